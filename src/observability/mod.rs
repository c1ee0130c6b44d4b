//! Observability for askdb
//!
//! - Structured JSON logging with a process-wide minimum severity
//! - Atomic counters with a serializable snapshot
//! - Stage timing scopes
//! - Audit trail of safety-gate decisions
//!
//! Observability never changes the outcome of a request. A failed audit
//! write is logged and the request continues.
//!
//! ```ignore
//! use askdb::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::CandidateAccepted, &[("collection", "students")]);
//! ```

pub mod audit;
mod events;
mod logger;
mod metrics;
mod scope;

pub use audit::{
    AuditLog, AuditOutcome, AuditRecord, FileAuditLog, MemoryAuditLog, MEMORY_AUDIT_CAPACITY,
};
pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Logs an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
