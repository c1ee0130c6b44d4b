//! Metrics registry for askdb
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters
///
/// Relaxed ordering; counters are independent of one another.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    questions_received: AtomicU64,
    proposals_failed: AtomicU64,
    candidates_rejected: AtomicU64,
    queries_executed: AtomicU64,
    executions_failed: AtomicU64,
    contract_breaches: AtomicU64,
    explains_served: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_questions_received(&self) {
        self.questions_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_proposals_failed(&self) {
        self.proposals_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_candidates_rejected(&self) {
        self.candidates_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_executions_failed(&self) {
        self.executions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_contract_breaches(&self) {
        self.contract_breaches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_explains_served(&self) {
        self.explains_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            questions_received: self.questions_received.load(Ordering::Relaxed),
            proposals_failed: self.proposals_failed.load(Ordering::Relaxed),
            candidates_rejected: self.candidates_rejected.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            executions_failed: self.executions_failed.load(Ordering::Relaxed),
            contract_breaches: self.contract_breaches.load(Ordering::Relaxed),
            explains_served: self.explains_served.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub questions_received: u64,
    pub proposals_failed: u64,
    pub candidates_rejected: u64,
    pub queries_executed: u64,
    pub executions_failed: u64,
    pub contract_breaches: u64,
    pub explains_served: u64,
}
