//! Observable events
//!
//! Every log line names one of these. Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    ConfigLoaded,
    SchemaLoaded,
    StoreLoaded,
    /// Data directory missing, serving an empty store
    StoreMissing,
    ServerStart,
    ServerStopped,

    // Ask pipeline
    QuestionReceived,
    IntentClassified,
    ProposalReceived,
    ProposalFailed,
    CandidateRejected,
    CandidateAccepted,
    ExecutionComplete,
    ExecutionFailed,
    /// An unvalidated operation reached the executor
    ContractBreach,

    // Explain
    ExplainComplete,

    AuditWriteFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::StoreLoaded => "STORE_LOADED",
            Event::StoreMissing => "STORE_MISSING",
            Event::ServerStart => "SERVER_START",
            Event::ServerStopped => "SERVER_STOPPED",
            Event::QuestionReceived => "QUESTION_RECEIVED",
            Event::IntentClassified => "INTENT_CLASSIFIED",
            Event::ProposalReceived => "PROPOSAL_RECEIVED",
            Event::ProposalFailed => "PROPOSAL_FAILED",
            Event::CandidateRejected => "CANDIDATE_REJECTED",
            Event::CandidateAccepted => "CANDIDATE_ACCEPTED",
            Event::ExecutionComplete => "EXECUTION_COMPLETE",
            Event::ExecutionFailed => "EXECUTION_FAILED",
            Event::ContractBreach => "CONTRACT_BREACH",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
            Event::AuditWriteFailed => "AUDIT_WRITE_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IntentClassified | Event::ProposalReceived | Event::ExplainComplete => {
                Severity::Trace
            }
            Event::StoreMissing
            | Event::ProposalFailed
            | Event::CandidateRejected
            | Event::AuditWriteFailed => Severity::Warn,
            Event::ExecutionFailed | Event::ContractBreach => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
