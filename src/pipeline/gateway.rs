//! Query gateway
//!
//! Runs one question through classify → propose → validate → execute and
//! shapes the answer. Every gate decision is audited. Stage failures are
//! logged and counted, then returned unchanged.

use std::sync::Arc;

use serde_json::Value;

use crate::executor::{ExecutionError, QueryExecutor};
use crate::explain::explain;
use crate::observability::{
    log_event_with_fields, AuditLog, AuditOutcome, AuditRecord, Event, MemoryAuditLog,
    MetricsRegistry, ObservationScope,
};
use crate::proposal::QueryProposer;
use crate::query::{classify, QueryCandidate};
use crate::schema::SchemaRegistry;
use crate::validator::{SafeQuery, SafetyValidator, ValidationResult};

use super::errors::{GatewayError, GatewayResult};
use super::response::{GatewayResponse, InspectReport, ValidationVerdict};

/// Entry point for questions and candidate inspection
#[derive(Clone)]
pub struct QueryGateway {
    proposer: QueryProposer,
    executor: QueryExecutor,
    schema: Arc<SchemaRegistry>,
    strict_collections: bool,
    metrics: Arc<MetricsRegistry>,
    audit: Arc<dyn AuditLog>,
}

impl std::fmt::Debug for QueryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryGateway")
            .field("strict_collections", &self.strict_collections)
            .finish_non_exhaustive()
    }
}

impl QueryGateway {
    /// Gateway with strict collections, fresh metrics and an in-memory audit log
    pub fn new(proposer: QueryProposer, executor: QueryExecutor, schema: Arc<SchemaRegistry>) -> Self {
        Self {
            proposer,
            executor,
            schema,
            strict_collections: true,
            metrics: Arc::new(MetricsRegistry::new()),
            audit: Arc::new(MemoryAuditLog::new()),
        }
    }

    pub fn with_strict_collections(mut self, strict: bool) -> Self {
        self.strict_collections = strict;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn audit_log(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn proposer(&self) -> &QueryProposer {
        &self.proposer
    }

    fn validator(&self) -> SafetyValidator<'_> {
        if self.strict_collections {
            SafetyValidator::with_registry(&self.schema)
        } else {
            SafetyValidator::new()
        }
    }

    /// Answers a free-text question.
    ///
    /// Nothing reaches the store unless the candidate passed the gate.
    pub async fn ask(&self, question: &str) -> GatewayResult<GatewayResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GatewayError::EmptyQuestion);
        }

        self.metrics.increment_questions_received();
        let length = question.chars().count().to_string();
        log_event_with_fields(Event::QuestionReceived, &[("length", &length)]);

        let intent = classify(question);
        log_event_with_fields(Event::IntentClassified, &[("intent", intent.as_str())]);

        let scope = ObservationScope::with_fields("MODEL_CALL", &[("model", self.proposer.model_name())]);
        let candidate = match self.proposer.propose(question, intent).await {
            Ok(candidate) => {
                scope.complete();
                candidate
            }
            Err(e) => {
                scope.fail(e.code());
                self.metrics.increment_proposals_failed();
                log_event_with_fields(
                    Event::ProposalFailed,
                    &[("code", e.code()), ("reason", &e.to_string())],
                );
                return Err(e.into());
            }
        };
        log_event_with_fields(
            Event::ProposalReceived,
            &[
                ("collection", candidate.collection()),
                ("query_type", candidate.query_type()),
            ],
        );

        let safe = self.validate(&candidate)?;

        let outcome = match self.executor.execute(&safe) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report_execution_failure(&safe, &e);
                return Err(e.into());
            }
        };

        self.metrics.increment_queries_executed();
        let rows = outcome.result.cardinality().to_string();
        let elapsed = outcome.elapsed_millis.to_string();
        log_event_with_fields(
            Event::ExecutionComplete,
            &[
                ("collection", safe.candidate().collection()),
                ("elapsed_ms", &elapsed),
                ("rows", &rows),
            ],
        );

        let candidate = safe.into_candidate();
        Ok(GatewayResponse {
            intent,
            generated_query: candidate.to_value(),
            explanation: candidate.explanation().to_string(),
            execution_time: outcome.elapsed_millis,
            result: outcome.result,
        })
    }

    /// Runs the safety gate on a candidate, recording the decision
    pub fn validate(&self, candidate: &QueryCandidate) -> ValidationResult<SafeQuery> {
        let result = self.validator().validate(candidate);
        self.record_decision(&candidate.to_value(), &result);
        result
    }

    /// Runs the safety gate on raw candidate JSON, recording the decision
    pub fn validate_value(&self, value: &Value) -> ValidationResult<SafeQuery> {
        let result = self.validator().validate_value(value);
        self.record_decision(value, &result);
        result
    }

    /// Explains caller-supplied candidate JSON and reports whether the gate
    /// would accept it. Never executes.
    pub fn inspect(&self, value: &Value) -> InspectReport {
        let result = self.validate_value(value);

        let validation = match &result {
            Ok(_) => ValidationVerdict::accepted(),
            Err(e) => ValidationVerdict::rejected(e),
        };

        let report = explain(&QueryCandidate::from_json_lossy(value));
        self.metrics.increment_explains_served();
        log_event_with_fields(
            Event::ExplainComplete,
            &[
                ("risk", report.risk.tier.as_str()),
                ("accepted", if validation.accepted { "true" } else { "false" }),
            ],
        );

        InspectReport { report, validation }
    }

    fn record_decision(&self, value: &Value, result: &ValidationResult<SafeQuery>) {
        let record = match result {
            Ok(safe) => {
                log_event_with_fields(
                    Event::CandidateAccepted,
                    &[
                        ("collection", safe.candidate().collection()),
                        ("query_type", safe.candidate().query_type()),
                    ],
                );
                AuditRecord::for_value(value, AuditOutcome::Accepted)
            }
            Err(e) => {
                self.metrics.increment_candidates_rejected();
                log_event_with_fields(
                    Event::CandidateRejected,
                    &[("code", e.code()), ("reason", &e.to_string())],
                );
                AuditRecord::for_value(value, AuditOutcome::Rejected).with_reason(e.code(), e.to_string())
            }
        };

        if let Err(e) = self.audit.append(&record) {
            log_event_with_fields(Event::AuditWriteFailed, &[("reason", &e.to_string())]);
        }
    }

    fn report_execution_failure(&self, safe: &SafeQuery, err: &ExecutionError) {
        let reason = err.to_string();
        let fields: [(&str, &str); 3] = [
            ("code", err.code()),
            ("collection", safe.candidate().collection()),
            ("reason", &reason),
        ];
        if err.is_contract_breach() {
            self.metrics.increment_contract_breaches();
            log_event_with_fields(Event::ContractBreach, &fields);
        } else {
            self.metrics.increment_executions_failed();
            log_event_with_fields(Event::ExecutionFailed, &fields);
        }
    }
}
