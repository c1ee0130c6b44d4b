//! End-to-end Pipeline Tests
//!
//! Question → intent → model → gate → store, with a scripted model and a
//! store that records every call it receives:
//! - A rejected candidate never reaches the store
//! - A model failure never reaches the gate or the store
//! - Every gate decision lands in the audit log

use std::sync::{Arc, Mutex};
use std::time::Duration;

use askdb::executor::{DocumentStore, MemoryStore, QueryExecutor, QueryResult, StoreResult};
use askdb::observability::{AuditOutcome, MemoryAuditLog};
use askdb::pipeline::{GatewayError, QueryGateway};
use askdb::proposal::{ModelClient, ModelFailure, ModelFuture, ModelRequest, QueryProposer};
use askdb::query::QueryIntent;
use askdb::schema::SchemaRegistry;
use serde_json::{json, Value};

// =============================================================================
// Helpers
// =============================================================================

/// Replies with a fixed body and keeps every prompt it was sent
struct ScriptedModel {
    reply: Result<Value, ModelFailure>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn replying(candidate: Value) -> Self {
        Self {
            reply: Ok(json!({"response": candidate.to_string()})),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(failure: ModelFailure) -> Self {
        Self {
            reply: Err(failure),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ModelClient for ScriptedModel {
    fn generate<'a>(&'a self, request: &'a ModelRequest) -> ModelFuture<'a> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Wraps a memory store and counts calls
struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new() -> Self {
        let inner = MemoryStore::new()
            .with_collection(
                "students",
                vec![
                    json!({"name": "Asha", "marks": 91, "grade": "A"}),
                    json!({"name": "Ravi", "marks": 45, "grade": "C"}),
                    json!({"name": "Meera", "marks": 78, "grade": "B"}),
                ],
            )
            .with_collection(
                "orders",
                vec![
                    json!({"category": "books", "amount": 20, "status": "Completed"}),
                    json!({"category": "books", "amount": 30, "status": "Completed"}),
                    json!({"category": "games", "amount": 60, "status": "Pending"}),
                ],
            );
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DocumentStore for RecordingStore {
    fn find(&self, collection: &str, filter: &Value) -> StoreResult<Vec<Value>> {
        self.calls.lock().unwrap().push(format!("find:{}", collection));
        self.inner.find(collection, filter)
    }

    fn aggregate(&self, collection: &str, pipeline: &[Value]) -> StoreResult<Vec<Value>> {
        self.calls.lock().unwrap().push(format!("aggregate:{}", collection));
        self.inner.aggregate(collection, pipeline)
    }

    fn count(&self, collection: &str, filter: &Value) -> StoreResult<u64> {
        self.calls.lock().unwrap().push(format!("count:{}", collection));
        self.inner.count(collection, filter)
    }
}

struct Harness {
    gateway: QueryGateway,
    model: Arc<ScriptedModel>,
    store: Arc<RecordingStore>,
    audit: Arc<MemoryAuditLog>,
}

fn harness(model: ScriptedModel) -> Harness {
    let schema = Arc::new(SchemaRegistry::builtin());
    let model = Arc::new(model);
    let store = Arc::new(RecordingStore::new());
    let audit = Arc::new(MemoryAuditLog::new());

    let proposer = QueryProposer::new(model.clone(), schema.clone(), Duration::from_secs(5));
    let gateway = QueryGateway::new(proposer, QueryExecutor::new(store.clone()), schema)
        .with_audit_log(audit.clone());

    Harness {
        gateway,
        model,
        store,
        audit,
    }
}

// =============================================================================
// Accepted Questions
// =============================================================================

#[tokio::test]
async fn test_find_question() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "find",
        "collection": "students",
        "query": {"grade": {"$in": ["A", "B"]}},
        "explanation": "students graded A or B"
    })));

    let response = h.gateway.ask("show students with grade A or B").await.unwrap();
    assert_eq!(response.intent, QueryIntent::Find);
    assert_eq!(response.result.cardinality(), 2);
    assert_eq!(h.store.calls(), vec!["find:students"]);
}

#[tokio::test]
async fn test_count_question() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "countDocuments",
        "collection": "orders",
        "query": {"status": "Pending"}
    })));

    let response = h.gateway.ask("count pending orders").await.unwrap();
    assert_eq!(response.intent, QueryIntent::Count);
    assert_eq!(response.result, QueryResult::Count(1));
    assert_eq!(h.store.calls(), vec!["count:orders"]);
}

#[tokio::test]
async fn test_aggregate_question() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "aggregate",
        "collection": "orders",
        "query": [
            {"$match": {"status": "Completed"}},
            {"$group": {"_id": "$category", "total": {"$sum": "$amount"}}}
        ]
    })));

    let response = h.gateway.ask("total sales by category").await.unwrap();
    assert_eq!(response.intent, QueryIntent::Aggregate);
    assert_eq!(
        response.result,
        QueryResult::Documents(vec![json!({"_id": "books", "total": 50})])
    );
    assert_eq!(h.store.calls(), vec!["aggregate:orders"]);
}

#[tokio::test]
async fn test_prompt_carries_question_and_schema() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "find",
        "collection": "students",
        "query": {}
    })));

    h.gateway.ask("list every student").await.unwrap();
    let prompts = h.model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("list every student"));
    assert!(prompts[0].contains("students"));
}

// =============================================================================
// Rejected Questions
// =============================================================================

#[tokio::test]
async fn test_rejected_candidate_never_reaches_store() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "find",
        "collection": "students",
        "query": {"$where": "this.marks > 50"}
    })));

    let err = h.gateway.ask("students above 50").await.unwrap_err();
    assert_eq!(err.code(), "ASKDB_FORBIDDEN_OPERATOR");
    assert!(h.store.calls().is_empty());

    let records = h.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, AuditOutcome::Rejected);
    assert_eq!(records[0].code.as_deref(), Some("ASKDB_FORBIDDEN_OPERATOR"));
}

#[tokio::test]
async fn test_unregistered_collection_never_reaches_store() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "find",
        "collection": "system.users",
        "query": {}
    })));

    let err = h.gateway.ask("list users").await.unwrap_err();
    assert_eq!(err.code(), "ASKDB_INVALID_COLLECTION");
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_model_failure_skips_gate_and_store() {
    let h = harness(ScriptedModel::failing(ModelFailure::Rejected {
        status: 500,
        body: "model not found".into(),
    }));

    let err = h.gateway.ask("list students").await.unwrap_err();
    assert!(matches!(err, GatewayError::Generation(_)));
    assert!(h.store.calls().is_empty());
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn test_unparseable_reply() {
    let model = ScriptedModel {
        reply: Ok(json!({"response": "Sure! Here is your query."})),
        prompts: Mutex::new(Vec::new()),
    };
    let h = harness(model);

    let err = h.gateway.ask("list students").await.unwrap_err();
    assert_eq!(err.code(), "ASKDB_MODEL_MALFORMED");
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_blank_question_skips_model() {
    let h = harness(ScriptedModel::replying(json!({})));

    let err = h.gateway.ask("\n\t ").await.unwrap_err();
    assert_eq!(err, GatewayError::EmptyQuestion);
    assert!(h.model.prompts.lock().unwrap().is_empty());
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let h = harness(ScriptedModel::replying(json!({
        "query_type": "count",
        "collection": "students",
        "query": {}
    })));

    for _ in 0..3 {
        h.gateway.ask("count students").await.unwrap();
    }

    let snapshot = h.gateway.metrics().snapshot();
    assert_eq!(snapshot.questions_received, 3);
    assert_eq!(snapshot.queries_executed, 3);
    assert_eq!(snapshot.candidates_rejected, 0);
    assert_eq!(h.audit.len(), 3);
}
