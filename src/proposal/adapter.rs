//! Query proposal adapter
//!
//! Turns a question into an untrusted candidate. The adapter performs no
//! safety filtering; its output always goes to the validator next.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::query::{QueryCandidate, QueryIntent};
use crate::schema::SchemaRegistry;

use super::client::{ModelClient, ModelFailure, ModelRequest};
use super::decode::{decode_reply, ProposalOutcome};
use super::errors::GenerationResult;
use super::prompt::PromptBuilder;

/// Asks the model for candidates
#[derive(Clone)]
pub struct QueryProposer {
    client: Arc<dyn ModelClient>,
    schema: Arc<SchemaRegistry>,
    timeout: Duration,
}

impl QueryProposer {
    pub fn new(client: Arc<dyn ModelClient>, schema: Arc<SchemaRegistry>, timeout: Duration) -> Self {
        Self {
            client,
            schema,
            timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// The exact prompt sent for `question`
    pub fn prompt(&self, question: &str, intent: QueryIntent) -> String {
        PromptBuilder::new(&self.schema).build(question, intent)
    }

    /// Calls the model once and reports what came back
    pub async fn request(&self, question: &str, intent: QueryIntent) -> ProposalOutcome {
        let request = ModelRequest::deterministic(self.prompt(question, intent));

        match timeout(self.timeout, self.client.generate(&request)).await {
            Err(_) | Ok(Err(ModelFailure::Timeout)) => ProposalOutcome::Timeout(self.timeout),
            Ok(Err(failure)) => ProposalOutcome::Unreachable(failure.to_string()),
            Ok(Ok(body)) => match decode_reply(&body) {
                Ok(candidate) => ProposalOutcome::Candidate(candidate),
                Err(reason) => ProposalOutcome::ParseFailure(reason),
            },
        }
    }

    /// Like `request`, with non-candidate outcomes as errors
    pub async fn propose(&self, question: &str, intent: QueryIntent) -> GenerationResult<QueryCandidate> {
        self.request(question, intent).await.into_result()
    }
}
