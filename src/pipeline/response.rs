//! Caller-facing result shapes

use serde::Serialize;
use serde_json::Value;

use crate::executor::QueryResult;
use crate::explain::ExplainReport;
use crate::query::QueryIntent;
use crate::validator::ValidationError;

/// Successful answer to a question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayResponse {
    pub intent: QueryIntent,
    /// The validated candidate as it was executed
    pub generated_query: Value,
    pub explanation: String,
    /// Milliseconds spent in the store
    pub execution_time: u64,
    pub result: QueryResult,
}

/// Gate decision as shown next to an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationVerdict {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            code: None,
            error: None,
        }
    }

    pub fn rejected(err: &ValidationError) -> Self {
        Self {
            accepted: false,
            code: Some(err.code()),
            error: Some(err.to_string()),
        }
    }
}

/// Explanation of a caller-supplied candidate, never executed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    #[serde(flatten)]
    pub report: ExplainReport,
    pub validation: ValidationVerdict,
}
