//! Decoding model replies into candidates
//!
//! Replies are untrusted text. The candidate may arrive as a JSON object
//! or as a string holding encoded JSON, possibly inside a markdown fence.

use std::time::Duration;

use serde_json::Value;

use crate::query::QueryCandidate;

use super::errors::{GenerationError, GenerationResult};

/// What came back across the model boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalOutcome {
    /// A well-formed (not yet validated) candidate
    Candidate(QueryCandidate),
    /// The reply arrived but was not a candidate
    ParseFailure(String),
    /// No reply within the deadline
    Timeout(Duration),
    /// The endpoint could not be used
    Unreachable(String),
}

impl ProposalOutcome {
    /// Converts every non-candidate outcome into an error
    pub fn into_result(self) -> GenerationResult<QueryCandidate> {
        match self {
            ProposalOutcome::Candidate(candidate) => Ok(candidate),
            ProposalOutcome::ParseFailure(reason) => Err(GenerationError::Malformed(reason)),
            ProposalOutcome::Timeout(after) => Err(GenerationError::Timeout(after)),
            ProposalOutcome::Unreachable(reason) => Err(GenerationError::Unreachable(reason)),
        }
    }

    pub fn is_candidate(&self) -> bool {
        matches!(self, ProposalOutcome::Candidate(_))
    }
}

/// Extracts a candidate from a reply body.
///
/// Looks at `response` (generate API), then `message.content` (chat API),
/// then the body itself.
pub fn decode_reply(body: &Value) -> Result<QueryCandidate, String> {
    let payload = body
        .get("response")
        .or_else(|| body.pointer("/message/content"))
        .unwrap_or(body);

    let value = match payload {
        Value::String(text) => parse_text(text)?,
        other => other.clone(),
    };

    QueryCandidate::decode(&value)
}

fn parse_text(text: &str) -> Result<Value, String> {
    let trimmed = strip_fence(text.trim());
    if trimmed.is_empty() {
        return Err("model returned an empty reply".into());
    }
    serde_json::from_str(trimmed).map_err(|e| format!("reply is not valid JSON: {}", e))
}

/// Removes a surrounding ```` ``` ```` or ```` ```json ```` fence
fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => strip_language_tag(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Drops a `json` tag glued to the payload of a one-line fence
fn strip_language_tag(text: &str) -> &str {
    match text.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &text[4..],
        _ => text,
    }
}
