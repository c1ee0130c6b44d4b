//! Lexical intent classification
//!
//! A heuristic front-end to the model prompt. It is not a guarantee of the
//! query type the model will actually produce.

use std::fmt;

use serde::Serialize;

/// Coarse intent of a user question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    Find,
    Search,
    Count,
    Aggregate,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Find => "find",
            QueryIntent::Search => "search",
            QueryIntent::Count => "count",
            QueryIntent::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keyword families in strict priority order. The first family with a
/// substring hit decides the intent.
const KEYWORD_FAMILIES: &[(QueryIntent, &[&str])] = &[
    (
        QueryIntent::Aggregate,
        &["total", "sum", "average", "top", "group", "monthly", "trend"],
    ),
    (
        QueryIntent::Search,
        &["search", "contains", "similar", "about"],
    ),
    (QueryIntent::Count, &["count"]),
];

/// Classifies free text into a query intent.
///
/// Total: every input, including the empty string, yields an intent.
pub fn classify(text: &str) -> QueryIntent {
    let lowered = text.to_lowercase();

    KEYWORD_FAMILIES
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(QueryIntent::Find)
}
