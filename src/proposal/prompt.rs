//! Prompt construction
//!
//! The prompt pins the model to the registered collections, a closed
//! operator whitelist and a fixed return shape. None of this is trusted
//! later: the safety validator re-checks everything the prompt asks for.

use crate::query::QueryIntent;
use crate::schema::SchemaRegistry;

const OPERATOR_WHITELIST: [&str; 5] = ["$gt", "$lt", "$gte", "$lte", "$eq"];

/// Builds prompts from a schema registry
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    schema: &'a SchemaRegistry,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(schema: &'a SchemaRegistry) -> Self {
        Self { schema }
    }

    pub fn build(&self, question: &str, intent: QueryIntent) -> String {
        let operators = OPERATOR_WHITELIST
            .iter()
            .map(|op| format!("\"{}\"", op))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You are a MongoDB query generator for a read-only analytics assistant.
Output STRICT valid JSON only.

Collections:

{collections}

Rules:
- Only READ operations.
- Allowed query_type values: find, aggregate, count, countDocuments, search.
- For numeric comparisons use simple find syntax.
- Only use {operators}.
- Do NOT use $expr.
- Do NOT use $where.
- Do NOT reference other fields inside comparisons ($field).
- Do NOT invent operators.
- Only use the collections and fields listed above.

Example:
  "marks more than 50" ->
  {{ "marks": {{ "$gt": 50 }} }}

Detected intent: {intent}

Return:

{{
  "query_type": "find | aggregate | count",
  "collection": "collection_name",
  "query": {{}},
  "explanation": "short explanation"
}}

User Query: {question}"#,
            collections = self.schema.describe(),
            operators = operators,
            intent = intent,
            question = question.trim(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> String {
        PromptBuilder::new(&SchemaRegistry::builtin()).build("marks above 80", QueryIntent::Find)
    }

    #[test]
    fn test_lists_every_collection_and_field() {
        let text = prompt();
        for collection in SchemaRegistry::builtin().collections() {
            assert!(text.contains(&format!("{}:\n{{", collection.name)));
            for field in &collection.fields {
                assert!(text.contains(&field.name), "missing field {}", field.name);
            }
        }
    }

    #[test]
    fn test_whitelist_and_prohibitions() {
        let text = prompt();
        assert!(text.contains(r#"Only use "$gt", "$lt", "$gte", "$lte", "$eq"."#));
        assert!(text.contains("Do NOT use $expr."));
        assert!(text.contains("Do NOT use $where."));
        assert!(text.contains("Do NOT invent operators."));
    }

    #[test]
    fn test_example_intent_and_question() {
        let text = prompt();
        assert!(text.contains(r#"{ "marks": { "$gt": 50 } }"#));
        assert!(text.contains("Detected intent: find"));
        assert!(text.ends_with("User Query: marks above 80"));
        assert!(text.contains(r#""query_type": "find | aggregate | count""#));
    }
}
