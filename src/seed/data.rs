use crate::model::{MockDefinition, ResponseSet};

/// The built-in definition table. Bodies are raw JSON text, exactly as an
/// authored response would be stored, so the demo data flows through the
/// same transmission path as real definitions.
pub fn builtin_definitions() -> Vec<MockDefinition> {
    vec![MockDefinition {
        path: "/api/v1/user".to_string(),
        method: "GET".to_string(),
        responses: ResponseSet::from_entries([
            (200, r#"{"name":"John","age":30,"car":null}"#),
            (404, r#"{"error":"User not found"}"#),
            (500, r#"{"error":"Internal server error"}"#),
        ]),
    }]
}
