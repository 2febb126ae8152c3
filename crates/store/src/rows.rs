//! Normalized result rows shared by both backing stores.
//!
//! A row is an ordered field→value mapping. SPARQL JSON bindings carry typed
//! values (`{"type": "uri", "value": "..."}`); vector hits carry documents and
//! distances. Both normalize to plain strings so the formatter and the HTTP
//! layer never see store-specific shapes.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::StoreError;

pub type ResultRow = BTreeMap<String, String>;
pub type ResultSet = Vec<ResultRow>;

/// Build a row from field/value pairs. Mostly a test and fallback helper.
pub fn row<const N: usize>(pairs: [(&str, &str); N]) -> ResultRow {
    pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}

/// Parse a SPARQL 1.1 JSON results document into normalized rows.
///
/// SELECT results become one row per binding set; an ASK result becomes a
/// single `{answer: true|false}` row.
pub fn from_sparql_json(document: &Value) -> Result<ResultSet, StoreError> {
    if let Some(answer) = document.get("boolean").and_then(Value::as_bool) {
        return Ok(vec![row([("answer", if answer { "true" } else { "false" })])]);
    }

    let bindings = document
        .get("results")
        .and_then(|results| results.get("bindings"))
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Query {
            diagnostic: "response is not a SPARQL JSON results document".to_string(),
        })?;

    let mut rows = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let fields = binding.as_object().ok_or_else(|| StoreError::Query {
            diagnostic: "malformed binding in SPARQL results".to_string(),
        })?;

        let mut result_row = ResultRow::new();
        for (variable, cell) in fields {
            let value = cell
                .get("value")
                .map(scalar_to_string)
                .unwrap_or_else(|| scalar_to_string(cell));
            result_row.insert(variable.clone(), value);
        }
        rows.push(result_row);
    }

    Ok(rows)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn select_bindings_normalize_to_string_rows() {
        let document = json!({
            "head": {"vars": ["name", "age"]},
            "results": {"bindings": [
                {"name": {"type": "literal", "value": "Alice"},
                 "age": {"type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#integer", "value": "34"}},
                {"name": {"type": "literal", "value": "Bob"}}
            ]}
        });

        let rows = from_sparql_json(&document).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name").map(String::as_str), Some("Alice"));
        assert_eq!(rows[0].get("age").map(String::as_str), Some("34"));
        // Unbound variables are simply absent from the row.
        assert!(!rows[1].contains_key("age"));
    }

    #[test]
    fn ask_results_become_a_single_answer_row() {
        let rows = from_sparql_json(&json!({"head": {}, "boolean": true})).expect("parse");
        assert_eq!(rows, vec![row([("answer", "true")])]);
    }

    #[test]
    fn empty_bindings_are_a_valid_empty_result_set() {
        let document = json!({"head": {"vars": ["name"]}, "results": {"bindings": []}});
        assert!(from_sparql_json(&document).expect("parse").is_empty());
    }

    #[test]
    fn non_sparql_documents_are_rejected_with_a_diagnostic() {
        let error = from_sparql_json(&json!({"error": "no such dataset"})).unwrap_err();
        assert!(matches!(error, StoreError::Query { .. }));
    }
}
