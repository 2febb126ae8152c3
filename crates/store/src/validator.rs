//! Guards between untrusted input and the backing stores.
//!
//! Two distinct responsibilities, depending on how an operation was built:
//! operations assembled from discrete caller parameters go through the
//! allow-list and literal sanitizer before assembly; free-text generated
//! operations are only classified by effect (read vs read-modify) so the
//! client can pick the right execution method.

use regex::Regex;
use std::sync::OnceLock;

use foafrag_core::schema;

use crate::error::StoreError;

/// Effect of an operation, decided by its leading keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    ReadWrite,
}

/// Escape a literal string value for embedding in an operation, preventing
/// injection through quotes or backslashes.
pub fn sanitize_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\'', "\\'")
}

/// Check a relationship predicate against the allow-list and resolve it to a
/// full URI. Operations built from caller parameters must never splice in a
/// predicate that did not pass through here.
pub fn validate_predicate(predicate: &str) -> Result<String, StoreError> {
    if !schema::is_allowed_predicate(predicate) {
        let allowed: Vec<&str> =
            schema::RELATIONSHIP_PREDICATES.iter().map(|(short, _)| *short).collect();
        return Err(StoreError::Validation(format!(
            "invalid relationship type `{predicate}`; valid types: {}",
            allowed.join(", ")
        )));
    }
    schema::resolve_predicate(predicate)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Validation(format!("unresolvable predicate `{predicate}`")))
}

/// Validate person fields before insertion.
pub fn validate_person(name: &str, age: Option<i64>, gender: Option<&str>) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("name is required".to_string()));
    }

    if let Some(age) = age {
        if !(0..=150).contains(&age) {
            return Err(StoreError::Validation("age must be between 0 and 150".to_string()));
        }
    }

    if let Some(gender) = gender {
        let normalized = gender.to_ascii_lowercase();
        if !matches!(normalized.as_str(), "male" | "female" | "other" | "non-binary") {
            return Err(StoreError::Validation(
                "gender must be male, female, other, or non-binary".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate an email address destined for a `mailto:` IRI. IRI refs have no
/// escape mechanism, so any character that could terminate the ref or smuggle
/// extra syntax past it is rejected outright rather than sanitized.
pub fn validate_email(email: &str) -> Result<&str, StoreError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(StoreError::Validation(format!("invalid email address `{trimmed}`")));
    }

    let forbidden = |ch: char| {
        ch.is_whitespace()
            || ch.is_control()
            || matches!(ch, '<' | '>' | '"' | '\\' | '{' | '}' | '|' | '^' | '`')
    };
    if trimmed.chars().any(forbidden) {
        return Err(StoreError::Validation(format!("invalid email address `{trimmed}`")));
    }

    Ok(trimmed)
}

fn prefix_preamble() -> &'static Regex {
    static PREAMBLE: OnceLock<Regex> = OnceLock::new();
    PREAMBLE.get_or_init(|| {
        Regex::new(r"(?i)^(\s*PREFIX\s+\S+\s+<[^>]+>\s*\.?\s*)+").unwrap_or_else(|error| {
            panic!("invalid preamble pattern: {error}")
        })
    })
}

/// Classify an operation's effect by its leading keyword after stripping any
/// PREFIX declarations. `SELECT`/`ASK`/`SEARCH` read; `INSERT`/`DELETE`
/// modify. Anything else is rejected before it can reach a store.
pub fn classify_operation(operation: &str) -> Result<OperationKind, StoreError> {
    let body = prefix_preamble().replace(operation, "");
    let body = body.trim_start();
    let keyword: String =
        body.chars().take_while(|ch| ch.is_ascii_alphabetic()).collect::<String>().to_uppercase();

    match keyword.as_str() {
        "SELECT" | "ASK" | "SEARCH" => Ok(OperationKind::Read),
        "INSERT" | "DELETE" => Ok(OperationKind::ReadWrite),
        "" => Err(StoreError::Validation("operation is empty".to_string())),
        other => Err(StoreError::Validation(format!(
            "unsupported operation type; operation starts with `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_escaped_for_injection_safety() {
        assert_eq!(sanitize_literal(r#"O"Brien"#), r#"O\"Brien"#);
        assert_eq!(sanitize_literal(r"back\slash"), r"back\\slash");
        assert_eq!(sanitize_literal("it's"), r"it\'s");
        // A crafted literal cannot terminate the surrounding quoted string.
        let hostile = "\"} } ; DROP GRAPH <http://example.org/foaf-poc/data>";
        assert!(!sanitize_literal(hostile).contains("\"}"));
    }

    #[test]
    fn emails_that_could_escape_an_iri_are_rejected() {
        assert_eq!(validate_email(" alice@example.org ").expect("valid"), "alice@example.org");
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
        assert!(validate_email("a b@example.org").is_err());
        assert!(validate_email("x@example.org> } } ; DROP ALL").is_err());
        assert!(validate_email("x@exa<mple.org").is_err());
    }

    #[test]
    fn allow_listed_predicates_resolve() {
        assert_eq!(
            validate_predicate("friendOf").expect("allowed"),
            "http://purl.org/vocab/relationship/friendOf"
        );
        assert!(validate_predicate("ownerOf").is_err());
    }

    #[test]
    fn person_validation_enforces_field_domains() {
        assert!(validate_person("Alice", Some(34), Some("female")).is_ok());
        assert!(validate_person("", None, None).is_err());
        assert!(validate_person("Bob", Some(200), None).is_err());
        assert!(validate_person("Bob", Some(-1), None).is_err());
        assert!(validate_person("Bob", None, Some("unknown")).is_err());
    }

    #[test]
    fn select_after_prefixes_classifies_as_read() {
        let operation = "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\
                         PREFIX rel: <http://purl.org/vocab/relationship/>\n\
                         SELECT ?name WHERE { ?p foaf:name ?name } LIMIT 10";
        assert_eq!(classify_operation(operation).expect("classify"), OperationKind::Read);
    }

    #[test]
    fn insert_and_delete_classify_as_read_write() {
        let insert = "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\
                      INSERT DATA { GRAPH <http://example.org/foaf-poc/data> { } }";
        assert_eq!(classify_operation(insert).expect("classify"), OperationKind::ReadWrite);
        assert_eq!(
            classify_operation("DELETE WHERE { ?s ?p ?o }").expect("classify"),
            OperationKind::ReadWrite
        );
    }

    #[test]
    fn search_directives_classify_as_read() {
        assert_eq!(
            classify_operation("SEARCH \"friends of David\" LIMIT 10").expect("classify"),
            OperationKind::Read
        );
    }

    #[test]
    fn unknown_and_empty_operations_are_rejected() {
        assert!(classify_operation("DESCRIBE <http://example.org/x>").is_err());
        assert!(classify_operation("   ").is_err());
        // A lone preamble with no body is not executable either.
        assert!(classify_operation("PREFIX foaf: <http://xmlns.com/foaf/0.1/>").is_err());
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        assert_eq!(
            classify_operation("select ?s where { ?s ?p ?o } LIMIT 1").expect("classify"),
            OperationKind::Read
        );
    }
}
