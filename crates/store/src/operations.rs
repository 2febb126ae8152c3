//! Typed operation builders for direct tool calls.
//!
//! These are assembled from discrete, validated parameters rather than model
//! output: every literal passes through the sanitizer and every predicate
//! through the allow-list, so nothing here can smuggle untrusted text into an
//! operation. The generated-operation path (free text from the model) never
//! goes through this module.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use foafrag_core::schema::{self, DATA_GRAPH, ONTOLOGY_GRAPH, PREFIXES};

use crate::error::StoreError;
use crate::validator::{sanitize_literal, validate_email, validate_person, validate_predicate};

/// A person to insert, as supplied by a caller. Only `name` is required;
/// blank names are rejected at validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPerson {
    pub name: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub job_title: Option<String>,
    pub occupation: Option<String>,
    pub industry: Option<String>,
}

pub fn search_person_by_name(name: &str) -> String {
    let safe_name = sanitize_literal(name);
    format!(
        r#"{PREFIXES}
SELECT ?person ?name ?age ?phone ?email ?jobTitle ?city
WHERE {{
    GRAPH <{DATA_GRAPH}> {{
        ?person a custom:Person ;
                foaf:name ?name .
        OPTIONAL {{ ?person foaf:age ?age }}
        OPTIONAL {{ ?person foaf:phone ?phone }}
        OPTIONAL {{ ?person foaf:mbox ?email }}
        OPTIONAL {{ ?person schema:jobTitle ?jobTitle }}
        OPTIONAL {{ ?person schema:addressLocality ?city }}
        FILTER (CONTAINS(LCASE(?name), LCASE("{safe_name}")))
    }}
}}
LIMIT 10
"#
    )
}

pub fn person_details(person_uri: &str) -> String {
    format!(
        r#"{PREFIXES}
SELECT ?predicate ?value
WHERE {{
    GRAPH <{DATA_GRAPH}> {{
        <{person_uri}> ?predicate ?value .
    }}
}}
"#
    )
}

pub fn person_relationships(person_uri: &str) -> String {
    format!(
        r#"{PREFIXES}
SELECT ?relationship ?relatedPerson ?relatedName
WHERE {{
    GRAPH <{DATA_GRAPH}> {{
        {{
            <{person_uri}> ?relationship ?relatedPerson .
            ?relatedPerson a custom:Person .
            ?relatedPerson foaf:name ?relatedName .
            FILTER (
                STRSTARTS(STR(?relationship), "http://purl.org/vocab/relationship/") ||
                ?relationship = foaf:knows ||
                ?relationship = custom:colleagueOf ||
                ?relationship = custom:neighborOf
            )
        }}
        UNION
        {{
            ?relatedPerson ?relationship <{person_uri}> .
            ?relatedPerson a custom:Person .
            ?relatedPerson foaf:name ?relatedName .
            FILTER (
                STRSTARTS(STR(?relationship), "http://purl.org/vocab/relationship/") ||
                ?relationship = foaf:knows ||
                ?relationship = custom:colleagueOf ||
                ?relationship = custom:neighborOf
            )
        }}
    }}
}}
"#
    )
}

pub fn next_person_id() -> String {
    format!(
        r#"{PREFIXES}
SELECT (COUNT(?p) as ?count)
WHERE {{
    GRAPH <{DATA_GRAPH}> {{ ?p a custom:Person }}
}}
"#
    )
}

pub fn list_persons(limit: u32) -> String {
    format!(
        r#"{PREFIXES}
SELECT ?person ?name ?age ?jobTitle ?city
WHERE {{
    GRAPH <{DATA_GRAPH}> {{
        ?person a custom:Person ;
                foaf:name ?name .
        OPTIONAL {{ ?person foaf:age ?age }}
        OPTIONAL {{ ?person schema:jobTitle ?jobTitle }}
        OPTIONAL {{ ?person schema:addressLocality ?city }}
    }}
}}
ORDER BY ?name
LIMIT {limit}
"#
    )
}

/// Build the INSERT for a validated person. The caller supplies the allocated
/// URI (see [`next_person_id`]); the builder contributes the triples.
pub fn insert_person(person_uri: &str, person: &NewPerson) -> Result<String, StoreError> {
    validate_person(&person.name, person.age, person.gender.as_deref())?;

    let mut triples = vec![
        format!("<{person_uri}> a custom:Person"),
        format!("<{person_uri}> foaf:name \"{}\"", sanitize_literal(&person.name)),
    ];

    if let Some(age) = person.age {
        triples.push(format!("<{person_uri}> foaf:age {age}"));
    }
    if let Some(email) = &person.email {
        // IRI refs cannot be escaped the way quoted literals can.
        let email = validate_email(email)?;
        triples.push(format!("<{person_uri}> foaf:mbox <mailto:{email}>"));
    }

    let string_fields: [(&str, &Option<String>); 10] = [
        ("foaf:gender", &person.gender),
        ("foaf:phone", &person.phone),
        ("schema:address", &person.address),
        ("schema:addressLocality", &person.city),
        ("schema:addressRegion", &person.state),
        ("schema:postalCode", &person.postal_code),
        ("schema:addressCountry", &person.country),
        ("schema:jobTitle", &person.job_title),
        ("custom:occupation", &person.occupation),
        ("custom:industry", &person.industry),
    ];
    for (predicate, value) in string_fields {
        if let Some(value) = value {
            triples.push(format!("<{person_uri}> {predicate} \"{}\"", sanitize_literal(value)));
        }
    }

    let timestamp = Utc::now().to_rfc3339();
    triples.push(format!("<{person_uri}> custom:createdAt \"{timestamp}\"^^xsd:dateTime"));

    let triple_block = triples.join(" .\n        ");
    Ok(format!(
        r#"{PREFIXES}
INSERT DATA {{
    GRAPH <{DATA_GRAPH}> {{
        {triple_block} .
    }}
}}
"#
    ))
}

/// Build the INSERT for one relationship triple. The predicate must be on the
/// allow-list; subject and object are full person URIs.
pub fn insert_relationship(
    subject_uri: &str,
    predicate: &str,
    object_uri: &str,
) -> Result<String, StoreError> {
    let predicate_uri = validate_predicate(predicate)?;
    Ok(format!(
        r#"{PREFIXES}
INSERT DATA {{
    GRAPH <{DATA_GRAPH}> {{
        <{subject_uri}> <{predicate_uri}> <{object_uri}> .
    }}
}}
"#
    ))
}

pub fn ontology_classes() -> String {
    format!(
        r#"{PREFIXES}
SELECT ?class ?label ?comment
WHERE {{
    GRAPH <{ONTOLOGY_GRAPH}> {{
        ?class a owl:Class .
        OPTIONAL {{ ?class rdfs:label ?label }}
        OPTIONAL {{ ?class rdfs:comment ?comment }}
    }}
}}
"#
    )
}

pub fn ontology_properties() -> String {
    format!(
        r#"{PREFIXES}
SELECT ?property ?type ?label ?domain ?range
WHERE {{
    GRAPH <{ONTOLOGY_GRAPH}> {{
        VALUES ?type {{ owl:ObjectProperty owl:DatatypeProperty }}
        ?property a ?type .
        OPTIONAL {{ ?property rdfs:label ?label }}
        OPTIONAL {{ ?property rdfs:domain ?domain }}
        OPTIONAL {{ ?property rdfs:range ?range }}
    }}
}}
ORDER BY ?type ?property
"#
    )
}

/// Retrieval directive for the embedding store.
pub fn search_directive(terms: &str, limit: u32) -> String {
    format!("SEARCH \"{}\" LIMIT {limit}", sanitize_literal(terms))
}

/// Allocate the next sequential person id (`person001`, `person002`, ...)
/// from the current person count.
pub fn person_id_from_count(count: u64) -> String {
    format!("person{:03}", count + 1)
}

#[cfg(test)]
mod tests {
    use foafrag_core::schema::DATA_GRAPH;

    use super::*;
    use crate::validator::{classify_operation, OperationKind};

    #[test]
    fn name_search_embeds_the_sanitized_literal() {
        let operation = search_person_by_name(r#"O"Brien"#);
        assert!(operation.contains(r#"LCASE("O\"Brien")"#));
        assert!(operation.contains(DATA_GRAPH));
        assert_eq!(classify_operation(&operation).expect("classify"), OperationKind::Read);
    }

    #[test]
    fn insert_person_requires_a_name() {
        let person = NewPerson::default();
        assert!(insert_person("http://example.org/foaf-poc/person001", &person).is_err());
    }

    #[test]
    fn insert_person_emits_only_present_fields() {
        let person = NewPerson {
            name: "Carol Jones".to_string(),
            age: Some(34),
            city: Some("Boston".to_string()),
            ..NewPerson::default()
        };
        let operation =
            insert_person("http://example.org/foaf-poc/person010", &person).expect("build");

        assert!(operation.contains("foaf:name \"Carol Jones\""));
        assert!(operation.contains("foaf:age 34"));
        assert!(operation.contains("schema:addressLocality \"Boston\""));
        assert!(!operation.contains("foaf:phone"));
        assert!(operation.contains("custom:createdAt"));
        assert_eq!(classify_operation(&operation).expect("classify"), OperationKind::ReadWrite);
    }

    #[test]
    fn hostile_emails_cannot_break_out_of_the_mailto_iri() {
        let person = NewPerson {
            name: "Mallory".to_string(),
            email: Some(
                "x> } } ; DROP ALL ; INSERT DATA { GRAPH <urn:g> { <urn:a> <urn:b> <urn:c"
                    .to_string(),
            ),
            ..NewPerson::default()
        };
        let result = insert_person("http://example.org/foaf-poc/person001", &person);
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let person = NewPerson {
            name: "Alice Smith".to_string(),
            email: Some("alice@example.org".to_string()),
            ..NewPerson::default()
        };
        let operation =
            insert_person("http://example.org/foaf-poc/person001", &person).expect("build");
        assert!(operation.contains("foaf:mbox <mailto:alice@example.org>"));
    }

    #[test]
    fn insert_relationship_rejects_unlisted_predicates() {
        let result = insert_relationship(
            "http://example.org/foaf-poc/person001",
            "enemyOf",
            "http://example.org/foaf-poc/person002",
        );
        assert!(result.is_err());
    }

    #[test]
    fn insert_relationship_resolves_short_predicate_names() {
        let operation = insert_relationship(
            "http://example.org/foaf-poc/person001",
            "friendOf",
            "http://example.org/foaf-poc/person002",
        )
        .expect("build");
        assert!(operation.contains("<http://purl.org/vocab/relationship/friendOf>"));
    }

    #[test]
    fn person_ids_are_sequential_and_zero_padded() {
        assert_eq!(person_id_from_count(0), "person001");
        assert_eq!(person_id_from_count(41), "person042");
        assert_eq!(person_id_from_count(120), "person121");
    }

    #[test]
    fn search_directive_is_bounded_and_classifies_as_read() {
        let directive = search_directive("friends of David", 10);
        assert_eq!(directive, "SEARCH \"friends of David\" LIMIT 10");
        assert_eq!(classify_operation(&directive).expect("classify"), OperationKind::Read);
    }

    #[test]
    fn relationship_query_covers_both_directions() {
        let operation = person_relationships("http://example.org/foaf-poc/person001");
        assert_eq!(operation.matches("UNION").count(), 1);
        assert_eq!(operation.matches("?relatedName").count(), 3);
    }
}
