//! Fixed vocabulary of the FoaF dataset: named-graph addressing, namespace
//! prefixes, the relationship allow-list, and the schema description injected
//! into generation prompts.
//!
//! The dataset keeps two named graphs inside one store: the ontology graph
//! holds the schema blueprint, the data graph holds person instances and
//! relationships. Every data operation must address the data graph explicitly.

pub const ONTOLOGY_GRAPH: &str = "http://example.org/foaf-poc/ontology";
pub const DATA_GRAPH: &str = "http://example.org/foaf-poc/data";
pub const PERSON_NAMESPACE: &str = "http://example.org/foaf-poc/";

pub const PREFIXES: &str = "\
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX rel: <http://purl.org/vocab/relationship/>
PREFIX schema: <http://schema.org/>
PREFIX custom: <http://example.org/foaf-poc/>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX owl: <http://www.w3.org/2002/07/owl#>
";

/// Relationship short names accepted from callers, with their full predicate
/// URIs. Anything outside this table is rejected before it can reach a store.
pub const RELATIONSHIP_PREDICATES: &[(&str, &str)] = &[
    ("friendOf", "http://purl.org/vocab/relationship/friendOf"),
    ("spouseOf", "http://purl.org/vocab/relationship/spouseOf"),
    ("parentOf", "http://purl.org/vocab/relationship/parentOf"),
    ("childOf", "http://purl.org/vocab/relationship/childOf"),
    ("siblingOf", "http://purl.org/vocab/relationship/siblingOf"),
    ("colleagueOf", "http://example.org/foaf-poc/colleagueOf"),
    ("neighborOf", "http://example.org/foaf-poc/neighborOf"),
    ("knows", "http://xmlns.com/foaf/0.1/knows"),
];

/// Resolve a short relationship name to its predicate URI. Full URIs pass
/// through untouched; unknown short names return `None`.
pub fn resolve_predicate(predicate: &str) -> Option<&str> {
    if predicate.starts_with("http") {
        return Some(predicate);
    }
    RELATIONSHIP_PREDICATES
        .iter()
        .find(|(short, _)| *short == predicate)
        .map(|(_, uri)| *uri)
}

pub fn is_allowed_predicate(predicate: &str) -> bool {
    RELATIONSHIP_PREDICATES
        .iter()
        .any(|(short, uri)| *short == predicate || *uri == predicate)
}

/// `http://example.org/foaf-poc/person001` -> `person001`.
pub fn uri_local_name(uri: &str) -> &str {
    uri.rsplit(['/', '#']).next().unwrap_or(uri)
}

/// `person001` -> full URI; already-qualified URIs pass through.
pub fn person_uri(person_id: &str) -> String {
    if person_id.starts_with("http") {
        person_id.to_string()
    } else {
        format!("{PERSON_NAMESPACE}{person_id}")
    }
}

/// Schema description for the structured-query store, injected verbatim into
/// the operation generation prompt. The pipeline treats this as an opaque
/// blob; it enumerates the ontology exhaustively so the model never has to
/// guess a class or predicate name.
pub const GRAPH_SCHEMA_DESCRIPTION: &str = r#"You are a SPARQL query generator for a FoaF (Friend-of-a-Friend) knowledge graph.

IMPORTANT - NAMED GRAPH ARCHITECTURE:
The dataset has TWO named graphs inside a single dataset:
  1. ONTOLOGY GRAPH  <http://example.org/foaf-poc/ontology>  - holds the schema blueprint (classes, properties, constraints).
  2. DATA GRAPH      <http://example.org/foaf-poc/data>      - holds the actual person instances and relationships.

You MUST wrap triple patterns inside the correct GRAPH clause:
  - For reading/writing person data   -> GRAPH <http://example.org/foaf-poc/data> { ... }
  - For reading schema/ontology info  -> GRAPH <http://example.org/foaf-poc/ontology> { ... }

NAMESPACES:
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX rel: <http://purl.org/vocab/relationship/>
PREFIX schema: <http://schema.org/>
PREFIX custom: <http://example.org/foaf-poc/>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX owl: <http://www.w3.org/2002/07/owl#>

CLASSES (defined in the ontology graph as owl:Class):
- custom:Person - base class for all individuals (owl:equivalentClass foaf:Person)
- custom:Student - rdfs:subClassOf custom:Person (students enrolled in education)
- custom:Employee - rdfs:subClassOf custom:Person (currently employed persons)
- custom:Retiree - rdfs:subClassOf custom:Person (retired persons)
- schema:Organization - an organization a person may work for
- custom:Student owl:disjointWith custom:Retiree (a person cannot be both)

PERSON PROPERTIES (owl:DatatypeProperty):
- foaf:name (string) - full name (exactly 1 per person)
- foaf:givenName (string) - first name
- foaf:familyName (string) - last name
- foaf:nick (string) - nickname
- foaf:age (integer) - age
- foaf:gender (string) - gender
- foaf:phone (string) - phone number
- foaf:mbox (URI) - email as mailto: URI (uniquely identifies a person)
- custom:birthDate (xsd:date) - date of birth (at most one per person)
- schema:address (string) - full address
- schema:addressLocality (string) - city
- schema:addressRegion (string) - state/province
- schema:postalCode (string) - postal code
- schema:addressCountry (string) - country
- schema:jobTitle (string) - job title
- custom:occupation (string) - occupation description
- custom:industry (string) - industry sector

RELATIONSHIP PREDICATES (owl:ObjectProperty):
- foaf:knows - general acquaintance
- rel:friendOf - friendship
- rel:spouseOf - marriage (owl:SymmetricProperty, bidirectional)
- rel:parentOf - parent to child (owl:inverseOf rel:childOf)
- rel:childOf - child to parent (owl:inverseOf rel:parentOf)
- rel:siblingOf - sibling (owl:SymmetricProperty)
- custom:colleagueOf - work colleague (owl:SymmetricProperty)
- custom:neighborOf - neighbor (owl:SymmetricProperty)
- custom:ancestorOf - ancestor (owl:TransitiveProperty)
- custom:descendantOf - descendant (owl:TransitiveProperty, owl:inverseOf custom:ancestorOf)

SUBCLASS QUERIES:
- To find all students: ?person a custom:Student
- To find all employees: ?person a custom:Employee
- To find all retirees: ?person a custom:Retiree
- Every Student/Employee/Retiree is also a custom:Person (via rdfs:subClassOf)

RULES:
1. Always include all necessary PREFIX declarations at the top of the query.
2. ALWAYS use GRAPH <http://example.org/foaf-poc/data> { ... } for person/relationship data.
3. Use GRAPH <http://example.org/foaf-poc/ontology> { ... } ONLY when the user asks about the schema itself.
4. For SELECT queries, use meaningful variable names.
5. Use FILTER with CONTAINS and LCASE for name searches to be case-insensitive.
6. For relationship queries, consider BOTH directions (some relationships are stored one-way).
7. Use OPTIONAL for fields that may not exist on all persons.
8. Add LIMIT to prevent overly large result sets (default LIMIT 50).
9. Return ONLY the SPARQL query, no explanation or markdown formatting.
10. For INSERT queries, use INSERT DATA { GRAPH <http://example.org/foaf-poc/data> { ... } } syntax.
11. For counting, use SELECT (COUNT(...) AS ?count).
12. Person URIs follow pattern: custom:personXXX (e.g., custom:person001)
13. When querying by subclass (Student, Employee, Retiree), use ?person a custom:Student etc.
14. For date comparisons on custom:birthDate, use FILTER with xsd:date casting.

Generate a valid SPARQL query for the following request:
"#;

/// Schema description for the embedding store. The operation language is a
/// single retrieval directive; bounding the result size is still mandatory.
pub const VECTOR_SCHEMA_DESCRIPTION: &str = r#"You are a retrieval directive generator for a semantic document store holding a FoaF (Friend-of-a-Friend) social network as text.

The store has one logical collection, `documents`, containing short text chunks about persons (name, age, contact details, job) and their relationships (friendOf, spouseOf, parentOf, childOf, siblingOf, colleagueOf, neighborOf, knows).

Your output is exactly one directive of the form:
SEARCH "<search terms>" LIMIT <n>

RULES:
1. The search terms must name the entities and relations the request is about, nothing else.
2. Always include the LIMIT clause to bound the result size (default LIMIT 50).
3. Return ONLY the directive, no explanation or markdown formatting.

Generate a retrieval directive for the following request:
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_predicate_names_resolve_to_full_uris() {
        assert_eq!(
            resolve_predicate("friendOf"),
            Some("http://purl.org/vocab/relationship/friendOf")
        );
        assert_eq!(resolve_predicate("knows"), Some("http://xmlns.com/foaf/0.1/knows"));
        assert_eq!(
            resolve_predicate("colleagueOf"),
            Some("http://example.org/foaf-poc/colleagueOf")
        );
    }

    #[test]
    fn full_uris_pass_through_resolution() {
        let uri = "http://purl.org/vocab/relationship/siblingOf";
        assert_eq!(resolve_predicate(uri), Some(uri));
    }

    #[test]
    fn unknown_predicates_are_rejected() {
        assert_eq!(resolve_predicate("enemyOf"), None);
        assert!(!is_allowed_predicate("enemyOf"));
        assert!(is_allowed_predicate("spouseOf"));
    }

    #[test]
    fn uri_helpers_round_trip_person_ids() {
        assert_eq!(person_uri("person001"), "http://example.org/foaf-poc/person001");
        assert_eq!(uri_local_name("http://example.org/foaf-poc/person001"), "person001");
        assert_eq!(uri_local_name("mailto:a@example.org#frag"), "frag");
        // Already-qualified input is preserved.
        let uri = "http://example.org/foaf-poc/person002";
        assert_eq!(person_uri(uri), uri);
    }

    #[test]
    fn schema_blob_names_both_graphs() {
        assert!(GRAPH_SCHEMA_DESCRIPTION.contains(ONTOLOGY_GRAPH));
        assert!(GRAPH_SCHEMA_DESCRIPTION.contains(DATA_GRAPH));
        assert!(VECTOR_SCHEMA_DESCRIPTION.contains("LIMIT"));
    }
}
