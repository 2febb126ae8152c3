//! Person and relationship operations composed from the typed builders.
//!
//! These drive the same validated execution path as generated operations but
//! are assembled from discrete parameters, so callers (CLI, HTTP API) get
//! inserts without a model in the loop.

use tracing::info;

use foafrag_core::schema;

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::operations::{self, NewPerson};
use crate::rows::ResultSet;

/// Insert a person under the next sequential id and return the allocated URI.
pub async fn create_person(store: &StoreClient, person: &NewPerson) -> Result<String, StoreError> {
    let rows = store.execute(&operations::next_person_id()).await?;
    let count = rows
        .first()
        .and_then(|row| row.get("count"))
        .and_then(|value| value.parse::<u64>().ok())
        .ok_or_else(|| StoreError::Query {
            diagnostic: "person count query returned no usable count".to_string(),
        })?;

    let person_uri = schema::person_uri(&operations::person_id_from_count(count));
    let operation = operations::insert_person(&person_uri, person)?;
    store.execute(&operation).await?;

    info!(
        event_name = "store.person_created",
        person_uri = %person_uri,
        "person inserted"
    );
    Ok(person_uri)
}

/// Insert one relationship between two persons identified by name.
pub async fn create_relationship(
    store: &StoreClient,
    from_name: &str,
    to_name: &str,
    kind: &str,
) -> Result<(), StoreError> {
    let subject_uri = resolve_person(store, from_name).await?;
    let object_uri = resolve_person(store, to_name).await?;

    let operation = operations::insert_relationship(&subject_uri, kind, &object_uri)?;
    store.execute(&operation).await?;

    info!(
        event_name = "store.relationship_created",
        subject = %subject_uri,
        object = %object_uri,
        kind,
        "relationship inserted"
    );
    Ok(())
}

/// Look a person up by name, requiring exactly one match.
pub async fn resolve_person(store: &StoreClient, name: &str) -> Result<String, StoreError> {
    let rows = store.execute(&operations::search_person_by_name(name)).await?;

    let mut uris: Vec<&String> = rows.iter().filter_map(|row| row.get("person")).collect();
    uris.dedup();

    match uris.as_slice() {
        [] => Err(StoreError::Validation(format!("no person named `{name}` found"))),
        [uri] => Ok((*uri).clone()),
        _ => Err(StoreError::Validation(format!(
            "`{name}` is ambiguous ({} matches); use a fuller name",
            uris.len()
        ))),
    }
}

pub async fn list_persons(store: &StoreClient, limit: u32) -> Result<ResultSet, StoreError> {
    store.execute(&operations::list_persons(limit)).await
}
