//! HTTP client for the Fuseki triple store.
//!
//! One long-lived client is shared by every transaction; `reqwest::Client`
//! already multiplexes concurrent requests over its pool, so no per-request
//! reconnects and no locks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use foafrag_core::schema::{DATA_GRAPH, ONTOLOGY_GRAPH};

use crate::client::StoreBackend;
use crate::error::StoreError;
use crate::rows::{self, ResultSet};

const SPARQL_QUERY_MEDIA_TYPE: &str = "application/sparql-query";
const SPARQL_UPDATE_MEDIA_TYPE: &str = "application/sparql-update";
const SPARQL_RESULTS_MEDIA_TYPE: &str = "application/sparql-results+json";

#[derive(Clone)]
pub struct SparqlStore {
    client: Client,
    query_endpoint: String,
    update_endpoint: String,
}

/// Best-effort dataset statistics. Counts come straight from the store and
/// are bounded by whatever LIMIT the counting queries carry; they are health
/// reporting, not an authoritative census.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub persons: u64,
    pub relationships: u64,
    pub data_triples: u64,
    pub ontology_triples: u64,
}

impl SparqlStore {
    pub fn new(
        query_endpoint: String,
        update_endpoint: String,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|error| StoreError::Unavailable(format!("http client setup failed: {error}")))?;

        Ok(Self { client, query_endpoint, update_endpoint })
    }

    async fn post_query(&self, operation: &str) -> Result<ResultSet, StoreError> {
        let response = self
            .client
            .post(&self.query_endpoint)
            .header(reqwest::header::CONTENT_TYPE, SPARQL_QUERY_MEDIA_TYPE)
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_MEDIA_TYPE)
            .body(operation.to_string())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let diagnostic = response.text().await.unwrap_or_default();
            error!(
                event_name = "store.sparql.query_rejected",
                status = %status,
                "store rejected query"
            );
            return Err(StoreError::Query {
                diagnostic: format!("{status}: {}", diagnostic.trim()),
            });
        }

        let document = response
            .json::<serde_json::Value>()
            .await
            .map_err(|error| StoreError::Query { diagnostic: format!("invalid results document: {error}") })?;

        let rows = rows::from_sparql_json(&document)?;
        debug!(
            event_name = "store.sparql.query_ok",
            row_count = rows.len(),
            "query executed"
        );
        Ok(rows)
    }

    async fn post_update(&self, operation: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.update_endpoint)
            .header(reqwest::header::CONTENT_TYPE, SPARQL_UPDATE_MEDIA_TYPE)
            .body(operation.to_string())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let diagnostic = response.text().await.unwrap_or_default();
            error!(
                event_name = "store.sparql.update_rejected",
                status = %status,
                "store rejected update"
            );
            return Err(StoreError::Query {
                diagnostic: format!("{status}: {}", diagnostic.trim()),
            });
        }

        debug!(event_name = "store.sparql.update_ok", "update executed");
        Ok(())
    }

    /// Person/relationship/triple counts from both named graphs.
    pub async fn graph_stats(&self) -> Result<GraphStats, StoreError> {
        let persons = self
            .count(&format!(
                "PREFIX custom: <http://example.org/foaf-poc/>\n\
                 SELECT (COUNT(?p) AS ?count) WHERE {{ GRAPH <{DATA_GRAPH}> {{ ?p a custom:Person }} }}"
            ))
            .await?;

        let relationships = self
            .count(&format!(
                "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\
                 PREFIX custom: <http://example.org/foaf-poc/>\n\
                 SELECT (COUNT(*) AS ?count) WHERE {{\n\
                     GRAPH <{DATA_GRAPH}> {{\n\
                         ?s ?p ?o .\n\
                         FILTER (\n\
                             STRSTARTS(STR(?p), \"http://purl.org/vocab/relationship/\") ||\n\
                             ?p = foaf:knows ||\n\
                             ?p = custom:colleagueOf ||\n\
                             ?p = custom:neighborOf\n\
                         )\n\
                     }}\n\
                 }}"
            ))
            .await?;

        let data_triples = self
            .count(&format!(
                "SELECT (COUNT(*) AS ?count) WHERE {{ GRAPH <{DATA_GRAPH}> {{ ?s ?p ?o }} }}"
            ))
            .await?;

        let ontology_triples = self
            .count(&format!(
                "SELECT (COUNT(*) AS ?count) WHERE {{ GRAPH <{ONTOLOGY_GRAPH}> {{ ?s ?p ?o }} }}"
            ))
            .await?;

        Ok(GraphStats { persons, relationships, data_triples, ontology_triples })
    }

    async fn count(&self, operation: &str) -> Result<u64, StoreError> {
        let result_set = self.post_query(operation).await?;
        Ok(result_set
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0))
    }
}

#[async_trait]
impl StoreBackend for SparqlStore {
    async fn execute_read(&self, operation: &str) -> Result<ResultSet, StoreError> {
        self.post_query(operation).await
    }

    async fn execute_read_write(&self, operation: &str) -> Result<(), StoreError> {
        self.post_update(operation).await
    }

    async fn test_connectivity(&self) -> bool {
        self.post_query("SELECT (COUNT(*) AS ?count) WHERE { ?s ?p ?o } LIMIT 1").await.is_ok()
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}
