//! HTTP client for the Chroma embedding store.
//!
//! Executes `SEARCH "<terms>" LIMIT <n>` directives against one documents
//! collection and normalizes hits into the same row shape the triple store
//! produces. The collection is ingested offline; this interface is read-only,
//! so a read-modify directive is a validation failure rather than a store
//! call.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::client::StoreBackend;
use crate::error::StoreError;
use crate::rows::{ResultRow, ResultSet};

#[derive(Clone)]
pub struct VectorStore {
    client: Client,
    base_url: String,
    collection: String,
    max_results: u32,
}

/// A parsed retrieval directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchDirective {
    pub terms: String,
    pub limit: u32,
}

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)^\s*SEARCH\s+"((?:[^"\\]|\\.)*)"\s+LIMIT\s+(\d+)\s*$"#)
            .unwrap_or_else(|error| panic!("invalid directive pattern: {error}"))
    })
}

/// Parse a `SEARCH` directive, rejecting anything that does not match the
/// grammar exactly. The terms literal is unescaped back to plain text.
pub fn parse_directive(operation: &str) -> Result<SearchDirective, StoreError> {
    let captures = directive_pattern().captures(operation).ok_or_else(|| {
        StoreError::Validation(format!(
            "not a valid retrieval directive (expected `SEARCH \"terms\" LIMIT n`): `{}`",
            operation.trim()
        ))
    })?;

    let terms = unescape_literal(&captures[1]);
    let limit = captures[2]
        .parse::<u32>()
        .map_err(|_| StoreError::Validation("directive LIMIT is out of range".to_string()))?;

    if terms.trim().is_empty() {
        return Err(StoreError::Validation("directive search terms are empty".to_string()));
    }
    if limit == 0 {
        return Err(StoreError::Validation("directive LIMIT must be at least 1".to_string()));
    }

    Ok(SearchDirective { terms, limit })
}

fn unescape_literal(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                output.push(next);
            }
            continue;
        }
        output.push(ch);
    }
    output
}

impl VectorStore {
    pub fn new(
        base_url: String,
        collection: String,
        max_results: u32,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|error| StoreError::Unavailable(format!("http client setup failed: {error}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            max_results: max_results.max(1),
        })
    }

    async fn collection_id(&self) -> Result<String, StoreError> {
        let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let diagnostic = response.text().await.unwrap_or_default();
            return Err(StoreError::Query {
                diagnostic: format!("collection lookup failed ({status}): {}", diagnostic.trim()),
            });
        }

        response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("id").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| StoreError::Query {
                diagnostic: format!("collection `{}` has no id in lookup response", self.collection),
            })
    }

    async fn query(&self, directive: &SearchDirective) -> Result<ResultSet, StoreError> {
        let collection_id = self.collection_id().await?;
        let n_results = directive.limit.min(self.max_results);
        let url = format!("{}/api/v1/collections/{collection_id}/query", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "query_texts": [directive.terms],
                "n_results": n_results,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let diagnostic = response.text().await.unwrap_or_default();
            error!(
                event_name = "store.vector.query_rejected",
                status = %status,
                "store rejected directive"
            );
            return Err(StoreError::Query {
                diagnostic: format!("{status}: {}", diagnostic.trim()),
            });
        }

        let body = response.json::<Value>().await.map_err(|error| StoreError::Query {
            diagnostic: format!("invalid query response: {error}"),
        })?;

        let rows = rows_from_hits(&body);
        debug!(
            event_name = "store.vector.query_ok",
            row_count = rows.len(),
            "directive executed"
        );
        Ok(rows)
    }
}

/// Flatten Chroma's parallel-array response into rows.
fn rows_from_hits(body: &Value) -> ResultSet {
    let first_list = |key: &str| -> Vec<Value> {
        body.get(key)
            .and_then(Value::as_array)
            .and_then(|outer| outer.first())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    let documents = first_list("documents");
    let metadatas = first_list("metadatas");
    let distances = first_list("distances");

    documents
        .iter()
        .enumerate()
        .filter_map(|(index, document)| {
            let text = document.as_str()?;
            let mut row = ResultRow::new();
            row.insert("document".to_string(), text.to_string());
            if let Some(source) = metadatas
                .get(index)
                .and_then(|meta| meta.get("source"))
                .and_then(Value::as_str)
            {
                row.insert("source".to_string(), source.to_string());
            }
            if let Some(distance) = distances.get(index).and_then(Value::as_f64) {
                row.insert("distance".to_string(), format!("{distance:.4}"));
            }
            Some(row)
        })
        .collect()
}

#[async_trait]
impl StoreBackend for VectorStore {
    async fn execute_read(&self, operation: &str) -> Result<ResultSet, StoreError> {
        let directive = parse_directive(operation)?;
        self.query(&directive).await
    }

    async fn execute_read_write(&self, _operation: &str) -> Result<(), StoreError> {
        Err(StoreError::Validation(
            "the vector store is read-only; ingestion happens offline".to_string(),
        ))
    }

    async fn test_connectivity(&self) -> bool {
        let url = format!("{}/api/v1/heartbeat", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}
