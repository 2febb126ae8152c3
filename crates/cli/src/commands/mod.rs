pub mod add_person;
pub mod add_relationship;
pub mod ask;
pub mod chat;
pub mod config;
pub mod doctor;

use std::sync::Arc;

use serde::Serialize;

use foafrag_agent::{GenerationClient, HttpLlmClient, Pipeline, TokioSleeper};
use foafrag_core::config::{AppConfig, StoreKind};
use foafrag_store::{SparqlStore, StoreBackend, StoreClient, VectorStore};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Build a current-thread runtime for commands that drive async work.
pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| format!("failed to initialize async runtime: {error}"))
}

/// Construct the store client the configuration points at.
pub(crate) fn build_store(config: &AppConfig) -> Result<StoreClient, String> {
    let backend: Arc<dyn StoreBackend> = match config.store.kind {
        StoreKind::Graph => Arc::new(
            SparqlStore::new(
                config.sparql_query_endpoint(),
                config.sparql_update_endpoint(),
                config.store.timeout_secs,
            )
            .map_err(|error| error.to_string())?,
        ),
        StoreKind::Vector => Arc::new(
            VectorStore::new(
                config.store.vector_endpoint.clone(),
                config.store.vector_collection.clone(),
                config.store.retrieval_top_k,
                config.store.timeout_secs,
            )
            .map_err(|error| error.to_string())?,
        ),
    };
    Ok(StoreClient::new(backend))
}

/// Construct the full request pipeline from configuration.
pub(crate) fn build_pipeline(
    config: &AppConfig,
) -> Result<Pipeline<HttpLlmClient, TokioSleeper>, String> {
    let llm = HttpLlmClient::from_config(&config.llm).map_err(|error| error.to_string())?;
    let generation_client = GenerationClient::from_config(llm, &config.llm);
    let store = build_store(config)?;
    Ok(Pipeline::new(config.store.kind, generation_client, store))
}
