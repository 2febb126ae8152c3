use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use foafrag_agent::{GenerationClient, HttpLlmClient, Pipeline, TokioSleeper};
use foafrag_core::config::{AppConfig, ConfigError, LoadOptions, StoreKind};
use foafrag_store::{SparqlStore, StoreBackend, StoreClient, VectorStore};

pub struct Application {
    pub config: AppConfig,
    pub store: StoreClient,
    /// Present only for graph deployments; used for statistics reporting.
    pub sparql: Option<SparqlStore>,
    pub pipeline: Arc<Pipeline<HttpLlmClient, TokioSleeper>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("store client setup failed: {0}")]
    Store(String),
    #[error("language model setup failed: {0}")]
    Llm(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        store_kind = ?config.store.kind,
        "starting application bootstrap"
    );

    let (backend, sparql): (Arc<dyn StoreBackend>, Option<SparqlStore>) = match config.store.kind {
        StoreKind::Graph => {
            let sparql = SparqlStore::new(
                config.sparql_query_endpoint(),
                config.sparql_update_endpoint(),
                config.store.timeout_secs,
            )
            .map_err(|error| BootstrapError::Store(error.to_string()))?;
            (Arc::new(sparql.clone()), Some(sparql))
        }
        StoreKind::Vector => {
            let vector = VectorStore::new(
                config.store.vector_endpoint.clone(),
                config.store.vector_collection.clone(),
                config.store.retrieval_top_k,
                config.store.timeout_secs,
            )
            .map_err(|error| BootstrapError::Store(error.to_string()))?;
            (Arc::new(vector), None)
        }
    };
    let store = StoreClient::new(backend);

    // A dead store is reported by /health rather than aborting startup.
    if store.test_connectivity().await {
        info!(event_name = "system.bootstrap.store_connected", "store connectivity verified");
    } else {
        warn!(
            event_name = "system.bootstrap.store_unreachable",
            store_kind = ?config.store.kind,
            "store unreachable at startup"
        );
    }

    let llm = HttpLlmClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::Llm(error.to_string()))?;
    let generation_client = GenerationClient::from_config(llm, &config.llm);
    let pipeline = Arc::new(Pipeline::new(config.store.kind, generation_client, store.clone()));

    info!(event_name = "system.bootstrap.ready", "application bootstrap complete");
    Ok(Application { config, store, sparql, pipeline })
}

#[cfg(test)]
mod tests {
    use foafrag_core::config::{ConfigOverrides, LoadOptions};

    use super::*;

    fn options(overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions { overrides, ..LoadOptions::default() }
    }

    #[tokio::test]
    async fn bootstrap_builds_a_graph_deployment_by_default() {
        let app = bootstrap(options(ConfigOverrides::default()))
            .await
            .expect("bootstrap should succeed with defaults");

        assert_eq!(app.config.store.kind, StoreKind::Graph);
        assert!(app.sparql.is_some());
    }

    #[tokio::test]
    async fn bootstrap_omits_the_sparql_handle_for_vector_deployments() {
        let app = bootstrap(options(ConfigOverrides {
            store_kind: Some(StoreKind::Vector),
            ..ConfigOverrides::default()
        }))
        .await
        .expect("bootstrap should succeed for the vector store");

        assert_eq!(app.config.store.kind, StoreKind::Vector);
        assert!(app.sparql.is_none());
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_config() {
        let result = bootstrap(options(ConfigOverrides {
            log_level: Some("not-a-level".to_string()),
            ..ConfigOverrides::default()
        }))
        .await;

        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }
}
