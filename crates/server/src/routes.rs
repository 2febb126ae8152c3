//! HTTP surface for the retrieval pipeline and the person directory.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use foafrag_agent::llm::{LlmClient, Sleeper};
use foafrag_agent::{Pipeline, PipelineOutcome};
use foafrag_store::{directory, NewPerson, ResultSet, SparqlStore, StoreClient, StoreError};

pub struct AppState<C, S> {
    pub pipeline: Arc<Pipeline<C, S>>,
    pub store: StoreClient,
    pub sparql: Option<SparqlStore>,
}

impl<C, S> Clone for AppState<C, S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            store: self.store.clone(),
            sparql: self.sparql.clone(),
        }
    }
}

pub fn router<C, S>(state: AppState<C, S>) -> Router
where
    C: LlmClient + 'static,
    S: Sleeper + 'static,
{
    Router::new()
        .route("/api/v1/query", post(run_query))
        .route("/api/v1/persons", get(list_persons).post(create_person))
        .route("/api/v1/relationships", post(create_relationship))
        .route("/api/v1/stats", get(graph_stats))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub request: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipRequest {
    pub from: String,
    pub to: String,
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct PersonCreated {
    pub person_uri: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn store_error_response(error: StoreError) -> ApiError {
    let status = match &error {
        StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Query { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorBody { error: error.to_string() }))
}

async fn run_query<C, S>(
    State(state): State<AppState<C, S>>,
    Json(body): Json<QueryRequest>,
) -> (StatusCode, Json<PipelineOutcome>)
where
    C: LlmClient,
    S: Sleeper,
{
    let outcome = state.pipeline.run(&body.request).await;
    info!(
        event_name = "api.query",
        run_id = %outcome.run_id,
        succeeded = outcome.succeeded,
        "query request served"
    );
    let status = if outcome.succeeded { StatusCode::OK } else { StatusCode::UNPROCESSABLE_ENTITY };
    (status, Json(outcome))
}

async fn list_persons<C, S>(
    State(state): State<AppState<C, S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ResultSet>, ApiError>
where
    C: LlmClient,
    S: Sleeper,
{
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let rows = directory::list_persons(&state.store, limit)
        .await
        .map_err(store_error_response)?;
    Ok(Json(rows))
}

async fn create_person<C, S>(
    State(state): State<AppState<C, S>>,
    Json(person): Json<NewPerson>,
) -> Result<(StatusCode, Json<PersonCreated>), ApiError>
where
    C: LlmClient,
    S: Sleeper,
{
    let person_uri = directory::create_person(&state.store, &person)
        .await
        .map_err(store_error_response)?;
    Ok((StatusCode::CREATED, Json(PersonCreated { person_uri })))
}

async fn create_relationship<C, S>(
    State(state): State<AppState<C, S>>,
    Json(body): Json<RelationshipRequest>,
) -> Result<StatusCode, ApiError>
where
    C: LlmClient,
    S: Sleeper,
{
    directory::create_relationship(&state.store, &body.from, &body.to, &body.kind)
        .await
        .map_err(store_error_response)?;
    Ok(StatusCode::CREATED)
}

async fn graph_stats<C, S>(
    State(state): State<AppState<C, S>>,
) -> Result<Json<foafrag_store::GraphStats>, ApiError>
where
    C: LlmClient,
    S: Sleeper,
{
    let Some(sparql) = &state.sparql else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "statistics are only available for graph deployments".to_string(),
            }),
        ));
    };
    let stats = sparql.graph_stats().await.map_err(store_error_response)?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use foafrag_agent::llm::{GenerationClient, LlmClient, LlmError, Sleeper};
    use foafrag_agent::Pipeline;
    use foafrag_core::config::StoreKind;
    use foafrag_store::rows::row;
    use foafrag_store::{ResultSet, StoreBackend, StoreClient, StoreError};

    use super::{router, AppState};

    struct NullSleeper;

    #[async_trait]
    impl Sleeper for NullSleeper {
        async fn sleep(&self, _duration: Duration) {}
    }

    struct QueuedLlm {
        responses: Mutex<VecDeque<String>>,
    }

    #[async_trait]
    impl LlmClient for QueuedLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .ok_or_else(|| LlmError::Failed("response queue exhausted".to_string()))
        }
    }

    struct ScriptedBackend {
        read_results: Mutex<Vec<ResultSet>>,
        writes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StoreBackend for ScriptedBackend {
        async fn execute_read(&self, _operation: &str) -> Result<ResultSet, StoreError> {
            let mut results = self.read_results.lock().expect("lock");
            if results.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(results.remove(0))
            }
        }

        async fn execute_read_write(&self, operation: &str) -> Result<(), StoreError> {
            self.writes.lock().expect("lock").push(operation.to_string());
            Ok(())
        }

        async fn test_connectivity(&self) -> bool {
            true
        }
    }

    fn app(
        responses: Vec<String>,
        read_results: Vec<ResultSet>,
    ) -> axum::Router {
        let llm = QueuedLlm { responses: Mutex::new(responses.into()) };
        let generation_client = GenerationClient::new(llm, NullSleeper, 3, Duration::from_secs(2));
        let store = StoreClient::new(Arc::new(ScriptedBackend {
            read_results: Mutex::new(read_results),
            writes: Mutex::new(Vec::new()),
        }));
        let pipeline = Arc::new(Pipeline::new(StoreKind::Graph, generation_client, store.clone()));
        router(AppState { pipeline, store, sparql: None })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn query_endpoint_returns_the_run_envelope() {
        let app = app(
            vec![
                "SELECT ?name WHERE { ?p <http://xmlns.com/foaf/0.1/name> ?name }".to_string(),
                "Alice is the only person in the network.".to_string(),
            ],
            vec![vec![row([("name", "Alice")])]],
        );

        let response = app
            .oneshot(post_json("/api/v1/query", json!({"request": "who is in the network?"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["succeeded"], true);
        assert_eq!(payload["intent"], "query");
        assert_eq!(payload["answer"], "Alice is the only person in the network.");
    }

    #[tokio::test]
    async fn blank_requests_map_to_unprocessable_entity() {
        let app = app(Vec::new(), Vec::new());

        let response = app
            .oneshot(post_json("/api/v1/query", json!({"request": "   "})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = body_json(response).await;
        assert_eq!(payload["succeeded"], false);
    }

    #[tokio::test]
    async fn creating_a_person_allocates_a_uri() {
        let app = app(Vec::new(), vec![vec![row([("count", "2")])]]);

        let response = app
            .oneshot(post_json("/api/v1/persons", json!({"name": "Carol White", "age": 29})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = body_json(response).await;
        assert_eq!(payload["person_uri"], "http://example.org/foaf-poc/person003");
    }

    #[tokio::test]
    async fn unknown_relationship_kinds_are_rejected() {
        let person = |uri: &str| vec![row([("person", uri)])];
        let app = app(
            Vec::new(),
            vec![
                person("http://example.org/foaf-poc/person001"),
                person("http://example.org/foaf-poc/person002"),
            ],
        );

        let response = app
            .oneshot(post_json(
                "/api/v1/relationships",
                json!({"from": "Alice", "to": "Bob", "kind": "enemyOf"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn stats_are_absent_for_vector_deployments() {
        let app = app(Vec::new(), Vec::new());

        let response = app
            .oneshot(Request::builder().uri("/api/v1/stats").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn person_listing_honors_the_limit_parameter() {
        let app = app(Vec::new(), vec![vec![row([("name", "Alice")])]]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/persons?limit=5")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload[0]["name"], "Alice");
    }
}
