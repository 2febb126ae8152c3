//! Request orchestration as a linear node machine.
//!
//! A run walks classify -> generate -> execute -> format, and any node
//! failure diverts to a terminal error node. [`Pipeline::run`] always returns
//! an outcome; failures become user-facing messages, never panics. A
//! successful run makes exactly two model calls: one to generate the store
//! operation and one to phrase the answer.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use foafrag_core::config::StoreKind;
use foafrag_core::errors::PipelineError;
use foafrag_core::intent::{Intent, IntentClassifier};
use foafrag_store::{ResultSet, StoreClient};

use crate::formatter::ResponseFormatter;
use crate::generator::OperationGenerator;
use crate::llm::{GenerationClient, LlmClient, Sleeper};

/// One node transition, kept for diagnostics and surfaced in the outcome.
#[derive(Clone, Debug, Serialize)]
pub struct TraceEntry {
    pub node: &'static str,
    pub at: DateTime<Utc>,
    pub detail: String,
}

/// The final envelope for one request.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub succeeded: bool,
    pub request: String,
    pub intent: Intent,
    pub generated_operation: Option<String>,
    pub result_set: ResultSet,
    pub answer: String,
    pub elapsed_ms: u64,
    pub trace: Vec<TraceEntry>,
}

struct RunState {
    run_id: Uuid,
    request: String,
    intent: Intent,
    generated_operation: Option<String>,
    result_set: ResultSet,
    trace: Vec<TraceEntry>,
}

impl RunState {
    fn new(request: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            request: request.to_string(),
            intent: Intent::Error,
            generated_operation: None,
            result_set: Vec::new(),
            trace: Vec::new(),
        }
    }

    fn record(&mut self, node: &'static str, detail: String) {
        self.trace.push(TraceEntry { node, at: Utc::now(), detail });
    }
}

pub struct Pipeline<C, S> {
    classifier: IntentClassifier,
    generator: OperationGenerator,
    formatter: ResponseFormatter,
    generation_client: GenerationClient<C, S>,
    store: StoreClient,
}

impl<C, S> Pipeline<C, S>
where
    C: LlmClient,
    S: Sleeper,
{
    pub fn new(
        store_kind: StoreKind,
        generation_client: GenerationClient<C, S>,
        store: StoreClient,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            generator: OperationGenerator::new(store_kind),
            formatter: ResponseFormatter::new(),
            generation_client,
            store,
        }
    }

    /// Process one request end to end. Never returns an error; failures are
    /// folded into the outcome with a user-facing answer.
    pub async fn run(&self, request: &str) -> PipelineOutcome {
        let started = Instant::now();
        let mut state = RunState::new(request);

        let result = self.drive(&mut state).await;
        let (succeeded, answer) = match result {
            Ok(answer) => (true, answer),
            Err(error) => {
                state.record("handle_error", error.to_string());
                warn!(
                    event_name = "pipeline.failed",
                    run_id = %state.run_id,
                    error = %error,
                    "run ended in the error node"
                );
                (false, error.user_message())
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            event_name = "pipeline.finished",
            run_id = %state.run_id,
            succeeded,
            intent = %state.intent,
            elapsed_ms,
            "run finished"
        );

        PipelineOutcome {
            run_id: state.run_id,
            succeeded,
            request: state.request,
            intent: state.intent,
            generated_operation: state.generated_operation,
            result_set: state.result_set,
            answer,
            elapsed_ms,
            trace: state.trace,
        }
    }

    async fn drive(&self, state: &mut RunState) -> Result<String, PipelineError> {
        state.intent = self.classifier.classify(&state.request);
        state.record("classify_intent", state.intent.to_string());
        if state.intent == Intent::Error {
            return Err(PipelineError::UnsupportedRequest);
        }

        let operation = self
            .generator
            .generate(&self.generation_client, state.intent, &state.request)
            .await?;
        state.record("generate_operation", operation.clone());
        state.generated_operation = Some(operation.clone());

        state.result_set = self.store.execute(&operation).await?;
        state.record("execute_operation", format!("{} row(s)", state.result_set.len()));

        let answer = self
            .formatter
            .format(&self.generation_client, &state.request, state.intent, &state.result_set)
            .await?;
        state.record("format_response", format!("{} char(s)", answer.len()));
        Ok(answer)
    }
}
