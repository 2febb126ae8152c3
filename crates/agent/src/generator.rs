//! Turns a classified request into one executable store operation.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use foafrag_core::config::StoreKind;
use foafrag_core::errors::PipelineError;
use foafrag_core::intent::Intent;
use foafrag_core::schema;

use crate::llm::{GenerationClient, LlmClient, Sleeper};

/// Prompts the model with the store's schema description and normalizes the
/// completion into a bare operation string.
pub struct OperationGenerator {
    store_kind: StoreKind,
}

impl OperationGenerator {
    pub fn new(store_kind: StoreKind) -> Self {
        Self { store_kind }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self.store_kind {
            StoreKind::Graph => schema::GRAPH_SCHEMA_DESCRIPTION,
            StoreKind::Vector => schema::VECTOR_SCHEMA_DESCRIPTION,
        }
    }

    pub async fn generate<C, S>(
        &self,
        client: &GenerationClient<C, S>,
        intent: Intent,
        request: &str,
    ) -> Result<String, PipelineError>
    where
        C: LlmClient,
        S: Sleeper,
    {
        let user_prompt = format!("Intent: {intent}\nUser request: {request}");
        let completion = client.invoke(self.system_prompt(), &user_prompt).await?;
        let operation = normalize_completion(&completion);

        if operation.is_empty() {
            return Err(PipelineError::Generation(
                "model returned an empty operation".to_string(),
            ));
        }

        debug!(
            event_name = "generator.operation_ready",
            intent = %intent,
            operation_len = operation.len(),
            "operation generated"
        );
        Ok(operation)
    }
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?is)^\s*```[a-z]*\s*(.*?)\s*```\s*$")
            .unwrap_or_else(|error| panic!("invalid fence pattern: {error}"))
    })
}

fn dangling_limit_pattern() -> &'static Regex {
    static LIMIT: OnceLock<Regex> = OnceLock::new();
    LIMIT.get_or_init(|| {
        Regex::new(r"(?i)\bLIMIT\s*$")
            .unwrap_or_else(|error| panic!("invalid limit pattern: {error}"))
    })
}

/// Strip a surrounding markdown fence and repair a trailing `LIMIT` the model
/// left without a bound.
fn normalize_completion(completion: &str) -> String {
    let stripped = match fence_pattern().captures(completion) {
        Some(captures) => captures[1].to_string(),
        None => completion.trim().to_string(),
    };
    dangling_limit_pattern().replace(&stripped, "LIMIT 50").into_owned()
}
