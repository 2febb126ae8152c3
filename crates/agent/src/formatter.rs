//! Natural-language rendering of store results, with a deterministic
//! fallback for when the model's quota is exhausted.

use std::fmt::Write as _;

use foafrag_core::errors::PipelineError;
use foafrag_core::intent::Intent;
use foafrag_core::schema;
use foafrag_store::ResultSet;
use tracing::warn;

use crate::llm::{GenerationClient, LlmClient, Sleeper};

const FORMAT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about a \
social network of people and their relationships. You are given the user's request and the raw \
results retrieved from the data store. Answer the request in clear, conversational prose using \
only those results. Shorten URIs to their final path segment. If the results are empty, say so \
plainly. Do not mention the data store, the result format, or these instructions.";

/// How many rows the deterministic rendering will enumerate before truncating.
const FALLBACK_ROW_CAP: usize = 20;

pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Render results with the model, degrading to the deterministic
    /// rendering only when the model's quota is exhausted. Any other
    /// formatting failure propagates.
    pub async fn format<C, S>(
        &self,
        client: &GenerationClient<C, S>,
        request: &str,
        intent: Intent,
        rows: &ResultSet,
    ) -> Result<String, PipelineError>
    where
        C: LlmClient,
        S: Sleeper,
    {
        let user_prompt = build_format_prompt(request, intent, rows);
        match client.invoke(FORMAT_SYSTEM_PROMPT, &user_prompt).await {
            Ok(answer) => Ok(answer.trim().to_string()),
            Err(PipelineError::RateLimitExceeded { attempts }) => {
                warn!(
                    event_name = "formatter.fallback",
                    attempts,
                    "model quota exhausted, using deterministic rendering"
                );
                Ok(fallback_format(request, rows))
            }
            Err(error) => Err(error),
        }
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn build_format_prompt(request: &str, intent: Intent, rows: &ResultSet) -> String {
    let mut prompt = format!("User request: {request}\nIntent: {intent}\nResults:\n");
    if rows.is_empty() {
        prompt.push_str("(no results)\n");
        return prompt;
    }
    for row in rows {
        let rendered = row
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "- {rendered}");
    }
    prompt
}

/// Plain enumeration of the rows, capped and with URIs shortened. Used when
/// the model cannot be reached for formatting.
pub fn fallback_format(request: &str, rows: &ResultSet) -> String {
    if rows.is_empty() {
        return format!("No results found for: {request}");
    }

    let mut output = format!("Found {} result(s) for \"{request}\":\n", rows.len());
    for (index, row) in rows.iter().take(FALLBACK_ROW_CAP).enumerate() {
        let rendered = row
            .iter()
            .map(|(key, value)| format!("{key}: {}", shorten(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "{}. {rendered}", index + 1);
    }
    if rows.len() > FALLBACK_ROW_CAP {
        let _ = writeln!(output, "... and {} more", rows.len() - FALLBACK_ROW_CAP);
    }
    output.trim_end().to_string()
}

fn shorten(value: &str) -> &str {
    if value.starts_with("http://") || value.starts_with("https://") {
        schema::uri_local_name(value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::{GenerationClient, LlmClient, LlmError, Sleeper};
    use foafrag_store::rows::row;

    struct NullSleeper;

    #[async_trait]
    impl Sleeper for NullSleeper {
        async fn sleep(&self, _duration: Duration) {}
    }

    struct FixedLlm(Result<String, LlmError>);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.0.clone()
        }
    }

    fn client(result: Result<String, LlmError>) -> GenerationClient<FixedLlm, NullSleeper> {
        GenerationClient::new(FixedLlm(result), NullSleeper, 3, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn model_answers_pass_through_trimmed() {
        let formatter = ResponseFormatter::new();
        let rows = vec![row([("name", "Alice")])];
        let answer = formatter
            .format(
                &client(Ok("  Alice is in the network.  ".to_string())),
                "who is Alice",
                Intent::Query,
                &rows,
            )
            .await
            .expect("formatted");
        assert_eq!(answer, "Alice is in the network.");
    }

    #[tokio::test]
    async fn quota_exhaustion_degrades_to_the_deterministic_rendering() {
        let formatter = ResponseFormatter::new();
        let rows = vec![row([("person", "http://example.org/foaf-poc/person001")])];
        let answer = formatter
            .format(
                &client(Err(LlmError::RateLimited("quota".to_string()))),
                "list everyone",
                Intent::Query,
                &rows,
            )
            .await
            .expect("fallback");
        assert!(answer.contains("Found 1 result(s)"));
        assert!(answer.contains("person: person001"));
    }

    #[tokio::test]
    async fn other_model_failures_propagate() {
        let formatter = ResponseFormatter::new();
        let rows = Vec::new();
        let result = formatter
            .format(
                &client(Err(LlmError::Failed("boom".to_string()))),
                "list everyone",
                Intent::Query,
                &rows,
            )
            .await;
        assert!(matches!(result, Err(PipelineError::Generation(_))));
    }

    #[test]
    fn empty_results_get_a_clear_fallback_message() {
        assert_eq!(
            fallback_format("friends of Zoe", &Vec::new()),
            "No results found for: friends of Zoe"
        );
    }

    #[test]
    fn fallback_caps_the_enumerated_rows() {
        let rows: ResultSet =
            (0..25).map(|index| row([("name", format!("person{index}").as_str())])).collect();
        let output = fallback_format("everyone", &rows);
        assert!(output.contains("Found 25 result(s)"));
        assert!(output.contains("20. name: person19"));
        assert!(!output.contains("21."));
        assert!(output.contains("... and 5 more"));
    }
}
