use thiserror::Error;

/// Error taxonomy for one pipeline transaction.
///
/// `RateLimitExceeded` is deliberately distinct from `Generation`: the former
/// marks a transient quota condition whose retry budget is already spent, and
/// it is the only class the response formatter may recover from locally.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("request is empty or not supported")]
    UnsupportedRequest,
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("store rejected operation: {0}")]
    StoreQuery(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl PipelineError {
    /// Whether this error class may clear on its own after a short delay.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. } | Self::StoreUnavailable(_))
    }

    /// A caller-safe sentence describing the failure. Raw diagnostics stay in
    /// the error itself for logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedRequest => {
                "I could not understand that request. Please rephrase your question.".to_string()
            }
            Self::Generation(_) => {
                "I could not translate that request into a store operation. Please try rephrasing."
                    .to_string()
            }
            Self::RateLimitExceeded { .. } => {
                "The language model is rate limited right now. Please wait a minute and try again."
                    .to_string()
            }
            Self::StoreUnavailable(_) => {
                "The knowledge store is unreachable. Please try again shortly.".to_string()
            }
            Self::StoreQuery(detail) => {
                format!("The store rejected the generated operation: {detail}")
            }
            Self::Validation(detail) => format!("The request failed validation: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineError;

    #[test]
    fn rate_limit_and_unavailable_are_transient() {
        assert!(PipelineError::RateLimitExceeded { attempts: 4 }.is_transient());
        assert!(PipelineError::StoreUnavailable("connection refused".to_string()).is_transient());
        assert!(!PipelineError::Generation("bad response".to_string()).is_transient());
        assert!(!PipelineError::StoreQuery("parse error".to_string()).is_transient());
    }

    #[test]
    fn user_messages_do_not_leak_internal_generation_detail() {
        let message =
            PipelineError::Generation("upstream returned 500: stack trace".to_string())
                .user_message();
        assert!(!message.contains("stack trace"));
        assert!(message.contains("rephrasing"));
    }

    #[test]
    fn display_includes_attempt_count_for_rate_limits() {
        let error = PipelineError::RateLimitExceeded { attempts: 4 };
        assert_eq!(error.to_string(), "rate limit exceeded after 4 attempts");
    }
}
