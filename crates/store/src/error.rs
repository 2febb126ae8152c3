use foafrag_core::PipelineError;
use thiserror::Error;

/// Store-layer failures. None of these are retried: an unreachable store will
/// be just as unreachable from the caller's retry loop, and a malformed
/// operation will not become well-formed by resubmitting it unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unavailable(String),
    #[error("store rejected operation: {diagnostic}")]
    Query { diagnostic: String },
    #[error("operation validation failed: {0}")]
    Validation(String),
}

impl From<StoreError> for PipelineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(detail) => Self::StoreUnavailable(detail),
            StoreError::Query { diagnostic } => Self::StoreQuery(diagnostic),
            StoreError::Validation(detail) => Self::Validation(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_the_pipeline_taxonomy() {
        assert_eq!(
            PipelineError::from(StoreError::Unavailable("connection refused".to_string())),
            PipelineError::StoreUnavailable("connection refused".to_string())
        );
        assert_eq!(
            PipelineError::from(StoreError::Query { diagnostic: "parse error at 'FROM'".to_string() }),
            PipelineError::StoreQuery("parse error at 'FROM'".to_string())
        );
        assert_eq!(
            PipelineError::from(StoreError::Validation("predicate not allowed".to_string())),
            PipelineError::Validation("predicate not allowed".to_string())
        );
    }
}
