//! Backend-agnostic execution of validated operations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::StoreError;
use crate::rows::{ResultRow, ResultSet};
use crate::validator::{classify_operation, OperationKind};

/// One backing store. Implementations speak their own wire protocol and
/// normalize results into [`ResultSet`] rows.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn execute_read(&self, operation: &str) -> Result<ResultSet, StoreError>;

    async fn execute_read_write(&self, operation: &str) -> Result<(), StoreError>;

    /// Cheap reachability probe for health reporting. Never errors.
    async fn test_connectivity(&self) -> bool;
}

/// Classifies operations and dispatches them to the configured backend.
#[derive(Clone)]
pub struct StoreClient {
    backend: Arc<dyn StoreBackend>,
}

impl StoreClient {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Execute one operation, routing by its classified effect. Read-modify
    /// operations report success as a single message row so callers see a
    /// uniform row shape either way.
    pub async fn execute(&self, operation: &str) -> Result<ResultSet, StoreError> {
        match classify_operation(operation)? {
            OperationKind::Read => {
                let rows = self.backend.execute_read(operation).await?;
                info!(
                    event_name = "store.execute_read",
                    row_count = rows.len(),
                    "read operation completed"
                );
                Ok(rows)
            }
            OperationKind::ReadWrite => {
                self.backend.execute_read_write(operation).await?;
                info!(event_name = "store.execute_read_write", "update operation completed");
                let mut row = ResultRow::new();
                row.insert("status".to_string(), "Update executed successfully".to_string());
                Ok(vec![row])
            }
        }
    }

    pub async fn test_connectivity(&self) -> bool {
        self.backend.test_connectivity().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::rows::row;

    #[derive(Default)]
    struct RecordingBackend {
        reads: Mutex<Vec<String>>,
        writes: Mutex<Vec<String>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl StoreBackend for RecordingBackend {
        async fn execute_read(&self, operation: &str) -> Result<ResultSet, StoreError> {
            self.reads
                .lock()
                .expect("lock")
                .push(operation.to_string());
            Ok(vec![row([("name", "Alice")])])
        }

        async fn execute_read_write(&self, operation: &str) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Query {
                    diagnostic: "update rejected".to_string(),
                });
            }
            self.writes
                .lock()
                .expect("lock")
                .push(operation.to_string());
            Ok(())
        }

        async fn test_connectivity(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn reads_dispatch_to_the_read_path() {
        let backend = Arc::new(RecordingBackend::default());
        let client = StoreClient::new(backend.clone());

        let rows = client
            .execute("SELECT ?name WHERE { ?p <http://xmlns.com/foaf/0.1/name> ?name }")
            .await
            .expect("read");

        assert_eq!(rows.len(), 1);
        assert_eq!(backend.reads.lock().expect("lock").len(), 1);
        assert!(backend.writes.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn updates_dispatch_to_the_write_path_and_report_a_message_row() {
        let backend = Arc::new(RecordingBackend::default());
        let client = StoreClient::new(backend.clone());

        let rows = client
            .execute("INSERT DATA { GRAPH <http://example.org/g> { <urn:a> <urn:b> <urn:c> } }")
            .await
            .expect("update");

        assert_eq!(
            rows[0].get("status").map(String::as_str),
            Some("Update executed successfully")
        );
        assert_eq!(backend.writes.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn prefix_preamble_does_not_mask_the_operation_keyword() {
        let backend = Arc::new(RecordingBackend::default());
        let client = StoreClient::new(backend.clone());

        let operation = "PREFIX foaf: <http://xmlns.com/foaf/0.1/> .\nINSERT DATA { <urn:a> foaf:name \"x\" }";
        client.execute(operation).await.expect("update");

        assert_eq!(backend.writes.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn unsupported_operations_never_reach_the_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let client = StoreClient::new(backend.clone());

        let result = client.execute("DROP GRAPH <http://example.org/g>").await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(backend.reads.lock().expect("lock").is_empty());
        assert!(backend.writes.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let backend = Arc::new(RecordingBackend {
            fail_writes: true,
            ..RecordingBackend::default()
        });
        let client = StoreClient::new(backend);

        let result = client.execute("DELETE WHERE { ?s ?p ?o }").await;
        assert!(matches!(result, Err(StoreError::Query { .. })));
    }
}
