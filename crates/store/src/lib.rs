pub mod client;
pub mod directory;
pub mod error;
pub mod operations;
pub mod rows;
pub mod sparql;
pub mod validator;
pub mod vector;

pub use client::{StoreBackend, StoreClient};
pub use error::StoreError;
pub use operations::NewPerson;
pub use rows::{ResultRow, ResultSet};
pub use sparql::{GraphStats, SparqlStore};
pub use validator::OperationKind;
pub use vector::VectorStore;
