pub mod config;
pub mod errors;
pub mod intent;
pub mod schema;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, StoreKind};
pub use errors::PipelineError;
pub use intent::{Intent, IntentClassifier};
