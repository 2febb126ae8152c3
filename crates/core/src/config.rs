use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Which backing store the pipeline targets. One process serves one kind;
/// the two strategies are compared by running two deployments side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Graph,
    Vector,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Fuseki dataset endpoint; `/query` and `/update` are derived from it.
    pub sparql_endpoint: String,
    /// Chroma HTTP endpoint.
    pub vector_endpoint: String,
    pub vector_collection: String,
    pub retrieval_top_k: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// First retry delay; subsequent delays double it.
    pub retry_base_delay_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Gemini,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub store_kind: Option<StoreKind>,
    pub sparql_endpoint: Option<String>,
    pub vector_endpoint: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                kind: StoreKind::Graph,
                sparql_endpoint: "http://localhost:3030/foaf".to_string(),
                vector_endpoint: "http://localhost:8000".to_string(),
                vector_collection: "documents".to_string(),
                retrieval_top_k: 10,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434/v1".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 3,
                retry_base_delay_secs: 2,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "vector" => Ok(Self::Vector),
            other => Err(ConfigError::Validation(format!(
                "unsupported store kind `{other}` (expected graph|vector)"
            ))),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|gemini|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("foafrag.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn sparql_query_endpoint(&self) -> String {
        format!("{}/query", self.store.sparql_endpoint.trim_end_matches('/'))
    }

    pub fn sparql_update_endpoint(&self) -> String {
        format!("{}/update", self.store.sparql_endpoint.trim_end_matches('/'))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(store) = patch.store {
            if let Some(kind) = store.kind {
                self.store.kind = kind;
            }
            if let Some(sparql_endpoint) = store.sparql_endpoint {
                self.store.sparql_endpoint = sparql_endpoint;
            }
            if let Some(vector_endpoint) = store.vector_endpoint {
                self.store.vector_endpoint = vector_endpoint;
            }
            if let Some(vector_collection) = store.vector_collection {
                self.store.vector_collection = vector_collection;
            }
            if let Some(retrieval_top_k) = store.retrieval_top_k {
                self.store.retrieval_top_k = retrieval_top_k;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
            if let Some(retry_base_delay_secs) = llm.retry_base_delay_secs {
                self.llm.retry_base_delay_secs = retry_base_delay_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FOAFRAG_STORE_KIND") {
            self.store.kind = value.parse()?;
        }
        if let Some(value) = read_env("FOAFRAG_SPARQL_ENDPOINT") {
            self.store.sparql_endpoint = value;
        }
        if let Some(value) = read_env("FOAFRAG_VECTOR_ENDPOINT") {
            self.store.vector_endpoint = value;
        }
        if let Some(value) = read_env("FOAFRAG_VECTOR_COLLECTION") {
            self.store.vector_collection = value;
        }
        if let Some(value) = read_env("FOAFRAG_RETRIEVAL_TOP_K") {
            self.store.retrieval_top_k = parse_u32("FOAFRAG_RETRIEVAL_TOP_K", &value)?;
        }
        if let Some(value) = read_env("FOAFRAG_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("FOAFRAG_STORE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOAFRAG_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("FOAFRAG_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FOAFRAG_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("FOAFRAG_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("FOAFRAG_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("FOAFRAG_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FOAFRAG_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("FOAFRAG_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("FOAFRAG_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FOAFRAG_SERVER_PORT") {
            self.server.port = parse_u16("FOAFRAG_SERVER_PORT", &value)?;
        }

        let log_level = read_env("FOAFRAG_LOGGING_LEVEL").or_else(|| read_env("FOAFRAG_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FOAFRAG_LOGGING_FORMAT").or_else(|| read_env("FOAFRAG_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(store_kind) = overrides.store_kind {
            self.store.kind = store_kind;
        }
        if let Some(sparql_endpoint) = overrides.sparql_endpoint {
            self.store.sparql_endpoint = sparql_endpoint;
        }
        if let Some(vector_endpoint) = overrides.vector_endpoint {
            self.store.vector_endpoint = vector_endpoint;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("foafrag.toml"), PathBuf::from("config/foafrag.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    for (field, endpoint) in [
        ("store.sparql_endpoint", &store.sparql_endpoint),
        ("store.vector_endpoint", &store.vector_endpoint),
    ] {
        let trimmed = endpoint.trim();
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{field} must start with http:// or https://"
            )));
        }
    }

    if store.vector_collection.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store.vector_collection must not be empty".to_string(),
        ));
    }

    if store.retrieval_top_k == 0 || store.retrieval_top_k > 100 {
        return Err(ConfigError::Validation(
            "store.retrieval_top_k must be in range 1..=100".to_string(),
        ));
    }

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_retries > 10 {
        return Err(ConfigError::Validation("llm.max_retries must be at most 10".to_string()));
    }

    if llm.retry_base_delay_secs == 0 {
        return Err(ConfigError::Validation(
            "llm.retry_base_delay_secs must be greater than zero".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Gemini => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/gemini providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    kind: Option<StoreKind>,
    sparql_endpoint: Option<String>,
    vector_endpoint: Option<String>,
    vector_collection: Option<String>,
    retrieval_top_k: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn options_with_path(path: PathBuf) -> LoadOptions {
        LoadOptions { config_path: Some(path), require_file: true, ..LoadOptions::default() }
    }

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().expect("default config should be valid");
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "[store]\nkind = \"vector\"\nretrieval_top_k = 5\n\n[llm]\nmodel = \"gemini-2.0-flash\"\nprovider = \"ollama\"\n"
        )
        .expect("write config");

        let config = AppConfig::load(options_with_path(file.path().to_path_buf()))
            .expect("config should load");

        assert_eq!(config.store.kind, StoreKind::Vector);
        assert_eq!(config.store.retrieval_top_k, 5);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        // Untouched sections keep their defaults.
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(options_with_path(PathBuf::from("/nonexistent/foafrag.toml")));
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn endpoint_must_be_http() {
        let mut config = AppConfig::default();
        config.store.sparql_endpoint = "ftp://example.org/foaf".to_string();
        let error = config.validate().expect_err("should reject non-http endpoint");
        assert!(error.to_string().contains("sparql_endpoint"));
    }

    #[test]
    fn api_key_required_for_hosted_providers() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::Gemini;
        config.llm.api_key = None;
        let error = config.validate().expect_err("should require api key");
        assert!(error.to_string().contains("llm.api_key"));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                store_kind: Some(StoreKind::Vector),
                llm_model: Some("llama3.2".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load");

        assert_eq!(config.store.kind, StoreKind::Vector);
        assert_eq!(config.llm.model, "llama3.2");
    }

    #[test]
    fn derived_sparql_endpoints_strip_trailing_slash() {
        let mut config = AppConfig::default();
        config.store.sparql_endpoint = "http://localhost:3030/foaf/".to_string();
        assert_eq!(config.sparql_query_endpoint(), "http://localhost:3030/foaf/query");
        assert_eq!(config.sparql_update_endpoint(), "http://localhost:3030/foaf/update");
    }

    #[test]
    fn interpolation_reports_unterminated_expression() {
        let error = interpolate_env_vars("endpoint = \"${FOAFRAG_UNTERMINATED").unwrap_err();
        assert!(matches!(error, ConfigError::UnterminatedInterpolation));
    }

    #[test]
    fn store_kind_parses_case_insensitively() {
        assert_eq!("Graph".parse::<StoreKind>().expect("parse"), StoreKind::Graph);
        assert_eq!(" VECTOR ".parse::<StoreKind>().expect("parse"), StoreKind::Vector);
        assert!("triple".parse::<StoreKind>().is_err());
    }
}
