//! Service configuration.
//!
//! Loaded once at start-up from an optional TOML file followed by
//! `MEDTRIAGE_`-prefixed environment variables (nested keys use `__`,
//! e.g. `MEDTRIAGE_LLM__MODEL`). The resulting `AppConfig` is passed
//! by reference into every component constructor.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Application-level constants
pub const APP_NAME: &str = "Medtriage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "MEDTRIAGE";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_VAR: &str = "MEDTRIAGE_CONFIG";

/// Config file read when `MEDTRIAGE_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "medtriage.toml";

/// Apply the nearest `.env` file. A missing file is normal outside
/// development; a malformed one is handed back for reporting once logging
/// is initialised.
pub fn load_env_file() -> Option<dotenvy::Error> {
    malformed_env_file(dotenvy::dotenv().map(|_| ()))
}

fn malformed_env_file(result: Result<(), dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Some(e),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tables: TableNames,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "AppSection::default_name")]
    pub name: String,
    #[serde(default = "AppSection::default_environment")]
    pub environment: String,
    #[serde(default = "AppSection::default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. `:memory:` keeps everything in process.
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: String,
}

/// Logical table names inside the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableNames {
    #[serde(default = "TableNames::default_patients")]
    pub patients: String,
    #[serde(default = "TableNames::default_consultations")]
    pub consultations: String,
    #[serde(default = "TableNames::default_triage")]
    pub triage: String,
}

/// Remote model endpoint and generation parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "LlmConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "LlmConfig::default_model")]
    pub model: String,
    /// Low by default for classification.
    #[serde(default = "LlmConfig::default_temperature")]
    pub temperature: f32,
    #[serde(default = "LlmConfig::default_top_p")]
    pub top_p: f32,
    #[serde(default = "LlmConfig::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "LlmConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load from `MEDTRIAGE_CONFIG` (or `medtriage.toml`) plus environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        Self::load_from(Path::new(&path))
    }

    /// Load from an explicit file path (missing file is allowed) plus environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults and environment");
        }

        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        let config: Self = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;
        if llm.base_url.trim().is_empty() {
            return Err(invalid("llm.base_url", "must not be empty"));
        }
        if llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(invalid("llm.temperature", format!("{} outside [0, 2]", llm.temperature)));
        }
        if !(llm.top_p > 0.0 && llm.top_p <= 1.0) {
            return Err(invalid("llm.top_p", format!("{} outside (0, 1]", llm.top_p)));
        }
        if llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens", "must be positive"));
        }
        if llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be positive"));
        }
        if self.database.path.trim().is_empty() {
            return Err(invalid("database.path", "must not be empty"));
        }
        Ok(())
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> String {
        let level = &self.app.log_level;
        format!("medtriage={level},medtriage_lib={level},tower_http=info")
    }

    /// `host:port` the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl AppSection {
    fn default_name() -> String {
        "Medtriage Triage Service".into()
    }
    fn default_environment() -> String {
        "development".into()
    }
    fn default_log_level() -> String {
        "info".into()
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            environment: Self::default_environment(),
            log_level: Self::default_log_level(),
        }
    }
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".into()
    }
    fn default_port() -> u16 {
        8000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl DatabaseConfig {
    fn default_path() -> String {
        "medtriage.db".into()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl TableNames {
    fn default_patients() -> String {
        "triage-patients".into()
    }
    fn default_consultations() -> String {
        "triage-consultations".into()
    }
    fn default_triage() -> String {
        "triage-results".into()
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            patients: Self::default_patients(),
            consultations: Self::default_consultations(),
            triage: Self::default_triage(),
        }
    }
}

impl LlmConfig {
    fn default_base_url() -> String {
        "http://localhost:11434".into()
    }
    fn default_model() -> String {
        "medgemma:latest".into()
    }
    fn default_temperature() -> f32 {
        0.3
    }
    fn default_top_p() -> f32 {
        0.9
    }
    fn default_max_tokens() -> u32 {
        2048
    }
    fn default_timeout_secs() -> u64 {
        120
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            top_p: Self::default_top_p(),
            max_tokens: Self::default_max_tokens(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert!((config.llm.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.llm.max_tokens, 2048);
    }

    #[test]
    fn absent_env_file_is_not_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let result = dotenvy::from_path(tmp.path().join(".env"));
        assert!(malformed_env_file(result).is_none());
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "not a valid line\n").unwrap();
        assert!(malformed_env_file(dotenvy::from_path(&path)).is_some());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.tables, TableNames::default());
        assert_eq!(config.database.path, "medtriage.db");
    }

    #[test]
    fn file_values_override_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("medtriage.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[tables]\ntriage = \"custom-triage\"\n\n[llm]\ntimeout_secs = 30"
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.tables.triage, "custom-triage");
        assert_eq!(config.tables.patients, "triage-patients");
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        std::env::set_var("MEDTRIAGE_LLM__MODEL", "llama3.1:8b");
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        std::env::remove_var("MEDTRIAGE_LLM__MODEL");
        assert_eq!(config.llm.model, "llama3.1:8b");
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[llm]\ntemperature = 3.5\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "llm.temperature", .. }));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_filter_uses_configured_level() {
        let mut config = AppConfig::default();
        config.app.log_level = "debug".into();
        assert!(config.default_log_filter().contains("medtriage_lib=debug"));
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        assert_eq!(AppConfig::default().bind_addr(), "0.0.0.0:8000");
    }
}
