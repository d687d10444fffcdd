use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QuizrecConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub recommend: RecommendConfig,
    pub quiz_api: QuizApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecommendConfig {
    /// Maximum number of answer records read per scope when building the
    /// preference vector. A pagination control, not a correctness mechanism.
    pub history_window: usize,
    /// Maximum number of stored questions considered as candidates per request.
    pub candidate_cap: usize,
    /// Default number of recommendations when the caller gives no limit.
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QuizApiConfig {
    pub url: String,
    pub api_key: String,
    /// Number of questions requested per batch.
    pub batch_size: usize,
}

impl Default for QuizrecConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            recommend: RecommendConfig::default(),
            quiz_api: QuizApiConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_quizrec_dir()
            .join("quiz.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_quizrec_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "bge-small-en-v1.5".into(),
            cache_dir,
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            history_window: 1000,
            candidate_cap: 1000,
            default_limit: 10,
        }
    }
}

impl Default for QuizApiConfig {
    fn default() -> Self {
        Self {
            url: "https://quizapi.io/api/v1/questions".into(),
            api_key: String::new(),
            batch_size: 10,
        }
    }
}

/// Returns `~/.quizrec/`
pub fn default_quizrec_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".quizrec")
}

/// Returns the default config file path: `~/.quizrec/config.toml`
pub fn default_config_path() -> PathBuf {
    default_quizrec_dir().join("config.toml")
}

impl QuizrecConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            QuizrecConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (QUIZREC_DB, QUIZREC_LOG_LEVEL, QUIZ_API_URL, QUIZ_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("QUIZREC_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("QUIZREC_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("QUIZ_API_URL") {
            self.quiz_api.url = val;
        }
        if let Ok(val) = std::env::var("QUIZ_API_KEY") {
            self.quiz_api.api_key = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = QuizrecConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.recommend.history_window, 1000);
        assert_eq!(config.recommend.default_limit, 10);
        assert!(config.storage.db_path.ends_with("quiz.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 9090
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[recommend]
default_limit = 5

[quiz_api]
api_key = "abc123"
"#;
        let config: QuizrecConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.recommend.default_limit, 5);
        assert_eq!(config.quiz_api.api_key, "abc123");
        // defaults still apply for unset fields
        assert_eq!(config.recommend.history_window, 1000);
        assert_eq!(config.quiz_api.batch_size, 10);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = QuizrecConfig::default();
        std::env::set_var("QUIZREC_DB", "/tmp/override.db");
        std::env::set_var("QUIZREC_LOG_LEVEL", "trace");
        std::env::set_var("QUIZ_API_KEY", "env-key");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.quiz_api.api_key, "env-key");

        // Clean up
        std::env::remove_var("QUIZREC_DB");
        std::env::remove_var("QUIZREC_LOG_LEVEL");
        std::env::remove_var("QUIZ_API_KEY");
    }
}
