//! # fb-config
//!
//! Layered runtime configuration: built-in defaults, then an optional
//! `flatboard.toml`, then `FLATBOARD_*` environment variables (a `.env`
//! file is loaded into the environment first).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "FLATBOARD";
const CONFIG_FILE: &str = "flatboard";
const DOTENV_FILE: &str = ".env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read {path}: {source}")]
    DotEnv {
        path: PathBuf,
        source: dotenvy::Error,
    },
}

/// Loads `./.env` into the process environment without overriding variables
/// that are already set. Returns the path that was read, `None` if there is
/// no such file. Nothing is logged here; the caller reports the outcome once
/// logging is up.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    load_dotenv_from(Path::new(DOTENV_FILE))
}

pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(source) => Err(ConfigError::DotEnv {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Root of the flat-file store (threads/, locks/, counter.txt)
    pub data_dir: PathBuf,
    pub site_name: String,
    /// Number of summaries shown on the index page
    pub threads_per_page: usize,
    /// Minimum seconds between two posts from the same origin
    pub post_cooldown_secs: u64,
    /// Upper bound on waiting for a record or counter lock
    pub lock_timeout_ms: u64,
    /// Shown when a poster leaves the name field empty
    pub default_author: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Loads the optional config file and the process environment.
    /// Call `load_dotenv` first for `.env` values to take part.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env_source(None));
        Self::finish(builder)
    }

    /// Builds settings from defaults plus an explicit variable map instead of
    /// the process environment.
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let builder = defaults()?.add_source(env_source(Some(vars)));
        Self::finish(builder)
    }

    fn finish(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.threads_per_page == 0 {
            return Err(ConfigError::Invalid(
                "threads_per_page must be at least 1".into(),
            ));
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "lock_timeout_ms must be at least 1".into(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must be set".into()));
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn post_cooldown(&self) -> Duration {
        Duration::from_secs(self.post_cooldown_secs)
    }
}

fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("host", "127.0.0.1")?
        .set_default("port", 8080_i64)?
        .set_default("data_dir", "./data")?
        .set_default("site_name", "Flatboard")?
        .set_default("threads_per_page", 50_i64)?
        .set_default("post_cooldown_secs", 10_i64)?
        .set_default("lock_timeout_ms", 10_000_i64)?
        .set_default("default_author", "Anonymous")?
        .set_default("log_format", "pretty")?)
}

fn env_source(vars: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .source(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::from_env_map(HashMap::new()).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.data_dir, PathBuf::from("./data"));
        assert_eq!(settings.threads_per_page, 50);
        assert_eq!(settings.post_cooldown(), Duration::from_secs(10));
        assert_eq!(settings.lock_timeout(), Duration::from_secs(10));
        assert_eq!(settings.default_author, "Anonymous");
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_env_map(vars(&[
            ("FLATBOARD_PORT", "9090"),
            ("FLATBOARD_DATA_DIR", "/srv/forum"),
            ("FLATBOARD_THREADS_PER_PAGE", "20"),
            ("FLATBOARD_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/forum"));
        assert_eq!(settings.threads_per_page, 20);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_dotenv_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dotenv_from(&dir.path().join(".env")).unwrap().is_none());
    }

    #[test]
    fn dotenv_values_reach_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "FLATBOARD_DOTENV_TEST_MARKER=loaded\n").unwrap();

        assert_eq!(load_dotenv_from(&path).unwrap(), Some(path.clone()));
        assert_eq!(
            std::env::var("FLATBOARD_DOTENV_TEST_MARKER").as_deref(),
            Ok("loaded")
        );
    }

    #[test]
    fn unreadable_dotenv_is_returned_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "this line is not an assignment\n").unwrap();

        let err = load_dotenv_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DotEnv { .. }));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = Settings::from_env_map(vars(&[("FLATBOARD_THREADS_PER_PAGE", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
