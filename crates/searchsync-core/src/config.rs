//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g.
//! `APP_SEARCH__HOST`). Typed sections are extracted with [`Config::settings`].
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::batcher::DocumentBatcher;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment; defaults are merged underneath it.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(figment);
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("Failed to extract settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> Result<()> {
        let settings = self.settings()?;
        match env {
            "prod" | "production" => {
                if settings.search.connection().is_none() && settings.search.local_index_dir.is_none() {
                    return Err(Error::InvalidConfig(
                        "Prod config has no search engine: set search.host and search.api_key".to_string(),
                    ));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub pagination: PaginationSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.search.batch_size == 0 {
            return Err(Error::InvalidConfig("search.batch_size must be positive".to_string()));
        }
        if self.search.retry_limit == 0 {
            return Err(Error::InvalidConfig("search.retry_limit must be positive".to_string()));
        }
        if self.pagination.page_size == 0 {
            return Err(Error::InvalidConfig("pagination.page_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub local_index_dir: Option<String>,
    pub batch_size: usize,
    pub retry_limit: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            host: None,
            api_key: None,
            local_index_dir: None,
            batch_size: DocumentBatcher::DEFAULT_BATCH_SIZE,
            retry_limit: 5,
            retry_base_delay_ms: 5000,
        }
    }
}

/// Host and key of a live search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConnection {
    pub host: String,
    pub api_key: String,
}

impl SearchSettings {
    /// Both `host` and `api_key` must be set and non-empty for live mode.
    pub fn connection(&self) -> Option<EngineConnection> {
        let host = self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        let api_key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        Some(EngineConnection { host: host.trim_end_matches('/').to_string(), api_key: api_key.to_string() })
    }

    pub fn local_index_path(&self) -> Option<PathBuf> {
        self.local_index_dir.as_deref().filter(|d| !d.is_empty()).map(expand_path)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub page_size: usize,
    pub no_results_grace_ms: u64,
    pub fetch_timeout_ms: Option<u64>,
    pub max_seek_pages: Option<usize>,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self { page_size: 100, no_results_grace_ms: 150, fetch_timeout_ms: None, max_seek_pages: None }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
