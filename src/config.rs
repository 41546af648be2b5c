//! Configuration management for dune-export.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for a catalog of named queries and Dune API settings.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Public Dune API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.dune.com/api/v1";

/// Main configuration structure for dune-export.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dune API settings.
    #[serde(default)]
    pub dune: DuneSettings,

    /// Named queries, merged over the built-in catalog.
    #[serde(default)]
    pub queries: BTreeMap<String, QueryConfig>,
}

/// Dune API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuneSettings {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Overall polling timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between status polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Timeout of a single HTTP request in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for DuneSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DuneSettings {
    /// Applies `DUNE_API_URL` over the configured base URL.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DUNE_API_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }

    /// Checks that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ExportError::config(format!("Invalid Dune base URL: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ExportError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(ExportError::config("poll_interval_secs must be at least 1"));
        }

        Ok(())
    }
}

/// A named Dune query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryConfig {
    /// Dune query id.
    pub id: u64,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Target table for the flat INSERT script when `--table` is not given.
    #[serde(default)]
    pub table: Option<String>,
}

impl QueryConfig {
    fn builtin(id: u64, name: &str, table: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            table: Some(table.to_string()),
        }
    }
}

/// The queries the tool knows about without a config file.
pub fn builtin_queries() -> BTreeMap<String, QueryConfig> {
    BTreeMap::from([
        (
            "collateral".to_string(),
            QueryConfig::builtin(
                5963629,
                "World Morpho Collateral History",
                "morpho_collateral_history",
            ),
        ),
        (
            "borrow".to_string(),
            QueryConfig::builtin(5963670, "World Morpho Borrow History", "morpho_borrow_history"),
        ),
        (
            "dex-volume".to_string(),
            QueryConfig::builtin(5963703, "World DEX Volume History", "dex_volume_history"),
        ),
        (
            "earn".to_string(),
            QueryConfig::builtin(5963349, "World Morpho Earn History", "morpho_earn_history"),
        ),
    ])
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dune-export")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ExportError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Values are checked by [`DuneSettings::validate`] once env overrides
    /// have been applied.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ExportError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Built-in queries with the configured ones layered on top.
    pub fn catalog(&self) -> BTreeMap<String, QueryConfig> {
        let mut catalog = builtin_queries();
        catalog.extend(self.queries.clone());
        catalog
    }

    /// Resolves a query by catalog key or numeric id.
    ///
    /// A numeric id that is not in the catalog resolves to an anonymous query.
    pub fn resolve_query(&self, selector: &str) -> Result<QueryConfig> {
        let catalog = self.catalog();

        if let Some(query) = catalog.get(selector) {
            return Ok(query.clone());
        }

        if let Ok(id) = selector.parse::<u64>() {
            return Ok(catalog
                .into_values()
                .find(|q| q.id == id)
                .unwrap_or(QueryConfig {
                    id,
                    name: format!("Query {id}"),
                    table: None,
                }));
        }

        let known: Vec<_> = catalog.keys().map(String::as_str).collect();
        Err(ExportError::config(format!(
            "Unknown query '{}'. Use a query id or one of: {}",
            selector,
            known.join(", ")
        )))
    }
}
