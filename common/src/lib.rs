/*!
common/src/lib.rs

Shared configuration types and helpers for Rupandehi Sandesh.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default and an override config file
- Re-exports of the article model, the local key/value store, the theme flag
  and the date/clock formatting helpers shared by the admin and public sides
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod article;
pub mod format;
pub mod store;
pub mod theme;

pub use article::{Article, ArticleForm, Category, PLACEHOLDER_IMAGE};
pub use store::LocalStore;
pub use theme::Theme;

/// Site identity section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Image used when an article has none, and as the `onerror` fallback
    #[serde(default = "default_placeholder")]
    pub placeholder_image: String,
    /// Theme used when the local store holds no theme flag yet
    #[serde(default)]
    pub preferred_theme: Theme,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            placeholder_image: default_placeholder(),
            preferred_theme: Theme::default(),
        }
    }
}

/// Where the published `news-data.json` lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Either an http(s) URL or a filesystem path
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Local persistence: the key/value store and the exported JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_local_store")]
    pub local_store_path: String,
    #[serde(default = "default_export_path")]
    pub export_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_store_path: default_local_store(),
            export_path: default_export_path(),
        }
    }
}

/// Auto refresh of the public page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
        }
    }
}

/// Rendered page output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_site_name() -> String {
    "Rupandehi Sandesh".to_string()
}

fn default_placeholder() -> String {
    PLACEHOLDER_IMAGE.to_string()
}

fn default_source_url() -> String {
    "news-data.json".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_local_store() -> String {
    "data/local-storage.json".to_string()
}

fn default_export_path() -> String {
    "news-data.json".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_output_dir() -> String {
    "public".to_string()
}

/// Top-level application configuration (deserialized from config.toml).
/// Every section is optional so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
