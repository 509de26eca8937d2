use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_TTL_MINUTES;
use crate::resolve::AliasTable;

pub const DEFAULT_ZENHUB_URL: &str = "https://api.zenhub.com/public/graphql";
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com/graphql";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  pub zenhub: ZenhubConfig,
  /// GitHub access, only needed to resolve branch names to issues
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub github: Option<GithubConfig>,
  #[serde(default)]
  pub aliases: AliasConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
  /// File this configuration was loaded from
  #[serde(skip)]
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenhubConfig {
  #[serde(default = "default_zenhub_url")]
  pub url: String,
  /// Active workspace id
  pub workspace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
  #[serde(default = "default_github_url")]
  pub url: String,
}

/// User-defined shorthands, `alias -> display name`, per entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasConfig {
  #[serde(default)]
  pub pipelines: AliasTable,
  #[serde(default)]
  pub epics: AliasTable,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// One JSON file per namespace and workspace
  #[default]
  File,
  /// A single SQLite database
  Sqlite,
  /// Caching disabled
  None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub backend: CacheBackend,
  /// Lifetime of a cached snapshot, shared by every entity kind
  #[serde(default = "default_ttl_minutes")]
  pub ttl_minutes: i64,
  /// Override for the cache directory (default: $XDG_CACHE_HOME/zh)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackend::default(),
      ttl_minutes: DEFAULT_TTL_MINUTES,
      dir: None,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::minutes(self.ttl_minutes.max(0))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
  /// Filter directive, overridden by ZH_LOG
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write logs to this file instead of stderr
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

fn default_zenhub_url() -> String {
  DEFAULT_ZENHUB_URL.to_string()
}

fn default_github_url() -> String {
  DEFAULT_GITHUB_URL.to_string()
}

fn default_ttl_minutes() -> i64 {
  DEFAULT_TTL_MINUTES
}

fn default_log_level() -> String {
  "warn".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./zh.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/zh/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/zh/config.yaml\n\
                 with at least `zenhub: {{ workspace: <id> }}`."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("zh.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("zh").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let mut config = Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
    config.path = Some(path.to_path_buf());

    Ok(config)
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Write the configuration back to the file it was loaded from.
  ///
  /// The file is replaced atomically so a concurrent reader never sees half of it.
  pub fn save(&self) -> Result<()> {
    let path = self
      .path
      .as_deref()
      .ok_or_else(|| eyre!("Configuration was not loaded from a file"))?;

    let contents =
      serde_yaml::to_string(self).map_err(|e| eyre!("Failed to serialize config: {}", e))?;
    let temp_path = path.with_extension(format!("yaml.{}.tmp", std::process::id()));

    std::fs::write(&temp_path, contents)
      .map_err(|e| eyre!("Failed to write config file {}: {}", temp_path.display(), e))?;
    std::fs::rename(&temp_path, path).map_err(|e| {
      let _ = std::fs::remove_file(&temp_path);
      eyre!("Failed to replace config file {}: {}", path.display(), e)
    })?;

    Ok(())
  }

  /// Get the ZenHub API token from environment variables.
  ///
  /// Checks ZH_API_TOKEN first, then ZENHUB_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("ZH_API_TOKEN")
      .or_else(|_| std::env::var("ZENHUB_API_TOKEN"))
      .map_err(|_| {
        eyre!("ZenHub API token not found. Set ZH_API_TOKEN or ZENHUB_API_TOKEN environment variable.")
      })
  }

  /// Get the GitHub token from environment variables.
  ///
  /// Checks GITHUB_TOKEN first, then GH_TOKEN.
  pub fn get_github_token() -> Result<String> {
    std::env::var("GITHUB_TOKEN")
      .or_else(|_| std::env::var("GH_TOKEN"))
      .map_err(|_| eyre!("GitHub token not found. Set GITHUB_TOKEN or GH_TOKEN environment variable."))
  }
}
