use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classify::Routes;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Origin the gateway intercepts, e.g. "https://app.example.com".
  /// Requests to any other origin pass through untouched.
  pub origin: String,
  /// Cache bucket version. Changing it is the only way to invalidate
  /// everything previously stored.
  pub cache_version: String,
  /// Path of the app shell served when navigations cannot reach
  /// network or cache
  #[serde(default = "default_offline_shell")]
  pub offline_shell: String,
  /// Paths fetched once at install to pre-populate the bucket
  #[serde(default)]
  pub precache: Vec<String>,
  /// Bound on how long a network fetch may run before the cache wins
  #[serde(default = "default_network_timeout_ms")]
  pub network_timeout_ms: u64,
  #[serde(default)]
  pub routes: Routes,
  /// Override for the cache database location
  pub cache_path: Option<PathBuf>,
}

fn default_offline_shell() -> String {
  "/index.html".to_string()
}

fn default_network_timeout_ms() -> u64 {
  5000
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./offgate.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/offgate/config.yaml
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
        "No configuration file found. Create one at ~/.config/offgate/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("offgate.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("offgate").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_defaults() {
    let config: Config = serde_yaml::from_str(
      "origin: https://app.test\n\
       cache_version: v1\n",
    )
    .unwrap();

    assert_eq!(config.offline_shell, "/index.html");
    assert_eq!(config.network_timeout_ms, 5000);
    assert!(config.precache.is_empty());
    assert_eq!(config.routes.api_prefix, "/api/");
  }

  #[test]
  fn test_full_config() {
    let config: Config = serde_yaml::from_str(
      "origin: https://app.test\n\
       cache_version: v7\n\
       offline_shell: /shell.html\n\
       network_timeout_ms: 1500\n\
       precache:\n\
         - /index.html\n\
         - /assets/app.js\n\
       routes:\n  \
       api_prefix: /v2/api/\n  \
       static_extensions: [JS, css]\n",
    )
    .unwrap();

    assert_eq!(config.cache_version, "v7");
    assert_eq!(config.network_timeout_ms, 1500);
    assert_eq!(config.precache.len(), 2);
    assert_eq!(config.routes.api_prefix, "/v2/api/");
    // Extensions are lowercased on load
    assert!(config.routes.static_extensions.contains("js"));
  }
}
