use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Number of stopwatch widgets on the dashboard.
  pub stopwatches: usize,
  /// Initial widget names; missing positions get `Stopwatch {n}`.
  pub names: Vec<String>,
  /// Display refresh interval in milliseconds.
  pub tick_rate_ms: u64,
  /// Directory snapshots are written to (default: home directory).
  pub snapshot_dir: Option<PathBuf>,
  #[serde(default)]
  pub assets: AssetsConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      stopwatches: 3,
      names: Vec::new(),
      tick_rate_ms: 33,
      snapshot_dir: None,
      assets: AssetsConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
  /// Whether the offline asset cache runs at all.
  pub enabled: bool,
  /// Base URL the companion app shell is served from.
  pub base_url: String,
}

impl Default for AssetsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      base_url: "https://watchdeck.app".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./watchdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/watchdeck/config.yaml
  ///
  /// A dashboard must start with zero setup, so no config file at all just
  /// means defaults.
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
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("watchdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("watchdeck").join("config.yaml");
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

  /// Parsed asset base URL.
  pub fn asset_base(&self) -> Result<Url> {
    Url::parse(&self.assets.base_url)
      .map_err(|e| eyre!("Invalid asset base URL {}: {}", self.assets.base_url, e))
  }

  pub fn tick_rate(&self) -> Duration {
    Duration::from_millis(self.tick_rate_ms.max(1))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_document_yields_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.stopwatches, 3);
    assert!(config.assets.enabled);
    assert_eq!(config.assets.base_url, "https://watchdeck.app");
  }

  #[test]
  fn test_partial_overrides() {
    let config: Config = serde_yaml::from_str(
      "stopwatches: 5\nnames: [Laps, Breaks]\nassets:\n  enabled: false\n",
    )
    .unwrap();
    assert_eq!(config.stopwatches, 5);
    assert_eq!(config.names, vec!["Laps", "Breaks"]);
    assert!(!config.assets.enabled);
    assert_eq!(config.tick_rate_ms, 33);
  }

  #[test]
  fn test_tick_rate_never_zero() {
    let config: Config = serde_yaml::from_str("tick_rate_ms: 0").unwrap();
    assert_eq!(config.tick_rate(), Duration::from_millis(1));
  }
}
