use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::constants::constants;

pub const BACKEND_URL_ENV: &str = "REEL_BACKEND_URL";
pub const API_KEY_ENV: &str = "REEL_API_KEY";

/// Persisted preferences (`prefs.toml`).
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub backend_url: Option<String>,
  pub api_key: Option<String>,
}

/// Where to reach the hosted backend, after env and CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
  pub url: String,
  pub api_key: String,
}

fn config_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", &constants().app_name).map(|dirs| dirs.config_dir().join(&constants().prefs_file))
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
  pub fn load() -> Self {
    config_path().map(|path| Self::load_from(&path)).unwrap_or_default()
  }

  pub fn load_from(path: &Path) -> Self {
    if let Ok(content) = std::fs::read_to_string(path) {
      match toml::from_str(&content) {
        Ok(config) => return config,
        Err(e) => warn!(err = %e, path = %path.display(), "config: ignoring unreadable prefs"),
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(path) = config_path()
      && let Err(e) = self.save_to(&path)
    {
      warn!(err = %e, "config: failed to save prefs");
    }
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize prefs")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
  }

  /// Resolve backend settings. Precedence: CLI flag, then environment, then `prefs.toml`.
  pub fn backend_settings(&self, cli_url: Option<String>, cli_key: Option<String>) -> Result<BackendSettings> {
    self.resolve_backend(cli_url, cli_key, |name| std::env::var(name).ok())
  }

  fn resolve_backend(
    &self,
    cli_url: Option<String>,
    cli_key: Option<String>,
    env: impl Fn(&str) -> Option<String>,
  ) -> Result<BackendSettings> {
    let url = non_empty(cli_url).or_else(|| non_empty(env(BACKEND_URL_ENV))).or_else(|| non_empty(self.backend_url.clone()));
    let api_key = non_empty(cli_key).or_else(|| non_empty(env(API_KEY_ENV))).or_else(|| non_empty(self.api_key.clone()));
    let Some(url) = url else {
      bail!("No backend configured: pass --backend-url, set {} or add backend_url to prefs.toml", BACKEND_URL_ENV)
    };
    if !url.starts_with("http://") && !url.starts_with("https://") {
      bail!("Backend URL must start with http:// or https:// (got '{}')", url);
    }
    let Some(api_key) = api_key else {
      bail!("No API key configured: pass --api-key, set {} or add api_key to prefs.toml", API_KEY_ENV)
    };
    Ok(BackendSettings { url, api_key })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn prefs_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reel").join("prefs.toml");
    let config = Config { theme_name: Some("Dusk".into()), backend_url: Some("https://x.co".into()), api_key: None };
    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path), config);
  }

  #[test]
  fn missing_or_broken_prefs_give_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load_from(&dir.path().join("absent.toml")), Config::default());
    let broken = dir.path().join("prefs.toml");
    std::fs::write(&broken, "theme_name = [").unwrap();
    assert_eq!(Config::load_from(&broken), Config::default());
  }

  #[test]
  fn cli_overrides_env_overrides_file() {
    let config = Config { theme_name: None, backend_url: Some("https://file.co".into()), api_key: Some("file".into()) };
    let env = |name: &str| match name {
      BACKEND_URL_ENV => Some("https://env.co".to_string()),
      _ => None,
    };

    let from_env = config.resolve_backend(None, None, env).unwrap();
    assert_eq!(from_env, BackendSettings { url: "https://env.co".into(), api_key: "file".into() });

    let from_cli = config.resolve_backend(Some("https://cli.co".into()), Some("cli".into()), env).unwrap();
    assert_eq!(from_cli, BackendSettings { url: "https://cli.co".into(), api_key: "cli".into() });
  }

  #[test]
  fn backend_settings_require_url_and_key() {
    let empty = Config::default();
    let err = empty.resolve_backend(None, None, no_env).unwrap_err();
    assert!(err.to_string().contains("No backend configured"));

    let err = empty.resolve_backend(Some("ftp://x".into()), Some("k".into()), no_env).unwrap_err();
    assert!(err.to_string().contains("http://"));

    let err = empty.resolve_backend(Some("https://x.co".into()), Some("  ".into()), no_env).unwrap_err();
    assert!(err.to_string().contains("No API key"));
  }
}
