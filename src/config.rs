use anyhow::{Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const OMDB_KEY_VAR: &str = "OMDB_API_KEY";
pub const YOUTUBE_KEY_VAR: &str = "YOUTUBE_API_KEY";

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub favorites_sort: Option<String>,
  pub omdb_api_key: Option<String>,
  pub youtube_api_key: Option<String>,
}

/// API keys after applying environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeys {
  pub omdb: String,
  pub youtube: Option<String>,
}

fn config_file() -> Option<PathBuf> {
  ProjectDirs::from("", "", "flick").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
  pub fn load() -> Self {
    if let Some(path) = config_file()
      && let Ok(content) = std::fs::read_to_string(&path)
    {
      match toml::from_str(&content) {
        Ok(config) => return config,
        Err(e) => warn!(path = %path.display(), err = %e, "config: ignoring malformed file"),
      }
    }
    Self::default()
  }

  /// Persist preferences. Failures are logged; the app keeps running with
  /// the in-memory values.
  pub fn save(&self) {
    let Some(path) = config_file() else { return };
    if let Some(dir) = path.parent()
      && let Err(e) = std::fs::create_dir_all(dir)
    {
      warn!(err = %e, "config: failed to create config dir");
      return;
    }
    match toml::to_string(self) {
      Ok(content) => {
        if let Err(e) = std::fs::write(&path, content) {
          warn!(path = %path.display(), err = %e, "config: failed to write");
        }
      }
      Err(e) => warn!(err = %e, "config: failed to serialize"),
    }
  }

  /// Resolve API keys, preferring the environment over the config file.
  pub fn api_keys(&self) -> Result<ApiKeys> {
    self.api_keys_with(|name| std::env::var(name).ok())
  }

  fn api_keys_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<ApiKeys> {
    let omdb = non_empty(env(OMDB_KEY_VAR)).or_else(|| non_empty(self.omdb_api_key.clone()));
    let youtube = non_empty(env(YOUTUBE_KEY_VAR)).or_else(|| non_empty(self.youtube_api_key.clone()));
    let Some(omdb) = omdb else {
      let location = config_file().map(|p| p.display().to_string()).unwrap_or_else(|| "config.toml".to_string());
      bail!("No OMDb API key configured. Set {} or add omdb_api_key to {}.", OMDB_KEY_VAR, location);
    };
    Ok(ApiKeys { omdb, youtube })
  }
}
