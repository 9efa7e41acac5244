//! Runtime configuration, layered from `config.toml` and `TUTR_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Duration;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  pub token_ttl_hours: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            3000,
      store_path:      PathBuf::from("tutr.db"),
      token_ttl_hours: 24 * 7,
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then let the environment override it.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TUTR"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn token_ttl(&self) -> anyhow::Result<Duration> {
    Duration::try_hours(self.token_ttl_hours)
      .filter(|ttl| *ttl > Duration::zero())
      .with_context(|| format!("token_ttl_hours out of range: {}", self.token_ttl_hours))
  }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
