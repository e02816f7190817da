//! Runtime configuration parsed from environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Url;

use crate::remote::{DEFAULT_PUBLIC_LIMIT, HttpRemote, RemoteError, RemoteStore};
use crate::session::SessionOptions;
use crate::store::FileStore;

pub const DEFAULT_DATA_DIR: &str = ".colregs";
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 500;
const SNAPSHOT_FILE_NAME: &str = "presets-collection.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the local key-value store.
    pub data_dir: PathBuf,
    /// Presets service base URL. `None` runs offline.
    pub remote_url: Option<String>,
    pub share_base_url: Url,
    pub public_limit: usize,
    pub port: u16,
    /// File the presets service persists its collection to.
    pub server_snapshot: PathBuf,
    pub flush_interval_ms: u64,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `COLREGS_DATA_DIR`: default `.colregs`
    /// - `COLREGS_REMOTE_URL`: presets service; unset or empty runs offline
    /// - `COLREGS_SHARE_BASE_URL`: default `http://localhost:3000/`
    /// - `COLREGS_PUBLIC_LIMIT`: default 50
    /// - `PORT`: default 3000
    /// - `COLREGS_SERVER_SNAPSHOT`: default `<data dir>/presets-collection.json`
    /// - `COLREGS_FLUSH_INTERVAL_MS`: default 500
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric value or the share base URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("COLREGS_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        let remote_url = lookup("COLREGS_REMOTE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty());

        let raw_share = lookup("COLREGS_SHARE_BASE_URL").unwrap_or_else(|| DEFAULT_SHARE_BASE_URL.to_owned());
        let share_base_url = Url::parse(raw_share.trim())
            .map_err(|e| ConfigError::Parse(format!("invalid COLREGS_SHARE_BASE_URL '{raw_share}': {e}")))?;

        let public_limit = parse_or("COLREGS_PUBLIC_LIMIT", lookup("COLREGS_PUBLIC_LIMIT"), DEFAULT_PUBLIC_LIMIT)?;
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let flush_interval_ms =
            parse_or("COLREGS_FLUSH_INTERVAL_MS", lookup("COLREGS_FLUSH_INTERVAL_MS"), DEFAULT_FLUSH_INTERVAL_MS)?;

        let server_snapshot = lookup("COLREGS_SERVER_SNAPSHOT")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| data_dir.join(SNAPSHOT_FILE_NAME), PathBuf::from);

        Ok(Self { data_dir, remote_url, share_base_url, public_limit, port, server_snapshot, flush_interval_ms })
    }

    #[must_use]
    pub fn local_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions { share_base_url: self.share_base_url.clone(), public_limit: self.public_limit }
    }

    /// HTTP client for the configured presets service, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote URL is invalid.
    pub fn remote(&self) -> Result<Option<Arc<dyn RemoteStore>>, RemoteError> {
        let Some(url) = &self.remote_url else {
            return Ok(None);
        };
        let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemote::new(url)?);
        Ok(Some(remote))
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Parse(format!("invalid {key}: {v}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
