//! Configuration loader for Palaver.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`PalaverConfig`]. Falls back to sensible defaults when the file is
//! missing or malformed. The encryption key rides in a
//! [`secrecy::SecretString`] so it is never Debug-printed or logged.

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::sqlite::pool::default_database_url;

/// Top-level configuration for the session store.
///
/// All fields have defaults; an absent `encryption_key` means the codec runs
/// keyless (fail-closed sentinel writes, see the crypto module).
#[derive(Debug, Deserialize)]
pub struct PalaverConfig {
    /// SQLite URL for the session database.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Base64-encoded 32-byte key for history encryption at rest.
    #[serde(default)]
    pub encryption_key: Option<SecretString>,

    /// User id that is always allowed through the access policy.
    #[serde(default)]
    pub owner_id: i64,

    /// Whether users other than the owner are allowed through.
    #[serde(default)]
    pub open_access: bool,
}

impl Default for PalaverConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            encryption_key: None,
            owner_id: 0,
            open_access: false,
        }
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`PalaverConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> PalaverConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return PalaverConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return PalaverConfig::default();
        }
    };

    match toml::from_str::<PalaverConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            PalaverConfig::default()
        }
    }
}
