//! Configuration
//!
//! `ClientConfig` carries the limits the library enforces. `Settings` is the
//! CLI/environment surface, parsed with clap.

use clap::Args;
use std::path::PathBuf;

use crate::ids::MIN_CLIENT_ID_LEN;

/// Default asset-host limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Limits enforced client-side
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Largest image file accepted before any upload starts
    pub max_upload_bytes: u64,
    /// Length of placeholder ids (never below 21)
    pub temp_id_len: usize,
    pub max_note_len: usize,
    pub max_name_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            temp_id_len: MIN_CLIENT_ID_LEN,
            max_note_len: 100,
            max_name_len: 100,
        }
    }
}

/// Global CLI options, each with an environment fallback
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Signed-in user id; mutations are refused without one
    #[arg(long, env = "HOBB_USER", global = true)]
    pub user: Option<String>,

    /// Local data directory (database, assets, logs)
    #[arg(long, env = "HOBB_DATA_DIR", default_value = "hobb-data", global = true)]
    pub data_dir: PathBuf,

    /// Remote REST API base URL; local storage is used when unset
    #[arg(long, env = "HOBB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Remote asset host upload endpoint (required with --api-url)
    #[arg(long, env = "HOBB_UPLOAD_URL", global = true)]
    pub upload_url: Option<String>,

    /// Unsigned upload preset for the asset host
    #[arg(long, env = "HOBB_UPLOAD_PRESET", global = true)]
    pub upload_preset: Option<String>,

    /// Public base URL for locally stored assets
    #[arg(long, env = "HOBB_PUBLIC_ASSET_BASE", global = true)]
    pub public_asset_base: Option<String>,

    /// Largest image upload in bytes
    #[arg(long, env = "HOBB_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES, global = true)]
    pub max_upload_bytes: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HOBB_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Log directory (defaults to <data-dir>/logs)
    #[arg(long, env = "HOBB_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            max_upload_bytes: self.max_upload_bytes,
            ..ClientConfig::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("logs"))
    }
}
