//! Configuration loading and root folder resolution
//!
//! The service is configured once at startup; the resulting
//! [`ServiceConfig`] is passed by reference into the pipeline and the
//! router rather than living in ambient global state.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default maximum accepted upload size (16 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default upload extensions accepted by the pipeline
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "dcm"];

/// Default bind address for the HTTP server
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";

/// Default inference endpoint for the external tumor classifier
pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:5731/classify";

/// Startup overrides, typically populated from command-line arguments.
/// `None` fields fall through to environment / config file / defaults.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub classifier_url: Option<String>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root folder holding the database and the upload directory
    pub root_folder: PathBuf,
    /// HTTP bind address (host:port)
    pub bind_address: String,
    /// Directory where uploaded images are staged during analysis
    pub upload_dir: PathBuf,
    /// Lowercase file extensions accepted for upload
    pub allowed_extensions: BTreeSet<String>,
    /// Inference endpoint of the external tumor classifier
    pub classifier_url: String,
    /// Maximum accepted upload payload size in bytes
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Resolve configuration with priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable
    /// 3. TOML config file
    /// 4. Compiled default (fallback)
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = load_config_file().ok();

        let root_folder = overrides
            .root_folder
            .or_else(|| std::env::var("NEUROSCAN_ROOT_FOLDER").ok().map(PathBuf::from))
            .or_else(|| file_str(&file, "root_folder").map(PathBuf::from))
            .unwrap_or_else(default_root_folder);

        let bind_address = overrides
            .bind_address
            .or_else(|| std::env::var("NEUROSCAN_BIND").ok())
            .or_else(|| file_str(&file, "bind_address"))
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let classifier_url = overrides
            .classifier_url
            .or_else(|| std::env::var("NEUROSCAN_CLASSIFIER_URL").ok())
            .or_else(|| file_str(&file, "classifier_url"))
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string());

        let upload_dir = std::env::var("NEUROSCAN_UPLOAD_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| file_str(&file, "upload_dir").map(PathBuf::from))
            .unwrap_or_else(|| root_folder.join("uploads"));

        let allowed_extensions = std::env::var("NEUROSCAN_ALLOWED_EXTENSIONS")
            .ok()
            .map(|raw| parse_extension_list(&raw))
            .or_else(|| file_extension_list(&file))
            .unwrap_or_else(default_allowed_extensions);

        if allowed_extensions.is_empty() {
            return Err(Error::Config(
                "allowed extension list must not be empty".to_string(),
            ));
        }

        let max_upload_bytes = file
            .as_ref()
            .and_then(|v| v.get("max_upload_bytes"))
            .and_then(|v| v.as_integer())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            root_folder,
            bind_address,
            upload_dir,
            allowed_extensions,
            classifier_url,
            max_upload_bytes,
        })
    }

    /// Build a config rooted at an explicit folder with compiled defaults
    /// for everything else. Used by tests and embedded setups.
    pub fn with_root(root_folder: impl Into<PathBuf>) -> Self {
        let root_folder = root_folder.into();
        let upload_dir = root_folder.join("uploads");
        Self {
            root_folder,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            upload_dir,
            allowed_extensions: default_allowed_extensions(),
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Path of the SQLite database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("neuroscan.db")
    }

    /// Create the root folder and upload directory if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(&self.upload_dir)?;
        Ok(())
    }

    /// Check an uploaded filename against the allow-list.
    ///
    /// The filename must contain a `.` and its lowercase suffix must be
    /// one of the configured extensions.
    pub fn extension_allowed(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| self.allowed_extensions.contains(&ext.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

fn default_allowed_extensions() -> BTreeSet<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn parse_extension_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|e| e.trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn file_str(file: &Option<toml::Value>, key: &str) -> Option<String> {
    file.as_ref()
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn file_extension_list(file: &Option<toml::Value>) -> Option<BTreeSet<String>> {
    let list = file
        .as_ref()
        .and_then(|v| v.get("allowed_extensions"))
        .and_then(|v| v.as_array())?;
    Some(
        list.iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_ascii_lowercase())
            .collect(),
    )
}

/// Locate and parse the platform config file (~/.config/neuroscan/config.toml
/// on Linux, the equivalent elsewhere; /etc/neuroscan/config.toml as the
/// system-wide fallback).
fn load_config_file() -> Result<toml::Value> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

fn config_file_path() -> Result<PathBuf> {
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("neuroscan").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    let system_config = Path::new("/etc/neuroscan/config.toml");
    if system_config.exists() {
        return Ok(system_config.to_path_buf());
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("neuroscan"))
        .unwrap_or_else(|| PathBuf::from("./neuroscan_data"))
}
