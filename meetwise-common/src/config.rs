//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration resolves in priority order:
//! 1. Command-line argument (handled by the binary, passed in as overrides)
//! 2. Environment variable (`MEETWISE_ROOT_FOLDER`, `MEETWISE_PORT`, ...)
//! 3. TOML config file (`~/.config/meetwise/config.toml`, then `/etc/meetwise/config.toml`)
//! 4. OS-dependent compiled default
//!
//! A missing or unreadable TOML file is never fatal: it logs a warning and the
//! compiled defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "meetwise.db";

/// Default HTTP port of meetwise-api
pub const DEFAULT_PORT: u16 = 3000;

/// Compiled-in fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Contents of `config.toml`
///
/// Every field is optional so partial files are accepted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Shared secret for bearer token verification (0 disables auth)
    #[serde(default)]
    pub auth_shared_secret: Option<i64>,
    /// Secret used to verify identity-provider webhooks
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging section of `config.toml`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
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

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from the platform config locations, or defaults when none is usable
    pub fn load_or_default() -> Self {
        let Some(path) = config_file_path() else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Resolves the root folder holding `meetwise.db`
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml: None,
        }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Use an already loaded TOML config instead of reading the platform file
    pub fn with_toml(mut self, toml: TomlConfig) -> Self {
        self.toml = Some(toml);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var("MEETWISE_ROOT_FOLDER") {
            if !path.is_empty() {
                info!("[{}] Root folder from MEETWISE_ROOT_FOLDER: {}", self.module_name, path);
                return PathBuf::from(path);
            }
        }

        let toml_root = match &self.toml {
            Some(config) => config.root_folder.clone(),
            None => TomlConfig::load_or_default().root_folder,
        };
        if let Some(path) = toml_root {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}

/// First existing config file for the platform
fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("meetwise").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/meetwise/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/meetwise
        dirs::data_local_dir()
            .map(|d| d.join("meetwise"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/meetwise"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/meetwise
        dirs::data_dir()
            .map(|d| d.join("meetwise"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/meetwise"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("meetwise"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\meetwise"))
    } else {
        PathBuf::from("./meetwise_data")
    }
}
