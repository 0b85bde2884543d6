use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "db.sqlite";

pub const DEFAULT_API_PORT: u16 = 6001;

/// On-disk configuration, stored at `<stacks_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_port: u16,
    /// bearer token required for force-return operations
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub admin_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            admin_token: None,
        }
    }
}

/// Resolved application state: the config directory and everything
/// derived from it.
#[derive(Debug, Clone)]
pub struct AppState {
    pub stacks_dir: PathBuf,
    pub db_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    fn dir_or_default(config_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match config_path {
            Some(path) => Ok(path),
            None => dirs::home_dir()
                .map(|home| home.join(".stacks"))
                .ok_or(StateError::NoHomeDir),
        }
    }

    /// Load state from an initialized config directory.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, StateError> {
        let stacks_dir = Self::dir_or_default(config_path)?;
        let config_file = stacks_dir.join(CONFIG_FILE);
        if !config_file.exists() {
            return Err(StateError::NotInitialized(stacks_dir));
        }

        let raw = std::fs::read_to_string(&config_file)?;
        let config: AppConfig = toml::from_str(&raw)?;

        Ok(Self {
            db_path: stacks_dir.join(DB_FILE),
            stacks_dir,
            config,
        })
    }

    /// Create the config directory with defaults. Refuses to clobber an
    /// existing configuration.
    pub fn init(config_path: Option<PathBuf>) -> Result<Self, StateError> {
        let stacks_dir = Self::dir_or_default(config_path)?;
        let config_file = stacks_dir.join(CONFIG_FILE);
        if config_file.exists() {
            return Err(StateError::AlreadyInitialized(stacks_dir));
        }

        std::fs::create_dir_all(&stacks_dir)?;
        let config = AppConfig::default();
        write_config(&config_file, &config)?;

        Ok(Self {
            db_path: stacks_dir.join(DB_FILE),
            stacks_dir,
            config,
        })
    }

    pub fn save(&self) -> Result<(), StateError> {
        write_config(&self.stacks_dir.join(CONFIG_FILE), &self.config)
    }
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), StateError> {
    let raw = toml::to_string_pretty(config)?;
    std::fs::write(path, raw)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine a home directory; pass --config-path")]
    NoHomeDir,

    #[error("config directory {0} is not initialized; run `stacks init`")]
    NotInitialized(PathBuf),

    #[error("config directory {0} is already initialized")]
    AlreadyInitialized(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("could not serialize config file: {0}")]
    SerializeConfig(#[from] toml::ser::Error),
}
