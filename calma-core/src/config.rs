use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CoreConfig {
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

impl CoreConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            let default_config = r#"
[storage]
# Where the sqlite database and the legacy namespace live.
# Defaults to the platform data directory under "calma".
# data_dir = "/path/to/calma/data"
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: CoreConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = self.storage.as_ref().and_then(|s| s.data_dir.clone()) {
            return dir;
        }
        if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("calma")
        } else {
            PathBuf::from(".")
        }
    }

    /// Path of the sqlite store.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("calma.db")
    }

    /// Directory holding the flat legacy namespace.
    pub fn legacy_dir(&self) -> PathBuf {
        self.data_dir().join("legacy")
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("calma").join("core.toml")
    } else {
        PathBuf::from("core.toml")
    }
}
