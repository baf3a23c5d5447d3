use std::path::{Path, PathBuf};

use hydrant_core::DatasetKind;
use serde::Deserialize;
use tracing::warn;

use crate::error::HydError;
use crate::store::{StorageType, default_storage_path};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub r#type: StorageType,
    pub path: Option<PathBuf>,
}

/// Where the usage CSVs live. Per-dataset paths win over `dir`.
#[derive(Debug, Deserialize, Default)]
pub struct DataConfig {
    pub dir: Option<PathBuf>,
    pub current: Option<PathBuf>,
    pub forecast: Option<PathBuf>,
    pub anomaly: Option<PathBuf>,
    pub demo: Option<PathBuf>,
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("HYDRANT_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|p| p.join("hydrant").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config, HydError> {
    Ok(toml::from_str(content)?)
}

pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_config_from(&path)
}

/// Reads `path`, falling back to defaults when it is missing or invalid.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Config::default();
    };

    parse_config(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring invalid config");
        Config::default()
    })
}

impl Config {
    pub fn resolve_storage(
        &self,
        cli_type: Option<StorageType>,
        cli_path: Option<PathBuf>,
    ) -> (StorageType, PathBuf) {
        let storage_type = cli_type.unwrap_or(self.storage.r#type);
        let storage_path = cli_path
            .or_else(|| self.storage.path.clone())
            .unwrap_or_else(|| default_storage_path(storage_type));

        (storage_type, storage_path)
    }

    pub fn resolve_dataset(&self, kind: DatasetKind, cli_path: Option<PathBuf>) -> PathBuf {
        let configured = match kind {
            DatasetKind::Current => &self.data.current,
            DatasetKind::Forecast => &self.data.forecast,
            DatasetKind::Anomaly => &self.data.anomaly,
            DatasetKind::Demo => &self.data.demo,
        };
        cli_path.or_else(|| configured.clone()).unwrap_or_else(|| {
            self.data
                .dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("data"))
                .join(kind.file_name())
        })
    }
}
