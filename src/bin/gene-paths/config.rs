use super::{Mode, OutputFormat};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    /// Loads `explicit` if given, else the default file if it exists.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let data = read_file(&path)?;
            return Ok(Self {
                path: Some(path),
                data,
            });
        }
        match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                let data = read_file(&path)?;
                Ok(Self {
                    path: Some(path),
                    data,
                })
            }
            None => Ok(Self::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&self) -> Option<&str> {
        self.data.log.as_deref()
    }

    pub fn both(&self) -> Option<bool> {
        self.data.search.both
    }

    pub fn mode(&self) -> Result<Option<Mode>, ConfigError> {
        self.data
            .search
            .mode
            .as_deref()
            .map(|value| {
                Mode::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
                    key: "search.mode",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    pub fn format(&self) -> Result<Option<OutputFormat>, ConfigError> {
        self.data
            .output
            .format
            .as_deref()
            .map(|value| {
                OutputFormat::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
                    key: "output.format",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    pub fn wrap(&self) -> Option<usize> {
        self.data.output.wrap
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    log: Option<String>,
    #[serde(default)]
    search: SearchSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchSection {
    both: Option<bool>,
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSection {
    format: Option<String>,
    wrap: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config value '{value}' is invalid for {key}")]
    InvalidValue { key: &'static str, value: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("gene-paths").join("config.toml"))
}
