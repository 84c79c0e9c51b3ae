// Source configuration, loaded from the host's JSON config

use crate::core::constants::*;
use crate::core::error::{Result, WindCubeError};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database root; catalog paths resolve below it.
    pub root: PathBuf,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default = "default_sample_period_secs")]
    pub sample_period_secs: u32,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Upper bound on day files decoded concurrently.
    #[serde(default = "default_max_open_files")]
    pub max_open_files: usize,
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_sample_period_secs() -> u32 {
    DEFAULT_SAMPLE_PERIOD_SECS
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_max_open_files() -> usize {
    DEFAULT_MAX_OPEN_FILES
}

impl SourceConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file_pattern: default_file_pattern(),
            sample_period_secs: default_sample_period_secs(),
            delimiter: default_delimiter(),
            max_open_files: default_max_open_files(),
        }
    }

    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: SourceConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_period_secs == 0 || SECONDS_PER_DAY % self.sample_period_secs != 0 {
            return Err(WindCubeError::Config(format!(
                "sample_period_secs must divide {} evenly, got {}",
                SECONDS_PER_DAY, self.sample_period_secs
            )));
        }
        if self.max_open_files == 0 {
            return Err(WindCubeError::Config("max_open_files must be at least 1".into()));
        }
        if self.file_pattern.trim().is_empty()
            || StrftimeItems::new(&self.file_pattern).any(|item| matches!(item, Item::Error))
        {
            return Err(WindCubeError::Config(format!(
                "invalid file_pattern {:?}",
                self.file_pattern
            )));
        }
        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(WindCubeError::Config("delimiter must not be a line break".into()));
        }
        Ok(())
    }
}
