use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_MIN_FILE_SIZE_BYTES;
use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "trialprep.toml";
pub const CONFIG_PATH_ENV: &str = "TRIALPREP_CONFIG";

/// What preprocessing does when one participant file fails to normalize
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run on the first failing file
    #[default]
    Abort,
    /// Log the failure, leave the file out, and continue
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub preprocess: PreprocessConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub preprocessed_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub demographics_file: PathBuf,
    pub ignore_files: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub on_file_error: FailurePolicy,
    /// Raw files at or below this size are quarantined
    pub min_file_size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_files"),
            preprocessed_dir: PathBuf::from("preprocessed_files"),
            output_dir: PathBuf::from("output_files"),
            output_file: "data_results.csv".to_string(),
            demographics_file: PathBuf::from("Animal or Vehicle Demographics Survey_November 6, 2024_21.43.csv"),
            ignore_files: PathBuf::from("ignore_files.txt"),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            on_file_error: FailurePolicy::Abort,
            min_file_size_bytes: DEFAULT_MIN_FILE_SIZE_BYTES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from `TRIALPREP_CONFIG`, or from `trialprep.toml`.
    /// A missing default file yields the defaults; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let config_path = match explicit {
            Some(p) => p,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&config_content)
    }

    fn validate(&self) -> Result<()> {
        if self.paths.output_file.trim().is_empty() {
            return Err(PipelineError::Config("paths.output_file must not be empty".to_string()));
        }
        Ok(())
    }

    /// Full path of the merged output file.
    pub fn output_path(&self) -> PathBuf {
        self.paths.output_dir.join(&self.paths.output_file)
    }
}
