use std::path::PathBuf;
use thiserror::Error;

/// A required column (or a minimum amount of structure) is missing from an input table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{table} is missing required column(s): {}", missing.join(", "))]
    MissingColumns { table: String, missing: Vec<String> },

    #[error("{table} has {found} non-null cue type value(s); at least 2 are required")]
    MissingCueTypes { table: String, found: usize },

    #[error("{table} has no fully populated rows; session metadata cannot be recovered")]
    EmptySession { table: String },

    #[error("{table} has {found} record(s); expected at least {expected} header rows")]
    TruncatedHeader {
        table: String,
        found: usize,
        expected: usize,
    },

    #[error("{table}: column {column} holds unexpected value {value:?}")]
    UnexpectedValue {
        table: String,
        column: String,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("The {role} folder \"{}\" could not be found. The current directory is {}", path.display(), cwd.display())]
    DirectoryNotFound {
        role: &'static str,
        path: PathBuf,
        cwd: PathBuf,
    },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Participant id {value:?} from {origin} is not an integer")]
    TypeConversion { value: String, origin: String },

    #[error("No YYYY-MM-DD session date found for {source_name}")]
    InvalidSessionDate { source_name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Builds a `DirectoryNotFound` for `path`, capturing the working directory for the message.
    pub fn directory_not_found(role: &'static str, path: impl Into<PathBuf>) -> Self {
        PipelineError::DirectoryNotFound {
            role,
            path: path.into(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
