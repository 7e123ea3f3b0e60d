use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Invalid {kind} pattern \"{pattern}\": {message}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        message: String,
    },

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory Creation Error: Path '{path}', Error: {source}")]
    DirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk Error: {0}")]
    Ignore(#[from] ignore::Error),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("Git Error: {0}")]
    Git(String),

    #[error("TikToken Error: {0}")]
    TikToken(String),
}

impl AppError {
    /// True for errors raised while building the filtering policy, before any scanning.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::InvalidPattern { .. } | AppError::TomlParse(_)
        )
    }
}

