use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UlpanError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid source id: {0:?}")]
    InvalidSourceId(String),

    #[error("Match store at {} is unreadable: {source}", path.display())]
    CorruptStore { path: PathBuf, source: serde_json::Error },

    #[error("Failed to flush match store to {}: {source}", path.display())]
    StoreFlush { path: PathBuf, source: std::io::Error },

    #[error("UlpanError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for UlpanError {
    fn from(error: std::io::Error) -> Self {
        UlpanError::Io(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, UlpanError>;
