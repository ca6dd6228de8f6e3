//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Compile(#[from] sextant_common::Error),

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid {kind} in {}: {source}", path.display())]
    InvalidObject {
        path: PathBuf,
        kind: String,
        source: serde_yaml::Error,
    },

    #[error("expected exactly one {kind} in {}, found {found}", path.display())]
    ObjectCount {
        path: PathBuf,
        kind: String,
        found: usize,
    },
}

impl Error {
    pub fn object_count(path: impl Into<PathBuf>, kind: impl Into<String>, found: usize) -> Self {
        Error::ObjectCount {
            path: path.into(),
            kind: kind.into(),
            found,
        }
    }
}
