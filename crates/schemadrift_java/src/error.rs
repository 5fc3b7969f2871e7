//! Error types for the Java front-ends.

use schemadrift_mapping::MappingError;
use std::path::PathBuf;
use thiserror::Error;

/// Front-end result type.
pub type Result<T> = std::result::Result<T, FrontEndError>;

/// Errors raised while discovering or decoding declaration units.
#[derive(Error, Debug)]
pub enum FrontEndError {
    /// A unit or root could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source text could not be tokenized or parsed.
    #[error("{path}:{line}:{column}: {message}")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    /// A class file is truncated or structurally invalid.
    #[error("Malformed class file {origin}: {message}")]
    ClassFormat { origin: String, message: String },

    /// An archive could not be opened or an entry could not be read.
    #[error("Archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Directory traversal failed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The configured root cannot be used.
    #[error("Invalid root {path}: {message}")]
    InvalidRoot { path: PathBuf, message: String },

    /// The decoding pool failed.
    #[error(transparent)]
    Worker(#[from] MappingError),
}

impl FrontEndError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn class_format(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClassFormat {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn invalid_root(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<FrontEndError> for MappingError {
    fn from(err: FrontEndError) -> Self {
        match err {
            FrontEndError::Worker(err) => err,
            FrontEndError::Io { path, source } => {
                MappingError::unreadable(path.display().to_string(), source)
            }
            FrontEndError::InvalidRoot { path, message } => {
                MappingError::invalid_root(path.display().to_string(), message)
            }
            FrontEndError::Syntax {
                path,
                line,
                column,
                message,
            } => MappingError::malformed(
                path.display().to_string(),
                format!("line {line}, column {column}: {message}"),
            ),
            FrontEndError::ClassFormat { origin, message } => MappingError::malformed(origin, message),
            FrontEndError::Archive { path, source } => {
                MappingError::malformed(path.display().to_string(), source.to_string())
            }
            FrontEndError::Walk(err) => {
                let origin = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                match err.into_io_error() {
                    Some(io) => MappingError::unreadable(origin, io),
                    None => MappingError::malformed(origin, "filesystem loop detected"),
                }
            }
        }
    }
}
