//! Error types for the schemadrift application.
//!
//! Every fatal error falls into one [`ErrorKind`], which decides the process
//! exit code.

use schemadrift_catalog::CatalogError;
use schemadrift_java::FrontEndError;
use schemadrift_mapping::MappingError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, DriftError>;

/// Failure categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Catalog unreachable or credentials rejected.
    ConnectionFailure,
    /// A declaration unit or schema file could not be read or parsed.
    ParsingFailure,
    /// Unsupported database kind or missing required setting.
    UnsupportedInput,
    /// A report or schema file could not be written.
    OutputFailure,
}

impl ErrorKind {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::UnsupportedInput => 2,
            Self::ConnectionFailure => 3,
            Self::ParsingFailure => 4,
            Self::OutputFailure => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionFailure => "connection failure",
            Self::ParsingFailure => "parsing failure",
            Self::UnsupportedInput => "unsupported input",
            Self::OutputFailure => "output failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DriftError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    FrontEnd(#[from] FrontEndError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A required setting is absent from both the command line and the
    /// configuration file.
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    /// A setting is present but unusable.
    #[error("Invalid setting {name}: {message}")]
    InvalidSetting { name: String, message: String },

    #[error("Failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A schema file given to `compare` could not be read.
    #[error("Failed to read schema file {path}: {source}")]
    SchemaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema file given to `compare` is not a schema document.
    #[error("Invalid schema file {path}: {message}")]
    SchemaFormat { path: PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },

    /// The async runtime for catalog access could not start.
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl DriftError {
    pub fn missing(setting: impl Into<String>) -> Self {
        Self::MissingSetting(setting.into())
    }

    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Mapping(_) | Self::FrontEnd(_) => ErrorKind::ParsingFailure,
            Self::Catalog(err) if err.is_unsupported_input() => ErrorKind::UnsupportedInput,
            Self::Catalog(_) | Self::Runtime(_) => ErrorKind::ConnectionFailure,
            Self::MissingSetting(_)
            | Self::InvalidSetting { .. }
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. } => ErrorKind::UnsupportedInput,
            Self::SchemaRead { .. } | Self::SchemaFormat { .. } => ErrorKind::ParsingFailure,
            Self::Write { .. } | Self::Serialize { .. } => ErrorKind::OutputFailure,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}
