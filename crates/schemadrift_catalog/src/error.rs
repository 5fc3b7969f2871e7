//! Error types for catalog extraction.

use thiserror::Error;

/// Catalog result type.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Driver error behind a connection or query failure.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The requested database kind is not supported at all.
    #[error("Unsupported database type '{0}' (supported: postgres, sqlite, oracle)")]
    UnsupportedKind(String),

    /// The kind is supported but its backend was not compiled in.
    #[error("Database type {kind} not compiled in. Rebuild with the '{feature}' feature.")]
    NotCompiled {
        kind: String,
        feature: &'static str,
    },

    /// A required connection setting is missing or unusable.
    #[error("Invalid catalog configuration: {0}")]
    InvalidConfig(String),

    /// Could not connect or authenticate.
    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: DriverError,
    },

    /// Connected, but the metadata query failed.
    #[error("Catalog query failed on {target}: {source}")]
    MetadataQuery {
        target: String,
        #[source]
        source: DriverError,
    },
}

impl CatalogError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn connection(target: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::Connection {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn metadata_query(target: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::MetadataQuery {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Errors raised before any connection attempt.
    pub fn is_unsupported_input(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind(_) | Self::NotCompiled { .. } | Self::InvalidConfig(_)
        )
    }
}
