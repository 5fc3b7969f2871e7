//! Error types for mapping inference.

use thiserror::Error;

/// Mapping inference result type.
pub type Result<T> = std::result::Result<T, MappingError>;

/// Errors raised while loading declarations or inferring a schema.
///
/// Malformed inheritance (unknown ancestors, cycles, unresolvable embedded
/// types) is not an error: it degrades to a [`crate::Diagnostic`] so one bad
/// declaration never fails the whole run.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A declaration unit could not be read at all.
    #[error("Failed to read {origin}: {source}")]
    Unreadable {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// A declaration unit was read but could not be parsed.
    #[error("Failed to parse {origin}: {message}")]
    Malformed { origin: String, message: String },

    /// The same qualified name was declared by two different units.
    #[error("Type '{qualified_name}' is declared more than once ({first}, {second})")]
    DuplicateDeclaration {
        qualified_name: String,
        first: String,
        second: String,
    },

    /// The declaration root itself is unusable (missing, not a directory, ...).
    #[error("Invalid declaration root {origin}: {message}")]
    InvalidRoot { origin: String, message: String },

    /// A worker thread panicked; the run result would be incomplete.
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// A worker thread could not be started.
    #[error("Failed to start worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl MappingError {
    /// Create a parse error for a declaration unit.
    pub fn malformed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create a read error for a declaration unit.
    pub fn unreadable(origin: impl Into<String>, source: std::io::Error) -> Self {
        Self::Unreadable {
            origin: origin.into(),
            source,
        }
    }

    /// Create an invalid-root error.
    pub fn invalid_root(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// True when the failure came from reading or parsing declarations,
    /// as opposed to a problem in the declaration set as a whole.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::Unreadable { .. }
                | Self::Malformed { .. }
                | Self::DuplicateDeclaration { .. }
                | Self::InvalidRoot { .. }
        )
    }
}
