//! Non-fatal findings recorded during inference.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A declared ancestor is not among the known declarations.
    UnresolvedAncestor,
    /// An embedded field's type is not among the known declarations.
    UnresolvedEmbeddable,
    /// The ancestor chain loops back on itself.
    CyclicHierarchy,
    /// An embedded type embeds itself, directly or transitively.
    RecursiveEmbedding,
    /// A qualified name was declared more than once and one copy was dropped.
    DuplicateDeclaration,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedAncestor => "unresolved ancestor",
            Self::UnresolvedEmbeddable => "unresolved embeddable",
            Self::CyclicHierarchy => "cyclic hierarchy",
            Self::RecursiveEmbedding => "recursive embedding",
            Self::DuplicateDeclaration => "duplicate declaration",
        }
    }
}

/// A warning tied to the type it concerns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Qualified name of the type the finding is about.
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.kind.as_str(), self.subject, self.message)
    }
}
