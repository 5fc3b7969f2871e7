//! Per-run inference settings.

/// Column synthesized for an inheritance root that names no discriminator.
pub const DEFAULT_DISCRIMINATOR_COLUMN: &str = "DTYPE";

/// What to do when two declaration units declare the same qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail the run.
    #[default]
    Reject,
    /// Keep the declaration whose origin sorts first and warn about the rest.
    FirstByOrigin,
}

/// Settings threaded through one inference run.
///
/// Built once by the caller and passed by reference; nothing in the crate
/// keeps process-wide state.
#[derive(Debug, Clone)]
pub struct InferenceContext {
    /// Only entities inside this namespace (or its sub-namespaces) are
    /// resolved. Ancestors and embedded types are looked up regardless.
    pub root_namespace: Option<String>,
    pub discriminator_default: String,
    pub duplicate_policy: DuplicatePolicy,
    /// Skip one-to-one fields that name the owning side (`mappedBy`).
    pub exclude_inverse_relationships: bool,
    /// Resolution workers; 0 means one per available CPU.
    pub workers: usize,
}

impl Default for InferenceContext {
    fn default() -> Self {
        Self {
            root_namespace: None,
            discriminator_default: DEFAULT_DISCRIMINATOR_COLUMN.to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            exclude_inverse_relationships: false,
            workers: 0,
        }
    }
}

impl InferenceContext {
    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.root_namespace = if namespace.trim().is_empty() {
            None
        } else {
            Some(namespace.trim().to_string())
        };
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_inverse_relationships_excluded(mut self, exclude: bool) -> Self {
        self.exclude_inverse_relationships = exclude;
        self
    }

    /// True if `qualified_name` falls within the configured root namespace.
    pub fn in_namespace(&self, qualified_name: &str) -> bool {
        match &self.root_namespace {
            None => true,
            Some(ns) => {
                qualified_name == ns
                    || qualified_name
                        .strip_prefix(ns.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            }
        }
    }
}
