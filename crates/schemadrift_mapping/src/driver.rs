//! Schema inference driver: load declarations, build the graph, resolve every
//! concrete entity in parallel and merge the results.

use crate::context::InferenceContext;
use crate::descriptor::EntityTypeDescriptor;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::graph::TypeGraph;
use crate::resolver::{EntityResolver, ResolvedEntity};
use crate::schema::CanonicalSchema;
use crate::workers;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, warn};

/// Anything that can produce type declarations: a source tree, a class
/// directory, an archive.
pub trait DeclarationSource: Send + Sync {
    /// Human-readable description for logs and errors.
    fn describe(&self) -> String;

    /// Produce every declaration the source holds.
    fn load(&self) -> Result<Vec<EntityTypeDescriptor>>;
}

/// Result of one inference run.
#[derive(Debug, Clone, Default)]
pub struct InferenceOutcome {
    pub schema: CanonicalSchema,
    /// Deduplicated and sorted.
    pub diagnostics: Vec<Diagnostic>,
    pub types_indexed: usize,
    pub entities_resolved: usize,
}

/// Orchestrates one inference run under a fixed [`InferenceContext`].
pub struct SchemaInferenceDriver<'c> {
    ctx: &'c InferenceContext,
}

impl<'c> SchemaInferenceDriver<'c> {
    pub fn new(ctx: &'c InferenceContext) -> Self {
        Self { ctx }
    }

    /// Load every source, then infer. The first source that fails aborts the
    /// run.
    pub fn run(&self, sources: &[&dyn DeclarationSource]) -> Result<InferenceOutcome> {
        let mut declarations = Vec::new();
        for source in sources {
            let loaded = source.load()?;
            info!(source = %source.describe(), types = loaded.len(), "Declarations loaded");
            declarations.extend(loaded);
        }
        self.infer(declarations)
    }

    /// Infer the canonical schema from an already-loaded declaration set.
    pub fn infer(&self, declarations: Vec<EntityTypeDescriptor>) -> Result<InferenceOutcome> {
        let start = Instant::now();
        let graph = TypeGraph::build(declarations, self.ctx)?;

        let targets: Vec<&EntityTypeDescriptor> = graph
            .entities()
            .filter(|e| e.is_concrete() && self.ctx.in_namespace(&e.qualified_name))
            .collect();

        let resolved = self.resolve_all(&graph, &targets)?;

        let mut schema = CanonicalSchema::new();
        let mut diagnostics: BTreeSet<Diagnostic> = graph.diagnostics().iter().cloned().collect();
        for entity in resolved {
            diagnostics.extend(entity.diagnostics);
            schema.insert_table(entity.table, entity.columns);
        }

        for diag in &diagnostics {
            warn!(kind = diag.kind.as_str(), subject = %diag.subject, "{}", diag.message);
        }

        info!(
            types = graph.len(),
            entities = targets.len(),
            tables = schema.table_count(),
            columns = schema.column_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Mapping schema inferred"
        );

        Ok(InferenceOutcome {
            schema,
            diagnostics: diagnostics.into_iter().collect(),
            types_indexed: graph.len(),
            entities_resolved: targets.len(),
        })
    }

    /// Resolve `targets` on the worker pool. Each worker owns its own
    /// results; the graph is shared read-only.
    fn resolve_all(
        &self,
        graph: &TypeGraph,
        targets: &[&EntityTypeDescriptor],
    ) -> Result<Vec<ResolvedEntity>> {
        let resolver = EntityResolver::new(graph, self.ctx);
        workers::map_in_parallel("resolve", targets, self.ctx.workers, |&entity| {
            resolver.resolve_entity(entity)
        })
    }
}
