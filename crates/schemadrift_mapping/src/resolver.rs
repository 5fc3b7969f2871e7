//! Per-entity resolution: table name plus the full column set contributed by
//! the entity, its ancestors and everything they embed.

use crate::context::InferenceContext;
use crate::descriptor::{EntityTypeDescriptor, FieldDescriptor};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::directives::{self, FieldDirectives, OverrideMap, TypeDirectives};
use crate::graph::TypeGraph;
use crate::naming;
use crate::schema::Identifier;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Columns one entity contributes to its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    pub entity: String,
    pub table: Identifier,
    pub columns: BTreeSet<Identifier>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves entities against a frozen [`TypeGraph`].
///
/// Holds only shared references, so one resolver per worker thread is cheap
/// and all of them can read the same graph.
pub struct EntityResolver<'g> {
    graph: &'g TypeGraph,
    ctx: &'g InferenceContext,
}

struct Accumulator {
    columns: BTreeSet<Identifier>,
    diagnostics: Vec<Diagnostic>,
    /// Embeddable types currently being flattened, outermost first.
    embedding: Vec<String>,
}

impl<'g> EntityResolver<'g> {
    pub fn new(graph: &'g TypeGraph, ctx: &'g InferenceContext) -> Self {
        Self { graph, ctx }
    }

    pub fn resolve_entity(&self, entity: &'g EntityTypeDescriptor) -> ResolvedEntity {
        let lineage = self.graph.lineage(entity);
        let table = Identifier::new(directives::resolve_table_name(&lineage.types));

        let mut acc = Accumulator {
            columns: BTreeSet::new(),
            diagnostics: lineage.interrupted.iter().cloned().collect(),
            embedding: Vec::new(),
        };

        if let Some(column) = self.discriminator_column(&lineage.types) {
            trace!(entity = %entity.qualified_name, %column, "Discriminator column");
            acc.columns.insert(column);
        }

        self.collect_lineage(&lineage.types, "", OverrideMap::default(), &mut acc);

        debug!(
            entity = %entity.qualified_name,
            table = %table,
            columns = acc.columns.len(),
            "Entity resolved"
        );

        ResolvedEntity {
            entity: entity.qualified_name.clone(),
            table,
            columns: acc.columns,
            diagnostics: acc.diagnostics,
        }
    }

    /// The first type in the lineage declaring an inheritance strategy or a
    /// discriminator column is the hierarchy root; it contributes exactly one
    /// discriminator column.
    fn discriminator_column(&self, lineage: &[&EntityTypeDescriptor]) -> Option<Identifier> {
        lineage
            .iter()
            .find_map(|ty| TypeDirectives::read(ty).inheritance)
            .map(|inh| {
                Identifier::new(
                    inh.discriminator_column
                        .unwrap_or_else(|| self.ctx.discriminator_default.clone()),
                )
            })
    }

    /// Visit every type of a lineage, nearest first. The overrides in effect
    /// for an ancestor are its descendant's declared overrides laid under
    /// those inherited from further down, so the entry nearest the leaf wins.
    fn collect_lineage(
        &self,
        lineage: &[&'g EntityTypeDescriptor],
        prefix: &str,
        inherited: OverrideMap,
        acc: &mut Accumulator,
    ) {
        let mut overrides = inherited;
        for &ty in lineage {
            for field in &ty.fields {
                self.collect_field(ty, field, prefix, &overrides, acc);
            }
            overrides = TypeDirectives::read(ty).overrides.overlay(&overrides);
        }
    }

    fn collect_field(
        &self,
        owner: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        prefix: &str,
        overrides: &OverrideMap,
        acc: &mut Accumulator,
    ) {
        let directives = FieldDirectives::read(field);
        if !directives.is_mappable(field, self.ctx.exclude_inverse_relationships) {
            trace!(owner = %owner.qualified_name, field = %field.name, "Field not mapped");
            return;
        }

        let declared = self.graph.resolve(&field.declared_type);
        if directives.embedded {
            match declared {
                Some(embedded) => {
                    self.collect_embedded(owner, field, embedded, &directives, prefix, overrides, acc)
                }
                None => acc.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvedEmbeddable,
                    owner.qualified_name.clone(),
                    format!(
                        "embedded field '{}' has unknown type '{}'",
                        field.name, field.declared_type.written
                    ),
                )),
            }
            return;
        }

        // An embeddable-typed field is flattened even without an explicit
        // embedded directive.
        if directives.relationship.is_none() {
            if let Some(embedded) = declared.filter(|ty| TypeDirectives::read(ty).embeddable) {
                self.collect_embedded(owner, field, embedded, &directives, prefix, overrides, acc);
                return;
            }
        }

        let column = directives::resolve_column_name(field, &directives, overrides);
        let column = Identifier::new(format!("{prefix}{column}"));
        trace!(owner = %owner.qualified_name, field = %field.name, %column, "Column");
        acc.columns.insert(column);
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_embedded(
        &self,
        owner: &EntityTypeDescriptor,
        field: &FieldDescriptor,
        embedded: &'g EntityTypeDescriptor,
        directives: &FieldDirectives,
        prefix: &str,
        overrides: &OverrideMap,
        acc: &mut Accumulator,
    ) {
        if acc.embedding.contains(&embedded.qualified_name) {
            acc.diagnostics.push(Diagnostic::new(
                DiagnosticKind::RecursiveEmbedding,
                owner.qualified_name.clone(),
                format!(
                    "field '{}' embeds '{}' inside itself",
                    field.name, embedded.qualified_name
                ),
            ));
            return;
        }

        // Dotted overrides from outside beat the field's own, which beat
        // plain inherited entries.
        let scoped = overrides
            .overlay(&directives.overrides)
            .overlay(&overrides.scoped_to(&field.name));
        let prefix = if directives.embedded_id {
            prefix.to_string()
        } else {
            format!("{prefix}{}_", naming::convert(&field.name))
        };

        let lineage = self.graph.lineage(embedded);
        if let Some(diag) = lineage.interrupted {
            acc.diagnostics.push(diag);
        }

        acc.embedding.push(embedded.qualified_name.clone());
        self.collect_lineage(&lineage.types, &prefix, scoped, acc);
        acc.embedding.pop();
    }
}
