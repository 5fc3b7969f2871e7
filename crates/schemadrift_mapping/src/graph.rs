//! Type graph: all known declarations indexed by qualified name.
//!
//! Ancestor links are stored as names, not pointers, so a graph can be built
//! from declarations in any order and shared read-only between workers.

use crate::context::{DuplicatePolicy, InferenceContext};
use crate::descriptor::{Annotated, EntityTypeDescriptor, TypeRef};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{MappingError, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Outcome of looking up a type's declared ancestor.
#[derive(Debug, Clone, Copy)]
pub enum Ancestor<'g> {
    /// The type declares no ancestor.
    Root,
    Resolved(&'g EntityTypeDescriptor),
    /// The type names an ancestor that is not among the known declarations.
    Unresolved(&'g TypeRef),
}

impl<'g> Ancestor<'g> {
    pub fn descriptor(&self) -> Option<&'g EntityTypeDescriptor> {
        match self {
            Self::Resolved(desc) => Some(desc),
            _ => None,
        }
    }
}

/// A type followed by its resolvable ancestors, nearest first.
#[derive(Debug)]
pub struct Lineage<'g> {
    pub types: Vec<&'g EntityTypeDescriptor>,
    /// Why the walk stopped early, if it did.
    pub interrupted: Option<Diagnostic>,
}

/// Arena of declarations keyed by qualified name.
#[derive(Debug, Default)]
pub struct TypeGraph {
    types: HashMap<String, EntityTypeDescriptor>,
    entities: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl TypeGraph {
    /// Index `declarations`, applying the context's duplicate policy.
    ///
    /// Declarations are ordered by (qualified name, origin) first, so
    /// [`DuplicatePolicy::FirstByOrigin`] picks the same winner regardless of
    /// the order front-ends produced them in.
    pub fn build(
        mut declarations: Vec<EntityTypeDescriptor>,
        ctx: &InferenceContext,
    ) -> Result<Self> {
        declarations.sort_by(|a, b| {
            a.qualified_name
                .cmp(&b.qualified_name)
                .then_with(|| a.origin.cmp(&b.origin))
        });

        let mut graph = TypeGraph::default();
        for decl in declarations {
            if let Some(existing) = graph.types.get(&decl.qualified_name) {
                match ctx.duplicate_policy {
                    DuplicatePolicy::Reject => {
                        return Err(MappingError::DuplicateDeclaration {
                            qualified_name: decl.qualified_name,
                            first: existing.origin.clone(),
                            second: decl.origin,
                        });
                    }
                    DuplicatePolicy::FirstByOrigin => {
                        warn!(
                            type_name = %decl.qualified_name,
                            kept = %existing.origin,
                            dropped = %decl.origin,
                            "Duplicate declaration ignored"
                        );
                        graph.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::DuplicateDeclaration,
                            decl.qualified_name.clone(),
                            format!("kept {}, ignored {}", existing.origin, decl.origin),
                        ));
                        continue;
                    }
                }
            }

            if decl.has_annotation("Entity") {
                graph.entities.push(decl.qualified_name.clone());
            }
            graph.types.insert(decl.qualified_name.clone(), decl);
        }

        graph.entities.sort();
        debug!(
            types = graph.types.len(),
            entities = graph.entities.len(),
            "Type graph built"
        );
        Ok(graph)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&EntityTypeDescriptor> {
        self.types.get(qualified_name)
    }

    /// Resolve a reference to the first candidate the graph knows about.
    pub fn resolve(&self, type_ref: &TypeRef) -> Option<&EntityTypeDescriptor> {
        type_ref.candidates.iter().find_map(|c| self.types.get(c))
    }

    pub fn resolve_ancestor<'g>(&'g self, ty: &'g EntityTypeDescriptor) -> Ancestor<'g> {
        match &ty.superclass {
            None => Ancestor::Root,
            Some(sup) => match self.resolve(sup) {
                Some(desc) => Ancestor::Resolved(desc),
                None => Ancestor::Unresolved(sup),
            },
        }
    }

    /// Walk from `start` up through its ancestors.
    ///
    /// Stops at the first type without an ancestor, at an ancestor that
    /// cannot be resolved, or when a type repeats. The last two cases are
    /// reported through [`Lineage::interrupted`].
    pub fn lineage<'g>(&'g self, start: &'g EntityTypeDescriptor) -> Lineage<'g> {
        let mut types = vec![start];
        let mut seen: HashSet<&str> = HashSet::from([start.qualified_name.as_str()]);
        let mut current = start;

        loop {
            match self.resolve_ancestor(current) {
                Ancestor::Root => {
                    return Lineage {
                        types,
                        interrupted: None,
                    }
                }
                Ancestor::Unresolved(sup) => {
                    debug!(
                        type_name = %current.qualified_name,
                        ancestor = %sup.written,
                        "Ancestor not among known declarations"
                    );
                    return Lineage {
                        types,
                        interrupted: Some(Diagnostic::new(
                            DiagnosticKind::UnresolvedAncestor,
                            current.qualified_name.clone(),
                            format!("ancestor '{}' is not among the scanned declarations", sup.written),
                        )),
                    };
                }
                Ancestor::Resolved(parent) => {
                    if !seen.insert(parent.qualified_name.as_str()) {
                        return Lineage {
                            types,
                            interrupted: Some(Diagnostic::new(
                                DiagnosticKind::CyclicHierarchy,
                                start.qualified_name.clone(),
                                format!("ancestor chain returns to '{}'", parent.qualified_name),
                            )),
                        };
                    }
                    types.push(parent);
                    current = parent;
                }
            }
        }
    }

    /// Declarations that carry the entity directive, by qualified name.
    pub fn entities(&self) -> impl Iterator<Item = &EntityTypeDescriptor> {
        self.entities.iter().filter_map(|name| self.types.get(name))
    }

    /// Findings recorded while building (dropped duplicates).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
