//! Interpretation of mapping directives attached to types and fields.
//!
//! Directives arrive as generic annotations. They are recognised by simple
//! name, so `javax.persistence.Column`, `jakarta.persistence.Column` and a
//! bare `Column` all mean the same thing.

use crate::descriptor::{Annotated, Annotation, EntityTypeDescriptor, FieldDescriptor};
use crate::naming;
use std::collections::BTreeMap;

/// Relationship directive on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
    ElementCollection,
}

impl RelationshipKind {
    /// Single-valued relationships own a join column on the declaring table.
    pub fn owns_join_column(&self) -> bool {
        matches!(self, Self::ManyToOne | Self::OneToOne)
    }
}

/// Attribute and association overrides, keyed by attribute name.
///
/// Keys may be dotted paths (`home.street`) addressing attributes of an
/// embedded field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideMap {
    entries: BTreeMap<String, String>,
}

impl OverrideMap {
    /// Collect every override declared in `annotations`. Within one
    /// declaration, a later override for the same attribute wins.
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut map = OverrideMap::default();
        for ann in annotations {
            match ann.simple_name() {
                "AttributeOverride" => map.add_attribute_override(ann),
                "AssociationOverride" => map.add_association_override(ann),
                "AttributeOverrides" => {
                    for inner in nested(ann) {
                        map.add_attribute_override(inner);
                    }
                }
                "AssociationOverrides" => {
                    for inner in nested(ann) {
                        map.add_association_override(inner);
                    }
                }
                _ => {}
            }
        }
        map
    }

    fn add_attribute_override(&mut self, ann: &Annotation) {
        let column = ann
            .attribute("column")
            .and_then(|v| v.as_annotation())
            .and_then(|col| col.string("name"));
        if let (Some(attr), Some(column)) = (ann.string("name"), column) {
            self.entries.insert(attr.to_string(), column.to_string());
        }
    }

    fn add_association_override(&mut self, ann: &Annotation) {
        let column = ann
            .attribute("joinColumns")
            .and_then(|v| v.elements().first())
            .and_then(|v| v.as_annotation())
            .and_then(|col| col.string("name"));
        if let (Some(attr), Some(column)) = (ann.string("name"), column) {
            self.entries.insert(attr.to_string(), column.to_string());
        }
    }

    pub fn insert(&mut self, attribute: impl Into<String>, column: impl Into<String>) {
        self.entries.insert(attribute.into(), column.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.entries.get(attribute).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A copy of `self` with `top` laid over it; entries in `top` win.
    pub fn overlay(&self, top: &OverrideMap) -> OverrideMap {
        let mut entries = self.entries.clone();
        entries.extend(top.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        OverrideMap { entries }
    }

    /// Entries addressed at attributes of embedded field `field`, re-keyed
    /// relative to it (`home.street` becomes `street`).
    pub fn scoped_to(&self, field: &str) -> OverrideMap {
        let prefix = format!("{field}.");
        let entries = self
            .entries
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), v.clone()))
            })
            .collect();
        OverrideMap { entries }
    }
}

fn nested(container: &Annotation) -> impl Iterator<Item = &Annotation> {
    container
        .attribute("value")
        .map(|v| v.elements())
        .unwrap_or(&[])
        .iter()
        .filter_map(|v| v.as_annotation())
}

/// Inheritance settings found on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceDirective {
    pub strategy: Option<String>,
    pub discriminator_column: Option<String>,
}

/// Type-level directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDirectives {
    pub entity: bool,
    pub entity_name: Option<String>,
    pub embeddable: bool,
    pub mapped_superclass: bool,
    pub table_name: Option<String>,
    pub inheritance: Option<InheritanceDirective>,
    pub overrides: OverrideMap,
}

impl TypeDirectives {
    pub fn read(ty: &EntityTypeDescriptor) -> Self {
        let entity = ty.annotation("Entity");
        let inheritance = ty.annotation("Inheritance");
        let discriminator = ty.annotation("DiscriminatorColumn");

        let inheritance = if inheritance.is_some() || discriminator.is_some() {
            Some(InheritanceDirective {
                strategy: inheritance
                    .and_then(|a| a.attribute("strategy"))
                    .and_then(|v| v.enum_constant())
                    .map(str::to_string),
                discriminator_column: discriminator
                    .and_then(|a| a.string("name"))
                    .map(str::to_string),
            })
        } else {
            None
        };

        Self {
            entity: entity.is_some(),
            entity_name: entity.and_then(|a| a.string("name")).map(str::to_string),
            embeddable: ty.has_annotation("Embeddable"),
            mapped_superclass: ty.has_annotation("MappedSuperclass"),
            table_name: ty
                .annotation("Table")
                .and_then(|a| a.string("name"))
                .map(str::to_string),
            inheritance,
            overrides: OverrideMap::from_annotations(&ty.annotations),
        }
    }
}

/// Field-level directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDirectives {
    pub column_name: Option<String>,
    pub join_column_name: Option<String>,
    /// `Embedded` or `EmbeddedId`.
    pub embedded: bool,
    /// `EmbeddedId`: the id components map to unprefixed columns.
    pub embedded_id: bool,
    pub transient: bool,
    pub relationship: Option<RelationshipKind>,
    pub mapped_by: Option<String>,
    pub overrides: OverrideMap,
}

impl FieldDirectives {
    pub fn read(field: &FieldDescriptor) -> Self {
        let relationship = [
            ("ManyToOne", RelationshipKind::ManyToOne),
            ("OneToOne", RelationshipKind::OneToOne),
            ("OneToMany", RelationshipKind::OneToMany),
            ("ManyToMany", RelationshipKind::ManyToMany),
            ("ElementCollection", RelationshipKind::ElementCollection),
        ]
        .into_iter()
        .find(|(name, _)| field.has_annotation(name))
        .map(|(_, kind)| kind);

        let mapped_by = relationship
            .and_then(|kind| match kind {
                RelationshipKind::OneToOne => field.annotation("OneToOne"),
                RelationshipKind::OneToMany => field.annotation("OneToMany"),
                RelationshipKind::ManyToMany => field.annotation("ManyToMany"),
                _ => None,
            })
            .and_then(|a| a.string("mappedBy"))
            .map(str::to_string);

        let join_column_name = field
            .annotation("JoinColumn")
            .and_then(|a| a.string("name"))
            .or_else(|| {
                field
                    .annotation("JoinColumns")
                    .and_then(|a| a.attribute("value"))
                    .and_then(|v| v.elements().first())
                    .and_then(|v| v.as_annotation())
                    .and_then(|a| a.string("name"))
            })
            .map(str::to_string);

        Self {
            column_name: field
                .annotation("Column")
                .and_then(|a| a.string("name"))
                .map(str::to_string),
            join_column_name,
            embedded: field.has_annotation("Embedded") || field.has_annotation("EmbeddedId"),
            embedded_id: field.has_annotation("EmbeddedId"),
            transient: field.has_annotation("Transient"),
            relationship,
            mapped_by,
            overrides: OverrideMap::from_annotations(&field.annotations),
        }
    }

    /// Whether the field contributes anything to its declaring table.
    ///
    /// Static, transient and synthetic fields are skipped, as are
    /// collection-valued relationships, which live in other tables. With
    /// `exclude_inverse` set, the inverse side of a one-to-one is skipped too.
    pub fn is_mappable(&self, field: &FieldDescriptor, exclude_inverse: bool) -> bool {
        if field.modifiers.is_static || field.modifiers.is_transient || field.modifiers.is_synthetic
        {
            return false;
        }
        if self.transient {
            return false;
        }
        match self.relationship {
            Some(RelationshipKind::OneToMany)
            | Some(RelationshipKind::ManyToMany)
            | Some(RelationshipKind::ElementCollection) => false,
            Some(RelationshipKind::OneToOne) if exclude_inverse && self.mapped_by.is_some() => false,
            _ => true,
        }
    }
}

/// Column name for one non-embedded field, before prefixing and
/// upper-casing.
///
/// Precedence: override for the field name, then an explicit join column,
/// then an explicit column, then `<field>_id` for single-valued
/// relationships, then the converted field name.
pub fn resolve_column_name(
    field: &FieldDescriptor,
    directives: &FieldDirectives,
    overrides: &OverrideMap,
) -> String {
    if let Some(name) = overrides.get(&field.name).filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }
    if let Some(name) = &directives.join_column_name {
        return name.clone();
    }
    if let Some(name) = &directives.column_name {
        return name.clone();
    }
    let base = naming::convert(&field.name);
    match directives.relationship {
        Some(kind) if kind.owns_join_column() => format!("{base}_id"),
        _ => base,
    }
}

/// Table name for an entity given its lineage (the entity first, then its
/// ancestors nearest first).
///
/// The nearest explicit table name wins. Without one, the entity's own
/// entity name (if it declares one) or simple name is converted.
pub fn resolve_table_name(lineage: &[&EntityTypeDescriptor]) -> String {
    let explicit = lineage
        .iter()
        .find_map(|ty| TypeDirectives::read(ty).table_name);
    if let Some(name) = explicit {
        return name;
    }
    match lineage.first() {
        Some(entity) => {
            let own = TypeDirectives::read(entity);
            naming::convert(own.entity_name.as_deref().unwrap_or(&entity.simple_name))
        }
        None => String::new(),
    }
}
