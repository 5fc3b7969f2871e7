//! End-to-end inference tests over hand-built declaration sets.

use schemadrift_mapping::{
    naming, Annotation, AnnotationValue, CanonicalSchema, DiagnosticKind, EntityTypeDescriptor,
    FieldDescriptor, Identifier, InferenceContext, SchemaInferenceDriver, TypeRef,
};

fn entity(name: &str) -> EntityTypeDescriptor {
    EntityTypeDescriptor::class(name).annotated(Annotation::marker("jakarta.persistence.Entity"))
}

fn field(name: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, TypeRef::new("String"))
}

fn column(name: &str) -> Annotation {
    Annotation::marker("Column").with_str("name", name)
}

fn attribute_override(name: &str, column_name: &str) -> Annotation {
    Annotation::marker("AttributeOverride")
        .with_str("name", name)
        .with("column", AnnotationValue::Annotation(column(column_name)))
}

fn columns_of(schema: &CanonicalSchema, table: &str) -> Vec<String> {
    schema
        .columns(&Identifier::new(table))
        .unwrap_or_else(|| panic!("table {table} missing"))
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn infer(decls: Vec<EntityTypeDescriptor>) -> schemadrift_mapping::InferenceOutcome {
    let ctx = InferenceContext::default();
    SchemaInferenceDriver::new(&ctx).infer(decls).unwrap()
}

/// A: table T, discriminator; B: non-entity base with v, c; C extends A adds d.
fn discriminated_hierarchy() -> Vec<EntityTypeDescriptor> {
    vec![
        EntityTypeDescriptor::class("m.B").field(field("v")).field(field("c")),
        entity("m.A")
            .abstract_class()
            .extends(TypeRef::new("m.B"))
            .annotated(Annotation::marker("Table").with_str("name", "T"))
            .annotated(Annotation::marker("Inheritance")),
        entity("m.C").extends(TypeRef::new("m.A")).field(field("d")),
    ]
}

// ============================================================================
// Hierarchies
// ============================================================================

/// Test the four-column single-table result through a non-persistent base
#[test]
fn test_discriminated_hierarchy_end_to_end() {
    let outcome = infer(discriminated_hierarchy());

    assert_eq!(outcome.schema.table_count(), 1);
    assert_eq!(columns_of(&outcome.schema, "T"), vec!["C", "D", "DTYPE", "V"]);
    assert!(outcome.diagnostics.is_empty());
}

/// Test that declaration order never changes the result
#[test]
fn test_result_independent_of_declaration_order() {
    let forward = infer(discriminated_hierarchy());
    let mut reversed_decls = discriminated_hierarchy();
    reversed_decls.reverse();
    let reversed = infer(reversed_decls);

    assert_eq!(forward.schema, reversed.schema);
}

/// Test that a discriminator declared on several ancestors appears once
#[test]
fn test_discriminator_declared_twice_appears_once() {
    let decls = vec![
        EntityTypeDescriptor::class("m.Root")
            .annotated(Annotation::marker("DiscriminatorColumn").with_str("name", "KIND")),
        entity("m.Mid")
            .extends(TypeRef::new("m.Root"))
            .annotated(Annotation::marker("Inheritance"))
            .annotated(Annotation::marker("Table").with_str("name", "THINGS")),
        entity("m.Leaf").extends(TypeRef::new("m.Mid")).field(field("name")),
    ];
    let outcome = infer(decls);

    let cols = columns_of(&outcome.schema, "THINGS");
    assert_eq!(cols.iter().filter(|c| c.as_str() == "DTYPE").count(), 1);
    assert!(!cols.contains(&"KIND".to_string()));
    assert_eq!(cols, vec!["DTYPE", "NAME"]);
}

/// Test that a discriminator also mapped as a field is not duplicated
#[test]
fn test_discriminator_field_collapses_with_synthetic_column() {
    let decls = vec![entity("m.Person")
        .annotated(Annotation::marker("DiscriminatorColumn").with_str("name", "person_type_code"))
        .field(field("personTypeCode"))
        .field(field("name"))];
    let outcome = infer(decls);

    assert_eq!(columns_of(&outcome.schema, "PERSON"), vec!["NAME", "PERSON_TYPE_CODE"]);
}

/// Test that entities sharing a table union their columns
#[test]
fn test_shared_table_unions_columns() {
    let decls = vec![
        entity("zoo.Animal")
            .annotated(Annotation::marker("Table").with_str("name", "ANIMALS"))
            .annotated(Annotation::marker("DiscriminatorColumn").with_str("name", "ANIMAL_TYPE"))
            .field(field("id"))
            .field(field("name")),
        entity("zoo.Cat").extends(TypeRef::new("zoo.Animal")).field(field("livesLeft")),
        entity("zoo.Dog").extends(TypeRef::new("zoo.Animal")).field(field("barkVolume")),
    ];
    let outcome = infer(decls);

    assert_eq!(outcome.schema.table_count(), 1);
    assert_eq!(
        columns_of(&outcome.schema, "ANIMALS"),
        vec!["ANIMAL_TYPE", "BARK_VOLUME", "ID", "LIVES_LEFT", "NAME"]
    );
}

/// Test that an unknown library base degrades to a warning
#[test]
fn test_unresolved_ancestor_is_reported_not_fatal() {
    let decls = vec![entity("m.Order")
        .extends(TypeRef::with_candidates(
            "AbstractPersistable",
            vec!["m.AbstractPersistable".into()],
        ))
        .field(field("total"))];
    let outcome = infer(decls);

    assert_eq!(columns_of(&outcome.schema, "ORDER"), vec!["TOTAL"]);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::UnresolvedAncestor);
}

// ============================================================================
// Fields, relationships, embedding
// ============================================================================

/// Test relationship columns and collection exclusion
#[test]
fn test_relationship_columns() {
    let decls = vec![entity("m.Pet")
        .field(FieldDescriptor::new("owner", TypeRef::new("m.Person")).annotated(Annotation::marker("ManyToOne")))
        .field(FieldDescriptor::new("primaryVet", TypeRef::new("m.Vet")).annotated(Annotation::marker("OneToOne")))
        .field(
            FieldDescriptor::new("house", TypeRef::new("m.House"))
                .annotated(Annotation::marker("ManyToOne"))
                .annotated(Annotation::marker("JoinColumn").with_str("name", "HOUSE_REF")),
        )
        .field(FieldDescriptor::new("toys", TypeRef::new("List")).annotated(Annotation::marker("OneToMany")))
        .field(FieldDescriptor::new("vets", TypeRef::new("Set")).annotated(Annotation::marker("ManyToMany")))];
    let outcome = infer(decls);

    assert_eq!(
        columns_of(&outcome.schema, "PET"),
        vec!["HOUSE_REF", "OWNER_ID", "PRIMARY_VET_ID"]
    );
}

/// Test embedded prefixes and override precedence over the embeddable's column
#[test]
fn test_embedded_columns_and_site_override() {
    let address = EntityTypeDescriptor::class("m.Address")
        .annotated(Annotation::marker("Embeddable"))
        .field(field("street"))
        .field(field("city").annotated(column("CITY_NAME")))
        .field(field("zipCode"));
    let customer = entity("m.Customer")
        .field(field("name"))
        .field(
            FieldDescriptor::new("homeAddress", TypeRef::new("m.Address"))
                .annotated(Annotation::marker("Embedded"))
                .annotated(attribute_override("city", "TOWN")),
        )
        .field(FieldDescriptor::new("billingAddress", TypeRef::new("m.Address")));
    let outcome = infer(vec![address, customer]);

    assert_eq!(
        columns_of(&outcome.schema, "CUSTOMER"),
        vec![
            "BILLING_ADDRESS_CITY_NAME",
            "BILLING_ADDRESS_STREET",
            "BILLING_ADDRESS_ZIP_CODE",
            "HOME_ADDRESS_STREET",
            "HOME_ADDRESS_TOWN",
            "HOME_ADDRESS_ZIP_CODE",
            "NAME",
        ]
    );

    let prefix = naming::convert("homeAddress");
    assert_eq!(prefix, "home_address");
}

/// Test that overrides flow toward the root only, never into siblings
#[test]
fn test_override_does_not_leak_into_sibling() {
    let base = EntityTypeDescriptor::class("m.Audited")
        .annotated(Annotation::marker("MappedSuperclass"))
        .field(field("createdBy"));
    let invoice = entity("m.Invoice")
        .extends(TypeRef::new("m.Audited"))
        .annotated(attribute_override("createdBy", "ISSUER"));
    let receipt = entity("m.Receipt").extends(TypeRef::new("m.Audited"));
    let outcome = infer(vec![base, invoice, receipt]);

    assert_eq!(columns_of(&outcome.schema, "INVOICE"), vec!["ISSUER"]);
    assert_eq!(columns_of(&outcome.schema, "RECEIPT"), vec!["CREATED_BY"]);
}

/// Test that the nearest override wins over one declared further up
#[test]
fn test_nearest_override_wins() {
    let decls = vec![
        EntityTypeDescriptor::class("m.Base").field(field("code")),
        EntityTypeDescriptor::class("m.Mid")
            .extends(TypeRef::new("m.Base"))
            .annotated(attribute_override("code", "MID_CODE")),
        entity("m.Leaf")
            .extends(TypeRef::new("m.Mid"))
            .annotated(attribute_override("code", "LEAF_CODE")),
    ];
    let outcome = infer(decls);

    assert_eq!(columns_of(&outcome.schema, "LEAF"), vec!["LEAF_CODE"]);
}

/// Test static, transient and modifier-transient fields are skipped
#[test]
fn test_unmapped_fields() {
    use schemadrift_mapping::Modifiers;

    let decls = vec![entity("m.Vet")
        .field(field("name"))
        .field(field("cache").annotated(Annotation::marker("Transient")))
        .field(field("serialVersionUID").with_modifiers(Modifiers {
            is_static: true,
            is_final: true,
            ..Modifiers::default()
        }))
        .field(field("scratch").with_modifiers(Modifiers {
            is_transient: true,
            ..Modifiers::default()
        }))];
    let outcome = infer(decls);

    assert_eq!(columns_of(&outcome.schema, "VET"), vec!["NAME"]);
}

/// Test the inverse one-to-one switch
#[test]
fn test_inverse_one_to_one_exclusion() {
    let decls = vec![entity("m.User").field(
        FieldDescriptor::new("profile", TypeRef::new("m.Profile"))
            .annotated(Annotation::marker("OneToOne").with_str("mappedBy", "user")),
    )];

    let default_run = infer(decls.clone());
    assert_eq!(columns_of(&default_run.schema, "USER"), vec!["PROFILE_ID"]);

    let ctx = InferenceContext::default().with_inverse_relationships_excluded(true);
    let excluded = SchemaInferenceDriver::new(&ctx).infer(decls).unwrap();
    assert!(excluded
        .schema
        .columns(&Identifier::new("USER"))
        .map(|c| c.is_empty())
        .unwrap_or(true));
}
