//! End-to-end inference over the zoo fixture source tree.

use schemadrift_java::{FrontEndError, SourceTree};
use schemadrift_mapping::{
    CanonicalSchema, DeclarationSource, Identifier, InferenceContext, MappingError,
    SchemaInferenceDriver,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn zoo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/zoo")
}

fn columns_of(schema: &CanonicalSchema, table: &str) -> Vec<String> {
    schema
        .columns(&Identifier::new(table))
        .unwrap_or_else(|| panic!("table {table} missing"))
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn infer_zoo(ctx: &InferenceContext) -> schemadrift_mapping::InferenceOutcome {
    let tree = SourceTree::new(zoo_root()).with_workers(2);
    let sources: [&dyn DeclarationSource; 1] = [&tree];
    SchemaInferenceDriver::new(ctx).run(&sources).unwrap()
}

// ============================================================================
// Full fixture
// ============================================================================

/// Test the table set inferred from the fixture tree
#[test]
fn test_zoo_tables() {
    let outcome = infer_zoo(&InferenceContext::default());
    let tables: Vec<String> = outcome.schema.table_names().map(|t| t.to_string()).collect();

    assert_eq!(tables, vec!["ANIMALS", "BADGES", "EGG", "VISITOR", "ZOO_KEEPER"]);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.entities_resolved, 6);
}

/// Test single-table union, discriminator, override and embedded prefixing
#[test]
fn test_zoo_single_table_hierarchy() {
    let outcome = infer_zoo(&InferenceContext::default());

    assert_eq!(
        columns_of(&outcome.schema, "ANIMALS"),
        vec![
            "BORN_ON",
            "DEN_STREET_LINE",
            "DEN_ZIP_CODE",
            "FLIPPER_SPAN",
            "ID",
            "KEEPER_ID",
            "KIND",
            "MANE_LENGTH",
            "NAME",
            "VERSION",
        ]
    );
}

/// Test entity-name tables, join columns, implicit embedding and skipped collections
#[test]
fn test_zoo_keeper_and_members() {
    let outcome = infer_zoo(&InferenceContext::default());

    assert_eq!(
        columns_of(&outcome.schema, "ZOO_KEEPER"),
        vec![
            "BADGE_REF",
            "FULL_NAME",
            "ID",
            "QUARTERS_STREET",
            "QUARTERS_ZIP_CODE",
            "SHIFT",
            "VERSION",
        ]
    );
    assert_eq!(
        columns_of(&outcome.schema, "EGG"),
        vec!["ID", "MARKINGS", "PARENT_ID", "VERSION"]
    );
    assert_eq!(
        columns_of(&outcome.schema, "BADGES"),
        vec!["CODE", "HOLDER_ID", "ID", "VERSION"]
    );
}

/// Test that an embeddable imported from another package is flattened
#[test]
fn test_zoo_cross_package_embeddable() {
    let outcome = infer_zoo(&InferenceContext::default());

    assert_eq!(
        columns_of(&outcome.schema, "VISITOR"),
        vec!["EMAIL", "HOME_ADDRESS_STREET", "HOME_ADDRESS_ZIP_CODE", "TICKET_NO"]
    );
}

/// Test the inverse one-to-one switch against the fixture
#[test]
fn test_zoo_inverse_one_to_one_excluded() {
    let ctx = InferenceContext::default().with_inverse_relationships_excluded(true);
    let outcome = infer_zoo(&ctx);

    assert_eq!(
        columns_of(&outcome.schema, "BADGES"),
        vec!["CODE", "ID", "VERSION"]
    );
}

/// Test that the root namespace restricts which entities are resolved
#[test]
fn test_zoo_root_namespace() {
    let ctx = InferenceContext::default().with_root_namespace("com.zoo.people");
    let outcome = infer_zoo(&ctx);

    assert_eq!(outcome.schema.table_count(), 1);
    assert!(outcome.schema.contains_table(&Identifier::new("VISITOR")));
}

// ============================================================================
// Failures
// ============================================================================

/// Test that one bad unit fails the whole run and names the file
#[test]
fn test_bad_unit_fails_run() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("Ok.java"),
        "@jakarta.persistence.Entity class Ok { String a; }",
    )
    .unwrap();
    std::fs::write(tmp.path().join("Broken.java"), "class Broken { String a }").unwrap();

    let tree = SourceTree::new(tmp.path());
    let sources: [&dyn DeclarationSource; 1] = [&tree];
    let ctx = InferenceContext::default();
    let err = SchemaInferenceDriver::new(&ctx).run(&sources).unwrap_err();

    match err {
        MappingError::Malformed { origin, .. } => assert!(origin.ends_with("Broken.java")),
        other => panic!("unexpected error: {other}"),
    }
}

/// Test that a missing root is reported as an invalid root
#[test]
fn test_missing_root() {
    let err = SourceTree::new("/no/such/source/root").load_all().unwrap_err();
    assert!(matches!(err, FrontEndError::InvalidRoot { .. }));

    let mapped: MappingError = err.into();
    assert!(matches!(mapped, MappingError::InvalidRoot { .. }));
}
