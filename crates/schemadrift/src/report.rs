//! Schema and drift report files.
//!
//! Schema files hold one top-level key naming their source:
//!
//! ```yaml
//! JPA_ENTITIES:
//!   ANIMALS:
//!     COLUMNS:
//!     - ID
//!     - NAME
//! ```
//!
//! Everything is keyed through `BTreeMap`s, so the same schema always
//! renders to the same bytes.

use crate::compare::DriftReport;
use crate::error::{DriftError, Result};
use chrono::{DateTime, Utc};
use schemadrift_mapping::{CanonicalSchema, Diagnostic, Identifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Top-level key of a schema inferred from entity declarations.
pub const MAPPING_SOURCE_KEY: &str = "JPA_ENTITIES";
/// Top-level key of a schema read from a database catalog.
pub const DATABASE_SOURCE_KEY: &str = "DATABASE_TABLES";

#[derive(Debug, Serialize, Deserialize)]
struct TableEntry {
    #[serde(rename = "COLUMNS", default)]
    columns: Vec<String>,
}

type SchemaDocument = BTreeMap<String, BTreeMap<String, TableEntry>>;

/// Render `schema` as a schema document under `source_key`.
pub fn render_schema(source_key: &str, schema: &CanonicalSchema) -> Result<String> {
    let tables = schema
        .tables()
        .map(|(table, columns)| {
            let entry = TableEntry {
                columns: columns.iter().map(|c| c.to_string()).collect(),
            };
            (table.to_string(), entry)
        })
        .collect();
    let mut document = SchemaDocument::new();
    document.insert(source_key.to_string(), tables);

    serde_yaml::to_string(&document).map_err(|e| DriftError::Serialize {
        what: "schema",
        message: e.to_string(),
    })
}

pub fn write_schema(path: &Path, source_key: &str, schema: &CanonicalSchema) -> Result<()> {
    let text = render_schema(source_key, schema)?;
    write_file(path, &text)?;
    info!(
        path = %path.display(),
        source = source_key,
        tables = schema.table_count(),
        "Schema written"
    );
    Ok(())
}

/// Parse a schema document, returning its source key and schema.
pub fn parse_schema(text: &str, path: &Path) -> Result<(String, CanonicalSchema)> {
    let format_error = |message: String| DriftError::SchemaFormat {
        path: path.to_path_buf(),
        message,
    };

    let document: SchemaDocument =
        serde_yaml::from_str(text).map_err(|e| format_error(e.to_string()))?;
    let mut sources = document.into_iter();
    let (source_key, tables) = sources
        .next()
        .ok_or_else(|| format_error("document is empty".to_string()))?;
    if let Some((extra, _)) = sources.next() {
        return Err(format_error(format!(
            "expected one top-level source key, found '{source_key}' and '{extra}'"
        )));
    }

    let mut schema = CanonicalSchema::new();
    for (table, entry) in tables {
        let table = Identifier::new(table);
        if table.is_empty() {
            return Err(format_error("blank table name".to_string()));
        }
        schema.insert_table(table, entry.columns.iter().map(Identifier::new));
    }
    Ok((source_key, schema))
}

pub fn read_schema(path: &Path) -> Result<(String, CanonicalSchema)> {
    let text = fs::read_to_string(path).map_err(|source| DriftError::SchemaRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&text, path)
}

/// Size of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    /// Where the schema came from: a source root, a catalog target, a file.
    pub source: String,
    pub tables: usize,
    pub columns: usize,
}

impl SchemaSummary {
    pub fn new(source: impl Into<String>, schema: &CanonicalSchema) -> Self {
        Self {
            source: source.into(),
            tables: schema.table_count(),
            columns: schema.column_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    Clean,
    Drift,
}

/// The drift report as written to `drift_report.yml` or printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub status: DriftStatus,
    pub mapping: SchemaSummary,
    pub database: SchemaSummary,
    pub drift: &'a DriftReport,
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> ReportDocument<'a> {
    pub fn new(
        mapping: SchemaSummary,
        database: SchemaSummary,
        drift: &'a DriftReport,
        diagnostics: &'a [Diagnostic],
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            status: if drift.is_clean() {
                DriftStatus::Clean
            } else {
                DriftStatus::Drift
            },
            mapping,
            database,
            drift,
            diagnostics,
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| DriftError::Serialize {
            what: "drift report",
            message: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DriftError::Serialize {
            what: "drift report",
            message: e.to_string(),
        })
    }

    pub fn write_yaml(&self, path: &Path) -> Result<()> {
        write_file(path, &self.to_yaml()?)?;
        info!(path = %path.display(), status = ?self.status, "Drift report written");
        Ok(())
    }
}

/// Write `contents`, creating missing parent directories.
fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DriftError::write(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| DriftError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use schemadrift_mapping::DiagnosticKind;
    use tempfile::TempDir;

    fn sample() -> CanonicalSchema {
        let mut schema = CanonicalSchema::new();
        schema.insert_table(
            Identifier::new("ANIMALS"),
            ["NAME", "ID", "KIND"].map(Identifier::new),
        );
        schema.insert_table(Identifier::new("AUDIT"), std::iter::empty());
        schema
    }

    #[test]
    fn test_render_is_stable_and_sorted() {
        let mut reversed = CanonicalSchema::new();
        reversed.insert_table(Identifier::new("AUDIT"), std::iter::empty());
        for column in ["KIND", "ID", "NAME"] {
            reversed.insert_column(Identifier::new("ANIMALS"), Identifier::new(column));
        }

        let a = render_schema(MAPPING_SOURCE_KEY, &sample()).unwrap();
        let b = render_schema(MAPPING_SOURCE_KEY, &reversed).unwrap();
        assert_eq!(a, b);

        assert!(a.starts_with("JPA_ENTITIES:"));
        let id = a.find("- ID").unwrap();
        let kind = a.find("- KIND").unwrap();
        let name = a.find("- NAME").unwrap();
        assert!(id < kind && kind < name);
        assert!(a.find("ANIMALS").unwrap() < a.find("AUDIT").unwrap());
    }

    #[test]
    fn test_parse_rendered_schema() {
        let text = render_schema(DATABASE_SOURCE_KEY, &sample()).unwrap();
        let (key, schema) = parse_schema(&text, Path::new("db.yml")).unwrap();
        assert_eq!(key, DATABASE_SOURCE_KEY);
        assert_eq!(schema, sample());
    }

    #[test]
    fn test_parse_normalizes_case_and_missing_columns() {
        let text = "DATABASE_TABLES:\n  orders:\n    COLUMNS: [id, Total]\n  audit: {}\n";
        let (_, schema) = parse_schema(text, Path::new("db.yml")).unwrap();
        let orders: Vec<&str> = schema
            .columns(&Identifier::new("ORDERS"))
            .unwrap()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(orders, vec!["ID", "TOTAL"]);
        assert!(schema.contains_table(&Identifier::new("AUDIT")));
    }

    #[test]
    fn test_parse_rejects_bad_documents() {
        let path = Path::new("bad.yml");
        for text in ["", "A: {}\nB: {}\n", "JPA_ENTITIES: [1, 2]\n", "- just\n- a list\n"] {
            let err = parse_schema(text, path).unwrap_err();
            assert!(matches!(err, DriftError::SchemaFormat { .. }), "{text:?}");
        }
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/nested/mapping_schema.yml");
        write_schema(&path, MAPPING_SOURCE_KEY, &sample()).unwrap();
        let (key, schema) = read_schema(&path).unwrap();
        assert_eq!(key, MAPPING_SOURCE_KEY);
        assert_eq!(schema.table_count(), 2);
    }

    #[test]
    fn test_report_document_formats() {
        let mapping = sample();
        let mut database = sample();
        database.insert_column(Identifier::new("ANIMALS"), Identifier::new("LEGACY"));
        let drift = compare(&mapping, &database);
        let diagnostics = vec![Diagnostic::new(
            DiagnosticKind::UnresolvedAncestor,
            "com.zoo.Lion",
            "ancestor 'lib.Base' is not declared",
        )];

        let doc = ReportDocument::new(
            SchemaSummary::new("source tree src", &mapping),
            SchemaSummary::new("sqlite:zoo.db", &database),
            &drift,
            &diagnostics,
        );
        assert_eq!(doc.status, DriftStatus::Drift);

        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "drift");
        assert_eq!(json["drift"]["columns"]["ANIMALS"]["only_in_database"][0], "LEGACY");
        assert_eq!(json["diagnostics"][0]["kind"], "unresolved_ancestor");
        assert_eq!(json["mapping"]["tables"], 2);
        assert!(json["generated_at"].as_str().is_some());

        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.contains("status: drift"));
        assert!(yaml.contains("LEGACY"));
    }
}
