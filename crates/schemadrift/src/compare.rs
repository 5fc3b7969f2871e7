//! Structural comparison of two canonical schemas.

use schemadrift_mapping::{CanonicalSchema, Identifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column differences for one table present on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub only_in_mapping: Vec<String>,
    pub only_in_database: Vec<String>,
}

impl ColumnDrift {
    pub fn is_empty(&self) -> bool {
        self.only_in_mapping.is_empty() && self.only_in_database.is_empty()
    }
}

/// Everything that differs between the mapped and the deployed schema.
///
/// Names are upper-case and every list is sorted. Only tables that actually
/// drifted appear in `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub tables_only_in_mapping: Vec<String>,
    pub tables_only_in_database: Vec<String>,
    pub columns: BTreeMap<String, ColumnDrift>,
    /// Tables present on both sides.
    pub tables_compared: usize,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.tables_only_in_mapping.is_empty()
            && self.tables_only_in_database.is_empty()
            && self.columns.is_empty()
    }

    /// Number of individual differences (missing tables plus missing columns).
    pub fn finding_count(&self) -> usize {
        self.tables_only_in_mapping.len()
            + self.tables_only_in_database.len()
            + self
                .columns
                .values()
                .map(|c| c.only_in_mapping.len() + c.only_in_database.len())
                .sum::<usize>()
    }
}

/// Compare the inferred mapping schema against the database schema.
pub fn compare(mapping: &CanonicalSchema, database: &CanonicalSchema) -> DriftReport {
    let mut report = DriftReport::default();

    for (table, mapped_columns) in mapping.tables() {
        let Some(db_columns) = database.columns(table) else {
            report.tables_only_in_mapping.push(table.to_string());
            continue;
        };
        report.tables_compared += 1;

        let drift = ColumnDrift {
            only_in_mapping: difference(mapped_columns.iter(), |c| db_columns.contains(c)),
            only_in_database: difference(db_columns.iter(), |c| mapped_columns.contains(c)),
        };
        if !drift.is_empty() {
            report.columns.insert(table.to_string(), drift);
        }
    }

    report.tables_only_in_database = database
        .table_names()
        .filter(|t| !mapping.contains_table(t))
        .map(|t| t.to_string())
        .collect();

    report
}

// Inputs iterate in sorted order, so outputs are sorted too.
fn difference<'a>(
    columns: impl Iterator<Item = &'a Identifier>,
    present: impl Fn(&Identifier) -> bool,
) -> Vec<String> {
    columns
        .filter(|c| !present(c))
        .map(|c| c.to_string())
        .collect()
}
