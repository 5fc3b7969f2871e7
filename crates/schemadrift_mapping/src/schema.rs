//! Canonical schema: the comparison currency between inferred and extracted
//! structures.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A table or column name, trimmed and upper-cased on construction so
/// equality is case-insensitive by the time two names meet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered mapping from table name to its set of column names.
///
/// Inserting a table that already exists unions the column sets, which is
/// what makes several entities sharing one table collapse into one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSchema {
    tables: BTreeMap<Identifier, BTreeSet<Identifier>>,
}

impl CanonicalSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with the given columns, unioning with any existing entry.
    pub fn insert_table(
        &mut self,
        table: Identifier,
        columns: impl IntoIterator<Item = Identifier>,
    ) {
        let entry = self.tables.entry(table).or_default();
        entry.extend(columns.into_iter().filter(|c| !c.is_empty()));
    }

    /// Add one column to a table, creating the table if needed.
    pub fn insert_column(&mut self, table: Identifier, column: Identifier) {
        self.insert_table(table, std::iter::once(column));
    }

    /// Union another schema into this one.
    pub fn merge(&mut self, other: CanonicalSchema) {
        for (table, columns) in other.tables {
            self.insert_table(table, columns);
        }
    }

    pub fn columns(&self, table: &Identifier) -> Option<&BTreeSet<Identifier>> {
        self.tables.get(table)
    }

    pub fn contains_table(&self, table: &Identifier) -> bool {
        self.tables.contains_key(table)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&Identifier, &BTreeSet<Identifier>)> {
        self.tables.iter()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &Identifier> {
        self.tables.keys()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<(Identifier, Identifier)> for CanonicalSchema {
    fn from_iter<I: IntoIterator<Item = (Identifier, Identifier)>>(iter: I) -> Self {
        let mut schema = CanonicalSchema::new();
        for (table, column) in iter {
            schema.insert_column(table, column);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<Identifier> {
        names.iter().map(|n| Identifier::new(n)).collect()
    }

    #[test]
    fn test_identifier_normalizes_case_and_whitespace() {
        assert_eq!(Identifier::new("  first_name "), Identifier::new("FIRST_NAME"));
        assert_eq!(Identifier::new("person").as_str(), "PERSON");
    }

    #[test]
    fn test_insert_table_unions_columns() {
        let mut schema = CanonicalSchema::new();
        schema.insert_table(Identifier::new("animals"), ids(&["id", "name"]));
        schema.insert_table(Identifier::new("ANIMALS"), ids(&["NAME", "lives"]));

        assert_eq!(schema.table_count(), 1);
        let cols = schema.columns(&Identifier::new("animals")).unwrap();
        assert_eq!(cols.len(), 3);
        assert!(cols.contains(&Identifier::new("LIVES")));
    }

    #[test]
    fn test_empty_column_names_are_dropped() {
        let mut schema = CanonicalSchema::new();
        schema.insert_table(Identifier::new("t"), ids(&["", "  ", "a"]));
        assert_eq!(schema.column_count(), 1);
    }

    #[test]
    fn test_from_pairs_and_serde_shape() {
        let schema: CanonicalSchema = vec![
            (Identifier::new("b"), Identifier::new("y")),
            (Identifier::new("a"), Identifier::new("x")),
            (Identifier::new("b"), Identifier::new("z")),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"{"A":["X"],"B":["Y","Z"]}"#);

        let back: CanonicalSchema = serde_json::from_str(r#"{"a":["x"],"B":["y","Z"]}"#).unwrap();
        assert_eq!(back, schema);
    }
}
