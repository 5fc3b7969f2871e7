//! Catalog metadata extraction.
//!
//! Each backend lists base tables and their columns in one query and the
//! rows are shaped into a [`CanonicalSchema`]. Oracle reads the tables of
//! one owner from the `ALL_TABLES` and `ALL_TAB_COLUMNS` dictionary views.
//! Views and engine-internal tables are never included. A table without
//! columns still appears.

use crate::config::{CatalogConfig, DatabaseKind};
use crate::error::{CatalogError, Result};
use schemadrift_mapping::{CanonicalSchema, Identifier};
use std::time::Instant;
use tracing::{debug, info};

/// `(table, column)` rows; `column` is `None` for a table with no columns.
pub type CatalogRow = (String, Option<String>);

#[cfg(feature = "postgres")]
const PG_COLUMNS_QUERY: &str = r#"
SELECT t.table_name::text, c.column_name::text
FROM information_schema.tables t
LEFT JOIN information_schema.columns c
  ON c.table_schema = t.table_schema AND c.table_name = t.table_name
WHERE t.table_schema = $1 AND t.table_type = 'BASE TABLE'
ORDER BY t.table_name, c.ordinal_position
"#;

#[cfg(feature = "sqlite")]
const SQLITE_COLUMNS_QUERY: &str = r#"
SELECT m.name, p.name
FROM sqlite_master AS m
LEFT JOIN pragma_table_info(m.name) AS p
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite\_%' ESCAPE '\'
ORDER BY m.name, p.cid
"#;

#[cfg(feature = "oracle")]
const ORACLE_COLUMNS_QUERY: &str = r#"
SELECT t.table_name, c.column_name
FROM all_tables t
LEFT JOIN all_tab_columns c
  ON c.owner = t.owner AND c.table_name = t.table_name
WHERE t.owner = :1 AND t.dropped = 'NO'
ORDER BY t.table_name, c.column_id
"#;

/// Read the catalog described by `config`.
///
/// Configuration problems are reported before any connection attempt.
pub async fn extract_schema(config: &CatalogConfig) -> Result<CanonicalSchema> {
    config.validate()?;
    let start = Instant::now();
    let target = config.target();
    debug!(target = %target, "Reading catalog");

    let rows = match config.kind {
        DatabaseKind::Postgres => read_postgres(config).await?,
        DatabaseKind::Sqlite => read_sqlite(config).await?,
        DatabaseKind::Oracle => read_oracle(config).await?,
    };
    let schema = shape(rows);

    info!(
        target = %target,
        tables = schema.table_count(),
        columns = schema.column_count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Catalog extracted"
    );
    Ok(schema)
}

/// Fold catalog rows into a schema, upper-casing every name.
pub fn shape(rows: impl IntoIterator<Item = CatalogRow>) -> CanonicalSchema {
    let mut schema = CanonicalSchema::new();
    for (table, column) in rows {
        let table = Identifier::new(table);
        match column {
            Some(column) => schema.insert_column(table, Identifier::new(column)),
            None => schema.insert_table(table, std::iter::empty()),
        }
    }
    schema
}

#[cfg(feature = "postgres")]
async fn read_postgres(config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    let target = config.target();
    let mut options = PgConnectOptions::new()
        .host(config.host.as_deref().unwrap_or("localhost"))
        .port(config.port.unwrap_or(crate::config::DEFAULT_PG_PORT))
        .database(&config.database);
    if let Some(user) = config.user.as_deref() {
        options = options.username(user);
    }
    if let Some(password) = config.password.as_deref() {
        options = options.password(password);
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|source| CatalogError::connection(&target, source))?;
    info!(target = %target, "Connected to postgres database");

    let rows = sqlx::query_as::<_, CatalogRow>(PG_COLUMNS_QUERY)
        .bind(config.effective_schema())
        .fetch_all(&pool)
        .await
        .map_err(|source| CatalogError::metadata_query(&target, source))?;
    pool.close().await;
    Ok(rows)
}

#[cfg(not(feature = "postgres"))]
async fn read_postgres(_config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    Err(CatalogError::NotCompiled {
        kind: DatabaseKind::Postgres.to_string(),
        feature: "postgres",
    })
}

#[cfg(feature = "sqlite")]
async fn read_sqlite(config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    let target = config.target();
    let options = SqliteConnectOptions::new()
        .filename(&config.database)
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|source| CatalogError::connection(&target, source))?;
    info!(target = %target, "Connected to sqlite database");

    let rows = sqlx::query_as::<_, CatalogRow>(SQLITE_COLUMNS_QUERY)
        .fetch_all(&pool)
        .await
        .map_err(|source| CatalogError::metadata_query(&target, source))?;
    pool.close().await;
    Ok(rows)
}

#[cfg(not(feature = "sqlite"))]
async fn read_sqlite(_config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    Err(CatalogError::NotCompiled {
        kind: DatabaseKind::Sqlite.to_string(),
        feature: "sqlite",
    })
}

/// The Oracle driver is blocking, so the whole read runs on the blocking
/// pool.
#[cfg(feature = "oracle")]
async fn read_oracle(config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    let config = config.clone();
    let target = config.target();
    tokio::task::spawn_blocking(move || read_oracle_blocking(&config))
        .await
        .map_err(|source| CatalogError::connection(target, source))?
}

#[cfg(feature = "oracle")]
fn read_oracle_blocking(config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    let target = config.target();
    let conn = oracle::Connection::connect(
        config.user.as_deref().unwrap_or_default(),
        config.password.as_deref().unwrap_or_default(),
        config.connect_string(),
    )
    .map_err(|source| CatalogError::connection(&target, source))?;
    info!(target = %target, "Connected to oracle database");

    let owner = config.effective_owner();
    debug!(owner = %owner, "Reading tables of owner");
    let rows = conn
        .query_as::<CatalogRow>(ORACLE_COLUMNS_QUERY, &[&owner])
        .map_err(|source| CatalogError::metadata_query(&target, source))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| CatalogError::metadata_query(&target, source))?;

    if let Err(err) = conn.close() {
        debug!(target = %target, error = %err, "Closing oracle connection failed");
    }
    Ok(rows)
}

#[cfg(not(feature = "oracle"))]
async fn read_oracle(_config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    Err(CatalogError::NotCompiled {
        kind: DatabaseKind::Oracle.to_string(),
        feature: "oracle",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_upper_cases_and_keeps_empty_tables() {
        let schema = shape(vec![
            ("orders".to_string(), Some("id".to_string())),
            ("orders".to_string(), Some("customer_name".to_string())),
            ("audit".to_string(), None),
        ]);

        assert_eq!(schema.table_count(), 2);
        let orders: Vec<_> = schema
            .columns(&Identifier::new("ORDERS"))
            .unwrap()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(orders, vec!["CUSTOMER_NAME", "ID"]);
        assert!(schema.columns(&Identifier::new("AUDIT")).unwrap().is_empty());
    }

    #[cfg(not(feature = "oracle"))]
    #[tokio::test]
    async fn test_oracle_without_backend_is_unsupported_input() {
        let config = CatalogConfig::oracle("db.internal", "ORCLPDB1").with_credentials("hr", None);
        let err = extract_schema(&config).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotCompiled { feature: "oracle", .. }));
        assert!(err.is_unsupported_input());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_connecting() {
        let config = CatalogConfig::postgres("", "app").with_credentials("app", None);
        let err = extract_schema(&config).await.unwrap_err();
        assert!(err.is_unsupported_input());
    }
}
