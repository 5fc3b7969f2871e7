//! Live database catalog extraction.
//!
//! Connects to a deployed database and reads the base tables of one schema
//! together with their column names, producing the same
//! [`CanonicalSchema`](schemadrift_mapping::CanonicalSchema) shape the
//! mapping inference produces so the two can be compared directly.
//!
//! # Supported databases
//!
//! - **PostgreSQL** (`postgres` feature): `information_schema` base tables of
//!   the configured schema (default `public`).
//! - **SQLite** (`sqlite` feature): `sqlite_master` tables with
//!   `pragma_table_info`; the database is a file path opened read-only.
//! - **Oracle** (`oracle` feature, off by default): tables of one owner (the
//!   configured schema, else the connecting user) from `ALL_TABLES` and
//!   `ALL_TAB_COLUMNS`, reached at `//host:port/service`. Needs the Oracle
//!   client libraries at run time.
//!
//! Any other database type is rejected before a connection is attempted.

mod config;
mod error;
mod extract;

pub use config::{
    CatalogConfig, DatabaseKind, DEFAULT_ORACLE_PORT, DEFAULT_PG_PORT, DEFAULT_PG_SCHEMA,
};
pub use error::{CatalogError, DriverError, Result};
pub use extract::{extract_schema, shape, CatalogRow};
