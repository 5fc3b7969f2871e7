//! schemadrift: detect drift between JPA entity mappings and a database.
//!
//! The library side of the `schemadrift` binary. Inference lives in
//! `schemadrift_mapping`, the Java front-ends in `schemadrift_java` and the
//! catalog reader in `schemadrift_catalog`; this crate wires them to the
//! command line, compares the two schemas and writes the reports.

pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod output;
pub mod report;
pub mod run;

pub use compare::{compare, ColumnDrift, DriftReport};
pub use error::{DriftError, ErrorKind, Result};
pub use run::{run, RunOutcome};
