//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use schemadrift_mapping::DuplicatePolicy;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "schemadrift",
    version,
    about = "Detect drift between JPA entity mappings and a live database schema"
)]
pub struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (default: ./schemadrift.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Machine-readable output requested; errors are printed as JSON too.
    pub fn wants_json(&self) -> bool {
        match &self.command {
            Commands::Detect { json, .. } | Commands::Compare { json, .. } => *json,
            Commands::Infer { .. } | Commands::Extract { .. } => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer the mapped schema from entity sources and write it as YAML
    Infer {
        #[command(flatten)]
        sources: SourceArgs,

        #[command(flatten)]
        inference: InferenceArgs,

        /// Output file (default: mapping_schema.yml in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read a live database catalog and write it as YAML
    Extract {
        #[command(flatten)]
        database: DatabaseArgs,

        /// Output file (default: database_schema.yml in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Infer, extract, compare and write all reports
    Detect {
        #[command(flatten)]
        sources: SourceArgs,

        #[command(flatten)]
        inference: InferenceArgs,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Directory for the schema files and drift report
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Print the drift report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Exit with status 1 when drift is found
        #[arg(long)]
        fail_on_drift: bool,
    },

    /// Compare two previously written schema files
    Compare {
        /// Schema inferred from the entity mapping
        mapping: PathBuf,

        /// Schema extracted from the database
        database: PathBuf,

        /// Also write the drift report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Print the drift report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Exit with status 1 when drift is found
        #[arg(long)]
        fail_on_drift: bool,
    },
}

/// Where entity declarations come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Java source root (e.g. src/main/java)
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Compiled classes: a directory or a .jar/.zip archive (repeatable)
    #[arg(long, value_name = "PATH")]
    pub classpath: Vec<PathBuf>,

    /// Only resolve entities under this package
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InferenceArgs {
    /// Column name used when an inheritance root declares no discriminator
    #[arg(long, value_name = "COLUMN")]
    pub discriminator_column: Option<String>,

    /// What to do when two units declare the same type
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicateChoice>,

    /// Skip one-to-one fields on the inverse (mappedBy) side
    #[arg(long)]
    pub exclude_inverse: bool,

    /// Worker threads for parsing and resolution (0 = one per CPU)
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Catalog connection settings.
#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// Database type: postgres, sqlite or oracle
    #[arg(long, value_name = "TYPE")]
    pub db_type: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long, env = "SCHEMADRIFT_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name (sqlite: the database file, oracle: the service name)
    #[arg(long, value_name = "NAME")]
    pub dbname: Option<String>,

    /// Schema whose tables are read (postgres default: public; oracle: the
    /// owner, default: the user)
    #[arg(long)]
    pub schema: Option<String>,
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateChoice {
    /// Fail the run
    Reject,
    /// Keep the declaration whose origin sorts first
    FirstByOrigin,
}

impl From<DuplicateChoice> for DuplicatePolicy {
    fn from(choice: DuplicateChoice) -> Self {
        match choice {
            DuplicateChoice::Reject => DuplicatePolicy::Reject,
            DuplicateChoice::FirstByOrigin => DuplicatePolicy::FirstByOrigin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_detect_arguments() {
        let cli = Cli::try_parse_from([
            "schemadrift",
            "detect",
            "--source-dir",
            "src/main/java",
            "--classpath",
            "a.jar",
            "--classpath",
            "b.jar",
            "--db-type",
            "sqlite",
            "--dbname",
            "zoo.db",
            "--duplicates",
            "first-by-origin",
            "--json",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(cli.wants_json());
        match cli.command {
            Commands::Detect {
                sources,
                inference,
                database,
                fail_on_drift,
                ..
            } => {
                assert_eq!(sources.classpath.len(), 2);
                assert_eq!(inference.duplicates, Some(DuplicateChoice::FirstByOrigin));
                assert_eq!(database.dbname.as_deref(), Some("zoo.db"));
                assert!(!fail_on_drift);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let err = Cli::try_parse_from(["schemadrift", "-v", "-q", "compare", "a.yml", "b.yml"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
