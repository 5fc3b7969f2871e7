//! Layered run settings: command line over `schemadrift.toml` over defaults.
//!
//! ```toml
//! [database]
//! type = "postgres"
//! host = "db.internal"
//! user = "drift"
//! dbname = "app"
//! schema = "public"
//!
//! [sources]
//! source_dir = "src/main/java"
//! namespace = "com.acme"
//!
//! [inference]
//! duplicates = "reject"
//!
//! [output]
//! directory = "target/drift"
//! ```
//!
//! Relative paths in the file are taken relative to the file's directory.
//! Every required setting is checked here, before any work starts.

use crate::cli::{DatabaseArgs, DuplicateChoice, InferenceArgs, SourceArgs};
use crate::error::{DriftError, Result};
use schemadrift_catalog::{CatalogConfig, DatabaseKind};
use schemadrift_mapping::{InferenceContext, DEFAULT_DISCRIMINATOR_COLUMN};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "schemadrift.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: DatabaseSection,
    pub sources: SourcesSection,
    pub inference: InferenceSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    #[serde(rename = "type")]
    pub db_type: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
    pub schema: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesSection {
    pub source_dir: Option<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceSection {
    pub discriminator_column: Option<String>,
    pub duplicates: Option<DuplicateChoice>,
    pub exclude_inverse_relationships: bool,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Defaults to the working directory.
    pub directory: Option<PathBuf>,
    #[serde(default = "default_mapping_file")]
    pub mapping_file: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

fn default_mapping_file() -> String {
    "mapping_schema.yml".to_string()
}

fn default_database_file() -> String {
    "database_schema.yml".to_string()
}

fn default_report_file() -> String {
    "drift_report.yml".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: None,
            mapping_file: default_mapping_file(),
            database_file: default_database_file(),
            report_file: default_report_file(),
        }
    }
}

impl FileConfig {
    /// Load a configuration file, resolving its relative paths against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| DriftError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: FileConfig = toml::from_str(&text).map_err(|source| DriftError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.rebase(base);
        }
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// The explicit file if given (it must exist), else `schemadrift.toml`
    /// in `dir` when present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(dir) = self.sources.source_dir.as_mut() {
            join(dir);
        }
        self.sources.classpath.iter_mut().for_each(join);
        if let Some(dir) = self.output.directory.as_mut() {
            join(dir);
        }
        if let Some(db) = self.database.dbname.as_mut() {
            // For sqlite the database name is a file path.
            let is_sqlite = self
                .database
                .db_type
                .as_deref()
                .and_then(|t| t.parse::<DatabaseKind>().ok())
                == Some(DatabaseKind::Sqlite);
            if is_sqlite && Path::new(db.as_str()).is_relative() {
                *db = base.join(db.as_str()).to_string_lossy().into_owned();
            }
        }
    }

    /// Path of the mapping schema file, unless the command line names one.
    pub fn mapping_output(&self, dir: Option<&Path>) -> PathBuf {
        self.output_dir(dir).join(&self.output.mapping_file)
    }

    pub fn database_output(&self, dir: Option<&Path>) -> PathBuf {
        self.output_dir(dir).join(&self.output.database_file)
    }

    pub fn report_output(&self, dir: Option<&Path>) -> PathBuf {
        self.output_dir(dir).join(&self.output.report_file)
    }

    fn output_dir(&self, dir: Option<&Path>) -> PathBuf {
        dir.or(self.output.directory.as_deref())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    }
}

/// Declaration roots for one inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    pub source_dir: Option<PathBuf>,
    pub classpath: Vec<PathBuf>,
}

/// Merge source roots. At least one root is required.
pub fn source_selection(args: &SourceArgs, file: &FileConfig) -> Result<SourceSelection> {
    let source_dir = args
        .source_dir
        .clone()
        .or_else(|| file.sources.source_dir.clone());
    let classpath = if args.classpath.is_empty() {
        file.sources.classpath.clone()
    } else {
        args.classpath.clone()
    };

    if source_dir.is_none() && classpath.is_empty() {
        return Err(DriftError::missing(
            "entity sources (--source-dir or --classpath, or [sources] in the config file)",
        ));
    }
    Ok(SourceSelection {
        source_dir,
        classpath,
    })
}

/// Build the per-run inference context.
pub fn inference_context(
    sources: &SourceArgs,
    args: &InferenceArgs,
    file: &FileConfig,
) -> Result<InferenceContext> {
    let section = &file.inference;
    let mut ctx = InferenceContext::default();

    if let Some(namespace) = sources
        .namespace
        .as_deref()
        .or(file.sources.namespace.as_deref())
    {
        ctx = ctx.with_root_namespace(namespace);
    }

    let discriminator = args
        .discriminator_column
        .as_deref()
        .or(section.discriminator_column.as_deref())
        .unwrap_or(DEFAULT_DISCRIMINATOR_COLUMN);
    if discriminator.trim().is_empty() {
        return Err(DriftError::invalid("discriminator column", "must not be blank"));
    }
    ctx.discriminator_default = discriminator.trim().to_string();

    if let Some(choice) = args.duplicates.or(section.duplicates) {
        ctx = ctx.with_duplicate_policy(choice.into());
    }
    if let Some(workers) = args.workers.or(section.workers) {
        ctx = ctx.with_workers(workers);
    }
    Ok(ctx.with_inverse_relationships_excluded(
        args.exclude_inverse || section.exclude_inverse_relationships,
    ))
}

/// Merge catalog settings and validate them without connecting.
pub fn catalog_config(args: &DatabaseArgs, file: &FileConfig) -> Result<CatalogConfig> {
    let section = &file.database;
    let pick = |cli: &Option<String>, file: &Option<String>| {
        cli.clone()
            .or_else(|| file.clone())
            .filter(|v| !v.trim().is_empty())
    };

    let kind: DatabaseKind = pick(&args.db_type, &section.db_type)
        .ok_or_else(|| DriftError::missing("database type (--db-type)"))?
        .parse()?;
    let dbname = pick(&args.dbname, &section.dbname).ok_or_else(|| {
        DriftError::missing(match kind {
            DatabaseKind::Sqlite => "database file (--dbname)",
            DatabaseKind::Postgres => "database name (--dbname)",
            DatabaseKind::Oracle => "oracle service name (--dbname)",
        })
    })?;

    let mut config = match kind {
        DatabaseKind::Sqlite => CatalogConfig::sqlite(dbname),
        DatabaseKind::Postgres | DatabaseKind::Oracle => {
            let host = pick(&args.host, &section.host)
                .ok_or_else(|| DriftError::missing("database host (--host)"))?;
            let user = pick(&args.user, &section.user)
                .ok_or_else(|| DriftError::missing("database user (--user)"))?;
            let config = match kind {
                DatabaseKind::Oracle => CatalogConfig::oracle(host, dbname),
                _ => CatalogConfig::postgres(host, dbname),
            };
            let mut config = config
                .with_credentials(user, args.password.clone().or_else(|| section.password.clone()));
            if let Some(port) = args.port.or(section.port) {
                config = config.with_port(port);
            }
            if let Some(schema) = pick(&args.schema, &section.schema) {
                config = config.with_schema(schema);
            }
            config
        }
    };
    if let Some(secs) = section.connect_timeout_secs {
        config = config.with_connect_timeout(Duration::from_secs(secs));
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use schemadrift_mapping::DuplicatePolicy;
    use tempfile::TempDir;

    fn write_config(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_full_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[database]
type = "postgres"
host = "db.internal"
port = 6543
user = "drift"
password = "secret"
dbname = "app"
schema = "billing"
connect_timeout_secs = 3

[sources]
source_dir = "src/main/java"
classpath = ["/opt/app/lib/model.jar"]
namespace = "com.acme"

[inference]
discriminator_column = "TYPE"
duplicates = "first-by-origin"
exclude_inverse_relationships = true
workers = 2

[output]
directory = "target/drift"
report_file = "drift.yml"
"#,
        );

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(
            file.sources.source_dir.as_deref(),
            Some(tmp.path().join("src/main/java").as_path())
        );
        assert_eq!(file.sources.classpath, vec![PathBuf::from("/opt/app/lib/model.jar")]);
        assert_eq!(file.output.mapping_file, "mapping_schema.yml");
        assert_eq!(
            file.report_output(None),
            tmp.path().join("target/drift").join("drift.yml")
        );

        let ctx = inference_context(&SourceArgs::default(), &InferenceArgs::default(), &file)
            .unwrap();
        assert_eq!(ctx.root_namespace.as_deref(), Some("com.acme"));
        assert_eq!(ctx.discriminator_default, "TYPE");
        assert_eq!(ctx.duplicate_policy, DuplicatePolicy::FirstByOrigin);
        assert!(ctx.exclude_inverse_relationships);
        assert_eq!(ctx.workers, 2);

        let catalog = catalog_config(&DatabaseArgs::default(), &file).unwrap();
        assert_eq!(catalog.kind, DatabaseKind::Postgres);
        assert_eq!(catalog.port, Some(6543));
        assert_eq!(catalog.effective_schema(), "billing");
        assert_eq!(catalog.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
[database]
type = "postgres"
host = "db.internal"
user = "drift"
dbname = "app"

[sources]
namespace = "com.acme"
"#,
        )
        .unwrap();

        let args = DatabaseArgs {
            db_type: Some("sqlite".into()),
            dbname: Some("local.db".into()),
            ..Default::default()
        };
        let catalog = catalog_config(&args, &file).unwrap();
        assert_eq!(catalog.kind, DatabaseKind::Sqlite);
        assert_eq!(catalog.database, "local.db");

        let sources = SourceArgs {
            namespace: Some("com.other".into()),
            source_dir: Some("src".into()),
            ..Default::default()
        };
        let ctx = inference_context(&sources, &InferenceArgs::default(), &file).unwrap();
        assert_eq!(ctx.root_namespace.as_deref(), Some("com.other"));
        assert_eq!(ctx.discriminator_default, DEFAULT_DISCRIMINATOR_COLUMN);
        assert_eq!(ctx.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_missing_settings_are_unsupported_input() {
        let file = FileConfig::default();

        let err = source_selection(&SourceArgs::default(), &file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedInput);

        let err = catalog_config(&DatabaseArgs::default(), &file).unwrap_err();
        assert!(err.to_string().contains("--db-type"));
        assert_eq!(err.kind(), ErrorKind::UnsupportedInput);

        let postgres_without_user = DatabaseArgs {
            db_type: Some("postgres".into()),
            host: Some("localhost".into()),
            dbname: Some("app".into()),
            ..Default::default()
        };
        let err = catalog_config(&postgres_without_user, &file).unwrap_err();
        assert!(err.to_string().contains("--user"));

        let mssql = DatabaseArgs {
            db_type: Some("mssql".into()),
            dbname: Some("app".into()),
            ..Default::default()
        };
        let err = catalog_config(&mssql, &file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedInput);

        let oracle_without_host = DatabaseArgs {
            db_type: Some("oracle".into()),
            dbname: Some("ORCLPDB1".into()),
            ..Default::default()
        };
        let err = catalog_config(&oracle_without_host, &file).unwrap_err();
        assert!(err.to_string().contains("--host"));
    }

    #[test]
    fn test_oracle_service_and_owner() {
        let file = FileConfig::default();
        let args = DatabaseArgs {
            db_type: Some("oracle".into()),
            host: Some("ora.internal".into()),
            user: Some("hr".into()),
            password: Some("secret".into()),
            dbname: Some("ORCLPDB1".into()),
            schema: Some("app_owner".into()),
            ..Default::default()
        };
        let config = catalog_config(&args, &file).unwrap();
        assert_eq!(config.kind, DatabaseKind::Oracle);
        assert_eq!(config.connect_string(), "//ora.internal:1521/ORCLPDB1");
        assert_eq!(config.effective_owner(), "APP_OWNER");

        let default_owner = DatabaseArgs {
            schema: None,
            port: Some(1522),
            ..args
        };
        let config = catalog_config(&default_owner, &file).unwrap();
        assert_eq!(config.effective_owner(), "HR");
        assert_eq!(config.connect_string(), "//ora.internal:1522/ORCLPDB1");
    }

    #[test]
    fn test_discover_default_file() {
        let tmp = TempDir::new().unwrap();
        let none = FileConfig::discover(None, tmp.path()).unwrap();
        assert!(none.sources.source_dir.is_none());

        write_config(
            tmp.path(),
            "[database]\ntype = \"sqlite\"\ndbname = \"zoo.db\"\n",
        );
        let found = FileConfig::discover(None, tmp.path()).unwrap();
        assert_eq!(
            found.database.dbname,
            Some(tmp.path().join("zoo.db").to_string_lossy().into_owned())
        );

        let missing = tmp.path().join("absent.toml");
        let err = FileConfig::discover(Some(&missing), tmp.path()).unwrap_err();
        assert!(matches!(err, DriftError::ConfigRead { .. }));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[database]\ndriver = \"oracle\"\n");
        let err = FileConfig::load(&path).unwrap_err();
        assert!(matches!(err, DriftError::ConfigParse { .. }));
        assert_eq!(err.kind(), ErrorKind::UnsupportedInput);
    }
}
