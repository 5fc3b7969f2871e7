//! Command orchestration.

use crate::cli::{Cli, Commands};
use crate::compare::{compare, DriftReport};
use crate::config::{
    catalog_config, inference_context, source_selection, FileConfig, SourceSelection,
};
use crate::error::{DriftError, Result};
use crate::output::print_drift_summary;
use crate::report::{
    read_schema, write_schema, ReportDocument, SchemaSummary, DATABASE_SOURCE_KEY,
    MAPPING_SOURCE_KEY,
};
use schemadrift_catalog::{extract_schema, CatalogConfig};
use schemadrift_java::{Classpath, SourceTree};
use schemadrift_mapping::{
    CanonicalSchema, DeclarationSource, InferenceContext, InferenceOutcome, SchemaInferenceDriver,
};
use std::path::Path;
use tracing::{info, warn};

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Files written, nothing compared.
    Completed,
    Clean,
    Drift { fail_on_drift: bool },
}

impl RunOutcome {
    fn from_report(report: &DriftReport, fail_on_drift: bool) -> Self {
        if report.is_clean() {
            Self::Clean
        } else {
            Self::Drift { fail_on_drift }
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Drift {
                fail_on_drift: true,
            } => 1,
            _ => 0,
        }
    }
}

/// Run one command. `cwd` is where `schemadrift.toml` is looked for.
pub fn run(cli: Cli, cwd: &Path) -> Result<RunOutcome> {
    let file = FileConfig::discover(cli.config.as_deref(), cwd)?;

    match cli.command {
        Commands::Infer {
            sources,
            inference,
            output,
        } => {
            let selection = source_selection(&sources, &file)?;
            let ctx = inference_context(&sources, &inference, &file)?;
            let path = output.unwrap_or_else(|| file.mapping_output(None));

            let outcome = infer_schema(&selection, &ctx)?;
            write_schema(&path, MAPPING_SOURCE_KEY, &outcome.schema)?;
            println!(
                "Mapping schema: {} table(s), {} column(s) from {} entities -> {}",
                outcome.schema.table_count(),
                outcome.schema.column_count(),
                outcome.entities_resolved,
                path.display()
            );
            for diag in &outcome.diagnostics {
                println!("  warning: {}", diag);
            }
            Ok(RunOutcome::Completed)
        }

        Commands::Extract { database, output } => {
            let catalog = catalog_config(&database, &file)?;
            let path = output.unwrap_or_else(|| file.database_output(None));

            let schema = extract_database(&catalog)?;
            write_schema(&path, DATABASE_SOURCE_KEY, &schema)?;
            println!(
                "Database schema: {} table(s), {} column(s) from {} -> {}",
                schema.table_count(),
                schema.column_count(),
                catalog.target(),
                path.display()
            );
            Ok(RunOutcome::Completed)
        }

        Commands::Detect {
            sources,
            inference,
            database,
            output_dir,
            json,
            fail_on_drift,
        } => {
            // Resolve every setting before touching the database.
            let selection = source_selection(&sources, &file)?;
            let ctx = inference_context(&sources, &inference, &file)?;
            let catalog = catalog_config(&database, &file)?;
            let dir = output_dir.as_deref();

            let db_schema = extract_database(&catalog)?;
            let outcome = infer_schema(&selection, &ctx)?;

            write_schema(&file.database_output(dir), DATABASE_SOURCE_KEY, &db_schema)?;
            write_schema(&file.mapping_output(dir), MAPPING_SOURCE_KEY, &outcome.schema)?;

            let drift = compare(&outcome.schema, &db_schema);
            let document = ReportDocument::new(
                SchemaSummary::new(describe_selection(&selection), &outcome.schema),
                SchemaSummary::new(catalog.target(), &db_schema),
                &drift,
                &outcome.diagnostics,
            );
            document.write_yaml(&file.report_output(dir))?;
            present(&document, json)?;
            Ok(RunOutcome::from_report(&drift, fail_on_drift))
        }

        Commands::Compare {
            mapping,
            database,
            report,
            json,
            fail_on_drift,
        } => {
            let (mapping_key, mapping_schema) = read_schema(&mapping)?;
            let (database_key, db_schema) = read_schema(&database)?;
            if mapping_key != MAPPING_SOURCE_KEY {
                warn!(path = %mapping.display(), key = %mapping_key, "Mapping file has an unexpected source key");
            }
            if database_key != DATABASE_SOURCE_KEY {
                warn!(path = %database.display(), key = %database_key, "Database file has an unexpected source key");
            }

            let drift = compare(&mapping_schema, &db_schema);
            let document = ReportDocument::new(
                SchemaSummary::new(mapping.display().to_string(), &mapping_schema),
                SchemaSummary::new(database.display().to_string(), &db_schema),
                &drift,
                &[],
            );
            if let Some(path) = report {
                document.write_yaml(&path)?;
            }
            present(&document, json)?;
            Ok(RunOutcome::from_report(&drift, fail_on_drift))
        }
    }
}

fn present(document: &ReportDocument<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", document.to_json()?);
    } else {
        print_drift_summary(
            &document.mapping,
            &document.database,
            document.drift,
            document.diagnostics,
        );
    }
    Ok(())
}

/// Front-ends for the selected roots: the source tree first, then each
/// classpath entry in the order given.
pub fn declaration_sources(
    selection: &SourceSelection,
    ctx: &InferenceContext,
) -> Vec<Box<dyn DeclarationSource>> {
    let mut sources: Vec<Box<dyn DeclarationSource>> = Vec::new();
    if let Some(dir) = &selection.source_dir {
        sources.push(Box::new(SourceTree::new(dir).with_workers(ctx.workers)));
    }
    for entry in &selection.classpath {
        sources.push(Box::new(Classpath::new(entry).with_workers(ctx.workers)));
    }
    sources
}

/// Infer the mapped schema from every selected root.
pub fn infer_schema(selection: &SourceSelection, ctx: &InferenceContext) -> Result<InferenceOutcome> {
    let sources = declaration_sources(selection, ctx);
    let refs: Vec<&dyn DeclarationSource> = sources.iter().map(|s| s.as_ref()).collect();
    info!(
        sources = refs.len(),
        namespace = ctx.root_namespace.as_deref().unwrap_or("*"),
        "Inferring mapping schema"
    );
    Ok(SchemaInferenceDriver::new(ctx).run(&refs)?)
}

/// Read the catalog on a short-lived runtime.
pub fn extract_database(config: &CatalogConfig) -> Result<CanonicalSchema> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DriftError::Runtime)?;
    Ok(runtime.block_on(extract_schema(config))?)
}

fn describe_selection(selection: &SourceSelection) -> String {
    selection
        .source_dir
        .iter()
        .chain(selection.classpath.iter())
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_outcome_exit_codes() {
        let clean = DriftReport::default();
        assert_eq!(RunOutcome::from_report(&clean, true).exit_code(), 0);

        let drifted = DriftReport {
            tables_only_in_database: vec!["AUDIT".into()],
            ..Default::default()
        };
        assert_eq!(RunOutcome::from_report(&drifted, false).exit_code(), 0);
        assert_eq!(RunOutcome::from_report(&drifted, true).exit_code(), 1);
        assert_eq!(RunOutcome::Completed.exit_code(), 0);
    }

    #[test]
    fn test_declaration_sources_order() {
        let selection = SourceSelection {
            source_dir: Some(PathBuf::from("src/main/java")),
            classpath: vec![PathBuf::from("lib/a.jar"), PathBuf::from("target/classes")],
        };
        let sources = declaration_sources(&selection, &InferenceContext::default());
        assert_eq!(sources.len(), 3);
        assert!(sources[0].describe().contains("src/main/java"));
        assert!(sources[1].describe().contains("a.jar"));
        assert_eq!(
            describe_selection(&selection),
            "src/main/java, lib/a.jar, target/classes"
        );
    }
}
