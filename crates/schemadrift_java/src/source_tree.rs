//! Source-text front-end: a directory tree of `.java` compilation units.

use crate::error::{FrontEndError, Result};
use crate::lexer;
use crate::parser;
use crate::resolve;
use crate::workers;
use schemadrift_mapping::{DeclarationSource, EntityTypeDescriptor, MappingError};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Units that never declare types.
const SKIPPED_UNITS: &[&str] = &["module-info.java", "package-info.java"];

/// A directory scanned recursively for Java source units.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    workers: usize,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: 0,
        }
    }

    /// Parse on `workers` threads (0 = one per CPU).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All source units under the root, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(FrontEndError::invalid_root(
                &self.root,
                "source root is missing or not a directory",
            ));
        }

        let mut units = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_java = path.extension().is_some_and(|ext| ext == "java");
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_UNITS.contains(&n));
            if is_java && !skipped {
                units.push(path.to_path_buf());
            }
        }
        Ok(units)
    }

    /// Parse every unit under the root. The first unit that cannot be read
    /// or parsed fails the whole load.
    pub fn load_all(&self) -> Result<Vec<EntityTypeDescriptor>> {
        let start = Instant::now();
        let units = self.discover()?;
        debug!(root = %self.root.display(), units = units.len(), "Source units discovered");

        let types =
            workers::decode_all("parse-source", &units, self.workers, |path| parse_unit(path))?;

        info!(
            root = %self.root.display(),
            units = units.len(),
            types = types.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Source tree parsed"
        );
        Ok(types)
    }
}

impl DeclarationSource for SourceTree {
    fn describe(&self) -> String {
        format!("source tree {}", self.root.display())
    }

    fn load(&self) -> std::result::Result<Vec<EntityTypeDescriptor>, MappingError> {
        Ok(self.load_all()?)
    }
}

/// Read and parse one source unit.
pub fn parse_unit(path: &Path) -> Result<Vec<EntityTypeDescriptor>> {
    let source = std::fs::read_to_string(path).map_err(|e| FrontEndError::io(path, e))?;
    parse_source(&source, path)
}

/// Parse source text as if read from `path`.
pub fn parse_source(source: &str, path: &Path) -> Result<Vec<EntityTypeDescriptor>> {
    let tokens = lexer::tokenize(source).map_err(|e| FrontEndError::Syntax {
        path: path.to_path_buf(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;
    let unit = parser::parse(&tokens).map_err(|e| FrontEndError::Syntax {
        path: path.to_path_buf(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;
    Ok(resolve::describe_unit(&unit, &path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b/B.java", "class B {}");
        write(tmp.path(), "a/A.java", "class A {}");
        write(tmp.path(), "a/notes.txt", "not java");
        write(tmp.path(), "module-info.java", "module m {}");
        write(tmp.path(), "a/package-info.java", "package a;");

        let units = SourceTree::new(tmp.path()).discover().unwrap();
        let names: Vec<_> = units
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a/A.java", "b/B.java"]);
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let err = SourceTree::new("/definitely/not/here").discover().unwrap_err();
        assert!(matches!(err, FrontEndError::InvalidRoot { .. }));
    }

    #[test]
    fn test_syntax_error_names_file_and_line() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Good.java", "class Good { int a; }");
        write(tmp.path(), "Bad.java", "class Bad {\n  int a\n}");

        let err = SourceTree::new(tmp.path()).with_workers(2).load_all().unwrap_err();
        match err {
            FrontEndError::Syntax { path, line, .. } => {
                assert!(path.ends_with("Bad.java"));
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
