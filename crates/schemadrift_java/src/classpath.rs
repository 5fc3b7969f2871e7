//! Compiled front-end: a directory of `.class` files or a `.jar`/`.zip`
//! archive.

use crate::classfile::ClassFile;
use crate::error::{FrontEndError, Result};
use crate::workers;
use schemadrift_mapping::{DeclarationSource, EntityTypeDescriptor, MappingError};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

const SKIPPED_UNITS: &[&str] = &["module-info.class", "package-info.class"];

fn is_class_unit(name: &str) -> bool {
    let file = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    file.ends_with(".class") && !SKIPPED_UNITS.contains(&file)
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

/// A compiled class root.
#[derive(Debug, Clone)]
pub struct Classpath {
    root: PathBuf,
    workers: usize,
}

impl Classpath {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: 0,
        }
    }

    /// Decode on `workers` threads (0 = one per CPU).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_all(&self) -> Result<Vec<EntityTypeDescriptor>> {
        let start = Instant::now();
        let types = if self.root.is_dir() {
            self.load_directory()?
        } else if self.root.is_file() && is_archive(&self.root) {
            self.load_archive()?
        } else {
            return Err(FrontEndError::invalid_root(
                &self.root,
                "class root must be a directory, .jar or .zip",
            ));
        };

        info!(
            root = %self.root.display(),
            types = types.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Class root decoded"
        );
        Ok(types)
    }

    fn load_directory(&self) -> Result<Vec<EntityTypeDescriptor>> {
        let mut units = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name().to_str().is_some_and(is_class_unit) {
                units.push(entry.into_path());
            }
        }
        debug!(root = %self.root.display(), units = units.len(), "Class files discovered");

        workers::decode_all("decode-class", &units, self.workers, |path| {
            let bytes = std::fs::read(path).map_err(|e| FrontEndError::io(path, e))?;
            decode_class(&bytes, &path.display().to_string())
        })
    }

    /// Entries are read sequentially (the archive reader is not shareable)
    /// and decoded in parallel.
    fn load_archive(&self) -> Result<Vec<EntityTypeDescriptor>> {
        let archive_err = |source| FrontEndError::Archive {
            path: self.root.clone(),
            source,
        };
        let file = File::open(&self.root).map_err(|e| FrontEndError::io(&self.root, e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;

        let mut units: Vec<(String, Vec<u8>)> = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(archive_err)?;
            let name = entry.name().to_string();
            if !entry.is_file() || name.starts_with("META-INF/") || !is_class_unit(&name) {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| FrontEndError::io(self.root.join(&name), e))?;
            units.push((name, bytes));
        }
        units.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(archive = %self.root.display(), units = units.len(), "Archive entries read");

        let archive_name = self.root.display().to_string();
        workers::decode_all("decode-class", &units, self.workers, |(name, bytes)| {
            decode_class(bytes, &format!("{archive_name}!{name}"))
        })
    }
}

fn decode_class(bytes: &[u8], origin: &str) -> Result<Vec<EntityTypeDescriptor>> {
    let class = ClassFile::parse(bytes, origin)?;
    if class.is_anonymous_or_local() {
        return Ok(Vec::new());
    }
    Ok(vec![class.into_descriptor(origin)])
}

impl DeclarationSource for Classpath {
    fn describe(&self) -> String {
        format!("class root {}", self.root.display())
    }

    fn load(&self) -> std::result::Result<Vec<EntityTypeDescriptor>, MappingError> {
        Ok(self.load_all()?)
    }
}
