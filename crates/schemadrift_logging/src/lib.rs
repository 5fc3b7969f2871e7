//! Shared logging setup for schemadrift binaries.
//!
//! Installs a `tracing` subscriber with two layers: a size-rotated log file
//! under `$SCHEMADRIFT_HOME/logs` and stderr. When the log file cannot be
//! opened the run continues with stderr only.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str =
    "schemadrift=info,schemadrift_mapping=info,schemadrift_java=info,schemadrift_catalog=info";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// How much goes to stderr. The log file always gets the full filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    #[default]
    Normal,
    /// Debug output from every schemadrift crate.
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Self::Verbose,
            (false, true) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }
}

/// Logging configuration shared by schemadrift binaries.
#[derive(Debug, Clone)]
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbosity: Verbosity,
    /// Log directory override; defaults to [`logs_dir`].
    pub log_dir: Option<PathBuf>,
}

impl<'a> LogConfig<'a> {
    pub fn new(app_name: &'a str) -> Self {
        Self {
            app_name,
            verbosity: Verbosity::Normal,
            log_dir: None,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// What [`init_logging`] managed to set up.
#[derive(Debug)]
pub struct LogHandle {
    /// Current log file, `None` when logging to stderr only.
    pub log_file: Option<PathBuf>,
    /// Why the log file could not be used.
    pub file_error: Option<anyhow::Error>,
}

/// Initialize tracing with a rolling file writer and stderr output.
///
/// Fails only if a global subscriber is already installed.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogHandle> {
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = match config.verbosity {
        Verbosity::Verbose => EnvFilter::new(DEFAULT_LOG_FILTER.replace("=info", "=debug")),
        Verbosity::Quiet => EnvFilter::new("warn"),
        Verbosity::Normal => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let log_dir = match config.log_dir.clone() {
        Some(dir) => Ok(dir),
        None => ensure_logs_dir(),
    };
    let (file_layer, log_file, file_error) =
        match log_dir.and_then(|dir| SharedRollingWriter::new(dir, config.app_name)) {
            Ok(writer) => {
                let path = writer.current_path();
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter);
                (Some(layer), Some(path), None)
            }
            Err(e) => (None, None, Some(e)),
        };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    if let Some(e) = &file_error {
        tracing::warn!("Logging to stderr only: {e:#}");
    }
    Ok(LogHandle {
        log_file,
        file_error,
    })
}

/// Get the schemadrift home directory: `$SCHEMADRIFT_HOME` or `~/.schemadrift`
pub fn schemadrift_home() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var("SCHEMADRIFT_HOME") {
        if !override_path.trim().is_empty() {
            return Ok(PathBuf::from(override_path));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".schemadrift"))
        .context("Could not determine home directory; set SCHEMADRIFT_HOME")
}

/// Get the logs directory: `<home>/logs`
pub fn logs_dir() -> Result<PathBuf> {
    Ok(schemadrift_home()?.join("logs"))
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir()?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

struct RollingFileAppender {
    dir: PathBuf,
    base_name: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    current_size: u64,
}

impl RollingFileAppender {
    fn new(dir: PathBuf, base_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut appender = Self {
            dir,
            base_name: sanitize_name(base_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            current_size: 0,
        };
        let (file, size) = appender.open_current_file()?;
        appender.file = Some(file);
        appender.current_size = size;
        if appender.current_size > appender.max_size {
            appender.rotate()?;
        }
        Ok(appender)
    }

    fn open_current_file(&self) -> io::Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())?;
        let size = file.metadata()?.len();
        Ok((file, size))
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base_name, index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        // Shift name.log.N-1 .. name.log.1 up by one, dropping the oldest.
        let max_index = self.max_files.saturating_sub(1);
        if max_index > 0 {
            remove_if_exists(&self.rotated_path(max_index))?;
            for idx in (1..max_index).rev() {
                let src = self.rotated_path(idx);
                if src.exists() {
                    fs::rename(&src, self.rotated_path(idx + 1))?;
                }
            }
            let current = self.current_path();
            if current.exists() {
                fs::rename(current, self.rotated_path(1))?;
            }
        } else {
            remove_if_exists(&self.current_path())?;
        }

        let (file, size) = self.open_current_file()?;
        self.file = Some(file);
        self.current_size = size;
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size > 0 && self.current_size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let bytes = file.write(buf)?;
        self.current_size += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

#[derive(Clone)]
struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFileAppender>>,
    path: PathBuf,
}

impl SharedRollingWriter {
    fn new(dir: PathBuf, base_name: &str) -> Result<Self> {
        let appender = RollingFileAppender::new(dir, base_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file for {}", base_name))?;
        Ok(Self {
            path: appender.current_path(),
            inner: Arc::new(Mutex::new(appender)),
        })
    }

    fn current_path(&self) -> PathBuf {
        self.path.clone()
    }
}

struct SharedRollingWriterGuard {
    inner: Arc<Mutex<RollingFileAppender>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedRollingWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedRollingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("schema drift/cli"), "schema_drift_cli");
    }

    #[test]
    fn test_rotation_keeps_bounded_history() {
        let tmp = TempDir::new().unwrap();
        let mut appender =
            RollingFileAppender::new(tmp.path().to_path_buf(), "drift", 3, 16).unwrap();

        for i in 0..10 {
            appender.write_all(format!("line {i:02} ....\n").as_bytes()).unwrap();
        }
        appender.flush().unwrap();

        assert!(tmp.path().join("drift.log").exists());
        assert!(tmp.path().join("drift.log.1").exists());
        assert!(tmp.path().join("drift.log.2").exists());
        assert!(!tmp.path().join("drift.log.3").exists());

        let newest = fs::read_to_string(tmp.path().join("drift.log")).unwrap();
        assert_eq!(newest, "line 09 ....\n");
        let previous = fs::read_to_string(tmp.path().join("drift.log.1")).unwrap();
        assert_eq!(previous, "line 08 ....\n");
    }

    #[test]
    fn test_reopen_appends() {
        let tmp = TempDir::new().unwrap();
        {
            let mut appender =
                RollingFileAppender::new(tmp.path().to_path_buf(), "drift", 2, 1024).unwrap();
            appender.write_all(b"first\n").unwrap();
        }
        let mut appender =
            RollingFileAppender::new(tmp.path().to_path_buf(), "drift", 2, 1024).unwrap();
        appender.write_all(b"second\n").unwrap();
        appender.flush().unwrap();

        let content = fs::read_to_string(tmp.path().join("drift.log")).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
