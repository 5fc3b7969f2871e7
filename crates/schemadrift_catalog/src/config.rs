//! Connection settings for a catalog extraction.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Postgres schema when none is configured.
pub const DEFAULT_PG_SCHEMA: &str = "public";

/// Default Postgres port.
pub const DEFAULT_PG_PORT: u16 = 5432;

/// Default Oracle listener port.
pub const DEFAULT_ORACLE_PORT: u16 = 1521;

/// Database kinds a catalog can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
    Oracle,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
        }
    }

    /// Kinds reached over the network with a host, user and password.
    pub fn is_networked(&self) -> bool {
        matches!(self, Self::Postgres | Self::Oracle)
    }

    fn default_port(&self) -> u16 {
        match self {
            Self::Oracle => DEFAULT_ORACLE_PORT,
            _ => DEFAULT_PG_PORT,
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "oracle" => Ok(Self::Oracle),
            _ => Err(CatalogError::UnsupportedKind(s.trim().to_string())),
        }
    }
}

/// Everything needed to reach one database catalog.
///
/// For SQLite, `database` is the file path and the network fields are
/// ignored. For Oracle, `database` is the service name and `schema` the
/// owner whose tables are read.
#[derive(Clone)]
pub struct CatalogConfig {
    pub kind: DatabaseKind,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
    pub connect_timeout: Duration,
}

impl CatalogConfig {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            kind: DatabaseKind::Sqlite,
            host: None,
            port: None,
            database: path.into(),
            user: None,
            password: None,
            schema: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn postgres(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            kind: DatabaseKind::Postgres,
            host: Some(host.into()),
            port: None,
            database: database.into(),
            user: None,
            password: None,
            schema: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn oracle(host: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            kind: DatabaseKind::Oracle,
            ..Self::postgres(host, service_name)
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into()).filter(|s: &String| !s.trim().is_empty());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Schema whose tables are read (Postgres only).
    pub fn effective_schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_PG_SCHEMA)
    }

    /// Owner whose tables are read (Oracle only): the configured schema, else
    /// the connecting user. Upper-cased, as the dictionary stores it.
    pub fn effective_owner(&self) -> String {
        self.schema
            .as_deref()
            .or(self.user.as_deref())
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase()
    }

    /// `//host:port/service` for Oracle, `host:port` otherwise.
    pub fn connect_string(&self) -> String {
        let host = self.host.as_deref().unwrap_or("localhost");
        let port = self.port.unwrap_or(self.kind.default_port());
        match self.kind {
            DatabaseKind::Oracle => format!("//{host}:{port}/{}", self.database),
            _ => format!("{host}:{port}"),
        }
    }

    /// Human-readable target without credentials, for logs and errors.
    pub fn target(&self) -> String {
        match self.kind {
            DatabaseKind::Sqlite => format!("sqlite:{}", self.database),
            DatabaseKind::Postgres => format!(
                "postgres://{}@{}/{}",
                self.user.as_deref().unwrap_or(""),
                self.connect_string(),
                self.database
            ),
            DatabaseKind::Oracle => format!(
                "oracle://{}@{}",
                self.user.as_deref().unwrap_or(""),
                self.connect_string().trim_start_matches('/')
            ),
        }
    }

    /// Reject settings that can never connect.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(CatalogError::invalid_config(match self.kind {
                DatabaseKind::Sqlite => "sqlite database file path is required",
                DatabaseKind::Postgres => "database name is required",
                DatabaseKind::Oracle => "oracle service name is required",
            }));
        }
        if self.kind.is_networked() {
            if is_blank(self.host.as_deref()) {
                return Err(CatalogError::invalid_config("database host is required"));
            }
            if is_blank(self.user.as_deref()) {
                return Err(CatalogError::invalid_config("database user is required"));
            }
        }
        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("schema", &self.schema)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
