//! SQLite backend configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SqliteError, SqliteResult};

/// Environment variable read by [`SqliteConfig::from_env`].
pub const DATABASE_URL_VAR: &str = "SIFT_DATABASE_URL";

/// SQLite backend configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteConfig {
    /// Where the database lives.
    pub path: DatabasePath,
    /// Enforce foreign keys.
    pub foreign_keys: bool,
    /// Journal mode.
    pub journal_mode: JournalMode,
    /// Synchronous mode.
    pub synchronous: SynchronousMode,
    /// How long to wait on a locked database.
    pub busy_timeout: Option<Duration>,
    /// Rows the connection thread may read ahead of the consumer.
    pub row_buffer: usize,
}

/// Database location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// Private in-memory database.
    #[default]
    Memory,
    /// Database file.
    File(PathBuf),
}

impl DatabasePath {
    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl std::fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// SQLite synchronous mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronousMode {
    /// No syncing.
    Off,
    /// Sync at critical moments.
    #[default]
    Normal,
    /// Sync on every commit.
    Full,
    /// `FULL` plus directory syncs.
    Extra,
}

impl SynchronousMode {
    /// The pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "off" | "0" => Some(Self::Off),
            "normal" | "1" => Some(Self::Normal),
            "full" | "2" => Some(Self::Full),
            "extra" | "3" => Some(Self::Extra),
            _ => None,
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JournalMode {
    /// Delete the journal after each transaction.
    #[default]
    Delete,
    /// Truncate the journal instead of deleting it.
    Truncate,
    /// Keep the journal, zeroing its header.
    Persist,
    /// Journal in memory.
    Memory,
    /// Write-ahead log.
    Wal,
    /// No journal.
    Off,
}

impl JournalMode {
    /// The pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "delete" => Some(Self::Delete),
            "truncate" => Some(Self::Truncate),
            "persist" => Some(Self::Persist),
            "memory" => Some(Self::Memory),
            "wal" => Some(Self::Wal),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            foreign_keys: true,
            journal_mode: JournalMode::Delete,
            synchronous: SynchronousMode::Normal,
            busy_timeout: Some(Duration::from_secs(5)),
            row_buffer: 1,
        }
    }
}

impl SqliteConfig {
    /// In-memory database with default settings.
    pub fn memory() -> Self {
        Self::default()
    }

    /// File database with default settings.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parse a database URL.
    ///
    /// Accepted forms:
    /// - `sqlite::memory:` or `:memory:`
    /// - `sqlite://path/to/db.sqlite`, `sqlite:path`, `file:path`
    ///
    /// followed by optional `?key=value&...` settings: `foreign_keys`,
    /// `journal_mode`, `synchronous`, `busy_timeout` (milliseconds),
    /// `row_buffer`, and `mode=memory`. Unknown keys are ignored; bad values
    /// are errors.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url = url.as_ref().trim();
        let (location, query) = match url.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (url, None),
        };

        let path = match location {
            "sqlite::memory:" | ":memory:" | "sqlite:" => DatabasePath::Memory,
            _ => {
                let file = location
                    .strip_prefix("sqlite://")
                    .or_else(|| location.strip_prefix("sqlite:"))
                    .or_else(|| location.strip_prefix("file:"))
                    .unwrap_or(location);
                match file {
                    "" => return Err(SqliteError::config("database path is required")),
                    ":memory:" => DatabasePath::Memory,
                    file => DatabasePath::File(PathBuf::from(file)),
                }
            }
        };

        let mut config = Self {
            path,
            ..Default::default()
        };
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| SqliteError::config(format!("setting '{}' has no value", pair)))?;
            config.apply(key, value)?;
        }
        Ok(config)
    }

    /// Read the URL from `SIFT_DATABASE_URL`, defaulting to in-memory.
    pub fn from_env() -> SqliteResult<Self> {
        match env::var(DATABASE_URL_VAR) {
            Ok(url) => Self::from_url(url),
            Err(env::VarError::NotPresent) => Ok(Self::memory()),
            Err(e) => Err(SqliteError::config(format!("{}: {}", DATABASE_URL_VAR, e))),
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> SqliteResult<()> {
        let invalid = || SqliteError::config(format!("invalid value '{}' for '{}'", value, key));
        match key {
            "mode" if value == "memory" => self.path = DatabasePath::Memory,
            "foreign_keys" => {
                self.foreign_keys = match value.to_ascii_lowercase().as_str() {
                    "true" | "1" | "on" => true,
                    "false" | "0" | "off" => false,
                    _ => return Err(invalid()),
                }
            }
            "journal_mode" => self.journal_mode = JournalMode::parse(value).ok_or_else(invalid)?,
            "synchronous" => self.synchronous = SynchronousMode::parse(value).ok_or_else(invalid)?,
            "busy_timeout" => {
                let ms: u64 = value.parse().map_err(|_| invalid())?;
                self.busy_timeout = Some(Duration::from_millis(ms));
            }
            "row_buffer" => {
                self.row_buffer = match value.parse() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid()),
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// PRAGMA statements run when a connection opens.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();

        sql.push_str(&format!(
            "PRAGMA foreign_keys = {};\n",
            if self.foreign_keys { "ON" } else { "OFF" }
        ));
        if !self.path.is_memory() {
            sql.push_str(&format!(
                "PRAGMA journal_mode = {};\n",
                self.journal_mode.as_pragma()
            ));
        }
        sql.push_str(&format!(
            "PRAGMA synchronous = {};\n",
            self.synchronous.as_pragma()
        ));
        if let Some(timeout) = self.busy_timeout {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", timeout.as_millis()));
        }

        sql
    }

    /// Set the database path.
    pub fn path(mut self, path: DatabasePath) -> Self {
        self.path = path;
        self
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Set the synchronous mode.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }

    /// Set the busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Set how many rows may be read ahead of the consumer. At least one.
    pub fn row_buffer(mut self, rows: usize) -> Self {
        self.row_buffer = rows.max(1);
        self
    }
}
