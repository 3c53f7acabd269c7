//! Runtime configuration: database location and logging.
//!
//! The database path is resolved from `--db`, then the `PROMPTS_DB`
//! environment variable (both handled by clap), then `~/.prompts/prompts.db`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Directory under `$HOME` holding the default database and log file.
pub const DATA_DIR_NAME: &str = ".prompts";
/// Default database file name inside the data directory.
pub const DB_FILE_NAME: &str = "prompts.db";
/// Log file written next to the database while the TUI owns the terminal.
pub const LOG_FILE_NAME: &str = "prompts.log";

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub verbose: bool,
}

impl Config {
    /// Resolve the database path, falling back to the default location under `home`.
    pub fn resolve(db: Option<PathBuf>, home: Option<PathBuf>, verbose: bool) -> Self {
        let db_path = db.unwrap_or_else(|| {
            home.unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME)
                .join(DB_FILE_NAME)
        });
        Config { db_path, verbose }
    }

    /// Resolve using the current process environment for `$HOME`.
    pub fn from_env(db: Option<PathBuf>, verbose: bool) -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::resolve(db, home, verbose)
    }

    /// Directory containing the database file.
    pub fn data_dir(&self) -> &Path {
        match self.db_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// Create the data directory if it does not exist yet.
    pub fn ensure_data_dir(&self) -> io::Result<()> {
        fs::create_dir_all(self.data_dir())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join(LOG_FILE_NAME)
    }

    fn env_filter(&self) -> EnvFilter {
        let default = if self.verbose { "debug" } else { "warn" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

/// Send logs to stderr; used by the one-shot CLI commands.
pub fn init_stderr_logging(config: &Config) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(io::stderr)
        .try_init();
}

/// Send logs to the log file so they do not draw over the TUI.
pub fn init_file_logging(config: &Config) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_db_wins() {
        let cfg = Config::resolve(Some(PathBuf::from("/tmp/x/my.db")), Some(PathBuf::from("/home/u")), false);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x/my.db"));
        assert_eq!(cfg.data_dir(), Path::new("/tmp/x"));
        assert_eq!(cfg.log_path(), PathBuf::from("/tmp/x/prompts.log"));
    }

    #[test]
    fn test_default_location_under_home() {
        let cfg = Config::resolve(None, Some(PathBuf::from("/home/u")), true);
        assert_eq!(cfg.db_path, PathBuf::from("/home/u/.prompts/prompts.db"));
        assert!(cfg.verbose);
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let cfg = Config::resolve(Some(PathBuf::from("prompts.db")), None, false);
        assert_eq!(cfg.data_dir(), Path::new("."));
    }

    #[test]
    fn test_ensure_data_dir_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = Config::resolve(Some(dir.path().join("a").join("b").join("p.db")), None, false);
        cfg.ensure_data_dir().unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }
}
