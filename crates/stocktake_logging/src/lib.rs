//! Logging setup for the Stocktake binary.
//!
//! Two sinks: `<home>/logs/<app>.log`, which always captures the configured
//! filter, and stderr, which is quietened while an operator is scanning so
//! feedback lines are not buried in log output.
//!
//! The log file is size capped. When it would grow past the cap it is moved
//! to `<app>.log.old` (replacing any previous one) and a fresh file starts,
//! so at most two files exist per app.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "stocktake=info,stocktake_audit=info,stocktake_db=info";
const LOG_FILE_CAP: u64 = 10 * 1024 * 1024;

/// Environment variable that relocates the Stocktake home directory.
pub const HOME_ENV: &str = "STOCKTAKE_HOME";

/// Logging configuration for a Stocktake process.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// An operator is reading console feedback; only warnings go to stderr.
    pub interactive: bool,
}

/// Install the file and stderr layers as the global subscriber.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir()?;
    let sink = LogSink::open(&log_dir, config.app_name, LOG_FILE_CAP)?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.interactive && !config.verbose {
        EnvFilter::new("warn")
    } else {
        file_filter.clone()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(sink)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Global tracing subscriber already installed")?;

    Ok(())
}

/// Stocktake home directory: `$STOCKTAKE_HOME` or `~/.stocktake`.
pub fn stocktake_home() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV) {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stocktake")
}

/// Create `<home>/logs` if needed and return it.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = stocktake_home().join("logs");
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Append-only log file with a single `.old` backup.
struct CappedLogFile {
    path: PathBuf,
    backup: PathBuf,
    cap: u64,
    file: File,
    written: u64,
}

impl CappedLogFile {
    fn open(dir: &Path, app_name: &str, cap: u64) -> io::Result<Self> {
        let path = dir.join(format!("{app_name}.log"));
        let backup = dir.join(format!("{app_name}.log.old"));
        let (file, written) = open_append(&path)?;
        Ok(Self {
            path,
            backup,
            cap,
            file,
            written,
        })
    }

    fn roll_over(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, &self.backup)?;
        let (file, written) = open_append(&self.path)?;
        self.file = file;
        self.written = written;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

impl Write for CappedLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.cap {
            self.roll_over()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Cloneable handle handed to `tracing_subscriber` as its writer.
#[derive(Clone)]
struct LogSink(Arc<Mutex<CappedLogFile>>);

impl LogSink {
    fn open(dir: &Path, app_name: &str, cap: u64) -> Result<Self> {
        let file = CappedLogFile::open(dir, app_name, cap)
            .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
        Ok(Self(Arc::new(Mutex::new(file))))
    }

    // A panic while holding the lock must not silence logging.
    fn lock(&self) -> MutexGuard<'_, CappedLogFile> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_rolls_over_to_single_backup() {
        let tmp = TempDir::new().unwrap();
        let mut sink = LogSink::open(tmp.path(), "stocktake", 32).unwrap();

        for i in 0..10 {
            sink.write_all(format!("line {i:02} of output\n").as_bytes())
                .unwrap();
        }
        sink.flush().unwrap();

        let current = fs::read_to_string(tmp.path().join("stocktake.log")).unwrap();
        let backup = fs::read_to_string(tmp.path().join("stocktake.log.old")).unwrap();
        assert!(current.contains("line 09"));
        assert!(!backup.contains("line 09"));
        assert!(current.len() as u64 <= 32);

        let files = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn test_reopen_appends() {
        let tmp = TempDir::new().unwrap();
        {
            let mut sink = LogSink::open(tmp.path(), "audit", 1024).unwrap();
            writeln!(sink, "first").unwrap();
        }
        let mut sink = LogSink::open(tmp.path(), "audit", 1024).unwrap();
        writeln!(sink, "second").unwrap();

        let content = fs::read_to_string(tmp.path().join("audit.log")).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_oversized_write_is_not_split() {
        let tmp = TempDir::new().unwrap();
        let mut sink = LogSink::open(tmp.path(), "audit", 4).unwrap();
        sink.write_all(b"much longer than the cap\n").unwrap();

        let content = fs::read_to_string(tmp.path().join("audit.log")).unwrap();
        assert_eq!(content, "much longer than the cap\n");
        assert!(!tmp.path().join("audit.log.old").exists());
    }
}
