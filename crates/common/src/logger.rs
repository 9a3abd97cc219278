use crate::error::NewsSeekError;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "newsseek.log";

/// Where log output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode<'a> {
    /// Long-running work (ingestion, the server): stderr plus an appended
    /// `newsseek.log` in the given directory
    Persistent(&'a Path),

    /// One-shot commands (search, stats): stderr only, no files left behind
    Console,
}

/// Initialize the global subscriber
///
/// Console output always goes to stderr so command output on stdout stays
/// clean. `RUST_LOG` overrides `log_level`. Returns the log file path in
/// persistent mode.
pub fn init_logging(mode: LogMode<'_>, log_level: &str) -> Result<Option<PathBuf>, NewsSeekError> {
    let (file_layer, log_path) = match mode {
        LogMode::Persistent(dir) => {
            let (file, path) = open_log_file(dir)?;
            let layer = fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_filter(level_filter(log_level));
            (Some(layer), Some(path))
        }
        LogMode::Console => (None, None),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(matches!(mode, LogMode::Persistent(_)))
        .with_line_number(true)
        .with_filter(level_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    match &log_path {
        Some(path) => tracing::info!("Logging initialized: level={}, log_file={}", log_level, path.display()),
        None => tracing::debug!("Console logging initialized: level={}", log_level),
    }
    Ok(log_path)
}

/// Open `<dir>/newsseek.log` for appending, creating the directory if needed
pub fn open_log_file(dir: &Path) -> Result<(File, PathBuf), NewsSeekError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        NewsSeekError::config(format!("Failed to create log directory {}: {}", dir.display(), e))
    })?;

    let path = dir.join(LOG_FILE_NAME);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| NewsSeekError::config(format!("Failed to open log file {}: {}", path.display(), e)))?;
    Ok((file, path))
}

fn level_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(parse_log_level(log_level).as_str().to_ascii_lowercase())
    })
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace"), Level::TRACE);
        assert_eq!(parse_log_level("debug"), Level::DEBUG);
        assert_eq!(parse_log_level("WARNING"), Level::WARN);
        assert_eq!(parse_log_level("error"), Level::ERROR);
        assert_eq!(parse_log_level("loud"), Level::INFO);
    }

    #[test]
    fn test_open_log_file_appends() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("log");

        let (mut file, path) = open_log_file(&dir).unwrap();
        writeln!(file, "first").unwrap();
        drop(file);
        let (mut file, _) = open_log_file(&dir).unwrap();
        writeln!(file, "second").unwrap();

        assert_eq!(path, dir.join(LOG_FILE_NAME));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_rejects_file_as_dir() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("log");
        std::fs::write(&blocker, b"x").unwrap();
        assert!(matches!(open_log_file(&blocker), Err(NewsSeekError::Config(_))));
    }
}
