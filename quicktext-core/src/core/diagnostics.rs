//! Crash reports for failures that stop the application from starting.

use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Version of this crate, recorded in every fatal log.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes `fatal-YYYYMMDD-HHMMSS.log` into `logs_dir` describing `error`.
///
/// Returns the written path, or `None` if the log itself could not be
/// written; the error is also emitted through `log::error!` either way.
pub fn write_fatal_log(logs_dir: &Path, error: &dyn Error) -> Option<PathBuf> {
    let now = Utc::now();
    let report = fatal_report(now, error);
    log::error!("fatal startup error: {error}");

    let path = logs_dir.join(format!("fatal-{}.log", now.format("%Y%m%d-%H%M%S")));
    let written = fs::create_dir_all(logs_dir).and_then(|()| fs::write(&path, report));
    match written {
        Ok(()) => Some(path),
        Err(e) => {
            log::error!("could not write fatal log to {}: {e}", path.display());
            None
        }
    }
}

fn fatal_report(at: DateTime<Utc>, error: &dyn Error) -> String {
    let process = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut report = String::new();
    let _ = writeln!(report, "Timestamp (UTC): {}", at.to_rfc3339());
    let _ = writeln!(report, "Process: {process}");
    let _ = writeln!(
        report,
        "OS: {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    let _ = writeln!(report, "Version: {APP_VERSION}");
    let _ = writeln!(report, "Error: {error}");

    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(report, "Caused by: {cause}");
        source = cause.source();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuicktextError;
    use tempfile::TempDir;

    #[test]
    fn test_fatal_log_contains_error_chain() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let error = QuicktextError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));

        let path = write_fatal_log(&logs, &error).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("fatal-") && name.ends_with(".log"));

        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("Timestamp (UTC):"));
        assert!(body.contains(APP_VERSION));
        assert!(body.contains(std::env::consts::OS));
        assert!(body.contains("disk on fire"));
    }

    #[test]
    fn test_unwritable_location_returns_none() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let error = QuicktextError::NoSelection;
        assert!(write_fatal_log(&blocker.join("logs"), &error).is_none());
    }
}
