use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::{LogError, Result};
use crate::store::PatternStore;

pub const DEBUG_LOG_HEADER: &str = "=== DEBUG.LOG ===";
pub const CONSOLE_LOG_HEADER: &str = "=== CONSOLE.LOG ===";

/// Result of merging the debug log with the newest console log
#[derive(Clone, Debug)]
pub struct CombinedLogs {
    /// Merged text under both section headers
    pub text: String,
    /// Console log that was used
    pub console_log: PathBuf,
    /// Length of the console log text in bytes
    pub console_len: usize,
}

impl CombinedLogs {
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Merges debug.log content with the latest browser console log
pub struct LogCombiner<'a> {
    store: &'a PatternStore,
}

impl<'a> LogCombiner<'a> {
    pub fn new(store: &'a PatternStore) -> Self {
        Self { store }
    }

    pub fn combine(&self, current_debug_content: &str) -> Result<CombinedLogs> {
        let console_log = self.store.resolve_console_log()?;

        let bytes =
            fs::read(&console_log).map_err(|e| LogError::io("failed to read", &console_log, e))?;
        let console_content = String::from_utf8_lossy(&bytes);

        if console_content.trim().is_empty() {
            return Err(LogError::EmptySource(console_log));
        }

        let text = format!(
            "{}\n\n{}\n\n{}\n\n{}",
            DEBUG_LOG_HEADER, current_debug_content, CONSOLE_LOG_HEADER, console_content
        );
        info!(
            "Combined debug log with {:?} ({} bytes)",
            console_log,
            console_content.len()
        );

        Ok(CombinedLogs {
            text,
            console_len: console_content.len(),
            console_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_combine_without_directory_is_configuration_error() {
        let store = PatternStore::in_memory();
        let err = LogCombiner::new(&store).combine("debug").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_combine_missing_directory() {
        let temp = tempdir().unwrap();
        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path().join("missing"));
        let err = LogCombiner::new(&store).combine("debug").unwrap_err();
        assert!(matches!(err, LogError::MissingDirectory(_)));
    }

    #[test]
    fn test_combine_no_log_files() {
        let temp = tempdir().unwrap();
        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());
        let err = LogCombiner::new(&store).combine("debug").unwrap_err();
        assert!(matches!(err, LogError::NoConsoleLogs(_)));
    }

    #[test]
    fn test_combine_empty_console_log() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("console.log"), "  \n\t\n").unwrap();
        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());

        let err = LogCombiner::new(&store).combine("debug").unwrap_err();
        assert!(matches!(err, LogError::EmptySource(_)));
        assert!(err.is_informational());
    }

    #[test]
    fn test_combine_formats_sections() {
        let temp = tempdir().unwrap();
        let console = temp.path().join("console.log");
        fs::write(&console, "Uncaught TypeError: x is undefined").unwrap();
        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());

        let combined = LogCombiner::new(&store).combine("[01-Jan-2024 00:00:00 UTC] a").unwrap();
        assert_eq!(
            combined.text,
            "=== DEBUG.LOG ===\n\n[01-Jan-2024 00:00:00 UTC] a\n\n=== CONSOLE.LOG ===\n\nUncaught TypeError: x is undefined"
        );
        assert_eq!(combined.console_log, console);
        assert_eq!(combined.console_len, 34);
    }

    #[test]
    fn test_combine_tolerates_invalid_utf8() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("console.log"), b"ok \xff\xfe end").unwrap();
        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());

        let combined = LogCombiner::new(&store).combine("").unwrap();
        assert!(combined.text.ends_with("ok \u{FFFD}\u{FFFD} end"));
    }
}
