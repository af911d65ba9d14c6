//! Persistent filter rules and paths
//!
//! The store owns the configuration record and rewrites it in full after
//! every mutation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{CONSOLE_DIR_SETTING, LogError, Result};

/// Name of the watched file inside the log source directory
pub const DEBUG_LOG_FILE: &str = "debug.log";

/// Extension of console log files
pub const CONSOLE_LOG_EXTENSION: &str = "log";

const CONFIG_DIR: &str = "wpdebugger";
const CONFIG_FILE: &str = "config.json";

/// Externally persisted form of the store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRecord {
    #[serde(rename = "wp_content_path")]
    pub log_source_path: Option<PathBuf>,

    #[serde(rename = "console_logs_path")]
    pub console_log_directory: Option<PathBuf>,

    #[serde(rename = "regex_exceptions")]
    pub filter_rules: Vec<String>,
}

/// Ordered filter rules plus the two configured directories
#[derive(Debug)]
pub struct PatternStore {
    /// Backing file (None = memory only)
    path: Option<PathBuf>,

    /// Current record
    record: ConfigRecord,
}

impl PatternStore {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            record: ConfigRecord::default(),
        }
    }

    /// Load the store from `path`
    ///
    /// A missing file yields the empty state. A malformed file is reported
    /// and also yields the empty state; it is left on disk untouched until
    /// the next mutation rewrites it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = Self::read_record(&path);
        Self {
            path: Some(path),
            record,
        }
    }

    fn read_record(path: &Path) -> ConfigRecord {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return ConfigRecord::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(record) => {
                    debug!("Loaded config from {:?}", path);
                    record
                }
                Err(e) => {
                    warn!("Malformed config {:?}, starting empty: {}", path, e);
                    ConfigRecord::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                ConfigRecord::default()
            }
        }
    }

    /// Write the whole record to the backing file
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| LogError::io("failed to create", parent, e))?;
            }
        }
        let content = serde_json::to_string_pretty(&self.record)?;
        fs::write(path, content).map_err(|e| LogError::io("failed to write", path, e))
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            error!("Failed to persist config: {}", e);
        }
    }

    /// Backing file of this store
    pub fn config_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of the persisted record
    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    // ------------------------------------------------------------------------
    // Filter rules
    // ------------------------------------------------------------------------

    /// Rules in insertion order
    pub fn rules(&self) -> &[String] {
        &self.record.filter_rules
    }

    /// Compile `pattern` without storing it
    pub fn validate(pattern: &str) -> Result<Regex> {
        Regex::new(pattern).map_err(|source| LogError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
    }

    /// Append a rule if it compiles and is not already present
    pub fn add_rule(&mut self, pattern: &str) -> bool {
        if let Err(e) = Self::validate(pattern) {
            warn!("Rejected rule: {}", e);
            return false;
        }
        if self.record.filter_rules.iter().any(|r| r == pattern) {
            debug!("Rule '{}' already present", pattern);
            return false;
        }
        self.record.filter_rules.push(pattern.to_string());
        self.persist();
        info!("Added rule '{}'", pattern);
        true
    }

    /// Remove the first rule equal to `pattern`
    pub fn remove_rule(&mut self, pattern: &str) -> bool {
        let Some(pos) = self.record.filter_rules.iter().position(|r| r == pattern) else {
            return false;
        };
        self.record.filter_rules.remove(pos);
        self.persist();
        info!("Removed rule '{}'", pattern);
        true
    }

    /// Drop every rule
    pub fn clear_rules(&mut self) {
        self.record.filter_rules.clear();
        self.persist();
        info!("Cleared all rules");
    }

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    /// Directory holding `debug.log` (the wp-content directory)
    pub fn log_source_path(&self) -> Option<&Path> {
        self.record.log_source_path.as_deref()
    }

    pub fn set_log_source_path(&mut self, path: impl Into<PathBuf>) {
        self.record.log_source_path = Some(path.into());
        self.persist();
    }

    /// Full path of the watched file, if a source directory is set
    pub fn debug_log_path(&self) -> Option<PathBuf> {
        self.log_source_path().map(|dir| dir.join(DEBUG_LOG_FILE))
    }

    pub fn console_log_directory(&self) -> Option<&Path> {
        self.record.console_log_directory.as_deref()
    }

    pub fn set_console_log_directory(&mut self, path: impl Into<PathBuf>) {
        self.record.console_log_directory = Some(path.into());
        self.persist();
    }

    /// Most recently modified console log, if any
    pub fn latest_console_log(&self) -> Option<PathBuf> {
        self.resolve_console_log().ok()
    }

    /// Like [`latest_console_log`](Self::latest_console_log) but says why
    /// nothing was found
    pub fn resolve_console_log(&self) -> Result<PathBuf> {
        let dir = self
            .console_log_directory()
            .ok_or(LogError::NotConfigured(CONSOLE_DIR_SETTING))?;
        if !dir.is_dir() {
            return Err(LogError::MissingDirectory(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|e| LogError::io("failed to list", dir, e))?;

        let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_log = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == CONSOLE_LOG_EXTENSION);
            if !is_log {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            candidates.push((modified, path));
        }

        // Newest first; equal times fall back to path order
        candidates
            .into_iter()
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
            .map(|(_, path)| path)
            .ok_or_else(|| LogError::NoConsoleLogs(dir.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let store = PatternStore::load(temp.path().join("config.json"));
        assert!(store.rules().is_empty());
        assert!(store.log_source_path().is_none());
        assert!(store.console_log_directory().is_none());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = PatternStore::load(&path);
        assert!(store.rules().is_empty());
        // Left untouched until the next mutation
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_load_partial_record() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"regex_exceptions": ["foo", "bar"]}"#).unwrap();

        let store = PatternStore::load(&path);
        assert_eq!(store.rules(), &["foo".to_string(), "bar".to_string()]);
        assert!(store.log_source_path().is_none());
    }

    #[test]
    fn test_add_rule_persists() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");

        let mut store = PatternStore::load(&path);
        assert!(store.add_rule("Deprecated"));
        assert!(store.add_rule(r"PHP Notice:\s+Undefined"));

        let reloaded = PatternStore::load(&path);
        assert_eq!(reloaded.rules(), store.rules());
    }

    #[test]
    fn test_add_rule_rejects_invalid() {
        let mut store = PatternStore::in_memory();
        assert!(store.add_rule("ok"));
        assert!(!store.add_rule("[unterminated"));
        assert_eq!(store.rules(), &["ok".to_string()]);
    }

    #[test]
    fn test_add_rule_rejects_duplicate() {
        let mut store = PatternStore::in_memory();
        assert!(store.add_rule("dup"));
        assert!(!store.add_rule("dup"));
        assert_eq!(store.rules().len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        let mut store = PatternStore::load(&path);
        store.add_rule("a");
        store.add_rule("b");
        store.add_rule("c");

        assert!(store.remove_rule("b"));
        assert!(!store.remove_rule("b"));
        assert_eq!(store.rules(), &["a".to_string(), "c".to_string()]);

        store.clear_rules();
        assert!(store.rules().is_empty());
        assert!(PatternStore::load(&path).rules().is_empty());
    }

    #[test]
    fn test_record_uses_wire_keys() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.json");
        let mut store = PatternStore::load(&path);
        store.set_log_source_path("/srv/wp-content");
        store.add_rule("x");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["wp_content_path"], "/srv/wp-content");
        assert!(raw["console_logs_path"].is_null());
        assert_eq!(raw["regex_exceptions"][0], "x");
    }

    #[test]
    fn test_debug_log_path() {
        let mut store = PatternStore::in_memory();
        assert!(store.debug_log_path().is_none());
        store.set_log_source_path("/srv/wp-content");
        assert_eq!(
            store.debug_log_path(),
            Some(PathBuf::from("/srv/wp-content/debug.log"))
        );
    }

    #[test]
    fn test_latest_console_log_unset() {
        let store = PatternStore::in_memory();
        assert!(store.latest_console_log().is_none());
        assert_eq!(
            store.resolve_console_log().unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_latest_console_log_missing_dir() {
        let temp = tempdir().unwrap();
        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path().join("nope"));
        assert!(matches!(
            store.resolve_console_log(),
            Err(LogError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_latest_console_log_no_logs() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(temp.path().join("dir.log")).unwrap();

        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());
        assert!(matches!(
            store.resolve_console_log(),
            Err(LogError::NoConsoleLogs(_))
        ));
    }

    #[test]
    fn test_latest_console_log_picks_newest() {
        let temp = tempdir().unwrap();
        let old = temp.path().join("old.log");
        let new = temp.path().join("new.log");
        fs::write(&old, "old").unwrap();
        fs::write(&new, "new").unwrap();

        let now = SystemTime::now();
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(now - Duration::from_secs(3600))
            .unwrap();
        File::options()
            .write(true)
            .open(&new)
            .unwrap()
            .set_modified(now)
            .unwrap();

        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());
        assert_eq!(store.latest_console_log(), Some(new));
    }

    #[test]
    fn test_latest_console_log_tie_is_deterministic() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a.log");
        let b = temp.path().join("b.log");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let when = SystemTime::now() - Duration::from_secs(60);
        for path in [&a, &b] {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(when)
                .unwrap();
        }

        let mut store = PatternStore::in_memory();
        store.set_console_log_directory(temp.path());
        assert_eq!(store.latest_console_log(), Some(a));
    }
}
