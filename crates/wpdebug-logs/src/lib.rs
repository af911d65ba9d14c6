//! Log processing for wpdebugger
//!
//! This crate provides the debug.log engine: persistent filter rules, block
//! segmentation, collapse/redaction filtering, change watching and console
//! log merging.

mod combiner;
mod error;
mod filter;
mod segmenter;
mod session;
mod store;
mod watcher;

pub use combiner::{CONSOLE_LOG_HEADER, CombinedLogs, DEBUG_LOG_HEADER, LogCombiner};
pub use error::{CONSOLE_DIR_SETTING, ErrorKind, LOG_SOURCE_SETTING, LogError, Result};
pub use filter::{
    ContentFilter, MISSING_TIMESTAMP, OMITTED_NOTICE, REDACTION_MARKER, RuleSet, collapse_blocks,
    redact,
};
pub use segmenter::{BlockSegmenter, is_timestamp_line, timestamp_of};
pub use session::LogSession;
pub use store::{ConfigRecord, DEBUG_LOG_FILE, PatternStore};
pub use watcher::{
    ChangeListener, ChangeWatcher, CycleOutcome, DEFAULT_DEBOUNCE_MS, DisplaySink, FileMonitor,
    LogSnapshot, ensure_log_file,
};

// Re-export types used in our public API
pub use wpdebug_types::{Block, FilterMode, WatchState};
