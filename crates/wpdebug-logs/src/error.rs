use std::path::PathBuf;

use thiserror::Error;

/// Setting named by [`LogError::NotConfigured`] when no debug.log is monitored
pub const LOG_SOURCE_SETTING: &str = "log source directory";
/// Setting named by [`LogError::NotConfigured`] when combining is impossible
pub const CONSOLE_DIR_SETTING: &str = "console log directory";

/// Errors raised by the log engine
///
/// None of these are fatal: every variant is meant to be reported to the
/// display layer and recovered from.
#[derive(Debug, Error)]
pub enum LogError {
    /// A required path has not been configured yet
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// A configured directory does not exist
    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// The console log directory holds no `.log` files
    #[error("no .log files found in {}", .0.display())]
    NoConsoleLogs(PathBuf),

    /// A regular expression failed to compile
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Reading or writing a file failed
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The console log exists but holds no content
    #[error("console log is empty: {}", .0.display())]
    EmptySource(PathBuf),

    /// The configuration record could not be serialized
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Coarse classification used by the display layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unset path; prompt the user to configure it
    Configuration,
    /// Rejected regular expression
    InvalidPattern,
    /// File missing, unreadable or unwritable
    Io,
    /// Informational: source file had nothing in it
    EmptySource,
}

impl LogError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured(_) | Self::MissingDirectory(_) | Self::NoConsoleLogs(_) => {
                ErrorKind::Configuration
            }
            Self::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            Self::Io { .. } | Self::Serialize(_) => ErrorKind::Io,
            Self::EmptySource(_) => ErrorKind::EmptySource,
        }
    }

    /// Whether this is informational rather than a failure
    pub fn is_informational(&self) -> bool {
        self.kind() == ErrorKind::EmptySource
    }
}

pub type Result<T, E = LogError> = std::result::Result<T, E>;
