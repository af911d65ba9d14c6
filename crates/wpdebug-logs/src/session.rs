use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;

use wpdebug_types::FilterMode;

use crate::error::{LOG_SOURCE_SETTING, LogError, Result};
use crate::store::PatternStore;
use crate::watcher::{
    ChangeWatcher, DEFAULT_DEBOUNCE_MS, DisplaySink, FileMonitor, ensure_log_file,
};

/// Watcher and observer for the currently monitored debug.log
struct ActiveWatch {
    watcher: Arc<ChangeWatcher>,
    monitor: FileMonitor,
}

/// Manages monitoring of one debug.log at a time
pub struct LogSession {
    store: Arc<RwLock<PatternStore>>,
    sink: Arc<dyn DisplaySink>,
    mode: FilterMode,
    debounce: Duration,
    block_view: bool,
    active: Option<ActiveWatch>,
}

impl LogSession {
    pub fn new(store: Arc<RwLock<PatternStore>>, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            store,
            sink,
            mode: FilterMode::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            block_view: false,
            active: None,
        }
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start monitoring `dir/debug.log`, replacing any previous watch
    ///
    /// The file is created empty if missing and its current content is
    /// pushed to the display right away.
    pub fn start(&mut self, dir: &Path) -> Result<PathBuf> {
        self.stop();

        let path = ensure_log_file(dir)?;
        let watcher = Arc::new(
            ChangeWatcher::new(&path, Arc::clone(&self.store), Arc::clone(&self.sink))
                .with_debounce(self.debounce)
                .with_filter_mode(self.mode),
        );
        watcher.set_block_view(self.block_view);
        watcher.load_initial();

        let monitor = FileMonitor::start(&path, watcher.clone())?;
        info!("Monitoring {}", path.display());

        self.active = Some(ActiveWatch { watcher, monitor });
        Ok(path)
    }

    /// Stop monitoring and wait for the observer thread to exit
    pub fn stop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.monitor.stop();
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.active.is_some()
    }

    pub fn watcher(&self) -> Option<&Arc<ChangeWatcher>> {
        self.active.as_ref().map(|a| &a.watcher)
    }

    /// Path of the monitored file
    pub fn log_path(&self) -> Option<&Path> {
        self.watcher().map(|w| w.path())
    }

    fn require_watcher(&self) -> Result<&Arc<ChangeWatcher>> {
        self.watcher().ok_or(LogError::NotConfigured(LOG_SOURCE_SETTING))
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.mode
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
        if let Some(watcher) = self.watcher() {
            watcher.set_filter_mode(mode);
        }
    }

    pub fn set_block_view(&mut self, enabled: bool) {
        self.block_view = enabled;
        if let Some(watcher) = self.watcher() {
            watcher.set_block_view(enabled);
        }
    }

    pub fn reload(&self) -> Result<()> {
        self.require_watcher()?.reload()
    }

    pub fn clear_content(&self) -> Result<()> {
        self.require_watcher()?.clear_content()
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        self.stop();
    }
}
