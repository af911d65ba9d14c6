//! debug.log change detection
//!
//! A [`FileMonitor`] owns a `notify` watcher on a dedicated observer thread
//! and forwards modification events to a [`ChangeListener`]. The
//! [`ChangeWatcher`] is that listener: it debounces events, re-reads the
//! file, filters it and pushes the result to a [`DisplaySink`].

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{EventKind, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use wpdebug_types::{Block, FilterMode, WatchState};

use crate::error::{LogError, Result};
use crate::filter::{ContentFilter, RuleSet};
use crate::segmenter::BlockSegmenter;
use crate::store::{DEBUG_LOG_FILE, PatternStore};

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// How often the observer thread checks for a stop request
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Receives filesystem change notifications
pub trait ChangeListener: Send + Sync {
    fn on_file_changed(&self, path: &Path);
}

/// Display callbacks invoked by the watcher
///
/// Called from the observer thread; implementations must hand the data over
/// to their own UI thread rather than mutate UI state directly.
pub trait DisplaySink: Send + Sync {
    fn content_updated(&self, text: &str);
    fn attention_needed(&self);
    fn blocks_updated(&self, blocks: &[Block]);
}

/// Last-read content of the watched file
#[derive(Clone, Debug, Default)]
pub struct LogSnapshot {
    /// Full file content as of the last successful read
    pub content: String,
    /// When the last acted-upon change started (watcher-local clock)
    pub modified: Option<Instant>,
}

/// What a single event or reload did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Event fell inside the debounce window
    Debounced,
    /// File content matched the snapshot; nothing was sent
    Unchanged,
    /// New content was filtered and sent to the display
    Notified,
    /// The file could not be read
    ReadFailed,
}

/// Debounced, snapshot-comparing handler for debug.log changes
pub struct ChangeWatcher {
    path: PathBuf,
    store: Arc<RwLock<PatternStore>>,
    sink: Arc<dyn DisplaySink>,
    snapshot: Mutex<LogSnapshot>,
    /// Held for a whole read/compare/notify cycle and for truncation, so
    /// cycles reach the sink in the order they read the file
    cycle_lock: Mutex<()>,
    debounce: Duration,
    mode: RwLock<FilterMode>,
    filter: ContentFilter,
    segmenter: BlockSegmenter,
    block_view: AtomicBool,
    processing: AtomicBool,
}

impl ChangeWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        store: Arc<RwLock<PatternStore>>,
        sink: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            path: path.into(),
            store,
            sink,
            snapshot: Mutex::new(LogSnapshot::default()),
            cycle_lock: Mutex::new(()),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            mode: RwLock::new(FilterMode::default()),
            filter: ContentFilter::new(),
            segmenter: BlockSegmenter::new(),
            block_view: AtomicBool::new(false),
            processing: AtomicBool::new(false),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_filter_mode(self, mode: FilterMode) -> Self {
        *self.mode.write() = mode;
        self
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_segmenter(mut self, segmenter: BlockSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filter_mode(&self) -> FilterMode {
        *self.mode.read()
    }

    pub fn set_filter_mode(&self, mode: FilterMode) {
        *self.mode.write() = mode;
    }

    /// Also push segmented blocks on every notify
    pub fn set_block_view(&self, enabled: bool) {
        self.block_view.store(enabled, Ordering::SeqCst);
    }

    pub fn block_view(&self) -> bool {
        self.block_view.load(Ordering::SeqCst)
    }

    /// Unfiltered content as of the last read
    pub fn content(&self) -> String {
        self.snapshot.lock().content.clone()
    }

    pub fn state(&self) -> WatchState {
        self.state_at(Instant::now())
    }

    pub fn state_at(&self, now: Instant) -> WatchState {
        if self.processing.load(Ordering::SeqCst) {
            return WatchState::Processing;
        }
        match self.snapshot.lock().modified {
            Some(last) if now.saturating_duration_since(last) < self.debounce => {
                WatchState::Debouncing
            }
            _ => WatchState::Idle,
        }
    }

    /// Handle a modification event observed at `now`
    ///
    /// Events less than the debounce window after the last acted-upon event
    /// are ignored; the window is measured from the last action, so ignored
    /// events never extend it.
    pub fn handle_event_at(&self, now: Instant) -> CycleOutcome {
        {
            let mut snapshot = self.snapshot.lock();
            if let Some(last) = snapshot.modified {
                if now.saturating_duration_since(last) < self.debounce {
                    debug!("Change event inside debounce window, ignoring");
                    return CycleOutcome::Debounced;
                }
            }
            snapshot.modified = Some(now);
        }
        self.process(Cycle::Change)
    }

    /// Show whatever the file holds right now
    ///
    /// Used at monitoring start; does not touch the debounce clock. The
    /// display is always updated, even for an empty file, so text from a
    /// previously monitored file never lingers.
    pub fn load_initial(&self) -> CycleOutcome {
        self.process(Cycle::Initial)
    }

    /// Re-read and re-notify even if the content is unchanged
    pub fn reload(&self) -> Result<()> {
        match self.process(Cycle::Reload) {
            CycleOutcome::ReadFailed => Err(LogError::io(
                "failed to reload",
                &self.path,
                std::io::Error::other("read failed"),
            )),
            _ => Ok(()),
        }
    }

    /// Truncate the watched file and clear the display
    pub fn clear_content(&self) -> Result<()> {
        let _cycle = self.cycle_lock.lock();
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| LogError::io("failed to truncate", &self.path, e))?;
        self.snapshot.lock().content.clear();
        info!("Cleared {:?}", self.path);

        self.sink.content_updated("");
        if self.block_view() {
            self.sink.blocks_updated(&[]);
        }
        Ok(())
    }

    fn read_file(&self) -> std::io::Result<String> {
        let bytes = fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn process(&self, cycle: Cycle) -> CycleOutcome {
        let _cycle = self.cycle_lock.lock();
        self.processing.store(true, Ordering::SeqCst);
        let outcome = self.run_cycle(cycle);
        self.processing.store(false, Ordering::SeqCst);
        outcome
    }

    fn run_cycle(&self, cycle: Cycle) -> CycleOutcome {
        let content = match self.read_file() {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {:?}: {}", self.path, e);
                return CycleOutcome::ReadFailed;
            }
        };

        {
            let mut snapshot = self.snapshot.lock();
            if cycle == Cycle::Change && snapshot.content == content {
                debug!("No content change in {:?}", self.path);
                return CycleOutcome::Unchanged;
            }
            debug!(
                "Content changed: {} -> {} bytes",
                snapshot.content.len(),
                content.len()
            );
            snapshot.content = content.clone();
        }

        let rules = RuleSet::compile(self.store.read().rules());
        let filtered = self.filter.apply(self.filter_mode(), &content, &rules);

        self.sink.content_updated(&filtered);
        if self.block_view() {
            self.sink.blocks_updated(&self.segmenter.segment(&filtered));
        }
        let attention = match cycle {
            Cycle::Change => true,
            Cycle::Initial => !content.is_empty(),
            Cycle::Reload => false,
        };
        if attention {
            self.sink.attention_needed();
        }
        CycleOutcome::Notified
    }
}

/// What started a read/notify cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cycle {
    /// Debounced file event; skipped when the content is unchanged
    Change,
    /// Monitoring start; always notifies, flashes only for a non-empty file
    Initial,
    /// User reload; always notifies, never flashes
    Reload,
}

impl ChangeListener for ChangeWatcher {
    fn on_file_changed(&self, path: &Path) {
        if path.file_name() != self.path.file_name() {
            return;
        }
        self.handle_event_at(Instant::now());
    }
}

/// Make sure `dir` exists and holds a debug.log, creating an empty one
pub fn ensure_log_file(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(LogError::MissingDirectory(dir.to_path_buf()));
    }
    let path = dir.join(DEBUG_LOG_FILE);
    if !path.exists() {
        fs::File::create(&path).map_err(|e| LogError::io("failed to create", &path, e))?;
        info!("Created empty {:?}", path);
    }
    Ok(path)
}

/// Background observer forwarding file events to a listener
pub struct FileMonitor {
    path: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FileMonitor {
    /// Start watching `path` (its parent directory, non-recursively)
    pub fn start(path: &Path, listener: Arc<dyn ChangeListener>) -> Result<Self> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let target = path.to_path_buf();

        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher = notify::recommended_watcher(tx).map_err(|e| {
            LogError::io("failed to create watcher for", &dir, std::io::Error::other(e))
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| LogError::io("failed to watch", &dir, std::io::Error::other(e)))?;
        info!("Watching: {}", target.display());

        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("debug-log-observer".to_string())
                .spawn(move || {
                    // Keep the watcher alive for the life of the thread
                    let _watcher = watcher;
                    Self::run(&target, &rx, listener.as_ref(), &stop);
                })
                .map_err(|e| LogError::io("failed to spawn observer for", path, e))?
        };

        Ok(Self {
            path: path.to_path_buf(),
            stop,
            handle: Some(handle),
        })
    }

    fn run(
        target: &Path,
        rx: &mpsc::Receiver<notify::Result<notify::Event>>,
        listener: &dyn ChangeListener,
        stop: &AtomicBool,
    ) {
        let target_name = target.file_name();
        loop {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            match rx.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        continue;
                    }
                    if let Some(changed) = event
                        .paths
                        .iter()
                        .find(|p| p.file_name() == target_name)
                    {
                        listener.on_file_changed(changed);
                    }
                }
                Ok(Err(e)) => {
                    warn!("File watcher error: {:?}", e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("File watcher channel closed");
                    break;
                }
            }
        }
        info!("File watcher stopping");
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the observer and wait for it to finish
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("File watcher thread panicked");
            }
        }
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSink {
        contents: Mutex<Vec<String>>,
        blocks: Mutex<Vec<Vec<Block>>>,
        attention: AtomicUsize,
    }

    impl RecordingSink {
        fn contents(&self) -> Vec<String> {
            self.contents.lock().clone()
        }

        fn attention(&self) -> usize {
            self.attention.load(Ordering::SeqCst)
        }
    }

    impl DisplaySink for RecordingSink {
        fn content_updated(&self, text: &str) {
            self.contents.lock().push(text.to_string());
        }

        fn attention_needed(&self) {
            self.attention.fetch_add(1, Ordering::SeqCst);
        }

        fn blocks_updated(&self, blocks: &[Block]) {
            self.blocks.lock().push(blocks.to_vec());
        }
    }

    fn watcher_for(path: &Path, rules: &[&str]) -> (ChangeWatcher, Arc<RecordingSink>) {
        let mut store = PatternStore::in_memory();
        for rule in rules {
            store.add_rule(rule);
        }
        let sink = Arc::new(RecordingSink::default());
        let watcher = ChangeWatcher::new(path, Arc::new(RwLock::new(store)), sink.clone());
        (watcher, sink)
    }

    #[test]
    fn test_events_inside_window_trigger_one_cycle() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "[01-Jan-2024 00:00:00 UTC] hello\n").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        let t0 = Instant::now();
        assert_eq!(watcher.handle_event_at(t0), CycleOutcome::Notified);

        fs::write(&path, "[01-Jan-2024 00:00:00 UTC] hello\nmore\n").unwrap();
        assert_eq!(
            watcher.handle_event_at(t0 + Duration::from_millis(100)),
            CycleOutcome::Debounced
        );

        assert_eq!(sink.contents().len(), 1);
        assert_eq!(sink.attention(), 1);
    }

    #[test]
    fn test_debounce_measured_from_last_action() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "a").unwrap();
        let (watcher, _sink) = watcher_for(&path, &[]);

        let t0 = Instant::now();
        watcher.handle_event_at(t0);
        // Ignored events do not restart the window
        watcher.handle_event_at(t0 + Duration::from_millis(300));
        fs::write(&path, "b").unwrap();
        assert_eq!(
            watcher.handle_event_at(t0 + Duration::from_millis(550)),
            CycleOutcome::Notified
        );
    }

    #[test]
    fn test_same_content_does_not_notify_twice() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "same").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        let t0 = Instant::now();
        assert_eq!(watcher.handle_event_at(t0), CycleOutcome::Notified);
        assert_eq!(
            watcher.handle_event_at(t0 + Duration::from_secs(1)),
            CycleOutcome::Unchanged
        );
        assert_eq!(sink.contents(), vec!["same".to_string()]);
    }

    #[test]
    fn test_state_transitions() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "x").unwrap();
        let (watcher, _sink) = watcher_for(&path, &[]);

        let t0 = Instant::now();
        assert_eq!(watcher.state_at(t0), WatchState::Idle);
        watcher.handle_event_at(t0);
        assert_eq!(
            watcher.state_at(t0 + Duration::from_millis(100)),
            WatchState::Debouncing
        );
        assert_eq!(
            watcher.state_at(t0 + Duration::from_millis(600)),
            WatchState::Idle
        );
    }

    #[test]
    fn test_notify_applies_collapse_filter() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(
            &path,
            "[01-Jan-2024 00:00:00 UTC] Error A\n[01-Jan-2024 00:00:01 UTC] Error B\n",
        )
        .unwrap();
        let (watcher, sink) = watcher_for(&path, &["Error A"]);

        watcher.load_initial();
        assert_eq!(
            sink.contents(),
            vec![
                "[01-Jan-2024 00:00:00 UTC] Contenido omitido... (coincide con 'Error A')\n\
                 [01-Jan-2024 00:00:01 UTC] Error B\n"
                    .to_string()
            ]
        );
        // Snapshot keeps the raw text
        assert!(watcher.content().contains("Error A\n"));
    }

    #[test]
    fn test_notify_applies_redaction_filter() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "password=hunter2 ok").unwrap();
        let (watcher, sink) = watcher_for(&path, &[r"password=\S+"]);
        watcher.set_filter_mode(FilterMode::Redact);

        watcher.load_initial();
        assert_eq!(sink.contents(), vec!["[FILTRADO] ok".to_string()]);
    }

    #[test]
    fn test_custom_filter_and_segmenter() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "[info] token=1\n[01-Jan-2024 00:00:00 UTC] x\n").unwrap();
        let (watcher, sink) = watcher_for(&path, &[r"token=\d"]);
        let watcher = watcher
            .with_filter_mode(FilterMode::Redact)
            .with_filter(ContentFilter::new().with_marker("<hidden>"))
            .with_segmenter(BlockSegmenter::strict());
        watcher.set_block_view(true);

        watcher.load_initial();
        assert_eq!(
            sink.contents(),
            vec!["[info] <hidden>\n[01-Jan-2024 00:00:00 UTC] x\n".to_string()]
        );
        assert_eq!(sink.blocks.lock()[0].len(), 1);
    }

    #[test]
    fn test_block_view_pushes_blocks() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "[a] one\n[b] two\n").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        watcher.load_initial();
        assert!(sink.blocks.lock().is_empty());

        watcher.set_block_view(true);
        watcher.reload().unwrap();
        let blocks = sink.blocks.lock();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].len(), 2);
    }

    #[test]
    fn test_reload_bypasses_compare() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "same").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        watcher.load_initial();
        watcher.reload().unwrap();
        watcher.reload().unwrap();
        assert_eq!(sink.contents().len(), 3);
        // Reloads do not flash
        assert_eq!(sink.attention(), 1);
    }

    #[test]
    fn test_reload_missing_file_fails() {
        let temp = tempdir().unwrap();
        let (watcher, sink) = watcher_for(&temp.path().join("debug.log"), &[]);
        assert!(watcher.reload().is_err());
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_clear_content_truncates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "old content").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        watcher.load_initial();
        watcher.clear_content().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(watcher.content(), "");
        assert_eq!(sink.contents().last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_initial_load_of_empty_file_clears_display() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        assert_eq!(watcher.load_initial(), CycleOutcome::Notified);
        assert_eq!(sink.contents(), vec![String::new()]);
        assert_eq!(sink.attention(), 0);
    }

    #[test]
    fn test_clear_content_serialised_with_change_cycles() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "[01-Jan-2024 00:00:00 UTC] stale entry\n").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);
        let watcher = Arc::new(watcher.with_debounce(Duration::ZERO));

        let events = {
            let watcher = Arc::clone(&watcher);
            thread::spawn(move || {
                for _ in 0..200 {
                    watcher.handle_event_at(Instant::now());
                }
            })
        };
        for _ in 0..20 {
            watcher.clear_content().unwrap();
        }
        events.join().unwrap();

        // Whatever interleaving happened, the display ends on what the file holds
        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "");
        assert_eq!(watcher.content(), on_disk);
        assert_eq!(sink.contents().last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_listener_ignores_other_files() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("debug.log");
        fs::write(&path, "x").unwrap();
        let (watcher, sink) = watcher_for(&path, &[]);

        watcher.on_file_changed(&temp.path().join("other.txt"));
        assert!(sink.contents().is_empty());

        watcher.on_file_changed(&path);
        assert_eq!(sink.contents().len(), 1);
    }

    #[test]
    fn test_ensure_log_file() {
        let temp = tempdir().unwrap();
        let path = ensure_log_file(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("debug.log"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        assert!(matches!(
            ensure_log_file(&temp.path().join("missing")),
            Err(LogError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_file_monitor_stops_cleanly() {
        struct Noop;
        impl ChangeListener for Noop {
            fn on_file_changed(&self, _path: &Path) {}
        }

        let temp = tempdir().unwrap();
        let path = ensure_log_file(temp.path()).unwrap();
        let mut monitor = FileMonitor::start(&path, Arc::new(Noop)).unwrap();
        assert!(monitor.is_running());

        monitor.stop();
        assert!(!monitor.is_running());
        // Second stop is a no-op
        monitor.stop();
    }
}
