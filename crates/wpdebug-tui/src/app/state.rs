use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use wpdebug_logs::{BlockSegmenter, PatternStore};
use wpdebug_types::{Block, FilterMode};

use crate::config::KeyContext;
use crate::display::DisplayEvent;

/// Base window title
pub const APP_TITLE: &str = "WordPress Debug Log Viewer";
/// Appended to the title while display updates are paused
pub const PAUSED_SUFFIX: &str = " [PAUSADO]";
/// Prepended to the title during the attention flash
pub const ATTENTION_PREFIX: &str = "¡NUEVO LOG! - ";
/// How long an info message stays in the status bar
pub const INFO_MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Which view of the log is shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Full filtered text
    #[default]
    Log,
    /// One selectable entry per block
    Blocks,
}

/// What a text prompt is collecting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputPurpose {
    AddRule,
    LogSource,
    ConsoleDirectory,
}

impl InputPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            Self::AddRule => " Add exception pattern ",
            Self::LogSource => " wp-content directory ",
            Self::ConsoleDirectory => " Console log directory ",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::AddRule => "Regular expression; matching entries are hidden",
            Self::LogSource => "Directory holding debug.log (created if missing)",
            Self::ConsoleDirectory => "Directory holding browser console .log files",
        }
    }
}

/// An open text prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputState {
    pub purpose: InputPurpose,
    pub text: String,
    pub error: Option<String>,
}

impl InputState {
    pub fn new(purpose: InputPurpose, text: String) -> Self {
        Self {
            purpose,
            text,
            error: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// UI-specific transient state
pub struct UiState {
    /// Is help overlay visible?
    pub help_visible: bool,

    /// Is the rules overlay visible?
    pub rules_visible: bool,

    /// Selected row in the rules overlay
    pub rule_selection: usize,

    /// Open text prompt, if any
    pub input: Option<InputState>,

    /// Waiting for confirmation before truncating debug.log
    pub confirm_clear: bool,

    /// One-line message shown in the status area
    pub message: Option<(MessageLevel, String)>,

    /// When the current message was shown
    pub message_since: Option<Instant>,

    /// Scroll position in the log view
    pub log_scroll: usize,

    /// Follow the end of the log?
    pub auto_scroll: bool,

    /// Cursor row in the block view
    pub block_cursor: usize,

    /// Indices of checked blocks
    pub selected_blocks: BTreeSet<usize>,

    /// Attention prefix currently shown in the title
    pub flash_on: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            help_visible: false,
            rules_visible: false,
            rule_selection: 0,
            input: None,
            confirm_clear: false,
            message: None,
            message_since: None,
            log_scroll: 0,
            auto_scroll: true,
            block_cursor: 0,
            selected_blocks: BTreeSet::new(),
            flash_on: false,
        }
    }
}

/// Global application state
pub struct AppState {
    pub view: ViewMode,

    /// Latest filtered log text
    pub content: String,

    /// Text shown while paused
    frozen: Option<String>,

    /// Blocks listed in the block view
    pub blocks: Vec<Block>,

    /// Display updates suspended?
    pub paused: bool,

    pub filter_mode: FilterMode,

    /// Mirror of the persisted exception patterns
    pub rules: Vec<String>,

    /// Monitored wp-content directory
    pub source_dir: Option<PathBuf>,

    /// Browser console log directory
    pub console_dir: Option<PathBuf>,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Dirty flag for rendering - only render when true
    pub render_dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: ViewMode::default(),
            content: String::new(),
            frozen: None,
            blocks: Vec::new(),
            paused: false,
            filter_mode: FilterMode::default(),
            rules: Vec::new(),
            source_dir: None,
            console_dir: None,
            ui_state: UiState::default(),
            should_quit: false,
            render_dirty: true,
        }
    }

    /// Refresh the mirrored configuration after the store changed
    pub fn sync_config(&mut self, store: &PatternStore) {
        self.rules = store.rules().to_vec();
        self.source_dir = store.log_source_path().map(PathBuf::from);
        self.console_dir = store.console_log_directory().map(PathBuf::from);
        if self.ui_state.rule_selection >= self.rules.len() {
            self.ui_state.rule_selection = self.rules.len().saturating_sub(1);
        }
        self.render_dirty = true;
    }

    /// Text currently on screen
    pub fn visible_content(&self) -> &str {
        self.frozen.as_deref().unwrap_or(&self.content)
    }

    /// Apply an update from the log engine
    ///
    /// Returns true when the attention flash should start.
    pub fn apply_display_event(&mut self, event: DisplayEvent) -> bool {
        self.render_dirty = true;
        match event {
            DisplayEvent::Content(text) => {
                self.content = text;
                false
            }
            DisplayEvent::Blocks(blocks) => {
                if !self.paused {
                    self.set_blocks(blocks);
                }
                false
            }
            DisplayEvent::Attention => true,
        }
    }

    /// Replace the block list; checked state does not survive
    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.ui_state.selected_blocks.clear();
        if self.ui_state.block_cursor >= self.blocks.len() {
            self.ui_state.block_cursor = self.blocks.len().saturating_sub(1);
        }
    }

    /// Rebuild the block list from the text on screen
    pub fn refresh_blocks(&mut self) {
        let blocks = BlockSegmenter::new().segment(self.visible_content());
        self.set_blocks(blocks);
    }

    pub fn toggle_block_view(&mut self) -> ViewMode {
        self.view = match self.view {
            ViewMode::Log => ViewMode::Blocks,
            ViewMode::Blocks => ViewMode::Log,
        };
        if self.view == ViewMode::Blocks {
            self.refresh_blocks();
        }
        self.view
    }

    /// Pause or resume display updates, returns the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.frozen = if self.paused {
            Some(self.content.clone())
        } else {
            None
        };
        self.paused
    }

    /// The user cleared debug.log; empty the view even while paused
    pub fn content_cleared(&mut self) {
        self.content.clear();
        if self.paused {
            self.frozen = Some(String::new());
        }
        self.set_blocks(Vec::new());
        self.render_dirty = true;
    }

    pub fn window_title(&self) -> String {
        let mut title = String::new();
        if self.ui_state.flash_on {
            title.push_str(ATTENTION_PREFIX);
        }
        title.push_str(APP_TITLE);
        if self.paused {
            title.push_str(PAUSED_SUFFIX);
        }
        title
    }

    /// Keybinding context for the topmost UI element
    pub fn key_context(&self) -> KeyContext {
        if self.ui_state.input.is_some() {
            KeyContext::TextInput
        } else if self.ui_state.confirm_clear {
            KeyContext::Confirm
        } else if self.ui_state.rules_visible {
            KeyContext::Rules
        } else if self.view == ViewMode::Blocks {
            KeyContext::BlockPicker
        } else {
            KeyContext::LogViewer
        }
    }

    /// Close the topmost overlay; false when there was nothing to close
    pub fn go_back(&mut self) -> bool {
        if self.ui_state.input.take().is_some() {
            return true;
        }
        if self.ui_state.confirm_clear {
            self.ui_state.confirm_clear = false;
            return true;
        }
        if self.ui_state.help_visible {
            self.ui_state.help_visible = false;
            return true;
        }
        if self.ui_state.rules_visible {
            self.ui_state.rules_visible = false;
            return true;
        }
        if self.view == ViewMode::Blocks {
            self.view = ViewMode::Log;
            return true;
        }
        self.ui_state.message_since = None;
        self.ui_state.message.take().is_some()
    }

    // Log view scrolling

    pub fn scroll_up(&mut self, n: usize) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = self.ui_state.log_scroll.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.ui_state.auto_scroll = false;
        // Clamped by the renderer against the real line count
        self.ui_state.log_scroll = self.ui_state.log_scroll.saturating_add(n);
    }

    pub fn scroll_to_top(&mut self) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = usize::MAX;
    }

    // Block view

    pub fn block_up(&mut self) {
        let len = self.blocks.len();
        if len == 0 {
            return;
        }
        let cursor = self.ui_state.block_cursor;
        self.ui_state.block_cursor = if cursor == 0 { len - 1 } else { cursor - 1 };
    }

    pub fn block_down(&mut self) {
        let len = self.blocks.len();
        if len == 0 {
            return;
        }
        let cursor = self.ui_state.block_cursor;
        self.ui_state.block_cursor = if cursor >= len - 1 { 0 } else { cursor + 1 };
    }

    pub fn toggle_block(&mut self) {
        let cursor = self.ui_state.block_cursor;
        if cursor >= self.blocks.len() {
            return;
        }
        let selected = &mut self.ui_state.selected_blocks;
        if !selected.remove(&cursor) {
            selected.insert(cursor);
        }
    }

    pub fn select_all_blocks(&mut self) {
        self.ui_state.selected_blocks = (0..self.blocks.len()).collect();
    }

    pub fn deselect_all_blocks(&mut self) {
        self.ui_state.selected_blocks.clear();
    }

    /// Checked blocks in display order, separated by blank lines
    pub fn selected_text(&self) -> Option<String> {
        if self.ui_state.selected_blocks.is_empty() {
            return None;
        }
        let texts: Vec<&str> = self
            .ui_state
            .selected_blocks
            .iter()
            .filter_map(|&i| self.blocks.get(i))
            .map(|b| b.text.as_str())
            .collect();
        Some(texts.join("\n\n"))
    }

    // Rules overlay

    pub fn rule_up(&mut self) {
        self.ui_state.rule_selection = self.ui_state.rule_selection.saturating_sub(1);
    }

    pub fn rule_down(&mut self) {
        if self.ui_state.rule_selection + 1 < self.rules.len() {
            self.ui_state.rule_selection += 1;
        }
    }

    pub fn selected_rule(&self) -> Option<&str> {
        self.rules
            .get(self.ui_state.rule_selection)
            .map(String::as_str)
    }

    // Text prompt

    /// Open a prompt, pre-filled with the current value where there is one
    pub fn open_input(&mut self, purpose: InputPurpose) {
        let current = match purpose {
            InputPurpose::AddRule => None,
            InputPurpose::LogSource => self.source_dir.as_ref(),
            InputPurpose::ConsoleDirectory => self.console_dir.as_ref(),
        };
        let text = current
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.ui_state.input = Some(InputState::new(purpose, text));
    }

    pub fn input_push(&mut self, c: char) {
        if let Some(input) = &mut self.ui_state.input {
            input.text.push(c);
            input.error = None;
        }
    }

    pub fn input_backspace(&mut self) {
        if let Some(input) = &mut self.ui_state.input {
            input.text.pop();
            input.error = None;
        }
    }

    pub fn input_clear(&mut self) {
        if let Some(input) = &mut self.ui_state.input {
            input.text.clear();
            input.error = None;
        }
    }

    /// Keep the prompt open with an error under it
    pub fn reject_input<S: Into<String>>(&mut self, error: S) {
        if let Some(input) = &mut self.ui_state.input {
            input.error = Some(error.into());
        }
    }

    // Messages

    pub fn show_info<S: Into<String>>(&mut self, msg: S) {
        self.ui_state.message = Some((MessageLevel::Info, msg.into()));
        self.ui_state.message_since = Some(Instant::now());
    }

    pub fn show_error<S: Into<String>>(&mut self, msg: S) {
        self.ui_state.message = Some((MessageLevel::Error, msg.into()));
        self.ui_state.message_since = Some(Instant::now());
    }

    pub fn dismiss_message(&mut self) {
        self.ui_state.message = None;
        self.ui_state.message_since = None;
    }

    /// Drop an info message older than [`INFO_MESSAGE_TTL`]; errors stay
    /// until dismissed. Returns true when the status bar changed.
    pub fn expire_message(&mut self, now: Instant) -> bool {
        let stale = matches!(
            (&self.ui_state.message, self.ui_state.message_since),
            (Some((MessageLevel::Info, _)), Some(since))
                if now.saturating_duration_since(since) >= INFO_MESSAGE_TTL
        );
        if stale {
            self.dismiss_message();
            self.render_dirty = true;
        }
        stale
    }
}
