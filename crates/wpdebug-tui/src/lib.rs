//! TUI components for wpdebugger
//!
//! This crate provides the terminal user interface for wpdebugger,
//! including state management, keybindings, event handling, the bridge from
//! the log engine's display sink, and UI components.

pub mod app;
pub mod config;
pub mod display;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, InputPurpose, InputState, MessageLevel, UiState, ViewMode};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use display::{ChannelDisplay, DisplayEvent};
pub use tui::{Event, EventHandler, TitleFlasher, Tui, open_folder};
pub use ui::components::{ConfirmDialog, HelpOverlay, InputBar, RulesOverlay, StatusBar};
pub use ui::screens::{BlockPickerScreen, LogViewerScreen};
pub use ui::{Layout, Theme};
