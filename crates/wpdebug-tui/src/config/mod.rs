//! Configuration for the TUI

mod keybindings;

pub use keybindings::{KeyBinding, KeyBindings, KeyContext};
