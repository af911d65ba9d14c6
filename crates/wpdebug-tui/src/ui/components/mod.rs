mod confirm_dialog;
mod help_overlay;
mod input_bar;
mod rules_overlay;
mod status_bar;

pub use confirm_dialog::ConfirmDialog;
pub use help_overlay::HelpOverlay;
pub use input_bar::InputBar;
pub use rules_overlay::RulesOverlay;
pub use status_bar::{StatusBar, truncate_to_width};
