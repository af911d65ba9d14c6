//! Terminal UI handling

mod event;
mod flash;
mod folder;
mod terminal;

pub use event::{Event, EventHandler};
pub use folder::{folder_command, open_folder};
pub use flash::{FLASH_INTERVAL_MS, FLASH_TOGGLES, TitleFlasher};
pub use terminal::Tui;
