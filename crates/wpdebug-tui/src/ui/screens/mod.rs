mod block_picker;
mod log_viewer;

pub use block_picker::BlockPickerScreen;
pub use log_viewer::LogViewerScreen;
