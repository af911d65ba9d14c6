//! Bridge between the watcher's observer thread and the UI loop

use tokio::sync::mpsc;
use tracing::debug;

use wpdebug_logs::DisplaySink;
use wpdebug_types::Block;

use crate::tui::Event;

/// Updates produced by the log engine for the UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    /// New filtered log text
    Content(String),
    /// New block list for the block view
    Blocks(Vec<Block>),
    /// The log changed, grab the user's attention
    Attention,
}

/// [`DisplaySink`] that hands every update to the UI loop's event channel
///
/// The engine calls the sink from its observer thread; nothing here touches
/// UI state directly.
pub struct ChannelDisplay {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelDisplay {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    fn send(&self, update: DisplayEvent) {
        if self.tx.send(Event::Display(update)).is_err() {
            debug!("UI channel closed, dropping display update");
        }
    }
}

impl DisplaySink for ChannelDisplay {
    fn content_updated(&self, text: &str) {
        self.send(DisplayEvent::Content(text.to_string()));
    }

    fn attention_needed(&self) {
        self.send(DisplayEvent::Attention);
    }

    fn blocks_updated(&self, blocks: &[Block]) {
        self.send(DisplayEvent::Blocks(blocks.to_vec()));
    }
}
