//! Single event stream feeding the UI loop
//!
//! Terminal input, periodic ticks and updates pushed by the log engine all
//! arrive through one channel, so the loop never has to choose between
//! sources.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::display::{ChannelDisplay, DisplayEvent};

/// Everything the UI loop reacts to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Periodic wakeup, used to expire status messages
    Tick,
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Update from the log engine
    Display(DisplayEvent),
    /// Terminal input failed
    Error(String),
}

/// Owns the terminal reader task and the sending side of the event channel
pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    /// Start reading terminal input, ticking every `tick_rate`
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(read_terminal(sender.clone(), cancel.clone(), tick_rate));
        Self {
            sender,
            receiver,
            cancel,
        }
    }

    /// Display sink whose updates arrive as [`Event::Display`]
    pub fn display_sink(&self) -> ChannelDisplay {
        ChannelDisplay::new(self.sender.clone())
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Stop the terminal reader; display updates still arrive
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn read_terminal(
    sender: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
) {
    let mut reader = EventStream::new();
    let mut ticks = tokio::time::interval(tick_rate);

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => Some(Event::Tick),
            input = reader.next().fuse() => match input {
                Some(Ok(event)) => translate(event),
                Some(Err(e)) => Some(Event::Error(e.to_string())),
                None => break,
            },
        };

        if let Some(event) = next {
            if sender.send(event).is_err() {
                break;
            }
        }
    }
    debug!("Terminal reader stopped");
}

/// Map a crossterm event to a UI event, dropping what the UI ignores
fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        // Windows reports releases too
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use wpdebug_logs::DisplaySink;

    fn key(kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(KeyCode::Char('p'), KeyModifiers::NONE, kind)
    }

    #[test]
    fn test_translate_keeps_presses_only() {
        let press = key(KeyEventKind::Press);
        assert_eq!(
            translate(CrosstermEvent::Key(press)),
            Some(Event::Key(press))
        );
        assert_eq!(translate(CrosstermEvent::Key(key(KeyEventKind::Release))), None);
        assert_eq!(
            translate(CrosstermEvent::Resize(80, 24)),
            Some(Event::Resize(80, 24))
        );
        assert_eq!(translate(CrosstermEvent::FocusGained), None);
    }

    #[tokio::test]
    async fn test_display_updates_share_the_stream() {
        // No terminal reader in tests
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut events = EventHandler {
            sender,
            receiver,
            cancel: CancellationToken::new(),
        };

        let sink = events.display_sink();
        sink.content_updated("[a] entry");
        sink.attention_needed();

        assert_eq!(
            events.next().await,
            Some(Event::Display(DisplayEvent::Content("[a] entry".into())))
        );
        assert_eq!(
            events.next().await,
            Some(Event::Display(DisplayEvent::Attention))
        );
    }
}
