use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::Action;

/// Number of on/off toggles in one attention flash
pub const FLASH_TOGGLES: usize = 6;
/// Delay between toggles
pub const FLASH_INTERVAL_MS: u64 = 500;

/// Drives the window-title attention flash
///
/// Each trigger runs [`FLASH_TOGGLES`] toggles, [`FLASH_INTERVAL_MS`] apart,
/// sending [`Action::Flash`] to the UI loop and always ending with the
/// prefix off. A trigger while a flash is running is ignored.
pub struct TitleFlasher {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Default for TitleFlasher {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleFlasher {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(FLASH_INTERVAL_MS))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            task: None,
            interval,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start a flash unless one is already running
    pub fn trigger(&mut self, tx: mpsc::UnboundedSender<Action>) {
        if self.is_running() {
            debug!("Attention flash already running");
            return;
        }

        let cancel = self.cancel.clone();
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            for i in 0..FLASH_TOGGLES {
                if tx.send(Action::Flash(i % 2 == 0)).is_err() {
                    return;
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            let _ = tx.send(Action::Flash(false));
        }));
    }

    /// Stop any running flash
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
