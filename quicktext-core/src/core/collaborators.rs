//! Interfaces to the host application: clipboard and view presentation.

use std::thread;
use std::time::Duration;

use thiserror::Error;

pub const CLIPBOARD_ATTEMPTS: u32 = 5;
pub const CLIPBOARD_RETRY_DELAY: Duration = Duration::from_millis(40);

#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Another process holds the clipboard; worth retrying shortly.
    #[error("the clipboard is in use by another application")]
    Busy,

    #[error("{0}")]
    Failed(String),
}

/// Places text on the system clipboard.
pub trait ClipboardSink: Send + Sync {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Shows or hides the host's windows when the engine is asked to.
pub trait ViewPresenter: Send + Sync {
    fn open_main_view(&self);
    fn toggle_widget(&self);
}

/// Copies `text`, retrying while the clipboard reports [`ClipboardError::Busy`].
///
/// Blank text is ignored. Non-busy failures are returned immediately.
pub fn copy_with_retry(sink: &dyn ClipboardSink, text: &str) -> Result<(), ClipboardError> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let mut attempt = 1;
    loop {
        match sink.copy_text(text) {
            Ok(()) => return Ok(()),
            Err(ClipboardError::Busy) if attempt < CLIPBOARD_ATTEMPTS => {
                log::debug!("clipboard busy (attempt {attempt}), retrying");
                attempt += 1;
                thread::sleep(CLIPBOARD_RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}
