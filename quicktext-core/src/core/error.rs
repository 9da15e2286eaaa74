//! Error types for the QuickText core library.

use thiserror::Error;

use crate::core::ai::AiError;
use crate::core::collaborators::ClipboardError;
use crate::core::excel::ImportError;
use crate::core::vault::VaultError;

/// All errors that can occur within the QuickText core library.
#[derive(Debug, Error)]
pub enum QuicktextError {
    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored snippet or settings data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The vault could not seal or open the snippet blob.
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    /// A spreadsheet import was rejected.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// The local AI process could not produce text.
    #[error("AI generation failed: {0}")]
    Ai(#[from] AiError),

    /// A generation was requested while another one is still running.
    #[error("AI generation already in progress")]
    AiBusy,

    /// The AI executable, model path, or prompt is not usable.
    #[error("AI is not configured: {0}")]
    AiNotConfigured(String),

    /// There is no AI output to apply.
    #[error("No AI output available")]
    NoAiOutput,

    /// A snippet ID was requested that does not exist in the library.
    #[error("Snippet not found: {0}")]
    SnippetNotFound(String),

    /// The operation needs a selected snippet and there is none.
    #[error("No snippet selected")]
    NoSelection,

    /// The clipboard collaborator refused the text.
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// No tokio runtime was available to drive timers and subprocesses.
    #[error("Runtime unavailable: {0}")]
    Runtime(String),
}

/// Convenience alias that pins the error type to [`QuicktextError`].
pub type Result<T> = std::result::Result<T, QuicktextError>;

impl QuicktextError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                "Permission issue while accessing your quicktext files.".to_string()
            }
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Vault(_) => "Encryption issue while handling snippets.".to_string(),
            Self::Import(e) => format!("Excel import failed: {e}"),
            Self::Ai(e) => format!("AI generation failed: {e}"),
            Self::AiBusy => "AI generation is already running.".to_string(),
            Self::AiNotConfigured(_) => {
                "Set the AI executable, model path, and prompt first.".to_string()
            }
            Self::NoAiOutput => "Generate some AI output first.".to_string(),
            Self::SnippetNotFound(_) => "Quicktext no longer exists".to_string(),
            Self::NoSelection => "Select a quicktext first.".to_string(),
            Self::Clipboard(e) => format!("Could not copy to clipboard: {e}"),
            Self::Runtime(e) => format!("Internal error: {e}"),
        }
    }

    /// Status text shown when a library save fails; the in-memory library stays intact.
    #[must_use]
    pub fn save_message(&self) -> String {
        match self {
            Self::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                "Permission issue while saving snippets.".to_string()
            }
            Self::Vault(_) => "Encryption issue while saving snippets.".to_string(),
            _ => "Could not save snippets right now. Please try again.".to_string(),
        }
    }
}
