//! Core library for QuickText, a local encrypted library of reusable text snippets.
//!
//! The primary entry point is [`LibraryEngine`], which owns the in-memory
//! library, keeps the main and widget views filtered, and saves every
//! change through a [`SecureSnippetStore`] after a short quiet period.
//! Spreadsheet import lives in [`ExcelImporter`] and local AI drafting in
//! [`LocalAiService`].
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    ai::{AiError, AiGenerationRequest, AiRuntimeSettings, LlamaCppService, LocalAiService},
    codec::{decode_snippets, encode_snippets, SnippetRecord},
    collaborators::{copy_with_retry, ClipboardError, ClipboardSink, ViewPresenter},
    config::EngineConfig,
    debounce::Debouncer,
    diagnostics::{write_fatal_log, APP_VERSION},
    error::{QuicktextError, Result},
    excel::{ExcelImporter, ImportError, ImportLimits},
    filter::{apply_filter, category_index, ALL_CATEGORIES},
    identity::current_user_context,
    library::{
        EngineServices, GenerationOutcome, ImportSummary, LibraryEngine, PendingGeneration,
        SnippetUpdate, ViewKind, ViewState,
    },
    paths::AppPaths,
    settings::{AppSettings, SettingsStore},
    snippet::{ImportCandidate, Snippet},
    store::{LoadWarning, SecureSnippetStore, StoreLoad},
    vault::{KeyFileCipher, PlaintextCipher, VaultCipher, VaultError},
};
