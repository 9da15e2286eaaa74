//! Internal domain modules for the QuickText core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod ai;
pub mod codec;
pub mod collaborators;
pub mod config;
pub mod debounce;
pub mod diagnostics;
pub mod error;
pub mod excel;
pub mod filter;
pub mod identity;
pub mod library;
pub mod paths;
pub mod settings;
pub mod snippet;
pub mod store;
pub mod vault;

#[doc(inline)]
pub use ai::{
    AiError, AiGenerationRequest, AiRuntimeSettings, LlamaCppService, LocalAiService,
};
#[doc(inline)]
pub use codec::{decode_snippets, encode_snippets, SnippetRecord};
#[doc(inline)]
pub use collaborators::{copy_with_retry, ClipboardError, ClipboardSink, ViewPresenter};
#[doc(inline)]
pub use config::EngineConfig;
#[doc(inline)]
pub use debounce::Debouncer;
#[doc(inline)]
pub use diagnostics::write_fatal_log;
#[doc(inline)]
pub use error::{QuicktextError, Result};
#[doc(inline)]
pub use excel::{ExcelImporter, ImportError, ImportLimits};
#[doc(inline)]
pub use filter::{apply_filter, category_index, ALL_CATEGORIES};
#[doc(inline)]
pub use library::{
    EngineServices, GenerationOutcome, ImportSummary, LibraryEngine, PendingGeneration,
    SnippetUpdate, ViewKind, ViewState,
};
#[doc(inline)]
pub use paths::AppPaths;
#[doc(inline)]
pub use settings::{AppSettings, SettingsStore};
#[doc(inline)]
pub use snippet::{ImportCandidate, Snippet};
#[doc(inline)]
pub use store::{LoadWarning, SecureSnippetStore, StoreLoad};
#[doc(inline)]
pub use vault::{KeyFileCipher, PlaintextCipher, VaultCipher, VaultError};
