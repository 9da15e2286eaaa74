//! The in-memory quicktext library and everything the UI drives through it.
//!
//! [`LibraryEngine`] is the single owner of the snippet collection. It keeps
//! the two filtered views (main library and widget) and the category index
//! in sync with the collection, and routes every change to a debounced
//! save. User-facing outcomes are published as status text.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::ai::{AiError, AiGenerationRequest, AiRuntimeSettings, LlamaCppService, LocalAiService};
use crate::core::collaborators::{copy_with_retry, ClipboardSink, ViewPresenter};
use crate::core::config::EngineConfig;
use crate::core::debounce::Debouncer;
use crate::core::excel::ExcelImporter;
use crate::core::filter::{apply_filter, category_index, is_all_categories, ALL_CATEGORIES};
use crate::core::paths::AppPaths;
use crate::core::settings::{clamp_max_tokens, clamp_temperature, AppSettings, SettingsStore};
use crate::core::snippet::{
    normalize_category, truncate_with_ellipsis, ImportCandidate, Snippet, DEFAULT_CATEGORY,
};
use crate::core::store::SecureSnippetStore;
use crate::{QuicktextError, Result};

/// Title of snippets created with [`LibraryEngine::add_snippet`].
pub const NEW_SNIPPET_TITLE: &str = "New QuickText";

/// Title used for AI-created snippets when the prompt is blank.
pub const AI_SNIPPET_TITLE: &str = "AI QuickText";

pub const DEFAULT_AI_PROMPT: &str = "Write a concise professional follow-up message.";

const AI_TITLE_CHARS: usize = 38;
const NOT_CONFIGURED_MESSAGE: &str = "Set the AI executable, model path, and prompt first.";

/// Which of the two independent views an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// The main library window.
    Library,
    /// The compact quick-access widget.
    Widget,
}

/// Query, category selector and the resulting visible snippet IDs of one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub query: String,
    pub category: String,
    /// Visible snippet IDs, most recently used first.
    pub items: Vec<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
            items: Vec::new(),
        }
    }
}

/// Field changes for [`LibraryEngine::update_snippet`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub keywords: Option<String>,
}

/// Counts reported after merging imported candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Candidates whose title and content already existed.
    pub skipped: usize,
}

/// External services the engine talks to.
pub struct EngineServices {
    pub store: Arc<SecureSnippetStore>,
    pub settings: Arc<SettingsStore>,
    pub ai: Arc<dyn LocalAiService>,
    pub clipboard: Arc<dyn ClipboardSink>,
    pub presenter: Option<Arc<dyn ViewPresenter>>,
}

impl EngineServices {
    /// The production wiring: encrypted store and settings under `paths`, llama.cpp for AI.
    pub fn standard(paths: &AppPaths, clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self {
            store: Arc::new(SecureSnippetStore::open_default(paths)),
            settings: Arc::new(SettingsStore::open_default(paths)),
            ai: Arc::new(LlamaCppService::new()),
            clipboard,
            presenter: None,
        }
    }

    #[must_use]
    pub fn with_presenter(mut self, presenter: Arc<dyn ViewPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }
}

/// Clears the engine's busy flag when dropped.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A generation that has passed the busy and configuration checks.
///
/// Holding it keeps the engine busy. Dropping it at any point, including
/// mid-[`run`](Self::run), releases the engine again.
pub struct PendingGeneration {
    service: Arc<dyn LocalAiService>,
    settings: AiRuntimeSettings,
    request: AiGenerationRequest,
    busy: BusyGuard,
}

impl PendingGeneration {
    pub fn request(&self) -> &AiGenerationRequest {
        &self.request
    }

    /// Runs the model. Does not touch the engine, so it can be awaited off the UI thread.
    pub async fn run(self, cancel: CancellationToken) -> GenerationOutcome {
        let result = self
            .service
            .generate(&self.settings, &self.request, cancel)
            .await;
        GenerationOutcome {
            result,
            _busy: self.busy,
        }
    }
}

/// What a [`PendingGeneration`] produced; hand it to [`LibraryEngine::finish_generation`].
pub struct GenerationOutcome {
    result: std::result::Result<String, AiError>,
    _busy: BusyGuard,
}

impl GenerationOutcome {
    pub fn result(&self) -> std::result::Result<&str, &AiError> {
        self.result.as_deref()
    }
}

/// Owns the snippet library, both views, AI drafting state, and persistence scheduling.
pub struct LibraryEngine {
    snippets: Vec<Snippet>,
    categories: Vec<String>,
    library_view: ViewState,
    widget_view: ViewState,
    selected: Option<String>,
    status: Arc<watch::Sender<String>>,
    importer: ExcelImporter,
    ai: Arc<dyn LocalAiService>,
    clipboard: Arc<dyn ClipboardSink>,
    presenter: Option<Arc<dyn ViewPresenter>>,
    library_saver: Debouncer<Vec<Snippet>>,
    settings_saver: Debouncer<AppSettings>,
    settings: AppSettings,
    ai_prompt: String,
    ai_output: String,
    ai_busy: Arc<AtomicBool>,
}

impl LibraryEngine {
    /// Loads settings and the library and prepares both views.
    ///
    /// Load problems never fail construction; they become the status
    /// message. An empty library is seeded with a welcome snippet.
    ///
    /// # Errors
    ///
    /// Returns [`QuicktextError::Runtime`] if called outside a tokio runtime.
    pub fn new(services: EngineServices, config: EngineConfig) -> Result<Self> {
        let (status_tx, _) = watch::channel(String::new());
        let status = Arc::new(status_tx);

        let settings = services.settings.load();
        if let Some(message) = services.settings.last_load_error() {
            status.send_replace(message);
        }

        let loaded = services.store.load();
        if let Some(warning) = &loaded.warning {
            log::warn!("library loaded with warning: {warning:?}");
            status.send_replace(warning.to_string());
        }
        let mut snippets = loaded.snippets;
        if snippets.is_empty() {
            snippets.push(welcome_snippet());
        }

        let library_saver = {
            let store = Arc::clone(&services.store);
            let status = Arc::clone(&status);
            Debouncer::new(config.autosave_delay, move |snapshot: Vec<Snippet>| {
                if let Err(e) = store.save(&snapshot) {
                    log::error!("failed to save library: {e}");
                    status.send_replace(e.save_message());
                }
            })?
        };
        let settings_saver = {
            let store = Arc::clone(&services.settings);
            let status = Arc::clone(&status);
            Debouncer::new(config.settings_save_delay, move |settings: AppSettings| {
                if let Err(e) = store.save(&settings) {
                    log::error!("failed to save settings: {e}");
                    status.send_replace(settings_save_message(&e));
                }
            })?
        };

        let mut engine = Self {
            snippets,
            categories: Vec::new(),
            library_view: ViewState::default(),
            widget_view: ViewState::default(),
            selected: None,
            status,
            importer: ExcelImporter::with_limits(config.import_limits),
            ai: services.ai,
            clipboard: services.clipboard,
            presenter: services.presenter,
            library_saver,
            settings_saver,
            settings,
            ai_prompt: DEFAULT_AI_PROMPT.to_string(),
            ai_output: String::new(),
            ai_busy: Arc::new(AtomicBool::new(false)),
        };
        engine.refresh_categories();
        engine.refresh_views();
        log::info!("library ready with {} snippet(s)", engine.snippets.len());
        Ok(engine)
    }

    // ── Read access ─────────────────────────────────────────────

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn snippet(&self, id: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    /// `"All Categories"` followed by the library's distinct categories.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn view(&self, kind: ViewKind) -> &ViewState {
        match kind {
            ViewKind::Library => &self.library_view,
            ViewKind::Widget => &self.widget_view,
        }
    }

    /// The snippets currently visible in `kind`, in display order.
    pub fn filtered(&self, kind: ViewKind) -> Vec<&Snippet> {
        self.view(kind)
            .items
            .iter()
            .filter_map(|id| self.snippet(id))
            .collect()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_snippet(&self) -> Option<&Snippet> {
        self.selected.as_deref().and_then(|id| self.snippet(id))
    }

    /// Latest user-visible status message.
    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status.subscribe()
    }

    /// True while a library save is waiting for its debounce timer.
    pub fn has_pending_save(&self) -> bool {
        self.library_saver.is_pending()
    }

    // ── Views and selection ─────────────────────────────────────

    pub fn set_query(&mut self, kind: ViewKind, query: impl Into<String>) {
        self.view_mut(kind).query = query.into();
        self.refresh_views();
    }

    /// Sets the category selector; blank or unknown categories select everything.
    pub fn set_category(&mut self, kind: ViewKind, category: &str) {
        let category = category.trim();
        let resolved = if is_all_categories(category) {
            ALL_CATEGORIES.to_string()
        } else {
            self.categories
                .iter()
                .find(|c| c.to_lowercase() == category.to_lowercase())
                .cloned()
                .unwrap_or_else(|| ALL_CATEGORIES.to_string())
        };
        self.view_mut(kind).category = resolved;
        self.refresh_views();
    }

    /// Selects a snippet, or clears the selection with `None`.
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) if self.snippet(id).is_none() => {
                Err(QuicktextError::SnippetNotFound(id.to_string()))
            }
            Some(id) => {
                self.selected = Some(id.to_string());
                Ok(())
            }
            None => {
                self.selected = None;
                Ok(())
            }
        }
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Creates an empty snippet in the library view's category and selects it.
    pub fn add_snippet(&mut self) -> String {
        let category = if is_all_categories(&self.library_view.category) {
            DEFAULT_CATEGORY.to_string()
        } else {
            self.library_view.category.clone()
        };
        let snippet = Snippet::new(NEW_SNIPPET_TITLE, "", category, "");
        let id = snippet.id.clone();
        self.snippets.push(snippet);
        self.selected = Some(id.clone());
        self.library_changed();
        self.set_status("Created a new quicktext.");
        id
    }

    /// Changes the given fields of a snippet. Unchanged values do not trigger a save.
    pub fn update_snippet(&mut self, id: &str, update: SnippetUpdate) -> Result<()> {
        let snippet = self
            .snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| QuicktextError::SnippetNotFound(id.to_string()))?;

        let mut changed = false;
        if let Some(title) = update.title {
            changed |= replace_if_different(&mut snippet.title, title);
        }
        if let Some(content) = update.content {
            changed |= replace_if_different(&mut snippet.content, content);
        }
        if let Some(category) = update.category {
            changed |= replace_if_different(&mut snippet.category, normalize_category(&category));
        }
        if let Some(keywords) = update.keywords {
            changed |= replace_if_different(&mut snippet.keywords, keywords);
        }

        if changed {
            self.library_changed();
        }
        Ok(())
    }

    pub fn delete_snippet(&mut self, id: &str) -> Result<()> {
        let index = self
            .snippets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| QuicktextError::SnippetNotFound(id.to_string()))?;
        self.snippets.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.library_changed();
        self.set_status("Quicktext deleted.");
        Ok(())
    }

    /// Deletes the selected snippet; does nothing without a selection.
    pub fn delete_selected(&mut self) -> Result<()> {
        match self.selected.clone() {
            Some(id) => self.delete_snippet(&id),
            None => Ok(()),
        }
    }

    /// Puts a snippet's content on the clipboard and marks it as just used.
    ///
    /// Snippets with blank content are ignored.
    pub fn copy_snippet(&mut self, id: &str) -> Result<()> {
        let snippet = self
            .snippet(id)
            .ok_or_else(|| QuicktextError::SnippetNotFound(id.to_string()))?;
        if snippet.content.trim().is_empty() {
            return Ok(());
        }
        let title = snippet.title.clone();

        if let Err(e) = copy_with_retry(self.clipboard.as_ref(), &snippet.content) {
            let error = QuicktextError::from(e);
            self.set_status(error.user_message());
            return Err(error);
        }

        if let Some(snippet) = self.snippets.iter_mut().find(|s| s.id == id) {
            snippet.last_used_utc = Utc::now();
        }
        self.library_changed();
        self.set_status(format!("Copied '{title}' to clipboard."));
        Ok(())
    }

    pub fn copy_selected(&mut self) -> Result<()> {
        match self.selected.clone() {
            Some(id) => self.copy_snippet(&id),
            None => Err(QuicktextError::NoSelection),
        }
    }

    /// Adds candidates whose title and content are new, skipping the rest.
    ///
    /// The first added snippet becomes the selection.
    pub fn merge_import(&mut self, candidates: Vec<ImportCandidate>) -> ImportSummary {
        let mut existing: HashSet<String> = self.snippets.iter().map(Snippet::identity_key).collect();
        let mut summary = ImportSummary::default();
        let mut first_added = None;

        for candidate in candidates {
            let candidate = candidate.normalized();
            if !existing.insert(candidate.identity_key()) {
                summary.skipped += 1;
                continue;
            }
            first_added.get_or_insert_with(|| candidate.id.clone());
            self.snippets.push(candidate);
            summary.added += 1;
        }

        if let Some(id) = first_added {
            self.selected = Some(id);
            self.library_changed();
        }
        log::info!(
            "merged import: {} added, {} skipped",
            summary.added,
            summary.skipped
        );
        summary
    }

    /// Imports a workbook and merges it. Failures leave the library untouched.
    ///
    /// The workbook is parsed on the calling thread.
    pub fn import_from_excel(&mut self, path: &Path) -> Result<ImportSummary> {
        let candidates = match self.importer.import(path) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("import of {} failed: {e}", path.display());
                let error = QuicktextError::from(e);
                self.set_status(error.user_message());
                return Err(error);
            }
        };

        if candidates.is_empty() {
            self.set_status("No quicktexts found in the selected workbook.");
            return Ok(ImportSummary::default());
        }

        let summary = self.merge_import(candidates);
        self.set_status(format!("Imported {} quicktexts from Excel.", summary.added));
        Ok(summary)
    }

    // ── AI drafting ─────────────────────────────────────────────

    pub fn ai_prompt(&self) -> &str {
        &self.ai_prompt
    }

    pub fn set_ai_prompt(&mut self, prompt: impl Into<String>) {
        self.ai_prompt = prompt.into();
    }

    pub fn ai_output(&self) -> &str {
        &self.ai_output
    }

    /// Replaces the draft, e.g. after the user edited it.
    pub fn set_ai_output(&mut self, output: impl Into<String>) {
        self.ai_output = output.into();
    }

    pub fn is_ai_busy(&self) -> bool {
        self.ai_busy.load(Ordering::SeqCst)
    }

    /// True when both the executable and the model file exist.
    pub fn is_ai_configured(&self) -> bool {
        let runtime = self.settings.ai_runtime();
        runtime.executable_path.is_file() && runtime.model_path.is_file()
    }

    /// Checks that a generation may start and marks the engine busy.
    ///
    /// The request carries the selected snippet's category, keywords and
    /// content as hints.
    ///
    /// # Errors
    ///
    /// [`QuicktextError::AiBusy`] while another generation is pending, or
    /// [`QuicktextError::AiNotConfigured`] when the prompt is blank or the
    /// executable or model file is missing.
    pub fn begin_generation(&mut self) -> Result<PendingGeneration> {
        if self.is_ai_busy() {
            return Err(QuicktextError::AiBusy);
        }
        if let Some(reason) = self.ai_configuration_problem() {
            self.set_status(NOT_CONFIGURED_MESSAGE);
            return Err(QuicktextError::AiNotConfigured(reason));
        }
        if self
            .ai_busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(QuicktextError::AiBusy);
        }
        let busy = BusyGuard(Arc::clone(&self.ai_busy));

        let selected = self.selected_snippet();
        let request = AiGenerationRequest {
            prompt: self.ai_prompt.clone(),
            category: selected.map(|s| s.category.clone()).unwrap_or_default(),
            keywords: selected.map(|s| s.keywords.clone()).unwrap_or_default(),
            existing_text: selected.map(|s| s.content.clone()).unwrap_or_default(),
        };

        self.set_status("Generating quicktext locally...");
        Ok(PendingGeneration {
            service: Arc::clone(&self.ai),
            settings: self.settings.ai_runtime(),
            request,
            busy,
        })
    }

    /// Records a generation's result. On failure the previous draft is kept.
    pub fn finish_generation(&mut self, outcome: GenerationOutcome) -> Result<()> {
        let GenerationOutcome { result, _busy: busy } = outcome;
        drop(busy);
        match result {
            Ok(text) => {
                self.ai_output = text.trim().to_string();
                self.set_status("AI quicktext generated successfully.");
                Ok(())
            }
            Err(AiError::Cancelled) => {
                self.set_status("AI generation cancelled.");
                Err(QuicktextError::Ai(AiError::Cancelled))
            }
            Err(e) => {
                log::warn!("AI generation failed: {e}");
                self.set_status(format!("AI generation failed: {e}"));
                Err(QuicktextError::Ai(e))
            }
        }
    }

    /// Begins, runs and finishes one generation.
    pub async fn generate_ai(&mut self, cancel: CancellationToken) -> Result<()> {
        let pending = self.begin_generation()?;
        let outcome = pending.run(cancel).await;
        self.finish_generation(outcome)
    }

    /// Replaces the selected snippet's content with the AI draft.
    pub fn apply_ai_output_to_selected(&mut self) -> Result<()> {
        let output = self.ai_output.trim().to_string();
        if output.is_empty() {
            return Err(QuicktextError::NoAiOutput);
        }
        let id = self.selected.clone().ok_or(QuicktextError::NoSelection)?;
        let snippet = self
            .snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(QuicktextError::SnippetNotFound(id))?;
        snippet.content = output;
        snippet.last_used_utc = Utc::now();
        self.library_changed();
        self.set_status("Applied AI output to selected quicktext.");
        Ok(())
    }

    /// Saves the AI draft as a new snippet titled after the prompt and selects it.
    ///
    /// Category and keywords come from the selected snippet, if any.
    pub fn create_snippet_from_ai_output(&mut self) -> Result<String> {
        let output = self.ai_output.trim().to_string();
        if output.is_empty() {
            return Err(QuicktextError::NoAiOutput);
        }

        let (category, keywords) = match self.selected_snippet() {
            Some(s) => (s.category.clone(), s.keywords.clone()),
            None => (DEFAULT_CATEGORY.to_string(), String::new()),
        };
        let snippet = Snippet::new(title_from_prompt(&self.ai_prompt), output, category, keywords);
        let id = snippet.id.clone();
        self.snippets.push(snippet);
        self.selected = Some(id.clone());
        self.library_changed();
        self.set_status("Created a new quicktext from AI output.");
        Ok(id)
    }

    // ── Settings ────────────────────────────────────────────────

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn set_ai_executable_path(&mut self, path: impl Into<String>) {
        self.settings.ai_executable_path = path.into();
        self.settings_changed();
    }

    pub fn set_ai_model_path(&mut self, path: impl Into<String>) {
        self.settings.ai_model_path = path.into();
        self.settings_changed();
    }

    pub fn set_ai_temperature(&mut self, temperature: f64) {
        self.settings.ai_temperature = clamp_temperature(temperature);
        self.settings_changed();
    }

    pub fn set_ai_max_tokens(&mut self, max_tokens: i64) {
        self.settings.ai_max_tokens = clamp_max_tokens(max_tokens);
        self.settings_changed();
    }

    // ── Host requests ───────────────────────────────────────────

    /// Writes the library and settings now, cancelling pending timers. Call on shutdown.
    pub fn persist_now(&mut self) {
        self.library_saver.flush_with(self.snippets.clone());
        self.settings_saver.flush_with(self.settings.clone());
    }

    pub fn request_toggle_widget(&self) {
        match &self.presenter {
            Some(presenter) => presenter.toggle_widget(),
            None => log::debug!("toggle widget requested without a presenter"),
        }
    }

    pub fn request_open_main(&self) {
        match &self.presenter {
            Some(presenter) => presenter.open_main_view(),
            None => log::debug!("open main view requested without a presenter"),
        }
    }

    // ── Internals ───────────────────────────────────────────────

    fn set_status(&self, message: impl Into<String>) {
        self.status.send_replace(message.into());
    }

    fn view_mut(&mut self, kind: ViewKind) -> &mut ViewState {
        match kind {
            ViewKind::Library => &mut self.library_view,
            ViewKind::Widget => &mut self.widget_view,
        }
    }

    fn ai_configuration_problem(&self) -> Option<String> {
        if self.ai_prompt.trim().is_empty() {
            return Some("the prompt is empty".to_string());
        }
        let runtime = self.settings.ai_runtime();
        if !runtime.executable_path.is_file() {
            return Some(format!(
                "executable not found: {}",
                runtime.executable_path.display()
            ));
        }
        if !runtime.model_path.is_file() {
            return Some(format!("model not found: {}", runtime.model_path.display()));
        }
        None
    }

    /// Recomputes derived state after the collection changed and schedules a save.
    fn library_changed(&mut self) {
        self.refresh_categories();
        self.refresh_views();
        self.library_saver.schedule(self.snippets.clone());
    }

    fn settings_changed(&mut self) {
        self.settings_saver.schedule(self.settings.clone());
    }

    /// Rebuilds the category index; selectors naming a vanished category fall back to all.
    fn refresh_categories(&mut self) {
        self.categories = category_index(&self.snippets);
        for view in [&mut self.library_view, &mut self.widget_view] {
            let current = view.category.to_lowercase();
            if !self.categories.iter().any(|c| c.to_lowercase() == current) {
                view.category = ALL_CATEGORIES.to_string();
            }
        }
    }

    fn refresh_views(&mut self) {
        self.library_view.items = visible_ids(&self.snippets, &self.library_view);
        self.widget_view.items = visible_ids(&self.snippets, &self.widget_view);

        let still_visible = self
            .selected
            .as_ref()
            .is_some_and(|id| self.library_view.items.contains(id));
        if !still_visible {
            self.selected = self.library_view.items.first().cloned();
        }
    }
}

fn visible_ids(snippets: &[Snippet], view: &ViewState) -> Vec<String> {
    apply_filter(snippets, &view.query, &view.category)
        .into_iter()
        .map(|s| s.id.clone())
        .collect()
}

fn replace_if_different(field: &mut String, value: String) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}

fn welcome_snippet() -> Snippet {
    Snippet::new(
        "Welcome",
        "Use Lookr to store reusable quicktexts and copy them instantly.",
        DEFAULT_CATEGORY,
        "intro,getting-started",
    )
}

/// Trimmed prompt cut to 38 characters, or a fixed title when blank.
fn title_from_prompt(prompt: &str) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return AI_SNIPPET_TITLE.to_string();
    }
    truncate_with_ellipsis(prompt, AI_TITLE_CHARS)
}

fn settings_save_message(error: &QuicktextError) -> String {
    match error {
        QuicktextError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            "Permission issue while saving app settings.".to_string()
        }
        _ => "Could not save app settings right now.".to_string(),
    }
}
