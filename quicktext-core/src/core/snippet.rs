//! The snippet record and its normalization rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to records that reach the store without one.
pub const DEFAULT_TITLE: &str = "New Snippet";

/// Category given to records without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// A reusable block of text in the user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub keywords: String,
    pub last_used_utc: DateTime<Utc>,
}

/// A snippet produced by an import that has not yet been merged into a library.
pub type ImportCandidate = Snippet;

/// Generates a fresh opaque snippet identifier.
pub fn new_snippet_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Snippet {
    /// Creates a snippet with a fresh ID and `last_used_utc` set to now.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        keywords: impl Into<String>,
    ) -> Self {
        Self {
            id: new_snippet_id(),
            title: title.into(),
            content: content.into(),
            category: category.into(),
            keywords: keywords.into(),
            last_used_utc: Utc::now(),
        }
        .normalized()
    }

    /// Fills blank identity, title and category with defaults.
    ///
    /// IDs and categories are trimmed; timestamps at or before the Unix epoch
    /// are treated as missing and replaced with the current time.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.id = if self.id.trim().is_empty() {
            new_snippet_id()
        } else {
            self.id.trim().to_string()
        };
        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        self.category = normalize_category(&self.category);
        if self.last_used_utc <= DateTime::<Utc>::UNIX_EPOCH {
            self.last_used_utc = Utc::now();
        }
        self
    }

    /// Key used to detect duplicates during import: trimmed, lowercased title and content.
    pub fn identity_key(&self) -> String {
        format!(
            "{}::{}",
            self.title.trim().to_lowercase(),
            self.content.trim().to_lowercase()
        )
    }

    /// Short single-line preview of the content for list rows.
    pub fn preview(&self) -> String {
        if self.content.trim().is_empty() {
            return "(empty)".to_string();
        }
        truncate_with_ellipsis(&self.content, 90)
    }
}

/// Trims a category, substituting [`DEFAULT_CATEGORY`] when blank.
pub fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Keeps at most `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
