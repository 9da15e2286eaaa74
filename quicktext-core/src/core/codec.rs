//! Plaintext encoding of the snippet library.
//!
//! The vault stores a pretty-printed JSON array of [`SnippetRecord`]s. Older
//! files used PascalCase property names and a `tags` field instead of
//! `keywords`; both are still accepted on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::snippet::Snippet;
use crate::Result;

/// One persisted snippet as it appears in the plaintext payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnippetRecord {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Content")]
    pub content: String,
    #[serde(alias = "Category")]
    pub category: Option<String>,
    #[serde(alias = "Keywords")]
    pub keywords: Option<String>,
    /// Legacy alias for `keywords`; never written by current versions.
    #[serde(alias = "Tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(alias = "LastUsedUtc", deserialize_with = "lenient_timestamp")]
    pub last_used_utc: Option<DateTime<Utc>>,
}

impl From<&Snippet> for SnippetRecord {
    fn from(snippet: &Snippet) -> Self {
        Self {
            id: snippet.id.clone(),
            title: snippet.title.clone(),
            content: snippet.content.clone(),
            category: Some(snippet.category.clone()),
            keywords: Some(snippet.keywords.clone()),
            tags: None,
            last_used_utc: Some(snippet.last_used_utc),
        }
    }
}

impl SnippetRecord {
    /// Converts the record into a normalized [`Snippet`].
    pub fn into_snippet(self) -> Snippet {
        let keywords = match self.keywords {
            Some(k) if !k.trim().is_empty() => k,
            _ => self.tags.unwrap_or_default(),
        };
        Snippet {
            id: self.id,
            title: self.title,
            content: self.content,
            category: self.category.unwrap_or_default(),
            keywords,
            last_used_utc: self.last_used_utc.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
        .normalized()
    }
}

/// Serializes the library into the pretty-printed plaintext payload.
pub fn encode_snippets(snippets: &[Snippet]) -> Result<Vec<u8>> {
    let records: Vec<SnippetRecord> = snippets.iter().map(SnippetRecord::from).collect();
    Ok(serde_json::to_vec_pretty(&records)?)
}

/// Parses the plaintext payload, normalizing every record.
///
/// # Errors
///
/// Returns [`crate::QuicktextError::Json`] when the payload is not a JSON
/// array of records.
pub fn decode_snippets(bytes: &[u8]) -> Result<Vec<Snippet>> {
    let records: Vec<SnippetRecord> = serde_json::from_slice(bytes)?;
    Ok(records.into_iter().map(SnippetRecord::into_snippet).collect())
}

/// Accepts RFC 3339 timestamps, `null`, and unparseable legacy values (read as missing).
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Offset-less values such as "2024-05-01T10:00:00" are taken as UTC.
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_is_pretty_camel_case() {
        let snippet = Snippet::new("Title", "Body", "General", "a,b");
        let bytes = encode_snippets(&[snippet]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n"));
        assert!(text.contains("\"lastUsedUtc\""));
        assert!(!text.contains("\"tags\""));
    }

    #[test]
    fn test_round_trip_preserves_snippets() {
        let snippets = vec![
            Snippet::new("One", "First", "Sales", "x"),
            Snippet::new("Two", "", "Support", ""),
        ];
        let decoded = decode_snippets(&encode_snippets(&snippets).unwrap()).unwrap();
        assert_eq!(decoded, snippets);
    }

    #[test]
    fn test_legacy_tags_fill_blank_keywords() {
        let json = r#"[{"Id":"abc","Title":"Hi","Content":"Hello","Category":null,
            "Keywords":"","Tags":"greeting,intro","LastUsedUtc":"2024-05-01T10:00:00"}]"#;
        let decoded = decode_snippets(json.as_bytes()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].keywords, "greeting,intro");
        assert_eq!(decoded[0].category, "General");
        assert_eq!(
            decoded[0].last_used_utc,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_keywords_win_over_tags() {
        let json = r#"[{"id":"a","title":"t","content":"c","keywords":"kw","tags":"old"}]"#;
        let decoded = decode_snippets(json.as_bytes()).unwrap();
        assert_eq!(decoded[0].keywords, "kw");
    }

    #[test]
    fn test_missing_fields_are_defaulted() {
        let json = r#"[{"content":"only content","lastUsedUtc":"0001-01-01T00:00:00"}]"#;
        let decoded = decode_snippets(json.as_bytes()).unwrap();
        assert!(!decoded[0].id.is_empty());
        assert_eq!(decoded[0].title, "New Snippet");
        assert!(decoded[0].last_used_utc > DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_malformed_payload_is_error() {
        assert!(decode_snippets(b"{not json").is_err());
        assert!(decode_snippets(br#"{"id":"x"}"#).is_err());
    }
}
