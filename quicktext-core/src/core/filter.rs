//! Query/category filtering and the category index shown in both views.

use std::cmp::Ordering;

use crate::core::snippet::Snippet;

/// Category selector meaning "do not restrict by category".
pub const ALL_CATEGORIES: &str = "All Categories";

/// True when `selector` does not restrict by category.
pub fn is_all_categories(selector: &str) -> bool {
    let selector = selector.trim();
    selector.is_empty() || selector.eq_ignore_ascii_case(ALL_CATEGORIES)
}

/// Returns the snippets visible for `query` and `category`, most recently used first.
///
/// Category comparison is case-insensitive. A non-blank query must appear,
/// case-insensitively, in the title, content, category or keywords. Ties on
/// `last_used_utc` are broken by title, ignoring case.
pub fn apply_filter<'a>(snippets: &'a [Snippet], query: &str, category: &str) -> Vec<&'a Snippet> {
    let category = category.trim().to_lowercase();
    let restrict = !is_all_categories(&category);
    let query = query.trim().to_lowercase();

    let mut visible: Vec<&Snippet> = snippets
        .iter()
        .filter(|s| !restrict || s.category.trim().to_lowercase() == category)
        .filter(|s| query.is_empty() || matches_query(s, &query))
        .collect();
    visible.sort_by(|a, b| recency_order(a, b));
    visible
}

fn matches_query(snippet: &Snippet, lowered_query: &str) -> bool {
    [
        &snippet.title,
        &snippet.content,
        &snippet.category,
        &snippet.keywords,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(lowered_query))
}

fn recency_order(a: &Snippet, b: &Snippet) -> Ordering {
    b.last_used_utc
        .cmp(&a.last_used_utc)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

/// Distinct categories (trimmed, case-insensitively deduplicated, sorted)
/// prefixed with [`ALL_CATEGORIES`].
pub fn category_index(snippets: &[Snippet]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for snippet in snippets {
        let category = snippet.category.trim();
        if category.is_empty() {
            continue;
        }
        let lowered = category.to_lowercase();
        if !categories.iter().any(|c| c.to_lowercase() == lowered) {
            categories.push(category.to_string());
        }
    }
    categories.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    let mut index = Vec::with_capacity(categories.len() + 1);
    index.push(ALL_CATEGORIES.to_string());
    index.extend(categories);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn snippet(title: &str, content: &str, category: &str, keywords: &str, minutes: i64) -> Snippet {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Snippet {
            id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            keywords: keywords.to_string(),
            last_used_utc: base + Duration::minutes(minutes),
        }
    }

    fn titles(view: &[&Snippet]) -> Vec<String> {
        view.iter().map(|s| s.title.clone()).collect()
    }

    #[test]
    fn test_query_and_category_filter() {
        let snippets = vec![
            snippet("Follow Up", "Checking in", "General", "", 5),
            snippet("Thanks", "Thanks for the call", "general", "FOLLOW-up", 10),
            snippet("Follow up sales", "Pricing", "Sales", "", 20),
            snippet("Intro", "Hello", "General", "", 30),
            snippet("Apology", "Sorry, I will follow through", "General", "", 5),
        ];

        let view = apply_filter(&snippets, "follow", "General");
        assert_eq!(titles(&view), vec!["Thanks", "Apology", "Follow Up"]);
    }

    #[test]
    fn test_all_categories_and_blank_query_keep_everything() {
        let snippets = vec![
            snippet("b", "", "Sales", "", 0),
            snippet("A", "", "General", "", 0),
            snippet("c", "", "Ops", "", 1),
        ];
        let view = apply_filter(&snippets, "   ", ALL_CATEGORIES);
        assert_eq!(titles(&view), vec!["c", "A", "b"]);
        assert_eq!(apply_filter(&snippets, "", "").len(), 3);
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let snippets = vec![snippet("a", "", "General", "", 0)];
        assert!(apply_filter(&snippets, "", "Missing").is_empty());
    }

    #[test]
    fn test_query_matches_any_field_case_insensitively() {
        let snippets = vec![
            snippet("Alpha", "", "General", "", 0),
            snippet("x", "contains ALPHA", "General", "", 0),
            snippet("y", "", "alphabet", "", 0),
            snippet("z", "", "General", "alp,ha", 0),
        ];
        assert_eq!(apply_filter(&snippets, "alpha", ALL_CATEGORIES).len(), 3);
    }

    #[test]
    fn test_category_index_dedupes_and_sorts() {
        let snippets = vec![
            snippet("a", "", "sales", "", 0),
            snippet("b", "", " Sales ", "", 0),
            snippet("c", "", "General", "", 0),
            snippet("d", "", "billing", "", 0),
        ];
        assert_eq!(
            category_index(&snippets),
            vec![ALL_CATEGORIES, "billing", "General", "sales"]
        );
    }

    #[test]
    fn test_category_index_of_empty_library() {
        assert_eq!(category_index(&[]), vec![ALL_CATEGORIES]);
    }
}
