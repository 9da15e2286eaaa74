//! Spreadsheet import of quicktexts from `.xlsx`/`.xlsm` workbooks.
//!
//! The first worksheet's first row names the columns; every later row with
//! a title or content becomes one [`ImportCandidate`]. Import is a pure
//! transform: merging and deduplication happen in the library engine.

mod package;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::core::snippet::{
    new_snippet_id, normalize_category, truncate_with_ellipsis, ImportCandidate, Snippet,
};

use package::{SheetRow, WorkbookPackage};

/// Title used when a row has neither a title nor any usable content text.
pub const IMPORTED_TITLE: &str = "Imported Snippet";

const SYNTHESIZED_TITLE_CHARS: usize = 50;

const TITLE_HEADERS: &[&str] = &["title", "name", "snippet", "subject"];
const CONTENT_HEADERS: &[&str] = &["content", "text", "body", "quicktext", "message", "template"];
const CATEGORY_HEADERS: &[&str] = &["category", "group", "folder", "section"];
const KEYWORD_HEADERS: &[&str] = &["keywords", "keyword", "tags", "tag"];

/// Errors that reject a whole import. The library is never touched when one occurs.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no file was selected")]
    MissingPath,

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("the file is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("the workbook part is missing")]
    WorkbookMissing,

    #[error("the workbook has no worksheet")]
    NoWorksheet,

    #[error("the first worksheet has no relationship id")]
    SheetIdMissing,

    #[error("worksheet part not found: {0}")]
    WorksheetMissing(String),

    #[error("no Title or Content column header was found in the first row")]
    MissingHeaders,

    #[error("the worksheet has more than {limit} data rows")]
    TooManyRows { limit: usize },

    #[error("cell {cell} is longer than {limit} characters")]
    CellTooLong { cell: String, limit: usize },

    #[error("package part {part} inflates past {limit} bytes")]
    PartTooLarge { part: String, limit: u64 },

    #[error("malformed worksheet: {0}")]
    Malformed(&'static str),

    #[error("not a valid spreadsheet package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("could not read the file: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds on what a single import may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_file_bytes: u64,
    /// Rows after the header row.
    pub max_data_rows: usize,
    pub max_cell_chars: usize,
    /// Inflated size cap for any single ZIP entry.
    pub max_part_bytes: u64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 20 * 1024 * 1024,
            max_data_rows: 10_000,
            max_cell_chars: 10_000,
            max_part_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Column letters resolved from the header row.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ColumnMap {
    title: Option<String>,
    content: Option<String>,
    category: Option<String>,
    keywords: Option<String>,
}

impl ColumnMap {
    fn from_header(row: &SheetRow) -> Result<Self, ImportError> {
        let mut map = Self::default();
        for (column, text) in row {
            let header = normalize_header(text);
            if header.is_empty() {
                continue;
            }
            let slot = if TITLE_HEADERS.contains(&header.as_str()) {
                &mut map.title
            } else if CONTENT_HEADERS.contains(&header.as_str()) {
                &mut map.content
            } else if CATEGORY_HEADERS.contains(&header.as_str()) {
                &mut map.category
            } else if KEYWORD_HEADERS.contains(&header.as_str()) {
                &mut map.keywords
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(column.clone());
            }
        }

        if map.title.is_none() && map.content.is_none() {
            return Err(ImportError::MissingHeaders);
        }
        Ok(map)
    }

    fn candidate(&self, row: &SheetRow) -> Option<ImportCandidate> {
        let cell = |column: &Option<String>| -> String {
            column
                .as_deref()
                .and_then(|c| row.iter().find(|(col, _)| col == c))
                .map(|(_, text)| text.trim().to_string())
                .unwrap_or_default()
        };

        let title = cell(&self.title);
        let content = cell(&self.content);
        if title.is_empty() && content.is_empty() {
            return None;
        }

        let title = if title.is_empty() {
            synthesize_title(&content)
        } else {
            title
        };

        Some(Snippet {
            id: new_snippet_id(),
            title,
            content,
            category: normalize_category(&cell(&self.category)),
            keywords: cell(&self.keywords),
            last_used_utc: Utc::now(),
        })
    }
}

fn normalize_header(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds a title from content: line breaks become spaces, then at most 50 characters.
fn synthesize_title(content: &str) -> String {
    let flattened = content.replace(['\r', '\n'], " ");
    let flattened = flattened.trim();
    if flattened.is_empty() {
        return IMPORTED_TITLE.to_string();
    }
    truncate_with_ellipsis(flattened, SYNTHESIZED_TITLE_CHARS)
}

/// Reads quicktexts out of the first worksheet of a workbook.
#[derive(Debug, Clone, Default)]
pub struct ExcelImporter {
    limits: ImportLimits,
}

impl ExcelImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ImportLimits) -> Self {
        Self { limits }
    }

    /// Parses `path` into import candidates.
    ///
    /// # Errors
    ///
    /// Any [`ImportError`]; a failure anywhere rejects the whole file.
    pub fn import(&self, path: &Path) -> Result<Vec<ImportCandidate>, ImportError> {
        if path.as_os_str().is_empty() {
            return Err(ImportError::MissingPath);
        }
        let metadata = match fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(ImportError::FileNotFound(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImportError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.len() > self.limits.max_file_bytes {
            return Err(ImportError::FileTooLarge {
                size: metadata.len(),
                limit: self.limits.max_file_bytes,
            });
        }

        let file = File::open(path)?;
        let package = WorkbookPackage::open(BufReader::new(file), &self.limits)?;

        let mut columns: Option<ColumnMap> = None;
        let mut candidates = Vec::new();
        package.for_each_row(&self.limits, |index, row| {
            if index == 0 {
                columns = Some(ColumnMap::from_header(&row)?);
            } else if let Some(map) = &columns {
                candidates.extend(map.candidate(&row));
            }
            Ok(())
        })?;

        if columns.is_none() {
            log::info!("{} has no rows to import", path.display());
            return Ok(Vec::new());
        }

        log::info!(
            "imported {} candidate(s) from {}",
            candidates.len(),
            path.display()
        );
        Ok(candidates)
    }
}
