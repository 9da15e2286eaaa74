//! Minimal streaming reader for the first worksheet of an XLSX/XLSM package.
//!
//! Only what the importer needs is understood: the workbook's sheet list,
//! its relationships, the shared string table, and `<row>`/`<c>` elements.
//! Row and cell limits are enforced while the worksheet is being streamed.

use std::borrow::Cow;
use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{ImportError, ImportLimits};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// One worksheet row: column letters (e.g. `"B"`) to resolved cell text, in document order.
pub(crate) type SheetRow = Vec<(String, String)>;

/// An opened workbook with its first worksheet located and shared strings loaded.
pub(crate) struct WorkbookPackage {
    worksheet_xml: Vec<u8>,
    shared_strings: Vec<String>,
}

impl WorkbookPackage {
    /// Reads the package structure from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::WorkbookMissing`], [`ImportError::NoWorksheet`],
    /// [`ImportError::SheetIdMissing`] or [`ImportError::WorksheetMissing`]
    /// when the package lacks the parts needed to find the first worksheet.
    pub(crate) fn open<R: Read + Seek>(reader: R, limits: &ImportLimits) -> Result<Self, ImportError> {
        let mut archive = ZipArchive::new(reader)?;

        let workbook_xml = read_part(&mut archive, WORKBOOK_PART, limits)?
            .ok_or(ImportError::WorkbookMissing)?;
        let relationship_id = first_sheet_relationship_id(&workbook_xml)?;

        let relationships = match read_part(&mut archive, WORKBOOK_RELS_PART, limits)? {
            Some(xml) => parse_relationships(&xml)?,
            None => Vec::new(),
        };

        let worksheet_target = relationships
            .iter()
            .find(|rel| rel.id == relationship_id)
            .map(|rel| resolve_target(&rel.target))
            .ok_or_else(|| ImportError::WorksheetMissing(relationship_id.clone()))?;
        let worksheet_xml = read_part(&mut archive, &worksheet_target, limits)?
            .ok_or_else(|| ImportError::WorksheetMissing(worksheet_target.clone()))?;

        let shared_strings_part = relationships
            .iter()
            .find(|rel| rel.kind.ends_with("/sharedStrings"))
            .map(|rel| resolve_target(&rel.target))
            .unwrap_or_else(|| DEFAULT_SHARED_STRINGS_PART.to_string());
        let shared_strings = match read_part(&mut archive, &shared_strings_part, limits)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        Ok(Self {
            worksheet_xml,
            shared_strings,
        })
    }

    /// Streams the worksheet rows to `visit`, stopping at the first error.
    ///
    /// The first row passed is the header row. More than
    /// `limits.max_data_rows` rows after it, or any cell longer than
    /// `limits.max_cell_chars` characters, aborts the stream immediately.
    pub(crate) fn for_each_row<F>(&self, limits: &ImportLimits, mut visit: F) -> Result<(), ImportError>
    where
        F: FnMut(usize, SheetRow) -> Result<(), ImportError>,
    {
        let mut reader = Reader::from_reader(self.worksheet_xml.as_slice());
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();
        let mut row_index = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"row" => {
                    if row_index > limits.max_data_rows {
                        return Err(ImportError::TooManyRows {
                            limit: limits.max_data_rows,
                        });
                    }
                    let row = self.read_row(&mut reader, limits)?;
                    visit(row_index, row)?;
                    row_index += 1;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    if row_index > limits.max_data_rows {
                        return Err(ImportError::TooManyRows {
                            limit: limits.max_data_rows,
                        });
                    }
                    visit(row_index, Vec::new())?;
                    row_index += 1;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn read_row(&self, reader: &mut Reader<&[u8]>, limits: &ImportLimits) -> Result<SheetRow, ImportError> {
        let mut buf = Vec::new();
        let mut cells: SheetRow = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    let header = CellHeader::from_start(&e)?;
                    let raw = read_cell_body(reader, limits, header.reference.as_deref())?;
                    push_cell(&mut cells, header, raw, &self.shared_strings, limits)?;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                    let header = CellHeader::from_start(&e)?;
                    push_cell(&mut cells, header, CellBody::default(), &self.shared_strings, limits)?;
                }
                Event::End(e) if e.local_name().as_ref() == b"row" => break,
                Event::Eof => {
                    return Err(ImportError::Malformed("unexpected end of worksheet inside <row>"))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(cells)
    }
}

struct CellHeader {
    reference: Option<String>,
    kind: Option<String>,
}

impl CellHeader {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, ImportError> {
        Ok(Self {
            reference: attr_value(e, b"r")?,
            kind: attr_value(e, b"t")?,
        })
    }
}

#[derive(Default)]
struct CellBody {
    value: Option<String>,
    inline: Option<String>,
}

fn push_cell(
    cells: &mut SheetRow,
    header: CellHeader,
    body: CellBody,
    shared_strings: &[String],
    limits: &ImportLimits,
) -> Result<(), ImportError> {
    let Some(reference) = header.reference.filter(|r| !r.trim().is_empty()) else {
        return Ok(());
    };
    let column = column_name(&reference);
    if column.is_empty() {
        return Ok(());
    }

    let text = resolve_cell_text(header.kind.as_deref(), body, shared_strings);
    check_cell_length(&text, &reference, limits)?;

    match cells.iter_mut().find(|(c, _)| *c == column) {
        Some(existing) => existing.1 = text,
        None => cells.push((column, text)),
    }
    Ok(())
}

fn resolve_cell_text(kind: Option<&str>, body: CellBody, shared_strings: &[String]) -> String {
    match kind {
        Some("s") => body
            .value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|index| shared_strings.get(index).cloned())
            .unwrap_or_default(),
        Some("inlineStr") => body.inline.unwrap_or_default(),
        Some("b") => {
            if body.value.as_deref().map(str::trim) == Some("1") {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        _ => body.value.or(body.inline).unwrap_or_default(),
    }
}

fn check_cell_length(text: &str, reference: &str, limits: &ImportLimits) -> Result<(), ImportError> {
    // Byte length bounds char count from above, so most cells skip the count.
    if text.len() > limits.max_cell_chars && text.chars().count() > limits.max_cell_chars {
        return Err(ImportError::CellTooLong {
            cell: reference.to_string(),
            limit: limits.max_cell_chars,
        });
    }
    Ok(())
}

/// Reads the children of a `<c>` element: `<v>` text and `<is>` inline strings.
fn read_cell_body(
    reader: &mut Reader<&[u8]>,
    limits: &ImportLimits,
    reference: Option<&str>,
) -> Result<CellBody, ImportError> {
    let mut buf = Vec::new();
    let mut body = CellBody::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                body.value = Some(read_text(reader, b"v", limits, reference)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"is" => {
                body.inline = Some(read_rich_text(reader, b"is", limits, reference)?);
            }
            Event::Start(e) => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => return Err(ImportError::Malformed("unexpected end of worksheet inside <c>")),
            _ => {}
        }
        buf.clear();
    }
    Ok(body)
}

/// Concatenates the visible `<t>` runs of an `<si>` or `<is>` element, skipping phonetic runs.
fn read_rich_text(
    reader: &mut Reader<&[u8]>,
    end: &[u8],
    limits: &ImportLimits,
    reference: Option<&str>,
) -> Result<String, ImportError> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(reader, b"t", limits, reference)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => return Err(ImportError::Malformed("unexpected end of rich text")),
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Reads text content up to the closing `end` tag, failing early once it
/// grows past the cell limit.
fn read_text(
    reader: &mut Reader<&[u8]>,
    end: &[u8],
    limits: &ImportLimits,
    reference: Option<&str>,
) -> Result<String, ImportError> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => {
                let chunk: Cow<'_, str> = e.unescape()?;
                text.push_str(&chunk);
            }
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => return Err(ImportError::Malformed("unexpected end of text element")),
            _ => {}
        }
        if let Some(reference) = reference {
            check_cell_length(&text, reference, limits)?;
        }
        buf.clear();
    }
    Ok(text)
}

/// Leading letters of a cell reference, upper-cased: `"ab12"` → `"AB"`.
pub(crate) fn column_name(reference: &str) -> String {
    reference
        .chars()
        .take_while(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}

fn first_sheet_relationship_id(workbook_xml: &[u8]) -> Result<String, ImportError> {
    let mut reader = Reader::from_reader(workbook_xml);
    let mut buf = Vec::new();
    let mut saw_sheets = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheets" => {
                saw_sheets = true;
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let id = relationship_id_attr(&e)?;
                return match id {
                    Some(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
                    _ => Err(ImportError::SheetIdMissing),
                };
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if saw_sheets {
        Err(ImportError::NoWorksheet)
    } else {
        Err(ImportError::WorkbookMissing)
    }
}

/// The `r:id` attribute, matched by local name since producers vary the prefix.
fn relationship_id_attr(e: &BytesStart<'_>) -> Result<Option<String>, ImportError> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        if key != b"id" && key.ends_with(b":id") {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

struct Relationship {
    id: String,
    kind: String,
    target: String,
}

fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>, ImportError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id")?.unwrap_or_default();
                let kind = attr_value(&e, b"Type")?.unwrap_or_default();
                let target = attr_value(&e, b"Target")?.unwrap_or_default();
                relationships.push(Relationship { id, kind, target });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Resolves a workbook relationship target to a package part name.
fn resolve_target(target: &str) -> String {
    let target = target.replace('\\', "/");
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, ImportError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut items = Vec::new();
    let unbounded = ImportLimits {
        max_cell_chars: usize::MAX,
        ..ImportLimits::default()
    };

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                items.push(read_rich_text(&mut reader, b"si", &unbounded, None)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => items.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(items)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ImportError> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Inflates one part, refusing parts larger than `limits.max_part_bytes`.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    limits: &ImportLimits,
) -> Result<Option<Vec<u8>>, ImportError> {
    let index = match archive.index_for_name(name) {
        Some(index) => index,
        None => match find_part_case_insensitive(archive, name) {
            Some(index) => index,
            None => return Ok(None),
        },
    };

    let file = match archive.by_index(index) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if file.is_dir() {
        return Ok(None);
    }

    let mut bytes = Vec::new();
    file.take(limits.max_part_bytes + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limits.max_part_bytes {
        return Err(ImportError::PartTooLarge {
            part: name.to_string(),
            limit: limits.max_part_bytes,
        });
    }
    Ok(Some(bytes))
}

fn find_part_case_insensitive<R: Read + Seek>(archive: &ZipArchive<R>, name: &str) -> Option<usize> {
    let wanted = name.trim_start_matches('/');
    let actual = archive.file_names().find(|candidate| {
        candidate
            .trim_start_matches('/')
            .replace('\\', "/")
            .eq_ignore_ascii_case(wanted)
    })?;
    archive.index_for_name(actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("A1"), "A");
        assert_eq!(column_name("ab12"), "AB");
        assert_eq!(column_name("12"), "");
        assert_eq!(column_name("XFD1048576"), "XFD");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_target("./worksheets/s.xml"), "xl/worksheets/s.xml");
        assert_eq!(resolve_target("../custom/sheet.xml"), "custom/sheet.xml");
    }

    #[test]
    fn test_first_sheet_relationship_id() {
        let xml = br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets><sheet name="A" sheetId="1" r:id="rId7"/><sheet name="B" sheetId="2" r:id="rId8"/></sheets>
        </workbook>"#;
        assert_eq!(first_sheet_relationship_id(xml).unwrap(), "rId7");
    }

    #[test]
    fn test_sheet_without_id_is_rejected() {
        let xml = br#"<workbook><sheets><sheet name="A" sheetId="1"/></sheets></workbook>"#;
        assert!(matches!(
            first_sheet_relationship_id(xml),
            Err(ImportError::SheetIdMissing)
        ));
    }

    #[test]
    fn test_empty_sheet_list_is_rejected() {
        let xml = br#"<workbook><sheets/></workbook>"#;
        assert!(matches!(
            first_sheet_relationship_id(xml),
            Err(ImportError::NoWorksheet)
        ));
    }

    #[test]
    fn test_shared_strings_skip_phonetic_runs() {
        let xml = br#"<sst><si><t>Plain</t></si><si><r><t>Rich </t></r><r><t>text</t></r><rPh><t>PHO</t></rPh></si><si/></sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["Plain", "Rich text", ""]);
    }

    #[test]
    fn test_resolve_cell_text_encodings() {
        let shared = vec!["zero".to_string(), "one".to_string()];
        let value = |v: &str| CellBody {
            value: Some(v.to_string()),
            inline: None,
        };
        assert_eq!(resolve_cell_text(Some("s"), value("1"), &shared), "one");
        assert_eq!(resolve_cell_text(Some("s"), value("9"), &shared), "");
        assert_eq!(resolve_cell_text(Some("b"), value("1"), &shared), "TRUE");
        assert_eq!(resolve_cell_text(Some("b"), value("0"), &shared), "FALSE");
        assert_eq!(resolve_cell_text(None, value("42.5"), &shared), "42.5");
        assert_eq!(
            resolve_cell_text(
                Some("inlineStr"),
                CellBody {
                    value: None,
                    inline: Some("inline".to_string())
                },
                &shared
            ),
            "inline"
        );
    }
}
