//! Turning an upload or pasted text into a document to query.
//!
//! | Source | Text |
//! |--------|------|
//! | `.txt` | the bytes as UTF-8 |
//! | `.xlsx` `.xlsm` `.xls` `.ods` | every sheet, one line per row |
//! | pasted | as typed |
//!
//! A workbook flattens to:
//!
//! ```text
//! Sheet: Staff
//! Ada Lovelace Engineer
//! Alan Turing Researcher
//!
//! Sheet: Sites
//! London 12
//! ```

use calamine::{open_workbook_auto_from_rs, Reader};
use tracing::debug;

use crate::{Error, Result, TableKind, Upload};

/// A single piece of raw text to chunk and query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    /// A document from pasted text.
    #[must_use]
    pub fn pasted(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The document text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether there is no text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the text out.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Where a document comes from.
#[derive(Debug, Clone, Copy)]
pub enum TextSource<'a> {
    /// An uploaded `.txt` or workbook file.
    Upload(&'a Upload),
    /// Text typed or pasted by the user.
    Pasted(&'a str),
}

impl<'a> TextSource<'a> {
    /// Prefer an upload over pasted text, as the form does.
    #[must_use]
    pub fn choose(upload: Option<&'a Upload>, pasted: &'a str) -> Self {
        upload.map_or(Self::Pasted(pasted), Self::Upload)
    }
}

/// Load the text of a document.
///
/// ```rust
/// use quarry::{load_text, TextSource, Upload};
///
/// let upload = Upload::new("notes.txt", "Hello. World.".as_bytes().to_vec());
/// let doc = load_text(TextSource::Upload(&upload)).unwrap();
/// assert_eq!(doc.text(), "Hello. World.");
///
/// let doc = load_text(TextSource::Pasted("typed")).unwrap();
/// assert_eq!(doc.text(), "typed");
/// ```
///
/// # Errors
///
/// Returns [`Error::Decode`] for a `.txt` upload that is not UTF-8,
/// [`Error::Spreadsheet`] for an unreadable workbook and
/// [`Error::UnsupportedFileType`] for any other extension.
pub fn load_text(source: TextSource<'_>) -> Result<Document> {
    match source {
        TextSource::Pasted(text) => Ok(Document::pasted(text)),
        TextSource::Upload(upload) => load_upload(upload),
    }
}

fn load_upload(upload: &Upload) -> Result<Document> {
    let extension = upload.extension();
    if extension.as_deref() == Some("txt") {
        let text = std::str::from_utf8(upload.bytes()).map_err(|_| Error::Decode {
            file: upload.name().to_string(),
            encoding: "utf-8",
        })?;
        return Ok(Document::pasted(text));
    }

    match TableKind::from_file_name(upload.name()) {
        Some(TableKind::Spreadsheet) => workbook_text(upload).map(Document::pasted),
        _ => Err(Error::UnsupportedFileType {
            file: upload.name().to_string(),
        }),
    }
}

fn spreadsheet_error(upload: &Upload, source: calamine::Error) -> Error {
    Error::Spreadsheet {
        file: upload.name().to_string(),
        source,
    }
}

fn cell_text(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::String(s) => s.clone(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => s.clone(),
        calamine::Data::Error(_) | calamine::Data::Empty => String::new(),
    }
}

/// Flatten every sheet of a workbook into lines of text.
fn workbook_text(upload: &Upload) -> Result<String> {
    let mut workbook =
        open_workbook_auto_from_rs(upload.cursor()).map_err(|e| spreadsheet_error(upload, e))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| spreadsheet_error(upload, e))?;

        let mut lines = vec![format!("Sheet: {name}")];
        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(cell_text)
                .filter(|text| !text.is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" "));
            }
        }
        sheets.push(lines.join("\n"));
    }

    debug!(file = upload.name(), sheets = sheets.len(), "flattened workbook");
    Ok(sheets.join("\n\n"))
}
