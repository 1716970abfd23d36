//! Figuring out how to read an uploaded table.
//!
//! For CSV that means an encoding and a delimiter; for a workbook, the list
//! of sheets. Either way the result carries the normalized header row the
//! user picks columns from.
//!
//! ## CSV Detection
//!
//! ```text
//! for encoding in [utf-8, latin-1]:
//!     decode the bytes            (latin-1 never fails)
//!     sniff the first line        (most frequent candidate delimiter)
//!     both worked? -> (encoding, delimiter)
//! nothing worked   -> UndetectableDialect
//! ```
//!
//! Delimiters are counted outside double quotes. `,` `\t` `;` `|` `:` are
//! candidates in that order of preference; a space is only chosen when none
//! of them occurs, since header names often contain spaces.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::{read_csv_header, read_sheet_header};
use crate::{Error, Result, Upload};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Delimiters tried on the first line, most preferred first.
pub const DELIMITER_CANDIDATES: [char; 5] = [',', '\t', ';', '|', ':'];

/// The two table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Delimited text.
    Csv,
    /// An Excel or OpenDocument workbook.
    Spreadsheet,
}

impl TableKind {
    /// Classify a file by its extension.
    ///
    /// ```rust
    /// use quarry::TableKind;
    ///
    /// assert_eq!(TableKind::from_file_name("sales.CSV"), Some(TableKind::Csv));
    /// assert_eq!(TableKind::from_file_name("q3.xlsx"), Some(TableKind::Spreadsheet));
    /// assert_eq!(TableKind::from_file_name("notes.txt"), None);
    /// ```
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = std::path::Path::new(name)
            .extension()?
            .to_string_lossy()
            .to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Text encodings tried for CSV uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// Strict UTF-8; a leading byte-order mark is skipped.
    #[serde(rename = "utf-8")]
    Utf8,
    /// Single-byte Latin-1 (decoded as windows-1252). Accepts any bytes.
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    /// Encodings in the order they are tried.
    pub const CANDIDATES: [Self; 2] = [Self::Utf8, Self::Latin1];

    /// The conventional label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
        }
    }

    /// Decode bytes, or `None` if they are not valid in this encoding.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
            }
            Self::Latin1 => Some(encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0),
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How to read a CSV upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvDialect {
    /// Text encoding of the bytes.
    pub encoding: TextEncoding,
    /// Field delimiter.
    pub delimiter: char,
}

impl CsvDialect {
    /// Create a dialect.
    #[must_use]
    pub fn new(encoding: TextEncoding, delimiter: char) -> Self {
        Self {
            encoding,
            delimiter,
        }
    }

    /// Decode an upload's bytes with this dialect's encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes are invalid in the encoding.
    pub fn decode<'a>(&self, upload: &'a Upload) -> Result<Cow<'a, str>> {
        self.encoding
            .decode(upload.bytes())
            .ok_or_else(|| Error::Decode {
                file: upload.name().to_string(),
                encoding: self.encoding.label(),
            })
    }

    /// A CSV reader over decoded text. The first record is the header.
    ///
    /// Records may be shorter or longer than the header.
    pub(crate) fn reader<'a>(&self, text: &'a [u8]) -> csv::Reader<&'a [u8]> {
        let mut delimiter = [0u8; 4];
        let delimiter = self.delimiter.encode_utf8(&mut delimiter).as_bytes()[0];
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text)
    }
}

/// Guess the delimiter of one line of CSV.
///
/// ```rust
/// use quarry::sniff_delimiter;
///
/// assert_eq!(sniff_delimiter("name;age;city"), Some(';'));
/// assert_eq!(sniff_delimiter("\"a;b\",c"), Some(','));
/// assert_eq!(sniff_delimiter("First Name"), Some(' '));
/// assert_eq!(sniff_delimiter("Name"), None);
/// ```
#[must_use]
pub fn sniff_delimiter(line: &str) -> Option<char> {
    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut spaces = 0usize;
    let mut in_quotes = false;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if in_quotes {
            continue;
        } else if c == ' ' {
            spaces += 1;
        } else if let Some(i) = DELIMITER_CANDIDATES.iter().position(|&d| d == c) {
            counts[i] += 1;
        }
    }

    let mut best: Option<(char, usize)> = None;
    for (&candidate, &count) in DELIMITER_CANDIDATES.iter().zip(&counts) {
        if count > 0 && best.map_or(true, |(_, n)| count > n) {
            best = Some((candidate, count));
        }
    }

    best.map(|(c, _)| c)
        .or_else(|| (spaces > 0).then_some(' '))
}

/// Establish the encoding and delimiter of a CSV upload.
///
/// # Errors
///
/// Returns [`Error::UndetectableDialect`] when no encoding yields a first
/// line with a recognizable delimiter.
pub fn detect_csv_dialect(upload: &Upload) -> Result<CsvDialect> {
    for encoding in TextEncoding::CANDIDATES {
        let Some(text) = encoding.decode(upload.bytes()) else {
            continue;
        };
        let Some(delimiter) = text.lines().next().and_then(sniff_delimiter) else {
            continue;
        };
        debug!(
            file = upload.name(),
            encoding = encoding.label(),
            delimiter = %delimiter.escape_debug(),
            "detected csv dialect"
        );
        return Ok(CsvDialect::new(encoding, delimiter));
    }

    Err(Error::UndetectableDialect {
        file: upload.name().to_string(),
    })
}

/// What a user needs to choose columns from one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHeader {
    /// The upload's file name.
    pub file: String,
    /// The table format.
    pub kind: TableKind,
    /// Encoding and delimiter, for CSV.
    pub dialect: Option<CsvDialect>,
    /// Every sheet in the workbook, for spreadsheets.
    pub sheets: Vec<String>,
    /// The sheet whose header was read, for spreadsheets.
    pub sheet: Option<String>,
    /// Normalized column names.
    pub columns: Vec<String>,
}

/// Inspect an upload and read its header row.
///
/// For spreadsheets, `sheet` picks the worksheet; the first sheet is used
/// when it is `None`. It is ignored for CSV.
///
/// # Errors
///
/// Fails with the typed reason the upload is unreadable: unsupported
/// extension, undetectable CSV dialect, or a broken workbook.
pub fn sniff_table(upload: &Upload, sheet: Option<&str>) -> Result<TableHeader> {
    let kind = TableKind::from_file_name(upload.name()).ok_or_else(|| Error::UnsupportedFileType {
        file: upload.name().to_string(),
    })?;

    match kind {
        TableKind::Csv => {
            let dialect = detect_csv_dialect(upload)?;
            let columns = read_csv_header(upload, &dialect)?;
            Ok(TableHeader {
                file: upload.name().to_string(),
                kind,
                dialect: Some(dialect),
                sheets: Vec::new(),
                sheet: None,
                columns,
            })
        }
        TableKind::Spreadsheet => {
            let header = read_sheet_header(upload, sheet)?;
            Ok(TableHeader {
                file: upload.name().to_string(),
                kind,
                dialect: None,
                sheets: header.sheets,
                sheet: Some(header.sheet),
                columns: header.columns,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_preferred_on_tie() {
        assert_eq!(sniff_delimiter("a,b;c"), Some(','));
    }

    #[test]
    fn test_most_frequent_wins() {
        assert_eq!(sniff_delimiter("a;b;c,d"), Some(';'));
        assert_eq!(sniff_delimiter("a\tb\tc"), Some('\t'));
    }

    #[test]
    fn test_spaces_lose_to_real_delimiters() {
        assert_eq!(sniff_delimiter("Customer full name,Age"), Some(','));
    }

    #[test]
    fn test_utf8_detected() {
        let upload = Upload::new("a.csv", "név;kor\nÉva;30\n".as_bytes().to_vec());
        let dialect = detect_csv_dialect(&upload).unwrap();
        assert_eq!(dialect, CsvDialect::new(TextEncoding::Utf8, ';'));
    }

    #[test]
    fn test_latin1_fallback() {
        // "café,prix" in Latin-1: 0xE9 is not valid UTF-8 on its own.
        let upload = Upload::new("a.csv", b"caf\xe9,prix\n".to_vec());
        let dialect = detect_csv_dialect(&upload).unwrap();
        assert_eq!(dialect.encoding, TextEncoding::Latin1);
        assert_eq!(dialect.delimiter, ',');
        assert_eq!(dialect.decode(&upload).unwrap(), "café,prix\n");
    }

    #[test]
    fn test_bom_is_skipped() {
        let upload = Upload::new("a.csv", b"\xef\xbb\xbfid,name\n".to_vec());
        let header = sniff_table(&upload, None).unwrap();
        assert_eq!(header.columns, ["id", "name"]);
    }

    #[test]
    fn test_empty_csv_is_undetectable() {
        let upload = Upload::new("a.csv", Vec::new());
        assert!(matches!(
            detect_csv_dialect(&upload),
            Err(Error::UndetectableDialect { .. })
        ));
    }

    #[test]
    fn test_single_word_header_is_undetectable() {
        let upload = Upload::new("a.csv", b"Name\nAda\n".to_vec());
        assert!(detect_csv_dialect(&upload).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let upload = Upload::new("a.txt", b"x,y".to_vec());
        assert!(matches!(
            sniff_table(&upload, None),
            Err(Error::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_csv_header() {
        let upload = Upload::new("people.csv", b"Name,Age\nAda,36\n".to_vec());
        let header = sniff_table(&upload, None).unwrap();
        assert_eq!(header.kind, TableKind::Csv);
        assert_eq!(header.columns, ["Name", "Age"]);
        assert!(header.sheets.is_empty());
    }

    #[test]
    fn test_dialect_serializes_with_labels() {
        let dialect = CsvDialect::new(TextEncoding::Latin1, ';');
        let json = serde_json::to_string(&dialect).unwrap();
        assert_eq!(json, r#"{"encoding":"latin-1","delimiter":";"}"#);
    }
}
