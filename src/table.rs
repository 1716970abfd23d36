//! Reading whole tables from uploads.
//!
//! Both formats come out the same shape: a normalized header row and rows of
//! optional cells. Headers go through [`normalize_headers`], so names read
//! here match the names offered when the file was first sniffed.
//!
//! ## Worksheet Columns
//!
//! The header of a worksheet is its first row with a named cell. Its
//! columns run from the first to the last named cell of that row; cells
//! outside that span are not part of the table.
//!
//! ```text
//!       A       B       C       D
//! 1
//! 2             Name            Age      header: [Name, Unnamed: 1, Age]
//! 3     stray   Ada     x       36       row:    [Ada,  x,          36]
//! ```

use std::io::{Cursor, Read, Seek};
use std::ops::Range;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx, XlsxError};
use tracing::debug;

use crate::{normalize_headers, CellValue, CsvDialect, Error, Result, Upload};

/// A table read from one CSV file or one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<CellValue>>>,
}

impl Table {
    /// Build a table from normalized headers and rows.
    ///
    /// Rows are padded with nulls or truncated to the header width.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<CellValue>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// The normalized column names.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows (the header row is not counted).
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// The non-null values of the named column, in row order.
    ///
    /// Returns `None` if no column has that name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<CellValue>> {
        let position = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row[position].clone())
                .collect(),
        )
    }
}

type Workbook<'a> = Sheets<Cursor<&'a [u8]>>;

fn spreadsheet_error(upload: &Upload, source: impl Into<calamine::Error>) -> Error {
    Error::Spreadsheet {
        file: upload.name().to_string(),
        source: source.into(),
    }
}

fn open_workbook(upload: &Upload) -> Result<Workbook<'_>> {
    open_workbook_auto_from_rs(upload.cursor()).map_err(|e| spreadsheet_error(upload, e))
}

/// List a workbook's sheet names without reading any rows.
///
/// # Errors
///
/// Returns [`Error::Spreadsheet`] if the upload is not a readable workbook.
pub fn sheet_names(upload: &Upload) -> Result<Vec<String>> {
    Ok(open_workbook(upload)?.sheet_names().to_vec())
}

/// Pick the requested sheet, or the first one when none was requested.
fn resolve_sheet(upload: &Upload, names: &[String], requested: Option<&str>) -> Result<String> {
    match requested {
        Some(sheet) if names.iter().any(|n| n == sheet) => Ok(sheet.to_string()),
        Some(sheet) => Err(Error::SheetNotFound {
            file: upload.name().to_string(),
            sheet: sheet.to_string(),
        }),
        None => names.first().cloned().ok_or_else(|| Error::EmptyWorkbook {
            file: upload.name().to_string(),
        }),
    }
}

fn header_text(cell: &Data) -> String {
    CellValue::from_cell(cell)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

fn is_blank(cell: &Data) -> bool {
    header_text(cell).trim().is_empty()
}

/// Positions of the first through the last named cell of a header row.
fn header_span(row: &[Data]) -> Range<usize> {
    let first = row.iter().position(|c| !is_blank(c));
    let last = row.iter().rposition(|c| !is_blank(c));
    match (first, last) {
        (Some(first), Some(last)) => first..last + 1,
        _ => 0..0,
    }
}

fn header_names(row: &[Data]) -> Vec<String> {
    normalize_headers(row[header_span(row)].iter().map(header_text))
}

/// Stream an xlsx worksheet only as far as the end of its header row.
fn first_xlsx_row<RS: Read + Seek>(
    xlsx: &mut Xlsx<RS>,
    sheet: &str,
) -> std::result::Result<Vec<Data>, XlsxError> {
    let mut cells = xlsx.worksheet_cells_reader(sheet)?;
    let mut header_row = None;
    let mut named: Vec<(u32, Data)> = Vec::new();

    while let Some(cell) = cells.next_cell()? {
        let (row, column) = cell.get_position();
        if header_row.is_some_and(|header| row > header) {
            break;
        }
        let value = Data::from(cell.get_value().clone());
        if is_blank(&value) {
            continue;
        }
        header_row = Some(row);
        named.push((column, value));
    }

    let Some(&(first, _)) = named.first() else {
        return Ok(Vec::new());
    };
    let mut row = Vec::with_capacity(named.len());
    for (column, value) in named {
        row.resize((column - first) as usize, Data::Empty);
        row.push(value);
    }
    Ok(row)
}

fn read_range(upload: &Upload, sheet: Option<&str>) -> Result<(String, calamine::Range<Data>)> {
    let mut workbook = open_workbook(upload)?;
    let names = workbook.sheet_names().to_vec();
    let sheet = resolve_sheet(upload, &names, sheet)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| spreadsheet_error(upload, e))?;
    Ok((sheet, range))
}

/// Sheet names plus the header of one sheet, from a single open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetHeader {
    pub sheets: Vec<String>,
    pub sheet: String,
    pub columns: Vec<String>,
}

/// Read the sheet list and the header row of one worksheet.
///
/// For `.xlsx` only the cells up to the end of the header row are parsed.
/// Other formats are loaded by their readers in one piece.
pub(crate) fn read_sheet_header(upload: &Upload, sheet: Option<&str>) -> Result<SheetHeader> {
    let mut workbook = open_workbook(upload)?;
    let sheets = workbook.sheet_names().to_vec();
    let sheet = resolve_sheet(upload, &sheets, sheet)?;

    let row = match &mut workbook {
        Sheets::Xlsx(xlsx) => {
            first_xlsx_row(xlsx, &sheet).map_err(|e| spreadsheet_error(upload, e))?
        }
        other => other
            .worksheet_range(&sheet)
            .map_err(|e| spreadsheet_error(upload, e))?
            .rows()
            .find(|row| !row.iter().all(is_blank))
            .map(<[Data]>::to_vec)
            .unwrap_or_default(),
    };

    Ok(SheetHeader {
        sheets,
        sheet,
        columns: header_names(&row),
    })
}

/// Read one worksheet in full.
///
/// # Errors
///
/// Fails if the workbook cannot be opened or the sheet does not exist.
pub fn read_sheet(upload: &Upload, sheet: Option<&str>) -> Result<(String, Table)> {
    let (sheet, range) = read_range(upload, sheet)?;
    let mut rows = range.rows().skip_while(|row| row.iter().all(is_blank));

    let header = rows.next().unwrap_or(&[]);
    let span = header_span(header);
    let headers = header_names(header);
    let rows: Vec<Vec<Option<CellValue>>> = rows
        .map(|row| row[span.clone()].iter().map(CellValue::from_cell).collect())
        .collect();

    debug!(
        file = upload.name(),
        sheet = %sheet,
        columns = headers.len(),
        rows = rows.len(),
        "read worksheet"
    );
    Ok((sheet, Table::new(headers, rows)))
}

fn csv_error(upload: &Upload, source: csv::Error) -> Error {
    Error::Csv {
        file: upload.name().to_string(),
        source,
    }
}

/// Read only the header row of a CSV upload.
///
/// # Errors
///
/// Fails if the content does not decode or the header cannot be parsed.
pub fn read_csv_header(upload: &Upload, dialect: &CsvDialect) -> Result<Vec<String>> {
    let text = dialect.decode(upload)?;
    let mut reader = dialect.reader(text.as_bytes());
    let headers = reader.headers().map_err(|e| csv_error(upload, e))?;
    Ok(normalize_headers(headers.iter().map(String::from)))
}

/// Read a CSV upload in full, typing each field.
///
/// # Errors
///
/// Fails if the content does not decode or a record cannot be parsed.
pub fn read_csv(upload: &Upload, dialect: &CsvDialect) -> Result<Table> {
    let text = dialect.decode(upload)?;
    let mut reader = dialect.reader(text.as_bytes());

    let headers = reader.headers().map_err(|e| csv_error(upload, e))?;
    let headers = normalize_headers(headers.iter().map(String::from));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(upload, e))?;
        rows.push(record.iter().map(CellValue::parse_field).collect());
    }

    debug!(
        file = upload.name(),
        columns = headers.len(),
        rows = rows.len(),
        "read csv"
    );
    Ok(Table::new(headers, rows))
}
