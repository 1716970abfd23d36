//! Pulling chosen columns out of many uploads into one wide table.
//!
//! ## Alignment
//!
//! Columns are placed side by side by row position. There is no join key:
//! each column's nulls are dropped first, so row `i` of one column has
//! nothing to do with row `i` of its neighbor.
//!
//! ```text
//! a.csv  X: [1, -, 3]      b.xlsx  Z: [p, q, r, s]
//!
//! combined   X    Z
//!            1    p
//!            3    q
//!            -    r
//!            -    s
//! ```
//!
//! ## Partial Failure
//!
//! A file that cannot be read, or a chosen column that is no longer in the
//! file, is recorded as a [`HarvestWarning`] and the rest of the batch goes
//! on. Only an empty result fails the whole action.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::table::{read_csv, read_sheet, Table};
use crate::{
    detect_csv_dialect, normalize_column_name, CellValue, CsvDialect, Error, Result, TableHeader,
    TableKind, Upload,
};

/// The user's choice for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelection {
    /// The upload's file name.
    pub file: String,
    /// The table format.
    pub kind: TableKind,
    /// Worksheet to read. Spreadsheets fall back to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Columns to extract, in output order.
    #[serde(default)]
    pub columns: Vec<String>,
    /// CSV encoding and delimiter. Detected again when missing.
    #[serde(default)]
    pub dialect: Option<CsvDialect>,
}

impl FileSelection {
    /// Select columns from a sniffed upload, keeping its sheet and dialect.
    #[must_use]
    pub fn from_header(header: &TableHeader, columns: Vec<String>) -> Self {
        Self {
            file: header.file.clone(),
            kind: header.kind,
            sheet: header.sheet.clone(),
            columns,
            dialect: header.dialect,
        }
    }
}

/// Which columns to take from which uploads.
///
/// Built once from the user's choices and then only read.
///
/// ```rust
/// use quarry::{ColumnSelection, FileSelection, TableKind};
///
/// let selection: ColumnSelection = serde_json::from_str(r#"[
///     {"file": "a.csv", "kind": "csv", "columns": ["X"]},
///     {"file": "b.xlsx", "kind": "spreadsheet", "sheet": "Data", "columns": ["Z"]}
/// ]"#).unwrap();
///
/// assert_eq!(selection.files().len(), 2);
/// assert_eq!(selection.column_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSelection {
    files: Vec<FileSelection>,
}

impl ColumnSelection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file's selection. A later entry for the same file replaces
    /// the earlier one but keeps its position.
    #[must_use]
    pub fn with(mut self, selection: FileSelection) -> Self {
        match self.files.iter_mut().find(|f| f.file == selection.file) {
            Some(existing) => *existing = selection,
            None => self.files.push(selection),
        }
        self
    }

    /// Per-file selections in upload order.
    #[must_use]
    pub fn files(&self) -> &[FileSelection] {
        &self.files
    }

    /// Total number of chosen columns across all files.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.files.iter().map(|f| f.columns.len()).sum()
    }
}

impl FromIterator<FileSelection> for ColumnSelection {
    fn from_iter<I: IntoIterator<Item = FileSelection>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}

/// The non-null values of one column of one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedColumn {
    /// Column name, as it will appear in the output header.
    pub name: String,
    /// The file the column came from.
    pub source: String,
    /// Values with nulls removed, contiguous from index 0.
    pub values: Vec<CellValue>,
}

impl ExtractedColumn {
    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extracted columns laid side by side, aligned by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedTable {
    columns: Vec<ExtractedColumn>,
}

impl CombinedTable {
    /// Lay out columns in the given order.
    #[must_use]
    pub fn new(columns: Vec<ExtractedColumn>) -> Self {
        Self { columns }
    }

    /// The columns, in selection order.
    #[must_use]
    pub fn columns(&self) -> &[ExtractedColumn] {
        &self.columns
    }

    /// The header row.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows: the length of the longest column.
    #[must_use]
    pub fn height(&self) -> usize {
        self.columns.iter().map(ExtractedColumn::len).max().unwrap_or(0)
    }

    /// The cell at `row`, `column`; `None` where a shorter column is padded.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.columns.get(column)?.values.get(row)
    }

    /// Rows from top to bottom, padded to the full width.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&CellValue>>> + '_ {
        (0..self.height()).map(move |row| {
            (0..self.width())
                .map(|column| self.cell(row, column))
                .collect()
        })
    }
}

/// Something that went wrong for one file or one column.
#[derive(Debug, thiserror::Error)]
pub enum HarvestWarning {
    /// The whole file was skipped.
    #[error("could not process `{file}`: {source}")]
    FileSkipped {
        /// The upload's file name.
        file: String,
        /// Why it was skipped.
        #[source]
        source: Error,
    },
    /// A chosen column was not in the file when it was read again.
    #[error("column `{column}` not found in `{file}`")]
    ColumnMissing {
        /// The upload's file name.
        file: String,
        /// The missing column.
        column: String,
    },
}

/// The outcome of a harvest: the table plus anything that was skipped.
#[derive(Debug)]
pub struct Harvest {
    /// The combined columns.
    pub table: CombinedTable,
    /// Files and columns that were skipped, in the order encountered.
    pub warnings: Vec<HarvestWarning>,
}

fn read_selected(upload: &Upload, selection: &FileSelection) -> Result<Table> {
    match selection.kind {
        TableKind::Csv => {
            let dialect = match selection.dialect {
                Some(dialect) => dialect,
                None => detect_csv_dialect(upload)?,
            };
            read_csv(upload, &dialect)
        }
        TableKind::Spreadsheet => {
            read_sheet(upload, selection.sheet.as_deref()).map(|(_, table)| table)
        }
    }
}

/// Extract every selected column from the uploads and combine them.
///
/// Each selected file is read again in full. Selected names are normalized
/// the same way as the re-read header before matching. Files with no
/// selected columns are passed over silently.
///
/// # Errors
///
/// Returns [`Error::NothingToExport`] when nothing was selected or every
/// selected column was skipped. Everything else becomes a warning.
pub fn harvest(uploads: &[Upload], selection: &ColumnSelection) -> Result<Harvest> {
    let mut columns = Vec::new();
    let mut warnings = Vec::new();

    for chosen in selection.files() {
        if chosen.columns.is_empty() {
            continue;
        }

        let table = uploads
            .iter()
            .find(|u| u.name() == chosen.file)
            .ok_or_else(|| Error::UploadNotFound(chosen.file.clone()))
            .and_then(|upload| read_selected(upload, chosen));
        let table = match table {
            Ok(table) => table,
            Err(source) => {
                warn!(file = %chosen.file, error = %source, "skipping file");
                warnings.push(HarvestWarning::FileSkipped {
                    file: chosen.file.clone(),
                    source,
                });
                continue;
            }
        };

        for column in &chosen.columns {
            let name = normalize_column_name(column);
            match table.column(&name) {
                Some(values) => columns.push(ExtractedColumn {
                    name,
                    source: chosen.file.clone(),
                    values,
                }),
                None => {
                    warn!(file = %chosen.file, column = %name, "column not found");
                    warnings.push(HarvestWarning::ColumnMissing {
                        file: chosen.file.clone(),
                        column: name,
                    });
                }
            }
        }
    }

    if columns.is_empty() {
        return Err(Error::NothingToExport);
    }

    let table = CombinedTable::new(columns);
    info!(
        columns = table.width(),
        rows = table.height(),
        warnings = warnings.len(),
        "combined columns"
    );
    Ok(Harvest { table, warnings })
}
