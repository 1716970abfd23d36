//! Error types for quarry.
//!
//! Everything here is recoverable at the level of one upload or one
//! action. The harvester never returns a per-file error as `Err`; it records
//! it as a [`HarvestWarning`](crate::HarvestWarning) and moves on.

/// Errors that can occur while loading, chunking, harvesting or exporting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid chunk size (must be > 0).
    #[error("invalid chunk size: {0} (must be > 0)")]
    InvalidChunkSize(usize),

    /// The upload's extension is not one this pipeline reads.
    #[error("unsupported file type for `{file}`")]
    UnsupportedFileType {
        /// The upload's file name.
        file: String,
    },

    /// A plain-text upload could not be decoded.
    #[error("`{file}` is not valid {encoding} text")]
    Decode {
        /// The upload's file name.
        file: String,
        /// The encoding that was required.
        encoding: &'static str,
    },

    /// No encoding/delimiter pair could be established for a CSV upload.
    #[error("could not read header from `{file}`: undetectable CSV dialect")]
    UndetectableDialect {
        /// The upload's file name.
        file: String,
    },

    /// The spreadsheet could not be opened or a sheet could not be read.
    #[error("error reading spreadsheet `{file}`: {source}")]
    Spreadsheet {
        /// The upload's file name.
        file: String,
        /// The underlying reader error.
        #[source]
        source: calamine::Error,
    },

    /// The CSV content could not be parsed with the detected dialect.
    #[error("error reading CSV `{file}`: {source}")]
    Csv {
        /// The upload's file name.
        file: String,
        /// The underlying parser error.
        #[source]
        source: csv::Error,
    },

    /// The selected sheet does not exist in the workbook.
    #[error("sheet `{sheet}` not found in `{file}`")]
    SheetNotFound {
        /// The upload's file name.
        file: String,
        /// The requested sheet.
        sheet: String,
    },

    /// The workbook contains no sheets at all.
    #[error("`{file}` contains no sheets")]
    EmptyWorkbook {
        /// The upload's file name.
        file: String,
    },

    /// A selection refers to a file that was not uploaded.
    #[error("no upload named `{0}`")]
    UploadNotFound(String),

    /// No column was selected, or every selected column was skipped.
    #[error("no columns selected or no data to export")]
    NothingToExport,

    /// The combined table is wider than a worksheet allows.
    #[error("{0} columns exceed the worksheet limit")]
    TooManyColumns(usize),

    /// The combined table is taller than a worksheet allows.
    #[error("{0} rows exceed the worksheet limit")]
    TooManyRows(usize),

    /// The workbook writer failed.
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type for quarry operations.
pub type Result<T> = std::result::Result<T, Error>;
