//! # quarry
//!
//! Two small pipelines over uploaded files.
//!
//! ## Retrieval
//!
//! Ask a question of a document and get back the passage most like it.
//!
//! ```text
//! upload / paste ──► Document ──► sentence chunks ──► TF-IDF + cosine ──► best chunk
//! ```
//!
//! The document is split into sentences, the sentences are packed into
//! chunks of at most `chunk_size` characters (300 by default), and every
//! chunk is scored against the question. The highest score wins; the first
//! chunk wins a tie. There is no cut-off, so a poor match is still returned.
//!
//! ```rust
//! use quarry::{load_text, Retriever, TextSource};
//!
//! let doc = load_text(TextSource::Pasted(
//!     "The cat sat on the mat. The dog ran in the park.",
//! )).unwrap();
//!
//! let answer = Retriever::new(25).ask(&doc, "Where did the cat sit?");
//! assert_eq!(answer.text(), "The cat sat on the mat.");
//! ```
//!
//! ## Column Extraction
//!
//! Pick columns from several CSV or Excel files and put them side by side
//! in one workbook.
//!
//! ```text
//! uploads ──► sniff (dialect / sheets / header) ──► user picks columns
//!         ──► harvest (re-read, normalize, drop nulls) ──► write .xlsx
//! ```
//!
//! ```rust
//! use quarry::{harvest, sniff_table, write_workbook, ColumnSelection, FileSelection, Upload};
//!
//! let uploads = vec![
//!     Upload::new("a.csv", b"X,Y\n1,2\n3,4\n".to_vec()),
//!     Upload::new("b.csv", b"Z;W\n5;6\n".to_vec()),
//! ];
//!
//! let selection: ColumnSelection = uploads
//!     .iter()
//!     .map(|upload| {
//!         let header = sniff_table(upload, None).unwrap();
//!         let first = header.columns[0].clone();
//!         FileSelection::from_header(&header, vec![first])
//!     })
//!     .collect();
//!
//! let harvest = harvest(&uploads, &selection).unwrap();
//! assert_eq!(harvest.table.height(), 2);
//!
//! let xlsx = write_workbook(&harvest.table).unwrap();
//! assert!(!xlsx.is_empty());
//! ```
//!
//! ## Failure Model
//!
//! Every failure is scoped to one file or one action. A file that cannot be
//! read is reported and the others are still processed; a column that has
//! gone missing is reported and the others are still extracted. See
//! [`Error`] and [`HarvestWarning`].

mod cell;
mod error;
mod harvest;
mod loader;
mod normalize;
mod retrieval;
mod sentence;
mod slab;
mod sniff;
mod table;
mod tfidf;
mod upload;
mod workbook;

pub use cell::{CellValue, NA_TOKENS};
pub use error::{Error, Result};
pub use harvest::{
    harvest, ColumnSelection, CombinedTable, ExtractedColumn, FileSelection, Harvest,
    HarvestWarning,
};
pub use loader::{load_text, Document, TextSource};
pub use normalize::{normalize_column_name, normalize_headers};
pub use retrieval::{best_match, retrieve_answer, Answer, Retriever, ScoredChunk, GUIDANCE_MESSAGE};
pub use sentence::{split_sentences, split_text, Chunker, SentenceChunker, DEFAULT_CHUNK_SIZE};
pub use slab::Slab;
pub use sniff::{
    detect_csv_dialect, sniff_delimiter, sniff_table, CsvDialect, TableHeader, TableKind,
    TextEncoding, DELIMITER_CANDIDATES,
};
pub use table::{read_csv, read_sheet, sheet_names, Table};
pub use tfidf::{cosine_similarity, tokenize, SparseVector, TfIdf};
pub use upload::Upload;
pub use workbook::{write_workbook, COMBINED_FILE_NAME, SHEET_NAME, XLSX_MIME_TYPE};
