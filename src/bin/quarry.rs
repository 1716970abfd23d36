//! Command-line front end for quarry.
//!
//! ```bash
//! quarry ask --file handbook.txt --query "How many vacation days?"
//! quarry ask --text "The cat sat. The dog ran." --query "cat?"
//! quarry headers sales.csv staff.xlsx > headers.json
//! quarry combine --selection selection.json sales.csv staff.xlsx
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use quarry::{
    harvest, load_text, sniff_table, write_workbook, ColumnSelection, Error, Retriever,
    SentenceChunker, TextSource, Upload, COMBINED_FILE_NAME, DEFAULT_CHUNK_SIZE,
};

#[derive(Parser, Debug)]
#[command(name = "quarry", version, about = "Ask questions of documents; combine spreadsheet columns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the passage of a document that best matches a question.
    Ask {
        /// A .txt or workbook file to read.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Text to use instead of a file.
        #[arg(long, default_value = "")]
        text: String,
        /// The question.
        #[arg(long, default_value = "")]
        query: String,
        /// Chunk budget in characters.
        #[arg(long, env = "QUARRY_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Print the dialect, sheets and columns of each table as JSON.
    Headers {
        /// CSV or workbook files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Worksheet to read headers from (default: first sheet).
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Combine selected columns from several tables into one workbook.
    Combine {
        /// JSON file listing the columns to take from each upload.
        #[arg(long)]
        selection: PathBuf,
        /// Where to write the workbook.
        #[arg(long, default_value = COMBINED_FILE_NAME)]
        output: PathBuf,
        /// CSV or workbook files named in the selection.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths
        .iter()
        .map(|path| Upload::from_path(path).with_context(|| format!("reading {}", path.display())))
        .collect()
}

fn ask(file: Option<PathBuf>, text: &str, query: &str, chunk_size: usize) -> Result<()> {
    let chunker = SentenceChunker::try_new(chunk_size)?;
    let upload = file
        .map(|path| Upload::from_path(&path).with_context(|| format!("reading {}", path.display())))
        .transpose()?;

    let document = load_text(TextSource::choose(upload.as_ref(), text))?;
    let answer = Retriever::with_chunker(chunker).ask(&document, query);
    println!("{answer}");
    Ok(())
}

fn headers(files: &[PathBuf], sheet: Option<&str>) -> Result<()> {
    let mut found = Vec::new();
    for upload in read_uploads(files)? {
        match sniff_table(&upload, sheet) {
            Ok(header) => found.push(header),
            Err(e) => error!(file = upload.name(), error = %e, "unreadable upload"),
        }
    }
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

fn combine(selection: &Path, output: &Path, files: &[PathBuf]) -> Result<()> {
    let json = std::fs::read_to_string(selection)
        .with_context(|| format!("reading {}", selection.display()))?;
    let selection: ColumnSelection =
        serde_json::from_str(&json).context("parsing column selection")?;
    let uploads = read_uploads(files)?;

    let harvest = match harvest(&uploads, &selection) {
        Ok(harvest) => harvest,
        Err(Error::NothingToExport) => bail!("no columns selected or no data to export"),
        Err(e) => return Err(e.into()),
    };
    if !harvest.warnings.is_empty() {
        warn!(count = harvest.warnings.len(), "some files or columns were skipped");
    }

    let bytes = write_workbook(&harvest.table)?;
    std::fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    println!("{}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            file,
            text,
            query,
            chunk_size,
        } => ask(file, &text, &query, chunk_size),
        Commands::Headers { files, sheet } => headers(&files, sheet.as_deref()),
        Commands::Combine {
            selection,
            output,
            files,
        } => combine(&selection, &output, &files),
    }
}
