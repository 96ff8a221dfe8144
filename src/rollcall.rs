use log::{debug, error, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use vote_records::*;

pub mod ingest;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod server;
pub mod store;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RollcallError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook {path} has no sheet"))]
    MissingSheet { path: String },
    #[snafu(display("Error opening csv file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing csv line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error reading directory {path}"))]
    ReadingDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Rejected file {path}"))]
    InvalidFileName { source: RecordError, path: String },
    #[snafu(display("Invalid content in data row {row} of {path}"))]
    InvalidRow {
        source: RecordError,
        path: String,
        row: usize,
    },
    #[snafu(display("Database error"))]
    Sqlite { source: rusqlite::Error },
    #[snafu(display("The database lock was poisoned"))]
    PoisonedStore {},
    #[snafu(display("The query task did not complete"))]
    QueryTask { source: tokio::task::JoinError },
    #[snafu(display("Error binding {addr}"))]
    Binding {
        source: std::io::Error,
        addr: String,
    },
    #[snafu(display("Server error"))]
    Serving { source: std::io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type RollcallResult<T> = Result<T, RollcallError>;

/// Renders an error and all its causes on one line, for the logs.
pub fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut cur = e.source();
    while let Some(s) = cur {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        cur = s.source();
    }
    msg
}

/// Reads the first sheet of a file into text rows, choosing the reader from
/// the extension.
pub fn read_sheet_rows(path: &Path) -> RollcallResult<Vec<SheetRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let p = path.display().to_string();
    debug!("read_sheet_rows: path: {:?} extension: {:?}", p, ext);
    match ext.as_deref() {
        Some("csv") => io_csv::read_csv_rows(&p),
        _ => io_excel::read_excel_rows(&p),
    }
}

/// Lists the files of the input directory, in name order.
///
/// Entries that are not regular files are skipped.
pub fn list_input_files(dir: &Path) -> RollcallResult<Vec<PathBuf>> {
    let path = dir.display().to_string();
    let entries = fs::read_dir(dir).context(ReadingDirectorySnafu { path: path.clone() })?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.context(ReadingDirectorySnafu { path: path.clone() })?;
        let p = entry.path();
        if p.is_file() {
            files.push(p);
        } else {
            warn!("list_input_files: skipping {:?}: not a file", p);
        }
    }
    files.sort();
    info!("Found {} file(s) in {:?}", files.len(), path);
    Ok(files)
}

pub(crate) fn log_failure(path: &Path, e: &RollcallError) {
    error!("Error processing file {}: {}", path.display(), error_chain(e));
}
