use std::path::Path;

use log::{debug, info};
use snafu::prelude::*;

use crate::rollcall::io_common::file_stem;
use crate::rollcall::store::VoteStore;
use crate::rollcall::*;

/// What happened to one input file.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FileOutcome {
    Inserted(usize),
    Empty,
}

/// Counts for a whole run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct IngestSummary {
    pub inserted_files: usize,
    pub empty_files: usize,
    pub failed_files: usize,
    pub rows: usize,
}

/// Loads one file into the store.
///
/// Nothing is stored if any step fails: the rows of a file are inserted in a
/// single batch.
pub fn ingest_file(store: &VoteStore, path: &Path) -> RollcallResult<FileOutcome> {
    let p = path.display().to_string();
    let rows = normalize_rows(read_sheet_rows(path)?);

    if rows.is_empty() {
        info!("No data found in file {}. Skipping.", p);
        return Ok(FileOutcome::Empty);
    }

    let datum = require_vote_date(&file_stem(path)).context(InvalidFileNameSnafu { path: &p })?;
    let mut rows = rows;
    stamp_vote_date(&mut rows, &datum);

    let records = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            VoteRecord::from_row(row).context(InvalidRowSnafu {
                path: &p,
                row: idx + 1,
            })
        })
        .collect::<RollcallResult<Vec<VoteRecord>>>()?;
    debug!("ingest_file: {}: {} record(s) dated {}", p, records.len(), datum);

    let n = store.insert_records(&records)?;
    info!(
        "Data inserted into {} table successfully from file: {} ({} rows)",
        store::TABLE,
        p,
        n
    );
    Ok(FileOutcome::Inserted(n))
}

/// Loads every file of a directory, one after the other.
///
/// Only a directory that cannot be listed is an error: the failure of a file
/// is logged and the run continues with the next one.
pub fn ingest_directory(store: &VoteStore, dir: &Path) -> RollcallResult<IngestSummary> {
    let files = list_input_files(dir)?;
    let mut summary = IngestSummary::default();
    for path in files.iter() {
        match ingest_file(store, path) {
            Ok(FileOutcome::Inserted(n)) => {
                summary.inserted_files += 1;
                summary.rows += n;
            }
            Ok(FileOutcome::Empty) => {
                summary.empty_files += 1;
            }
            Err(e) => {
                log_failure(path, &e);
                summary.failed_files += 1;
            }
        }
    }
    info!(
        "Ingestion done: {} file(s) inserted, {} empty, {} failed, {} row(s)",
        summary.inserted_files, summary.empty_files, summary.failed_files, summary.rows
    );
    Ok(summary)
}
