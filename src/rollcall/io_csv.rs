// Primitives for reading CSV files.

use log::debug;
use snafu::prelude::*;

use crate::rollcall::io_common::{header_names, rows_from_table};
use crate::rollcall::*;

/// Reads a comma-separated file with a header line.
///
/// Lines may have different lengths.
pub fn read_csv_rows(path: &str) -> RollcallResult<Vec<SheetRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut lines: Vec<Vec<String>> = Vec::new();
    for (idx, record_r) in rdr.into_records().enumerate() {
        let record = record_r.context(CsvLineParseSnafu { lineno: idx + 1 })?;
        lines.push(record.iter().map(|s| s.to_string()).collect());
    }

    let mut iter = lines.into_iter();
    let header = match iter.next() {
        Some(h) => header_names(&h),
        None => {
            debug!("read_csv_rows: {:?}: empty file", path);
            return Ok(Vec::new());
        }
    };
    debug!("read_csv_rows: header: {:?}", header);
    Ok(rows_from_table(&header, iter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_rows_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("20230615_vote.csv");
        fs::write(
            &p,
            "Wahlperiode,Name,Fraktion/Gruppe,ja\n20,Muster,SPD,1\n,,,\n20,Beispiel,CDU/CSU\n",
        )
        .unwrap();
        let rows = read_csv_rows(&p.display().to_string()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Fraktion/Gruppe").map(String::as_str), Some("SPD"));
        assert_eq!(rows[1].get("ja").map(String::as_str), Some(""));
    }

    #[test]
    fn empty_file_has_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("20230615_vote.csv");
        fs::write(&p, "").unwrap();
        assert!(read_csv_rows(&p.display().to_string()).unwrap().is_empty());
    }
}
