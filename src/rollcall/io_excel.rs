use calamine::{open_workbook_auto, Reader};
use log::debug;
use snafu::prelude::*;

use crate::rollcall::io_common::{cell_to_text, header_names, rows_from_table};
use crate::rollcall::*;

/// Reads the first sheet of a workbook (xlsx, xlsm, xlsb, xls or ods).
///
/// The first row is the header. An empty sheet gives no rows.
pub fn read_excel_rows(path: &str) -> RollcallResult<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(MissingSheetSnafu { path })?
        .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    let header = match iter.next() {
        Some(h) => header_names(&h.iter().map(cell_to_text).collect::<Vec<String>>()),
        None => {
            debug!("read_excel_rows: {:?}: empty sheet", path);
            return Ok(Vec::new());
        }
    };
    debug!("read_excel_rows: header: {:?}", header);

    let lines = iter.map(|row| row.iter().map(cell_to_text).collect::<Vec<String>>());
    let res = rows_from_table(&header, lines);
    debug!("read_excel_rows: {:?}: {} row(s)", path, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/20230615_vote.xlsx");

    #[test]
    fn first_sheet_is_read_as_text_rows() {
        let rows = read_excel_rows(FIXTURE).unwrap();
        assert_eq!(rows.len(), 3);
        let first = &rows[0];
        assert_eq!(first.len(), 14);
        assert_eq!(first["Fraktion/Gruppe"], "SPD");
        assert_eq!(first["Name"], "Muster");
        // Numeric cells come back as floats and render without a fraction.
        assert_eq!(first["Wahlperiode"], "20");
        assert_eq!(first["ja"], "1");
        assert_eq!(first["nein"], "0");
        assert_eq!(first["Titel"], "");
        assert_eq!(rows[1]["Titel"], "Dr.");
        assert_eq!(rows[2]["Enthaltung"], "1");
        assert_eq!(rows[2]["nichtabgegeben"], "");
        assert_eq!(rows[2]["Bemerkung"], "");
    }

    #[test]
    fn unreadable_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("20230615_vote.xlsx");
        std::fs::write(&p, b"not a zip archive").unwrap();
        let res = read_excel_rows(&p.display().to_string());
        assert!(matches!(res, Err(RollcallError::OpeningExcel { .. })));
    }
}
