// Primitives shared by the sheet readers.

use std::collections::HashSet;
use std::path::Path;

use calamine::DataType;
use chrono::{Duration, NaiveDate};

use vote_records::SheetRow;

/// The name of a file, without directory and extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Renders a cell the way it is displayed in a spreadsheet program.
pub fn cell_to_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => "".to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => float_to_text(*f),
        DataType::Bool(true) => "TRUE".to_string(),
        DataType::Bool(false) => "FALSE".to_string(),
        DataType::DateTime(serial) => excel_date_to_text(*serial),
        DataType::Error(e) => e.to_string(),
        #[allow(unreachable_patterns)]
        other => format!("{:?}", other),
    }
}

fn float_to_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

// Serial dates count days since 1899-12-30 (with the 1900 leap year bug
// already folded into that origin for all dates after March 1900).
fn excel_date_to_text(serial: f64) -> String {
    if !(0.0..3_000_000.0).contains(&serial) {
        return float_to_text(serial);
    }
    let origin = NaiveDate::from_ymd_opt(1899, 12, 30);
    let days = serial.floor() as i64;
    let date = origin.and_then(|o| o.checked_add_signed(Duration::days(days)));
    match date {
        Some(d) => {
            let secs = ((serial - serial.floor()) * 86400.0).round() as i64;
            if secs == 0 {
                d.format("%d.%m.%Y").to_string()
            } else {
                let t = d.and_hms_opt(0, 0, 0).map(|dt| dt + Duration::seconds(secs));
                match t {
                    Some(dt) => dt.format("%d.%m.%Y %H:%M:%S").to_string(),
                    None => float_to_text(serial),
                }
            }
        }
        None => float_to_text(serial),
    }
}

/// Turns the raw header cells into unique column names.
///
/// Blank cells become `__EMPTY`, `__EMPTY_1`, ... and repeated names get a
/// `_1`, `_2`, ... suffix.
pub fn header_names(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for cell in raw {
        let base = if cell.trim().is_empty() {
            "__EMPTY".to_string()
        } else {
            cell.clone()
        };
        let mut name = base.clone();
        let mut counter = 1;
        while seen.contains(&name) {
            name = format!("{}_{}", base, counter);
            counter += 1;
        }
        seen.insert(name.clone());
        res.push(name);
    }
    res
}

/// Assembles text rows from a header and the following lines.
///
/// Lines where all the cells are empty are dropped. Short lines are padded
/// with empty strings.
pub fn rows_from_table<I>(header: &[String], lines: I) -> Vec<SheetRow>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut res: Vec<SheetRow> = Vec::new();
    for line in lines {
        if line.iter().all(|c| c.is_empty()) {
            continue;
        }
        let row: SheetRow = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), line.get(idx).cloned().unwrap_or_default()))
            .collect();
        res.push(row);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_to_text(&DataType::Float(1.0)), "1");
        assert_eq!(cell_to_text(&DataType::Float(0.25)), "0.25");
        assert_eq!(cell_to_text(&DataType::Int(20)), "20");
        assert_eq!(cell_to_text(&DataType::Empty), "");
        assert_eq!(cell_to_text(&DataType::Bool(true)), "TRUE");
        assert_eq!(cell_to_text(&DataType::DateTime(45092.0)), "15.06.2023");
    }

    #[test]
    fn header_names_are_unique() {
        let names = header_names(&strings(&["Name", "", "Name", " ", "Name_1"]));
        assert_eq!(
            names,
            strings(&["Name", "__EMPTY", "Name_1", "__EMPTY_1", "Name_1_1"])
        );
    }

    #[test]
    fn blank_lines_are_dropped_and_short_lines_padded() {
        let header = strings(&["Name", "ja"]);
        let rows = rows_from_table(
            &header,
            vec![strings(&["A", "1"]), strings(&["", ""]), strings(&["B"])],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("ja").map(String::as_str), Some(""));
        assert_eq!(rows[1].get("Name").map(String::as_str), Some("B"));
    }

    #[test]
    fn stem_drops_directory_and_extension() {
        assert_eq!(
            file_stem(Path::new("input/20230615_vote.xlsx")),
            "20230615_vote"
        );
    }
}
