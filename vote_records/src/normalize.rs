use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::model::{columns, RecordError, SheetRow};

/// The group column as it is spelled in the published sheets.
pub const FRAKTION_GRUPPE_RAW: &str = "Fraktion/Gruppe";

fn date_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})_").expect("static regex"))
}

/// Renames the `Fraktion/Gruppe` column to `FraktionGruppe`.
///
/// If both spellings are present, the slash spelling wins.
pub fn rename_group_column(row: &mut SheetRow) {
    if let Some(v) = row.remove(FRAKTION_GRUPPE_RAW) {
        row.insert(columns::FRAKTION_GRUPPE.to_string(), v);
    }
}

pub fn normalize_rows(rows: Vec<SheetRow>) -> Vec<SheetRow> {
    rows.into_iter()
        .map(|mut row| {
            rename_group_column(&mut row);
            row
        })
        .collect()
}

/// Derives the date of a vote from the name of its file.
///
/// The name must start with `YYYYMMDD_`. The date is returned as `DD.MM.YYYY`.
/// No calendar check is done on the digits.
///
/// ```
/// use vote_records::vote_date_from_file_name;
///
/// assert_eq!(
///     vote_date_from_file_name("20230615_vote").as_deref(),
///     Some("15.06.2023")
/// );
/// assert_eq!(vote_date_from_file_name("vote_20230615"), None);
/// ```
pub fn vote_date_from_file_name(file_name: &str) -> Option<String> {
    let caps = date_prefix().captures(file_name)?;
    let date = format!("{}.{}.{}", &caps[3], &caps[2], &caps[1]);
    debug!("vote_date_from_file_name: {:?} -> {:?}", file_name, date);
    Some(date)
}

/// Same as [vote_date_from_file_name], failing with [RecordError::MissingDate].
pub fn require_vote_date(file_name: &str) -> Result<String, RecordError> {
    vote_date_from_file_name(file_name).ok_or_else(|| RecordError::MissingDate {
        file_name: file_name.to_string(),
    })
}

/// Sets the `Datum` column of every row, replacing any value read from the sheet.
pub fn stamp_vote_date(rows: &mut [SheetRow], datum: &str) {
    for row in rows.iter_mut() {
        row.insert(columns::DATUM.to_string(), datum.to_string());
    }
}
