// ********* Record data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One row of a sheet, as text: column name -> cell content.
///
/// Missing cells are present with an empty string.
pub type SheetRow = HashMap<String, String>;

/// The column names of the vote table, as they appear in the sheets
/// published by the Bundestag (after normalization).
pub mod columns {
    pub const WAHLPERIODE: &str = "Wahlperiode";
    pub const SITZUNGNR: &str = "Sitzungnr";
    pub const ABSTIMMNR: &str = "Abstimmnr";
    pub const FRAKTION_GRUPPE: &str = "FraktionGruppe";
    pub const NAME: &str = "Name";
    pub const VORNAME: &str = "Vorname";
    pub const TITEL: &str = "Titel";
    pub const JA: &str = "ja";
    pub const NEIN: &str = "nein";
    pub const ENTHALTUNG: &str = "Enthaltung";
    pub const UNGUELTIG: &str = "ungültig";
    pub const NICHTABGEGEBEN: &str = "nichtabgegeben";
    pub const BEZEICHNUNG: &str = "Bezeichnung";
    pub const BEMERKUNG: &str = "Bemerkung";
    pub const DATUM: &str = "Datum";
}

/// The vote of one member, for one roll call.
///
/// Text columns that are missing from the sheet are `None`, while present but
/// empty cells are kept as empty strings. Count columns that are empty are `None`.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteRecord {
    #[serde(rename = "Wahlperiode")]
    pub wahlperiode: Option<i64>,
    #[serde(rename = "Sitzungnr")]
    pub sitzungnr: Option<i64>,
    #[serde(rename = "Abstimmnr")]
    pub abstimmnr: Option<i64>,
    #[serde(rename = "FraktionGruppe")]
    pub fraktion_gruppe: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Vorname")]
    pub vorname: Option<String>,
    #[serde(rename = "Titel")]
    pub titel: Option<String>,
    pub ja: Option<i64>,
    pub nein: Option<i64>,
    #[serde(rename = "Enthaltung")]
    pub enthaltung: Option<i64>,
    #[serde(rename = "ungültig")]
    pub ungueltig: Option<i64>,
    pub nichtabgegeben: Option<i64>,
    #[serde(rename = "Bezeichnung")]
    pub bezeichnung: Option<String>,
    #[serde(rename = "Bemerkung")]
    pub bemerkung: Option<String>,
    #[serde(rename = "Datum")]
    pub datum: Option<String>,
}

impl VoteRecord {
    /// Builds a record from a normalized sheet row.
    ///
    /// Columns that are not part of the record are ignored.
    ///
    /// ```
    /// use vote_records::{SheetRow, VoteRecord};
    ///
    /// let row: SheetRow = [("Name", "Muster"), ("ja", "1"), ("nein", "")]
    ///     .iter()
    ///     .map(|(k, v)| (k.to_string(), v.to_string()))
    ///     .collect();
    /// let record = VoteRecord::from_row(&row)?;
    /// assert_eq!(record.name.as_deref(), Some("Muster"));
    /// assert_eq!(record.ja, Some(1));
    /// assert_eq!(record.nein, None);
    /// assert_eq!(record.titel, None);
    /// # Ok::<(), vote_records::RecordError>(())
    /// ```
    pub fn from_row(row: &SheetRow) -> Result<VoteRecord, RecordError> {
        let text = |column: &str| row.get(column).cloned();
        let count = |column: &str| match row.get(column) {
            Some(raw) => parse_count(column, raw),
            None => Ok(None),
        };
        Ok(VoteRecord {
            wahlperiode: count(columns::WAHLPERIODE)?,
            sitzungnr: count(columns::SITZUNGNR)?,
            abstimmnr: count(columns::ABSTIMMNR)?,
            fraktion_gruppe: text(columns::FRAKTION_GRUPPE),
            name: text(columns::NAME),
            vorname: text(columns::VORNAME),
            titel: text(columns::TITEL),
            ja: count(columns::JA)?,
            nein: count(columns::NEIN)?,
            enthaltung: count(columns::ENTHALTUNG)?,
            ungueltig: count(columns::UNGUELTIG)?,
            nichtabgegeben: count(columns::NICHTABGEGEBEN)?,
            bezeichnung: text(columns::BEZEICHNUNG),
            bemerkung: text(columns::BEMERKUNG),
            datum: text(columns::DATUM),
        })
    }
}

/// Reads a non-negative integer cell that was rendered as text.
///
/// Blank cells are `None`. Spreadsheet programs sometimes render integers as
/// floats (`1.0`): these are accepted as long as there is no fractional part.
/// Anything else (text, fractions, negative values) is an
/// [RecordError::InvalidNumber], which rejects the whole file: a sheet with
/// an unreadable count is not loaded partially.
pub fn parse_count(column: &str, raw: &str) -> Result<Option<i64>, RecordError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let parsed = match s.parse::<i64>() {
        Ok(x) => Some(x),
        Err(_) => match s.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
            _ => None,
        },
    };
    match parsed {
        Some(x) if x >= 0 => Ok(Some(x)),
        _ => Err(RecordError::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// A record as it is persisted, with the bookkeeping columns of the table.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct StoredVoteRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: VoteRecord,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// A distinct member of the parliament, with their group.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct MemberSummary {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Vorname")]
    pub vorname: Option<String>,
    #[serde(rename = "FraktionGruppe")]
    pub fraktion_gruppe: Option<String>,
}

/// A member of a group, together with the label of a vote they took part in.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Vorname")]
    pub vorname: Option<String>,
    #[serde(rename = "Bezeichnung")]
    pub bezeichnung: Option<String>,
}

/// Errors when turning sheet content into records.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RecordError {
    /// A count or identity column holds something that is not an integer.
    InvalidNumber { column: String, value: String },
    /// The file name does not start with a `YYYYMMDD_` date.
    MissingDate { file_name: String },
}

impl Error for RecordError {}

impl Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::InvalidNumber { column, value } => {
                write!(
                    f,
                    "column {} does not hold a non-negative integer: {:?}",
                    column, value
                )
            }
            RecordError::MissingDate { file_name } => {
                write!(f, "filename does not contain a valid date: {}", file_name)
            }
        }
    }
}
