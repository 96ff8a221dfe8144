// ******** Report data structures *********

use serde::ser::{Serialize, SerializeMap, Serializer};

/// How many votes the dissent report returns.
pub const TOP_DISSENT_LIMIT: usize = 10;

/// The summed outcome of all the records sharing a label and a remark.
///
/// The sums are `None` when every value in the group was NULL.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DissentTotals {
    pub bezeichnung: Option<String>,
    pub bemerkung: Option<String>,
    pub ja: Option<i64>,
    pub nein: Option<i64>,
    pub enthaltung: Option<i64>,
    pub ungueltig: Option<i64>,
    pub nichtabgegeben: Option<i64>,
}

/// The fields every entry of the dissent report carries, with NULL sums
/// replaced by 0.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DissentCounts {
    pub bezeichnung: Option<String>,
    pub ja: i64,
    pub nein: i64,
    pub enthaltung: i64,
    pub ungueltig: i64,
}

/// One entry of the dissent report.
///
/// When the vote carries a remark, the count of votes not cast is reported
/// under a key that embeds the remark: `nichtabgegeben (<remark>)`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DissentReport {
    Plain {
        counts: DissentCounts,
        nichtabgegeben: i64,
    },
    Annotated {
        counts: DissentCounts,
        bemerkung: String,
        // Not defaulted: a NULL sum stays null in the output.
        nichtabgegeben: Option<i64>,
    },
}

impl DissentReport {
    pub fn counts(&self) -> &DissentCounts {
        match self {
            DissentReport::Plain { counts, .. } => counts,
            DissentReport::Annotated { counts, .. } => counts,
        }
    }

    /// The JSON key under which the votes not cast are reported.
    ///
    /// ```
    /// use vote_records::{DissentReport, DissentTotals};
    ///
    /// let totals = DissentTotals {
    ///     bemerkung: Some("Nachtrag".to_string()),
    ///     ..Default::default()
    /// };
    /// let report = DissentReport::from(totals);
    /// assert_eq!(report.not_cast_key(), "nichtabgegeben (Nachtrag)");
    /// ```
    pub fn not_cast_key(&self) -> String {
        match self {
            DissentReport::Plain { .. } => "nichtabgegeben".to_string(),
            DissentReport::Annotated { bemerkung, .. } => {
                format!("nichtabgegeben ({})", bemerkung)
            }
        }
    }
}

impl From<DissentTotals> for DissentReport {
    fn from(t: DissentTotals) -> Self {
        let counts = DissentCounts {
            bezeichnung: t.bezeichnung,
            ja: t.ja.unwrap_or(0),
            nein: t.nein.unwrap_or(0),
            enthaltung: t.enthaltung.unwrap_or(0),
            ungueltig: t.ungueltig.unwrap_or(0),
        };
        match t.bemerkung {
            Some(bemerkung) if !bemerkung.is_empty() => DissentReport::Annotated {
                counts,
                bemerkung,
                nichtabgegeben: t.nichtabgegeben,
            },
            _ => DissentReport::Plain {
                counts,
                nichtabgegeben: t.nichtabgegeben.unwrap_or(0),
            },
        }
    }
}

pub fn build_dissent_report(totals: Vec<DissentTotals>) -> Vec<DissentReport> {
    totals.into_iter().map(DissentReport::from).collect()
}

impl Serialize for DissentReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let counts = self.counts();
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("bezeichnung", &counts.bezeichnung)?;
        map.serialize_entry("ja", &counts.ja)?;
        map.serialize_entry("nein", &counts.nein)?;
        map.serialize_entry("enthaltung", &counts.enthaltung)?;
        map.serialize_entry("ungültig", &counts.ungueltig)?;
        let not_cast_key = self.not_cast_key();
        match self {
            DissentReport::Plain { nichtabgegeben, .. } => {
                map.serialize_entry(&not_cast_key, nichtabgegeben)?
            }
            DissentReport::Annotated { nichtabgegeben, .. } => {
                map.serialize_entry(&not_cast_key, nichtabgegeben)?
            }
        }
        map.end()
    }
}
