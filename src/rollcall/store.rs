//! SQLite storage of the vote records.
//!
//! All the records live in one table, `ExcelData`. The table name and the
//! column names are kept compatible with databases created by earlier
//! versions of the importer.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use snafu::prelude::*;

use crate::rollcall::*;

pub const TABLE: &str = "ExcelData";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "ExcelData" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "Wahlperiode" INTEGER,
    "Sitzungnr" INTEGER,
    "Abstimmnr" INTEGER,
    "FraktionGruppe" VARCHAR(255),
    "Name" VARCHAR(255),
    "Vorname" VARCHAR(255),
    "Titel" VARCHAR(255),
    "ja" INTEGER,
    "nein" INTEGER,
    "Enthaltung" INTEGER,
    "ungültig" INTEGER,
    "nichtabgegeben" INTEGER,
    "Bezeichnung" VARCHAR(255),
    "Bemerkung" VARCHAR(255),
    "Datum" VARCHAR(255),
    "createdAt" DATETIME NOT NULL,
    "updatedAt" DATETIME NOT NULL
);
"#;

const INSERT: &str = r#"
INSERT INTO "ExcelData" (
    "Wahlperiode", "Sitzungnr", "Abstimmnr", "FraktionGruppe", "Name", "Vorname", "Titel",
    "ja", "nein", "Enthaltung", "ungültig", "nichtabgegeben",
    "Bezeichnung", "Bemerkung", "Datum", "createdAt", "updatedAt"
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
"#;

const TOP_DISSENT: &str = r#"
SELECT
    "Bezeichnung",
    "Bemerkung",
    SUM("ja") AS ja,
    SUM("nein") AS nein,
    SUM("Enthaltung") AS enthaltung,
    SUM("ungültig") AS "ungültig",
    SUM("nichtabgegeben") AS nichtabgegeben
FROM "ExcelData"
GROUP BY "Bezeichnung", "Bemerkung"
ORDER BY SUM(COALESCE("Enthaltung", 0) + COALESCE("ungültig", 0) + COALESCE("nichtabgegeben", 0)) DESC
LIMIT ?1
"#;

const SELECT_RECORDS: &str = r#"
SELECT
    "id", "Wahlperiode", "Sitzungnr", "Abstimmnr", "FraktionGruppe", "Name", "Vorname", "Titel",
    "ja", "nein", "Enthaltung", "ungültig", "nichtabgegeben",
    "Bezeichnung", "Bemerkung", "Datum", "createdAt", "updatedAt"
FROM "ExcelData"
WHERE "Bezeichnung" = ?1
"#;

/// A handle on the vote table.
///
/// The connection is shared behind a lock: every operation holds it for the
/// duration of one statement (or one transaction for inserts).
pub struct VoteStore {
    conn: Mutex<Connection>,
}

impl VoteStore {
    /// Opens (or creates) the database file and the vote table.
    pub fn open(path: impl AsRef<Path>) -> RollcallResult<Self> {
        debug!("VoteStore::open: {:?}", path.as_ref());
        let conn = Connection::open(path).context(SqliteSnafu {})?;
        Self::with_connection(conn)
    }

    /// A private database that disappears with the handle.
    pub fn open_in_memory() -> RollcallResult<Self> {
        let conn = Connection::open_in_memory().context(SqliteSnafu {})?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> RollcallResult<Self> {
        conn.execute_batch(SCHEMA).context(SqliteSnafu {})?;
        Ok(VoteStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> RollcallResult<MutexGuard<'_, Connection>> {
        self.conn.lock().ok().context(PoisonedStoreSnafu {})
    }

    /// Appends the records in one transaction: either all of them are
    /// stored, or none.
    pub fn insert_records(&self, records: &[VoteRecord]) -> RollcallResult<usize> {
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f +00:00").to_string();
        let mut conn = self.conn()?;
        let tx = conn.transaction().context(SqliteSnafu {})?;
        {
            let mut stmt = tx.prepare(INSERT).context(SqliteSnafu {})?;
            for r in records {
                stmt.execute(params![
                    r.wahlperiode,
                    r.sitzungnr,
                    r.abstimmnr,
                    r.fraktion_gruppe,
                    r.name,
                    r.vorname,
                    r.titel,
                    r.ja,
                    r.nein,
                    r.enthaltung,
                    r.ungueltig,
                    r.nichtabgegeben,
                    r.bezeichnung,
                    r.bemerkung,
                    r.datum,
                    now,
                    now,
                ])
                .context(SqliteSnafu {})?;
            }
        }
        tx.commit().context(SqliteSnafu {})?;
        debug!("insert_records: {} record(s)", records.len());
        Ok(records.len())
    }

    pub fn count_records(&self) -> RollcallResult<i64> {
        let conn = self.conn()?;
        conn.query_row(r#"SELECT COUNT(*) FROM "ExcelData""#, [], |row| row.get(0))
            .context(SqliteSnafu {})
    }

    /// The votes with the most abstentions, invalid and missing votes.
    pub fn top_dissent(&self, limit: usize) -> RollcallResult<Vec<DissentTotals>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(TOP_DISSENT).context(SqliteSnafu {})?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(DissentTotals {
                    bezeichnung: opt_text(row, 0)?,
                    bemerkung: opt_text(row, 1)?,
                    ja: opt_int(row, 2)?,
                    nein: opt_int(row, 3)?,
                    enthaltung: opt_int(row, 4)?,
                    ungueltig: opt_int(row, 5)?,
                    nichtabgegeben: opt_int(row, 6)?,
                })
            })
            .context(SqliteSnafu {})?;
        rows.collect::<Result<Vec<_>, _>>().context(SqliteSnafu {})
    }

    pub fn distinct_members(&self) -> RollcallResult<Vec<MemberSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(r#"SELECT DISTINCT "Name", "Vorname", "FraktionGruppe" FROM "ExcelData""#)
            .context(SqliteSnafu {})?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MemberSummary {
                    name: opt_text(row, 0)?,
                    vorname: opt_text(row, 1)?,
                    fraktion_gruppe: opt_text(row, 2)?,
                })
            })
            .context(SqliteSnafu {})?;
        rows.collect::<Result<Vec<_>, _>>().context(SqliteSnafu {})
    }

    /// All the stored records of the vote with the given label.
    pub fn records_by_bezeichnung(&self, bezeichnung: &str) -> RollcallResult<Vec<StoredVoteRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(SELECT_RECORDS).context(SqliteSnafu {})?;
        let rows = stmt
            .query_map(params![bezeichnung], |row| {
                Ok(StoredVoteRecord {
                    id: row.get(0)?,
                    record: VoteRecord {
                        wahlperiode: opt_int(row, 1)?,
                        sitzungnr: opt_int(row, 2)?,
                        abstimmnr: opt_int(row, 3)?,
                        fraktion_gruppe: opt_text(row, 4)?,
                        name: opt_text(row, 5)?,
                        vorname: opt_text(row, 6)?,
                        titel: opt_text(row, 7)?,
                        ja: opt_int(row, 8)?,
                        nein: opt_int(row, 9)?,
                        enthaltung: opt_int(row, 10)?,
                        ungueltig: opt_int(row, 11)?,
                        nichtabgegeben: opt_int(row, 12)?,
                        bezeichnung: opt_text(row, 13)?,
                        bemerkung: opt_text(row, 14)?,
                        datum: opt_text(row, 15)?,
                    },
                    created_at: opt_text(row, 16)?.unwrap_or_default(),
                    updated_at: opt_text(row, 17)?.unwrap_or_default(),
                })
            })
            .context(SqliteSnafu {})?;
        rows.collect::<Result<Vec<_>, _>>().context(SqliteSnafu {})
    }

    pub fn distinct_groups(&self) -> RollcallResult<Vec<Option<String>>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(r#"SELECT DISTINCT "FraktionGruppe" FROM "ExcelData""#)
            .context(SqliteSnafu {})?;
        let rows = stmt
            .query_map([], |row| opt_text(row, 0))
            .context(SqliteSnafu {})?;
        rows.collect::<Result<Vec<_>, _>>().context(SqliteSnafu {})
    }

    /// The members of a group, with each vote label they appear in.
    pub fn group_members(&self, fraktion_gruppe: &str) -> RollcallResult<Vec<GroupMember>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                r#"SELECT DISTINCT "Name", "Vorname", "Bezeichnung" FROM "ExcelData" WHERE "FraktionGruppe" = ?1"#,
            )
            .context(SqliteSnafu {})?;
        let rows = stmt
            .query_map(params![fraktion_gruppe], |row| {
                Ok(GroupMember {
                    name: opt_text(row, 0)?,
                    vorname: opt_text(row, 1)?,
                    bezeichnung: opt_text(row, 2)?,
                })
            })
            .context(SqliteSnafu {})?;
        rows.collect::<Result<Vec<_>, _>>().context(SqliteSnafu {})
    }
}

// Older databases may hold text in the integer columns (empty cells were
// stored as ''), and SUM over text gives a float.
fn opt_int(row: &Row, idx: usize) -> rusqlite::Result<Option<i64>> {
    let v: Value = row.get(idx)?;
    Ok(match v {
        Value::Integer(i) => Some(i),
        Value::Real(f) => Some(f as i64),
        Value::Text(s) => s.trim().parse::<i64>().ok(),
        Value::Null | Value::Blob(_) => None,
    })
}

fn opt_text(row: &Row, idx: usize) -> rusqlite::Result<Option<String>> {
    let v: Value = row.get(idx)?;
    Ok(match v {
        Value::Text(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Null | Value::Blob(_) => None,
    })
}
