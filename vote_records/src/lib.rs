/*!
Records of roll-call votes ("namentliche Abstimmungen"), as published in
spreadsheets: one row per member of the parliament and per vote.

This crate holds everything that does not depend on a storage engine or on a
file format:

- the [VoteRecord] model, built from text rows with [VoteRecord::from_row];
- the normalization of the rows ([normalize_rows]) and the derivation of the
  vote date from the name of the file ([vote_date_from_file_name]);
- the shaping of the dissent report ([DissentReport]).

```
use vote_records::*;

let mut rows: Vec<SheetRow> = vec![[("Fraktion/Gruppe", "SPD"), ("ja", "1")]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()];
rows = normalize_rows(rows);
let datum = require_vote_date("20230615_vote")?;
stamp_vote_date(&mut rows, &datum);

let record = VoteRecord::from_row(&rows[0])?;
assert_eq!(record.fraktion_gruppe.as_deref(), Some("SPD"));
assert_eq!(record.datum.as_deref(), Some("15.06.2023"));
# Ok::<(), RecordError>(())
```
*/

mod model;
mod normalize;
mod report;

pub use crate::model::*;
pub use crate::normalize::*;
pub use crate::report::*;
