use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::warn;

use crate::ClientResult;
use crate::intelligence::date::parse_stored_date;
use crate::intelligence::types::ContributionRecord;
use crate::state::map_sqlite_error;

const CONTRIBUTION_COLUMNS: &str =
    "contribution_id, member_id, due_date, amount, paid_date, month_tag";

type RawContribution = (String, String, String, f64, Option<String>, Option<String>);

/// Contributions for one member, oldest due date first (insertion order breaks ties).
pub fn load_member_contributions(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
) -> ClientResult<Vec<ContributionRecord>> {
    let sql = format!(
        "SELECT {CONTRIBUTION_COLUMNS}
         FROM contributions
         WHERE member_id = ?1
         ORDER BY due_date ASC, rowid ASC"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map(params![member_id], read_raw)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows: Vec<ContributionRecord> = Vec::new();
    for row in rows_iter {
        let raw = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        if let Some(record) = into_record(raw) {
            rows.push(record);
        }
    }
    Ok(rows)
}

/// All contributions grouped by member, each group ordered like `load_member_contributions`.
pub fn load_contributions_by_member(
    connection: &Connection,
    db_path: &Path,
) -> ClientResult<BTreeMap<String, Vec<ContributionRecord>>> {
    let sql = format!(
        "SELECT {CONTRIBUTION_COLUMNS}
         FROM contributions
         ORDER BY member_id ASC, due_date ASC, rowid ASC"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map([], read_raw)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut grouped: BTreeMap<String, Vec<ContributionRecord>> = BTreeMap::new();
    for row in rows_iter {
        let raw = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        if let Some(record) = into_record(raw) {
            grouped
                .entry(record.member_id.clone())
                .or_default()
                .push(record);
        }
    }
    Ok(grouped)
}

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContribution> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_record(raw: RawContribution) -> Option<ContributionRecord> {
    let (contribution_id, member_id, due_date, amount, paid_date, month_tag) = raw;
    let Some(due) = parse_stored_date(&due_date) else {
        warn!(%contribution_id, %due_date, "skipping contribution with malformed due date");
        return None;
    };
    let paid = match paid_date.as_deref() {
        None => None,
        Some(value) => match parse_stored_date(value) {
            Some(parsed) => Some(parsed),
            None => {
                warn!(%contribution_id, paid_date = value, "skipping contribution with malformed paid date");
                return None;
            }
        },
    };

    Some(ContributionRecord {
        contribution_id,
        member_id,
        due_date: due,
        amount,
        paid_date: paid,
        month_tag,
    })
}
