use std::path::Path;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use ulid::Ulid;

use crate::intelligence::date::format_iso_date;
use crate::intelligence::types::ContributionRecord;
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq)]
pub struct NewContribution {
    pub member_id: String,
    pub due_date: String,
    pub amount: f64,
    pub paid_date: Option<String>,
    pub month_tag: Option<String>,
}

pub fn new_contribution_id() -> String {
    format!("ctb_{}", Ulid::new())
}

pub fn month_exists(connection: &Connection, db_path: &Path, month_tag: &str) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM contributions WHERE month_tag = ?1 LIMIT 1",
            params![month_tag],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(found.unwrap_or(false))
}

/// Inserts every row or none.
pub fn insert_contributions(
    connection: &mut Connection,
    db_path: &Path,
    rows: &[NewContribution],
    created_at: &str,
) -> ClientResult<Vec<String>> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        let contribution_id = new_contribution_id();
        transaction
            .execute(
                "INSERT INTO contributions (
                    contribution_id, member_id, due_date, amount, paid_date, month_tag, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    contribution_id,
                    row.member_id,
                    row.due_date,
                    row.amount,
                    row.paid_date,
                    row.month_tag,
                    created_at,
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        ids.push(contribution_id);
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(ids)
}

pub fn contribution_owner(
    connection: &Connection,
    db_path: &Path,
    contribution_id: &str,
) -> ClientResult<String> {
    connection
        .query_row(
            "SELECT member_id FROM contributions WHERE contribution_id = ?1",
            params![contribution_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::contribution_not_found(contribution_id))
}

/// Sets the paid date. Re-recording overwrites the previous date.
pub fn record_payment(
    connection: &Connection,
    db_path: &Path,
    contribution_id: &str,
    paid_date: &str,
) -> ClientResult<()> {
    let changed = connection
        .execute(
            "UPDATE contributions SET paid_date = ?2 WHERE contribution_id = ?1",
            params![contribution_id, paid_date],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if changed == 0 {
        return Err(ClientError::contribution_not_found(contribution_id));
    }
    Ok(())
}

/// Marks every unpaid contribution of a member as paid; returns how many changed.
pub fn pay_all_for_member(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
    paid_date: &str,
) -> ClientResult<usize> {
    connection
        .execute(
            "UPDATE contributions SET paid_date = ?2 WHERE member_id = ?1 AND paid_date IS NULL",
            params![member_id, paid_date],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Unpaid contributions, earliest due date first.
pub fn unpaid(contributions: &[ContributionRecord]) -> Vec<&ContributionRecord> {
    let mut rows: Vec<&ContributionRecord> = contributions
        .iter()
        .filter(|contribution| !contribution.is_paid())
        .collect();
    rows.sort_by_key(|contribution| contribution.due_date);
    rows
}

pub fn paid_date_text(record: &ContributionRecord) -> Option<String> {
    record.paid_date.as_ref().map(format_iso_date)
}
