use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use ulid::Ulid;

use crate::ClientResult;
use crate::intelligence::date::{format_timestamp, parse_timestamp};
use crate::state::map_sqlite_error;

/// A lease older than this is treated as abandoned by a crashed holder.
pub const LOCK_STALE_AFTER_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRunRow {
    pub run_id: String,
    pub job_id: String,
    pub trigger: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: String,
    pub sent: i64,
    pub skipped: i64,
    pub errors: i64,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewJobRun<'a> {
    pub job_id: &'a str,
    pub trigger: &'a str,
    pub started_at: &'a str,
    pub finished_at: &'a str,
    pub status: &'a str,
    pub sent: i64,
    pub skipped: i64,
    pub errors: i64,
    pub error: Option<&'a str>,
}

pub fn new_holder_id() -> String {
    format!("hold_{}", Ulid::new())
}

/// Takes the single-flight lease for `job_id`. Returns false when a live lease exists.
pub fn try_acquire_lock(
    connection: &mut Connection,
    db_path: &Path,
    job_id: &str,
    holder: &str,
    now: NaiveDateTime,
) -> ClientResult<bool> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let existing = transaction
        .query_row(
            "SELECT acquired_at FROM internal_job_locks WHERE job_id = ?1",
            params![job_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let stale_before = now - Duration::minutes(LOCK_STALE_AFTER_MINUTES);
    if let Some(acquired_at) = existing
        && parse_timestamp(&acquired_at).is_some_and(|at| at > stale_before)
    {
        return Ok(false);
    }

    transaction
        .execute(
            "INSERT OR REPLACE INTO internal_job_locks (job_id, holder, acquired_at)
             VALUES (?1, ?2, ?3)",
            params![job_id, holder, format_timestamp(&now)],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(true)
}

pub fn release_lock(
    connection: &Connection,
    db_path: &Path,
    job_id: &str,
    holder: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "DELETE FROM internal_job_locks WHERE job_id = ?1 AND holder = ?2",
            params![job_id, holder],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub fn record_run(
    connection: &Connection,
    db_path: &Path,
    run: &NewJobRun<'_>,
) -> ClientResult<String> {
    let run_id = format!("run_{}", Ulid::new());
    connection
        .execute(
            "INSERT INTO internal_job_runs (
                run_id, job_id, trigger, started_at, finished_at, status,
                sent, skipped, errors, error
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run_id,
                run.job_id,
                run.trigger,
                run.started_at,
                run.finished_at,
                run.status,
                run.sent,
                run.skipped,
                run.errors,
                run.error,
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(run_id)
}

pub fn last_run(
    connection: &Connection,
    db_path: &Path,
    job_id: &str,
) -> ClientResult<Option<JobRunRow>> {
    connection
        .query_row(
            "SELECT run_id, job_id, trigger, started_at, finished_at, status,
                    sent, skipped, errors, error
             FROM internal_job_runs
             WHERE job_id = ?1
             ORDER BY finished_at DESC, run_id DESC
             LIMIT 1",
            params![job_id],
            |row| {
                Ok(JobRunRow {
                    run_id: row.get(0)?,
                    job_id: row.get(1)?,
                    trigger: row.get(2)?,
                    started_at: row.get(3)?,
                    finished_at: row.get(4)?,
                    status: row.get(5)?,
                    sent: row.get(6)?,
                    skipped: row.get(7)?,
                    errors: row.get(8)?,
                    error: row.get(9)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::{Duration, NaiveDate};
    use rusqlite::Connection;

    use super::{release_lock, try_acquire_lock};
    use crate::migrations::run_pending;

    #[test]
    fn live_lease_blocks_and_stale_lease_is_taken_over() {
        let db_path = Path::new(":memory:");
        let opened = Connection::open_in_memory();
        assert!(opened.is_ok());
        let now = NaiveDate::from_ymd_opt(2026, 3, 3).and_then(|day| day.and_hms_opt(9, 0, 0));
        assert!(now.is_some());
        if let (Ok(mut conn), Some(now)) = (opened, now) {
            assert!(run_pending(&mut conn).is_ok());

            let first = try_acquire_lock(&mut conn, db_path, "daily_reminder_check", "a", now);
            assert!(matches!(first, Ok(true)));
            let second = try_acquire_lock(&mut conn, db_path, "daily_reminder_check", "b", now);
            assert!(matches!(second, Ok(false)));

            let later = now + Duration::minutes(61);
            let takeover = try_acquire_lock(&mut conn, db_path, "daily_reminder_check", "b", later);
            assert!(matches!(takeover, Ok(true)));

            // Only the current holder can release.
            assert!(release_lock(&conn, db_path, "daily_reminder_check", "a").is_ok());
            let blocked = try_acquire_lock(&mut conn, db_path, "daily_reminder_check", "c", later);
            assert!(matches!(blocked, Ok(false)));
            assert!(release_lock(&conn, db_path, "daily_reminder_check", "b").is_ok());
            let free = try_acquire_lock(&mut conn, db_path, "daily_reminder_check", "c", later);
            assert!(matches!(free, Ok(true)));
        }
    }
}
