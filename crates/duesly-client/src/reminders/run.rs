use std::path::Path;
use std::time::Instant;

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::ClientResult;
use crate::intelligence::classify::primary_classification;
use crate::intelligence::date::format_timestamp;
use crate::intelligence::query::load_member_contributions;
use crate::ledger::contributions::unpaid;
use crate::ledger::jobs::{NewJobRun, new_holder_id, record_run, release_lock, try_acquire_lock};
use crate::ledger::members::{MemberRow, list_members};
use crate::ledger::notifications::reminder_sent_since;
use crate::notify::Notifier;

use super::policy::{DAILY_JOB_ID, dedupe_window_start, should_send_reminder};
use super::send::{ReminderContext, ReminderOutcome, send_member_reminder};

pub const RETRY_NOTE: &str = "Will retry on next scheduled run";
pub const IN_PROGRESS_NOTE: &str = "Another reminder run holds the lock; nothing was sent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Scheduled,
    Manual,
}

impl RunTrigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
    InProgress,
}

impl RunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::InProgress => "in_progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderRunSummary {
    pub status: RunStatus,
    pub trigger: RunTrigger,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub reminders: Vec<ReminderOutcome>,
}

impl ReminderRunSummary {
    fn empty(status: RunStatus, trigger: RunTrigger, now: NaiveDateTime) -> Self {
        Self {
            status,
            trigger,
            sent: 0,
            skipped: 0,
            errors: 0,
            timestamp: format_timestamp(&now),
            note: None,
            error: None,
            run_id: None,
            reminders: Vec::new(),
        }
    }

    /// Whole-batch infrastructure failure: nothing more can be done this pass.
    pub fn failed(trigger: RunTrigger, now: NaiveDateTime, detail: &str) -> Self {
        let mut summary = Self::empty(RunStatus::Failed, trigger, now);
        summary.error = Some(format!("Database connection failed: {detail}"));
        summary.note = Some(RETRY_NOTE.to_string());
        summary
    }
}

/// One pass of the daily reminder job.
///
/// Never returns an error: storage failures around the batch (lock, member
/// list, run bookkeeping) yield a `failed` summary carrying the retry note,
/// and per-member or per-contribution problems are counted as errors while
/// the pass continues.
pub fn run_reminder_check<R>(
    connection: &mut Connection,
    db_path: &Path,
    notifier: &Notifier,
    now: NaiveDateTime,
    trigger: RunTrigger,
    rng: &mut R,
) -> ReminderRunSummary
where
    R: Rng + ?Sized,
{
    let holder = new_holder_id();
    match try_acquire_lock(connection, db_path, DAILY_JOB_ID, &holder, now) {
        Ok(true) => {}
        Ok(false) => {
            warn!(job_id = DAILY_JOB_ID, "reminder run already in progress");
            let mut summary = ReminderRunSummary::empty(RunStatus::InProgress, trigger, now);
            summary.note = Some(IN_PROGRESS_NOTE.to_string());
            return summary;
        }
        Err(lock_error) => {
            error!(error = %lock_error, "could not acquire reminder job lock");
            return ReminderRunSummary::failed(trigger, now, &lock_error.message);
        }
    }

    info!(job_id = DAILY_JOB_ID, trigger = trigger.as_str(), "starting reminder check");
    let started = Instant::now();
    let context = ReminderContext {
        connection: &*connection,
        db_path,
        notifier,
        now,
    };
    let mut summary = check_all_members(&context, trigger, rng);

    let elapsed = Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero());
    let started_at = format_timestamp(&now);
    let finished_at = format_timestamp(&(now + elapsed));
    let recorded = record_run(
        connection,
        db_path,
        &NewJobRun {
            job_id: DAILY_JOB_ID,
            trigger: trigger.as_str(),
            started_at: &started_at,
            finished_at: &finished_at,
            status: summary.status.as_str(),
            sent: summary.sent as i64,
            skipped: summary.skipped as i64,
            errors: summary.errors as i64,
            error: summary.error.as_deref(),
        },
    );
    match recorded {
        Ok(run_id) => summary.run_id = Some(run_id),
        Err(record_error) => {
            error!(error = %record_error, "could not record reminder run");
            mark_bookkeeping_failure(&mut summary, &record_error.message);
        }
    }
    if let Err(release_error) = release_lock(connection, db_path, DAILY_JOB_ID, &holder) {
        error!(error = %release_error, "could not release reminder job lock");
        mark_bookkeeping_failure(&mut summary, &release_error.message);
    }

    info!(
        status = summary.status.as_str(),
        sent = summary.sent,
        skipped = summary.skipped,
        errors = summary.errors,
        "reminder check finished"
    );
    summary
}

// Reminders already delivered stay counted; the run itself is reported failed.
fn mark_bookkeeping_failure(summary: &mut ReminderRunSummary, detail: &str) {
    summary.status = RunStatus::Failed;
    if summary.error.is_none() {
        summary.error = Some(format!("Database connection failed: {detail}"));
    }
    summary.note = Some(RETRY_NOTE.to_string());
}

fn check_all_members<R>(
    context: &ReminderContext<'_>,
    trigger: RunTrigger,
    rng: &mut R,
) -> ReminderRunSummary
where
    R: Rng + ?Sized,
{
    let mut summary = ReminderRunSummary::empty(RunStatus::Completed, trigger, context.now);

    let members = match list_members(context.connection, context.db_path, Some("member")) {
        Ok(members) => members,
        Err(load_error) => {
            error!(error = %load_error, "could not load members for reminder check");
            return ReminderRunSummary::failed(trigger, context.now, &load_error.message);
        }
    };

    for member in &members {
        if let Err(member_error) = check_member(context, member, &mut summary, rng) {
            error!(
                member_id = %member.member_id,
                error = %member_error,
                "reminder check failed for member"
            );
            summary.errors += 1;
        }
    }
    summary
}

fn check_member<R>(
    context: &ReminderContext<'_>,
    member: &MemberRow,
    summary: &mut ReminderRunSummary,
    rng: &mut R,
) -> ClientResult<()>
where
    R: Rng + ?Sized,
{
    let contributions =
        load_member_contributions(context.connection, context.db_path, &member.member_id)?;
    let outstanding = unpaid(&contributions);
    if outstanding.is_empty() {
        return Ok(());
    }

    let priority = primary_classification(&contributions).priority();
    let since = format_timestamp(&dedupe_window_start(context.now));

    for contribution in outstanding {
        let recently_reminded = match reminder_sent_since(
            context.connection,
            context.db_path,
            &member.member_id,
            &contribution.contribution_id,
            &since,
        ) {
            Ok(found) => found,
            Err(lookup_error) => {
                error!(
                    member_id = %member.member_id,
                    contribution_id = %contribution.contribution_id,
                    error = %lookup_error,
                    "reminder history lookup failed"
                );
                summary.errors += 1;
                continue;
            }
        };
        let decision =
            should_send_reminder(contribution, priority, context.today(), recently_reminded);
        if !decision.should_send() {
            debug!(
                member_id = %member.member_id,
                contribution_id = %contribution.contribution_id,
                ?decision,
                "reminder skipped"
            );
            summary.skipped += 1;
            continue;
        }

        match send_member_reminder(context, member, &contributions, contribution, priority, rng) {
            Ok(outcome) => {
                summary.sent += 1;
                summary.reminders.push(outcome);
            }
            Err(send_error) => {
                error!(
                    member_id = %member.member_id,
                    contribution_id = %contribution.contribution_id,
                    error = %send_error,
                    "reminder send failed"
                );
                summary.errors += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rusqlite::Connection;

    use super::{RETRY_NOTE, RunStatus, RunTrigger, run_reminder_check};
    use crate::intelligence::query::load_member_contributions;
    use crate::intelligence::types::Priority;
    use crate::ledger::contributions::{NewContribution, insert_contributions};
    use crate::ledger::jobs::{last_run, try_acquire_lock};
    use crate::ledger::members::{NewMember, get_member, insert_member};
    use crate::ledger::notifications::list_notifications;
    use crate::migrations::run_pending;
    use crate::notify::Notifier;
    use crate::notify::test_support::recording;
    use crate::reminders::policy::DAILY_JOB_ID;
    use crate::reminders::send::{ReminderContext, send_manual_reminder};

    const DB: &str = ":memory:";

    fn at(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|day| day.and_hms_opt(9, 0, 0))
    }

    fn seeded_ledger() -> Option<Connection> {
        let mut conn = Connection::open_in_memory().ok()?;
        run_pending(&mut conn).ok()?;
        let db_path = Path::new(DB);
        let member = NewMember {
            name: "Asha",
            phone: "9876543210",
            email: Some("asha@example.org"),
            monthly_amount: 500.0,
            due_day: 10,
            role: "member",
            password_hash: "x",
            must_change_password: false,
        };
        insert_member(&conn, db_path, "M001", "EMP-20260101-0001", &member, "2026-01-01T00:00:00")
            .ok()?;
        // Four unpaid plus two paid 45 days late: high-risk, reminded 7 days out.
        let mut rows = Vec::new();
        for month in 1..=6u32 {
            let due = NaiveDate::from_ymd_opt(2026, month, 10)?;
            let paid = (month <= 2).then(|| (due + Duration::days(45)).to_string());
            rows.push(NewContribution {
                member_id: "M001".to_string(),
                due_date: due.to_string(),
                amount: 500.0,
                paid_date: paid,
                month_tag: Some(format!("2026-{month:02}")),
            });
        }
        insert_contributions(&mut conn, db_path, &rows, "2026-01-01T00:00:00").ok()?;
        Some(conn)
    }

    #[test]
    fn eligible_reminder_is_sent_once_then_suppressed() {
        let ledger = seeded_ledger();
        let now = at(2026, 6, 3);
        assert!(ledger.is_some() && now.is_some());
        if let (Some(mut conn), Some(now)) = (ledger, now) {
            let db_path = Path::new(DB);
            let transport = recording();
            let notifier = Notifier::new(transport.clone(), "noreply@example.org");
            let mut rng = StdRng::seed_from_u64(7);

            let first =
                run_reminder_check(&mut conn, db_path, &notifier, now, RunTrigger::Manual, &mut rng);
            assert_eq!(first.status, RunStatus::Completed);
            assert_eq!(first.sent, 1);
            assert_eq!(first.reminders[0].days_until_due, Some(7));
            assert!(first.run_id.is_some());

            let second =
                run_reminder_check(&mut conn, db_path, &notifier, now, RunTrigger::Manual, &mut rng);
            assert_eq!(second.sent, 0);

            let sent = transport.sent.lock().map(|rows| rows.len()).unwrap_or(0);
            assert_eq!(sent, 1);
            let records = list_notifications(&conn, db_path, Some("M001"), Some("reminder"), 50);
            assert!(matches!(records, Ok(ref rows) if rows.len() == 1));
            let recorded = last_run(&conn, db_path, DAILY_JOB_ID);
            assert!(matches!(recorded, Ok(Some(ref run)) if run.status == "completed"));
        }
    }

    #[test]
    fn held_lease_short_circuits_the_run() {
        let ledger = seeded_ledger();
        let now = at(2026, 6, 3);
        assert!(ledger.is_some() && now.is_some());
        if let (Some(mut conn), Some(now)) = (ledger, now) {
            let db_path = Path::new(DB);
            assert!(matches!(
                try_acquire_lock(&mut conn, db_path, DAILY_JOB_ID, "other", now),
                Ok(true)
            ));
            let notifier = Notifier::new(recording(), "noreply@example.org");
            let mut rng = StdRng::seed_from_u64(7);
            let summary =
                run_reminder_check(&mut conn, db_path, &notifier, now, RunTrigger::Scheduled, &mut rng);
            assert_eq!(summary.status, RunStatus::InProgress);
            assert_eq!(summary.sent, 0);
        }
    }

    #[test]
    fn delivery_failure_still_counts_as_sent_and_records_failure() {
        let ledger = seeded_ledger();
        let now = at(2026, 6, 3);
        assert!(ledger.is_some() && now.is_some());
        if let (Some(mut conn), Some(now)) = (ledger, now) {
            let db_path = Path::new(DB);
            let notifier = Notifier::new(
                Arc::new(crate::notify::test_support::RejectingTransport),
                "noreply@example.org",
            );
            let mut rng = StdRng::seed_from_u64(1);
            let summary =
                run_reminder_check(&mut conn, db_path, &notifier, now, RunTrigger::Manual, &mut rng);
            assert_eq!((summary.sent, summary.errors), (1, 0));
            let records = list_notifications(&conn, db_path, Some("M001"), None, 10);
            assert!(matches!(records, Ok(ref rows) if rows.len() == 1 && rows[0].status == "failed"));
        }
    }

    #[test]
    fn unusable_ledger_yields_a_failed_summary_with_retry_note() {
        let conn = Connection::open_in_memory();
        let now = at(2026, 6, 3);
        assert!(conn.is_ok() && now.is_some());
        if let (Ok(mut conn), Some(now)) = (conn, now) {
            let notifier = Notifier::new(recording(), "noreply@example.org");
            let mut rng = StdRng::seed_from_u64(7);
            let summary = run_reminder_check(
                &mut conn,
                Path::new(DB),
                &notifier,
                now,
                RunTrigger::Scheduled,
                &mut rng,
            );
            assert_eq!(summary.status, RunStatus::Failed);
            assert_eq!(summary.note.as_deref(), Some(RETRY_NOTE));
            assert!(
                summary
                    .error
                    .as_deref()
                    .is_some_and(|error| error.starts_with("Database connection failed"))
            );
            assert_eq!((summary.sent, summary.skipped), (0, 0));
        }
    }

    #[test]
    fn broken_reminder_history_counts_an_error_per_contribution() {
        let ledger = seeded_ledger();
        let now = at(2026, 6, 3);
        assert!(ledger.is_some() && now.is_some());
        if let (Some(mut conn), Some(now)) = (ledger, now) {
            assert!(conn.execute_batch("DROP TABLE notifications;").is_ok());
            let notifier = Notifier::new(recording(), "noreply@example.org");
            let mut rng = StdRng::seed_from_u64(7);
            let summary =
                run_reminder_check(&mut conn, Path::new(DB), &notifier, now, RunTrigger::Manual, &mut rng);
            // Every unpaid contribution is still visited.
            assert_eq!(summary.errors, 4);
            assert_eq!(summary.sent, 0);
            assert_eq!(summary.status, RunStatus::Completed);
        }
    }

    #[test]
    fn manual_send_does_not_suppress_the_scheduled_reminder() {
        let ledger = seeded_ledger();
        let now = at(2026, 6, 3);
        assert!(ledger.is_some() && now.is_some());
        if let (Some(mut conn), Some(now)) = (ledger, now) {
            let db_path = Path::new(DB);
            let notifier = Notifier::new(recording(), "noreply@example.org");
            let mut rng = StdRng::seed_from_u64(3);
            let member = get_member(&conn, db_path, "M001");
            let contributions = load_member_contributions(&conn, db_path, "M001");
            assert!(matches!(member, Ok(Some(_))) && contributions.is_ok());
            if let (Ok(Some(member)), Ok(contributions)) = (member, contributions) {
                let context = ReminderContext {
                    connection: &conn,
                    db_path,
                    notifier: &notifier,
                    now,
                };
                let manual =
                    send_manual_reminder(&context, &member, &contributions, None, &mut rng);
                assert!(matches!(manual, Ok(ref outcome) if outcome.priority == Some(Priority::EarlyReminder)));
            }

            let summary =
                run_reminder_check(&mut conn, db_path, &notifier, now, RunTrigger::Scheduled, &mut rng);
            assert_eq!(summary.sent, 1);

            let records = list_notifications(&conn, db_path, Some("M001"), Some("reminder"), 10);
            assert!(matches!(records, Ok(ref rows) if rows.len() == 2));
            if let Ok(rows) = records {
                let manual_rows = rows.iter().filter(|row| row.contribution_id.is_none()).count();
                assert_eq!(manual_rows, 1);
                assert!(rows.iter().all(|row| row.priority.as_deref() == Some("Early Reminder")));
            }
        }
    }
}
