//! Daily reminder service.
//!
//! Owned by whoever hosts the daemon. `start` spawns the periodic loop on the
//! current tokio runtime; `stop` cancels the wait and joins the loop, letting
//! an in-flight run finish first.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, NaiveDateTime, NaiveTime};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::intelligence::date::{format_timestamp, resolve_now};
use crate::notify::Notifier;
use crate::setup::SetupContext;
use crate::state::{open_connection, settings_path};
use crate::{ClientError, ClientResult};

use super::run::{ReminderRunSummary, RunStatus, RunTrigger, run_reminder_check};

/// Fallback wait when the next run time cannot be turned into a std duration.
const RETRY_WAIT: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub reminder_time: String,
    pub next_run: Option<String>,
    pub runs_completed: u64,
    pub last_run: Option<ReminderRunSummary>,
}

#[derive(Debug, Default)]
struct SharedState {
    next_run: Option<NaiveDateTime>,
    runs_completed: u64,
    last_run: Option<ReminderRunSummary>,
}

struct ReminderJob {
    db_path: PathBuf,
    notifier: Notifier,
}

impl ReminderJob {
    fn run_once(&self, trigger: RunTrigger) -> ReminderRunSummary {
        let now = resolve_now(None);
        let mut connection = match open_connection(&self.db_path) {
            Ok(connection) => connection,
            Err(open_error) => {
                error!(error = %open_error, "could not open the ledger for a reminder check");
                return ReminderRunSummary::failed(trigger, now, &open_error.message);
            }
        };
        let mut rng = StdRng::from_entropy();
        run_reminder_check(
            &mut connection,
            &self.db_path,
            &self.notifier,
            now,
            trigger,
            &mut rng,
        )
    }
}

pub struct ReminderScheduler {
    job: Arc<ReminderJob>,
    reminder_time: NaiveTime,
    shutdown: CancellationToken,
    state: Arc<Mutex<SharedState>>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(setup: &SetupContext, notifier: Notifier) -> ClientResult<Self> {
        let reminder_time = setup.settings.reminder_time().ok_or_else(|| {
            ClientError::settings_invalid(
                &settings_path(&setup.home),
                "`schedule.reminder_time` must use HH:MM (24-hour) format.",
            )
        })?;
        Ok(Self {
            job: Arc::new(ReminderJob {
                db_path: setup.db_path.clone(),
                notifier,
            }),
            reminder_time,
            shutdown: CancellationToken::new(),
            state: Arc::new(Mutex::new(SharedState::default())),
            handle: None,
        })
    }

    /// Spawns the loop. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("reminder scheduler already started");
            return;
        }
        if self.shutdown.is_cancelled() {
            self.shutdown = CancellationToken::new();
        }

        let job = Arc::clone(&self.job);
        let state = Arc::clone(&self.state);
        let shutdown = self.shutdown.clone();
        let reminder_time = self.reminder_time;
        self.handle = Some(tokio::spawn(async move {
            info!(reminder_time = %reminder_time.format("%H:%M"), "reminder scheduler started");
            periodic_loop(job, state, shutdown, reminder_time).await;
            info!("reminder scheduler stopped");
        }));
    }

    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(join_error) = handle.await
        {
            error!(error = %join_error, "reminder scheduler task ended abnormally");
        }
        lock_state(&self.state).next_run = None;
    }

    pub fn status(&self) -> SchedulerStatus {
        let running = self
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        let state = lock_state(&self.state);
        SchedulerStatus {
            running,
            reminder_time: self.reminder_time.format("%H:%M").to_string(),
            next_run: state.next_run.as_ref().map(format_timestamp),
            runs_completed: state.runs_completed,
            last_run: state.last_run.clone(),
        }
    }

    /// Runs one check right away on a blocking worker, outside the daily cadence.
    pub async fn run_now(&self) -> ClientResult<ReminderRunSummary> {
        let job = Arc::clone(&self.job);
        let joined = tokio::task::spawn_blocking(move || job.run_once(RunTrigger::Manual)).await;
        let summary = joined.map_err(|join_error| {
            ClientError::new(
                "internal_scheduler",
                &format!("Reminder run did not complete: {join_error}"),
                vec!["Retry the reminder run.".to_string()],
            )
        })?;
        record_summary(&self.state, &summary);
        Ok(summary)
    }
}

async fn periodic_loop(
    job: Arc<ReminderJob>,
    state: Arc<Mutex<SharedState>>,
    shutdown: CancellationToken,
    reminder_time: NaiveTime,
) {
    loop {
        let now = resolve_now(None);
        let next_run = next_run_after(now, reminder_time);
        let wait = (next_run - now).to_std().unwrap_or(RETRY_WAIT);
        lock_state(&state).next_run = Some(next_run);
        info!(
            next_run = %format_timestamp(&next_run),
            minutes = wait.as_secs() / 60,
            "next reminder check scheduled"
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.cancelled() => {
                info!("reminder scheduler received shutdown signal");
                return;
            }
        }

        let run_job = Arc::clone(&job);
        let joined =
            tokio::task::spawn_blocking(move || run_job.run_once(RunTrigger::Scheduled)).await;
        let summary = match joined {
            Ok(summary) => summary,
            Err(join_error) => {
                error!(error = %join_error, "reminder check worker panicked");
                ReminderRunSummary::failed(
                    RunTrigger::Scheduled,
                    resolve_now(None),
                    &join_error.to_string(),
                )
            }
        };
        if summary.status == RunStatus::Failed {
            error!(error = ?summary.error, "reminder check failed");
        } else if summary.errors > 0 {
            warn!(errors = summary.errors, "reminder check finished with errors");
        }
        record_summary(&state, &summary);
    }
}

fn record_summary(state: &Mutex<SharedState>, summary: &ReminderRunSummary) {
    let mut state = lock_state(state);
    state.runs_completed += 1;
    state.last_run = Some(summary.clone());
}

fn lock_state(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Next occurrence of `reminder_time` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, reminder_time: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(reminder_time);
    if now < today {
        today
    } else {
        today + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::next_run_after;

    #[test]
    fn next_run_rolls_to_tomorrow_once_the_time_has_passed() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0);
        let before = NaiveDate::from_ymd_opt(2026, 3, 3).and_then(|d| d.and_hms_opt(8, 59, 0));
        let exactly = NaiveDate::from_ymd_opt(2026, 3, 3).and_then(|d| d.and_hms_opt(9, 0, 0));
        let today_nine = NaiveDate::from_ymd_opt(2026, 3, 3).and_then(|d| d.and_hms_opt(9, 0, 0));
        let tomorrow_nine = NaiveDate::from_ymd_opt(2026, 3, 4).and_then(|d| d.and_hms_opt(9, 0, 0));
        assert!(nine.is_some() && before.is_some() && exactly.is_some());
        if let (Some(nine), Some(before), Some(exactly)) = (nine, before, exactly) {
            assert_eq!(Some(next_run_after(before, nine)), today_nine);
            assert_eq!(Some(next_run_after(exactly, nine)), tomorrow_nine);
        }
    }

    #[test]
    fn month_end_rolls_into_next_month() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0);
        let late = NaiveDate::from_ymd_opt(2026, 1, 31).and_then(|d| d.and_hms_opt(22, 0, 0));
        let expected = NaiveDate::from_ymd_opt(2026, 2, 1).and_then(|d| d.and_hms_opt(9, 0, 0));
        assert!(nine.is_some() && late.is_some());
        if let (Some(nine), Some(late)) = (nine, late) {
            assert_eq!(Some(next_run_after(late, nine)), expected);
        }
    }
}
