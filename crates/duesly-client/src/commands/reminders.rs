use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::commands::common::{command_now, command_rng, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    ReminderHistoryData, ReminderHistoryStats, ReminderPolicyView, ReminderScheduleData,
};
use crate::intelligence::date::format_timestamp;
use crate::intelligence::policy::REMINDER_POLICY;
use crate::intelligence::query::load_member_contributions;
use crate::intelligence::types::Priority;
use crate::ledger::jobs::last_run;
use crate::ledger::members::require_member;
use crate::ledger::notifications::{REMINDER_TYPE, list_notifications};
use crate::notify::EmailTransport;
use crate::reminders::scheduler::next_run_after;
use crate::reminders::send::send_manual_reminder;
use crate::reminders::{
    DAILY_JOB_ID, ReminderContext, RunTrigger, build_notifier, run_reminder_check,
};
use crate::state::settings_path;
use crate::{ClientError, ClientResult};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Default)]
pub struct ReminderRunOptions<'a> {
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
    pub rng_seed: Option<u64>,
    pub transport_override: Option<Arc<dyn EmailTransport>>,
}

#[derive(Default)]
pub struct ReminderSendOptions<'a> {
    pub member_id: String,
    pub message: Option<String>,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
    pub rng_seed: Option<u64>,
    pub transport_override: Option<Arc<dyn EmailTransport>>,
}

#[derive(Debug, Default)]
pub struct ReminderHistoryOptions<'a> {
    pub limit: Option<usize>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct ReminderScheduleOptions<'a> {
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

/// Runs the daily reminder check immediately.
pub fn run(options: ReminderRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let mut connection = setup.connect()?;
    let notifier = build_notifier(&setup, options.transport_override);
    let now = command_now(options.now_override);
    let mut rng = command_rng(options.rng_seed);
    let summary = run_reminder_check(
        &mut connection,
        &setup.db_path,
        &notifier,
        now,
        RunTrigger::Manual,
        &mut rng,
    );
    success("reminder run", summary)
}

pub fn send(options: ReminderSendOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let contributions = load_member_contributions(&connection, &setup.db_path, &member.member_id)?;
    let notifier = build_notifier(&setup, options.transport_override);
    let mut rng = command_rng(options.rng_seed);
    let context = ReminderContext {
        connection: &connection,
        db_path: &setup.db_path,
        notifier: &notifier,
        now: command_now(options.now_override),
    };
    let outcome = send_manual_reminder(
        &context,
        &member,
        &contributions,
        options.message.as_deref(),
        &mut rng,
    )?;
    success("reminder send", outcome)
}

/// Recent reminder records with counts per priority.
pub fn history(options: ReminderHistoryOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let limit = options.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let reminders = list_notifications(
        &connection,
        &setup.db_path,
        None,
        Some(REMINDER_TYPE),
        limit,
    )?;
    let count_priority = |priority: Priority| {
        reminders
            .iter()
            .filter(|row| row.priority.as_deref() == Some(priority.as_str()))
            .count()
    };
    let statistics = ReminderHistoryStats {
        high_risk_reminders: count_priority(Priority::EarlyReminder),
        regular_reminders: count_priority(Priority::Normal),
    };

    success(
        "reminder history",
        ReminderHistoryData {
            total: reminders.len(),
            statistics,
            reminders,
        },
    )
}

pub fn schedule(options: ReminderScheduleOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let reminder_time = setup.settings.reminder_time().ok_or_else(|| {
        ClientError::settings_invalid(
            &settings_path(&setup.home),
            "`schedule.reminder_time` must use HH:MM (24-hour) format.",
        )
    })?;
    let connection = setup.connect()?;
    let now = command_now(options.now_override);
    let time_label = reminder_time.format("%H:%M").to_string();

    success(
        "reminder schedule",
        ReminderScheduleData {
            job_id: DAILY_JOB_ID.to_string(),
            schedule: format!("Daily at {time_label}"),
            reminder_time: time_label,
            next_run: format_timestamp(&next_run_after(now, reminder_time)),
            reminder_policy: ReminderPolicyView {
                high_risk: format!(
                    "{} days before due date",
                    REMINDER_POLICY.lead_days(Priority::EarlyReminder)
                ),
                regular: format!(
                    "{} days before due date",
                    REMINDER_POLICY.lead_days(Priority::Normal)
                ),
            },
            last_run: last_run(&connection, &setup.db_path, DAILY_JOB_ID)?,
        },
    )
}
