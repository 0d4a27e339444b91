use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::ClientResult;
use crate::intelligence::classify::primary_classification;
use crate::intelligence::date::{format_iso_date, format_timestamp};
use crate::intelligence::messages::{generate_adaptive_reminder, reminder_body, reminder_subject};
use crate::intelligence::prediction::predict_delay;
use crate::intelligence::status::days_until_due;
use crate::intelligence::types::{Classification, ContributionRecord, Priority, Recipient};
use crate::ledger::contributions::unpaid;
use crate::ledger::members::MemberRow;
use crate::ledger::notifications::{NewNotification, REMINDER_TYPE, insert_notification};
use crate::notify::templates::{MemberStats, reminder_html, reminder_with_stats_html};
use crate::notify::{ChannelResult, Notifier};

const MANUAL_SUBJECT: &str = "Contribution Reminder";
const NO_PENDING_DUES: &str = "No Pending Dues";

/// Borrowed collaborators for one reminder pass.
pub struct ReminderContext<'a> {
    pub connection: &'a Connection,
    pub db_path: &'a Path,
    pub notifier: &'a Notifier,
    pub now: NaiveDateTime,
}

impl ReminderContext<'_> {
    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Sent,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderOutcome {
    pub member_id: String,
    pub member_name: String,
    pub status: ReminderStatus,
    pub contribution_id: Option<String>,
    pub priority: Option<Priority>,
    pub days_until_due: Option<i64>,
    pub message: String,
    pub notification_id: Option<String>,
    pub channels: Vec<ChannelResult>,
}

impl ReminderOutcome {
    pub fn delivered_count(&self) -> usize {
        self.channels.iter().filter(|channel| channel.is_sent()).count()
    }
}

pub fn member_stats(
    contributions: &[ContributionRecord],
    classification: Classification,
) -> MemberStats {
    let paid_count = contributions.iter().filter(|c| c.is_paid()).count();
    MemberStats {
        total_contributions: contributions.len(),
        paid_count,
        missed_count: contributions.len() - paid_count,
        classification,
    }
}

/// Sends the scheduled reminder for one eligible contribution.
///
/// The notification record is written whether or not email delivery works;
/// a failed email only marks the record `failed`.
pub fn send_member_reminder<R>(
    context: &ReminderContext<'_>,
    member: &MemberRow,
    contributions: &[ContributionRecord],
    contribution: &ContributionRecord,
    priority: Priority,
    rng: &mut R,
) -> ClientResult<ReminderOutcome>
where
    R: Rng + ?Sized,
{
    let classification = primary_classification(contributions);
    let prediction = predict_delay(contributions, context.today());
    let days = days_until_due(contribution.due_date, context.today());
    let recipient = Recipient {
        name: member.name.clone(),
        monthly_amount: member.monthly_amount,
    };
    let message = reminder_body(&recipient, classification, &prediction, days, rng);

    let mut channels = Vec::new();
    if member.preferences.email
        && let Some(email) = member.deliverable_email()
    {
        let stats = member_stats(contributions, classification);
        let html = reminder_with_stats_html(
            &member.name,
            &message,
            member.monthly_amount,
            &format_iso_date(&contribution.due_date),
            &stats,
        );
        channels.push(context.notifier.send_email(
            email,
            reminder_subject(priority),
            &message,
            Some(html),
            context.now,
        ));
    }

    let record_status = if channels.iter().all(ChannelResult::is_sent) {
        "sent"
    } else {
        "failed"
    };
    let notification_id = insert_notification(
        context.connection,
        context.db_path,
        &NewNotification {
            member_id: &member.member_id,
            contribution_id: Some(&contribution.contribution_id),
            notification_type: REMINDER_TYPE,
            message: &message,
            priority: Some(priority.as_str()),
            days_before_due: Some(days),
            status: record_status,
        },
        &format_timestamp(&context.now),
    )?;

    info!(
        member_id = %member.member_id,
        contribution_id = %contribution.contribution_id,
        priority = priority.as_str(),
        days_until_due = days,
        "reminder sent"
    );

    Ok(ReminderOutcome {
        member_id: member.member_id.clone(),
        member_name: member.name.clone(),
        status: ReminderStatus::Sent,
        contribution_id: Some(contribution.contribution_id.clone()),
        priority: Some(priority),
        days_until_due: Some(days),
        message,
        notification_id: Some(notification_id),
        channels,
    })
}

/// Admin-initiated reminder to every channel the member has enabled.
///
/// Without unpaid dues a custom message is still delivered; with neither
/// there is nothing to say and an informational outcome is returned.
///
/// The record carries no contribution id, so a manual send never suppresses
/// the scheduled lead-day reminder for the same contribution.
pub fn send_manual_reminder<R>(
    context: &ReminderContext<'_>,
    member: &MemberRow,
    contributions: &[ContributionRecord],
    custom_message: Option<&str>,
    rng: &mut R,
) -> ClientResult<ReminderOutcome>
where
    R: Rng + ?Sized,
{
    let custom_message = custom_message
        .map(str::trim)
        .filter(|message| !message.is_empty());
    let next_due = unpaid(contributions).into_iter().next();
    let classification = primary_classification(contributions);

    let (message, days) = match (custom_message, next_due) {
        (Some(custom), due) => (
            custom.to_string(),
            due.map(|c| days_until_due(c.due_date, context.today())),
        ),
        (None, Some(due)) => {
            let prediction = predict_delay(contributions, context.today());
            let days = days_until_due(due.due_date, context.today());
            let recipient = Recipient {
                name: member.name.clone(),
                monthly_amount: member.monthly_amount,
            };
            let message =
                generate_adaptive_reminder(&recipient, classification, &prediction, days, rng);
            (message, Some(days))
        }
        (None, None) => {
            return Ok(ReminderOutcome {
                member_id: member.member_id.clone(),
                member_name: member.name.clone(),
                status: ReminderStatus::Info,
                contribution_id: None,
                priority: None,
                days_until_due: None,
                message: "No unpaid contributions".to_string(),
                notification_id: None,
                channels: Vec::new(),
            });
        }
    };

    let priority = classification.priority();
    let due_text = next_due
        .map(|c| format_iso_date(&c.due_date))
        .unwrap_or_else(|| NO_PENDING_DUES.to_string());

    let mut channels = Vec::new();
    let preferences = member.preferences;
    if preferences.email
        && let Some(email) = member.deliverable_email()
    {
        let html = reminder_html(&member.name, &message, member.monthly_amount, &due_text);
        channels.push(context.notifier.send_email(
            email,
            MANUAL_SUBJECT,
            &message,
            Some(html),
            context.now,
        ));
    }
    if preferences.sms {
        channels.push(context.notifier.send_sms(&member.phone, &message, context.now));
    }
    if preferences.whatsapp {
        channels.push(context.notifier.send_whatsapp(&member.phone, &message, context.now));
    }

    let record_status = if channels.iter().all(ChannelResult::is_sent) {
        "sent"
    } else {
        warn!(member_id = %member.member_id, "manual reminder had failed channels");
        "failed"
    };
    let notification_id = insert_notification(
        context.connection,
        context.db_path,
        &NewNotification {
            member_id: &member.member_id,
            contribution_id: None,
            notification_type: REMINDER_TYPE,
            message: &message,
            priority: Some(priority.as_str()),
            days_before_due: days,
            status: record_status,
        },
        &format_timestamp(&context.now),
    )?;

    info!(
        member_id = %member.member_id,
        channels = channels.len(),
        "manual reminder sent"
    );

    Ok(ReminderOutcome {
        member_id: member.member_id.clone(),
        member_name: member.name.clone(),
        status: ReminderStatus::Sent,
        contribution_id: next_due.map(|c| c.contribution_id.clone()),
        priority: Some(priority),
        days_until_due: days,
        message,
        notification_id: Some(notification_id),
        channels,
    })
}
