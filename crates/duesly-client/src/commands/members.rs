use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::commands::common::{command_now, command_rng, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    ContributionHistoryData, ContributionHistoryRow, DueState, LoginData, MemberDashboardData,
    MemberInfo, MemberListData, MemberRegisterData, MemberStatistics, MemberSummary,
    NotificationListData, PasswordChangeData, PaymentSettingsData, PreferencesData,
    TrailingStatusView, UpcomingDue,
};
use crate::credentials::{check_new_password, hash_password, verify_password};
use crate::intelligence::classify::{
    missed_and_average_delay, primary_classification, status_badge, trailing_window_status,
};
use crate::intelligence::date::{format_iso_date, format_timestamp};
use crate::intelligence::prediction::round_to;
use crate::intelligence::query::{load_contributions_by_member, load_member_contributions};
use crate::intelligence::status::{current_delay, days_until_due, ledger_status, payment_status};
use crate::intelligence::types::ContributionRecord;
use crate::ledger::contributions::{paid_date_text, unpaid};
use crate::ledger::members::{
    MemberRow, NewMember, find_by_employee_id, find_credentials_by_email, generate_employee_id,
    insert_member, list_members, next_member_id, password_hash, require_member,
    update_password, update_payment_settings, update_preferences, validate_email, validate_phone,
};
use crate::ledger::notifications::list_notifications;
use crate::{ClientError, ClientResult};

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 20;

#[derive(Debug, Default)]
pub struct MemberRegisterOptions<'a> {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub monthly_amount: Option<f64>,
    pub due_day: Option<u32>,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Default)]
pub struct MemberSignupOptions<'a> {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Default)]
pub struct MemberListOptions<'a> {
    pub include_admins: bool,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct MemberSearchOptions<'a> {
    pub employee_id: String,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct PaymentSettingsOptions<'a> {
    pub member_id: String,
    pub monthly_amount: Option<f64>,
    pub due_day: Option<u32>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct PreferencesOptions<'a> {
    pub member_id: String,
    pub email: Option<bool>,
    pub sms: Option<bool>,
    pub whatsapp: Option<bool>,
    pub reminder_days_before: Option<i64>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct PasswordChangeOptions<'a> {
    pub member_id: String,
    pub current_password: String,
    pub new_password: String,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct LoginOptions<'a> {
    pub email: String,
    pub password: String,
    pub home_override: Option<&'a Path>,
}

/// Options shared by the per-member read commands.
#[derive(Debug, Default)]
pub struct MemberViewOptions<'a> {
    pub member_id: String,
    pub limit: Option<usize>,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

/// Admin registration: generated ids and the default credential, which the
/// member must rotate on first login.
pub fn register(options: MemberRegisterOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "member register";
    let setup = load_setup(options.home_override)?;
    let name = require_text(&options.name, "name", command)?;
    check_phone(&options.phone, command)?;
    let email = optional_email(options.email.as_deref(), command)?;
    let monthly_amount = options
        .monthly_amount
        .filter(|amount| *amount > 0.0)
        .unwrap_or(setup.settings.contributions.default_monthly_amount);
    check_amount(monthly_amount, command)?;
    let due_day = options
        .due_day
        .unwrap_or(setup.settings.contributions.default_due_day);
    check_due_day(due_day, command)?;

    let default_password = setup.settings.members.default_password.clone();
    let hash = hash_password(&default_password)?;
    let now = command_now(options.now_override);
    let mut rng = command_rng(options.rng_seed);

    let connection = setup.connect()?;
    let member_id = next_member_id(&connection, &setup.db_path)?;
    let employee_id = generate_employee_id(&connection, &setup.db_path, now.date(), &mut rng)?;
    let member = insert_member(
        &connection,
        &setup.db_path,
        &member_id,
        &employee_id,
        &NewMember {
            name,
            phone: options.phone.trim(),
            email,
            monthly_amount,
            due_day,
            role: "member",
            password_hash: &hash,
            must_change_password: true,
        },
        &format_timestamp(&now),
    )?;

    success(
        command,
        MemberRegisterData {
            message: format!("Member registered with default password '{default_password}'"),
            member,
            default_password: Some(default_password),
        },
    )
}

/// Self-service signup with the member's own password. Payment terms come
/// from the configured defaults until an admin or an approved ticket changes them.
pub fn signup(options: MemberSignupOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "member signup";
    let setup = load_setup(options.home_override)?;
    let name = require_text(&options.name, "name", command)?;
    check_phone(&options.phone, command)?;
    let email = optional_email(Some(&options.email), command)?.ok_or_else(|| {
        ClientError::invalid_argument_for_command("An email address is required.", Some(command))
    })?;
    check_new_password(&options.password, command)?;
    let hash = hash_password(&options.password)?;
    let now = command_now(options.now_override);
    let mut rng = command_rng(options.rng_seed);

    let connection = setup.connect()?;
    let member_id = next_member_id(&connection, &setup.db_path)?;
    let employee_id = generate_employee_id(&connection, &setup.db_path, now.date(), &mut rng)?;
    let member = insert_member(
        &connection,
        &setup.db_path,
        &member_id,
        &employee_id,
        &NewMember {
            name,
            phone: options.phone.trim(),
            email: Some(email),
            monthly_amount: setup.settings.contributions.default_monthly_amount,
            due_day: setup.settings.contributions.default_due_day,
            role: "member",
            password_hash: &hash,
            must_change_password: false,
        },
        &format_timestamp(&now),
    )?;

    success(
        command,
        MemberRegisterData {
            message: "Signup complete".to_string(),
            member,
            default_password: None,
        },
    )
}

pub fn list(options: MemberListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let today = command_now(options.now_override).date();
    let role = if options.include_admins {
        None
    } else {
        Some("member")
    };
    let members = list_members(&connection, &setup.db_path, role)?;
    let by_member = load_contributions_by_member(&connection, &setup.db_path)?;

    let summaries: Vec<MemberSummary> = members
        .into_iter()
        .map(|member| {
            let contributions = by_member
                .get(&member.member_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            summarize_member(member, contributions, today)
        })
        .collect();

    success(
        "member list",
        MemberListData {
            total: summaries.len(),
            members: summaries,
        },
    )
}

pub fn search(options: MemberSearchOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let employee_id = options.employee_id.trim();
    let member = find_by_employee_id(&connection, &setup.db_path, employee_id)?
        .ok_or_else(|| ClientError::employee_not_found(employee_id))?;
    let contributions = load_member_contributions(&connection, &setup.db_path, &member.member_id)?;
    let today = command_now(options.now_override).date();
    success(
        "member search",
        summarize_member(member, &contributions, today),
    )
}

pub fn payment_settings(options: PaymentSettingsOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "member settings";
    if options.monthly_amount.is_none() && options.due_day.is_none() {
        return Err(ClientError::invalid_argument_with_recovery(
            "Nothing to update.",
            vec!["Pass --monthly-amount and/or --due-day.".to_string()],
        ));
    }
    if let Some(amount) = options.monthly_amount {
        check_amount(amount, command)?;
    }
    if let Some(day) = options.due_day {
        check_due_day(day, command)?;
    }

    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = update_payment_settings(
        &connection,
        &setup.db_path,
        options.member_id.trim(),
        options.monthly_amount,
        options.due_day,
    )?;
    success(
        command,
        PaymentSettingsData {
            message: "Payment settings updated".to_string(),
            member_id: member.member_id,
            monthly_amount: member.monthly_amount,
            due_day: member.due_day,
        },
    )
}

/// Partial update: flags left unset keep their stored value.
pub fn preferences(options: PreferencesOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "member preferences";
    if let Some(days) = options.reminder_days_before
        && !(0..=31).contains(&days)
    {
        return Err(ClientError::invalid_argument_for_command(
            "Reminder lead days must be between 0 and 31.",
            Some(command),
        ));
    }

    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member_id = options.member_id.trim();
    let mut updated = require_member(&connection, &setup.db_path, member_id)?.preferences;
    if let Some(email) = options.email {
        updated.email = email;
    }
    if let Some(sms) = options.sms {
        updated.sms = sms;
    }
    if let Some(whatsapp) = options.whatsapp {
        updated.whatsapp = whatsapp;
    }
    if let Some(days) = options.reminder_days_before {
        updated.reminder_days_before = days;
    }

    let member = update_preferences(&connection, &setup.db_path, member_id, &updated)?;
    success(
        command,
        PreferencesData {
            member_id: member.member_id,
            preferences: member.preferences,
        },
    )
}

pub fn change_password(options: PasswordChangeOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "member password";
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member_id = options.member_id.trim();

    let stored = password_hash(&connection, &setup.db_path, member_id)?;
    if !verify_password(&options.current_password, &stored) {
        return Err(ClientError::invalid_argument_for_command(
            "Current password is incorrect.",
            Some(command),
        ));
    }
    check_new_password(&options.new_password, command)?;
    let hash = hash_password(&options.new_password)?;
    update_password(&connection, &setup.db_path, member_id, &hash)?;

    success(
        command,
        PasswordChangeData {
            message: "Password changed successfully".to_string(),
            member_id: member_id.to_string(),
        },
    )
}

/// Credential check only; no session is issued.
pub fn login(options: LoginOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let Some((member, stored)) =
        find_credentials_by_email(&connection, &setup.db_path, options.email.trim())?
    else {
        return Err(ClientError::invalid_credentials());
    };
    if !verify_password(&options.password, &stored) {
        return Err(ClientError::invalid_credentials());
    }

    success(
        "member login",
        LoginData {
            member_id: member.member_id,
            employee_id: member.employee_id,
            name: member.name,
            role: member.role,
            must_change_password: member.must_change_password,
        },
    )
}

pub fn dashboard(options: MemberViewOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let contributions = load_member_contributions(&connection, &setup.db_path, &member.member_id)?;
    let today = command_now(options.now_override).date();

    let (missed_count, avg_delay) = missed_and_average_delay(&contributions);
    let outstanding = unpaid(&contributions);
    let upcoming_dues = outstanding
        .iter()
        .map(|contribution| {
            let days_until = days_until_due(contribution.due_date, today);
            UpcomingDue {
                contribution_id: contribution.contribution_id.clone(),
                due_date: format_iso_date(&contribution.due_date),
                amount: contribution.amount,
                days_until,
                status: if days_until < 0 {
                    DueState::Overdue
                } else {
                    DueState::Upcoming
                },
            }
        })
        .collect();
    let total_pending: f64 = outstanding.iter().map(|contribution| contribution.amount).sum();

    success(
        "member dashboard",
        MemberDashboardData {
            member_info: MemberInfo {
                member_id: member.member_id,
                name: member.name,
                monthly_amount: member.monthly_amount,
            },
            statistics: MemberStatistics {
                total_contributions: contributions.len(),
                paid_count: contributions.len() - missed_count,
                missed_count,
                avg_delay_days: round_to(avg_delay, 1),
                classification: primary_classification(&contributions),
            },
            upcoming_dues,
            total_pending: round_to(total_pending, 2),
        },
    )
}

pub fn history(options: MemberViewOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let contributions = load_member_contributions(&connection, &setup.db_path, &member.member_id)?;
    let today = command_now(options.now_override).date();

    let rows = contributions
        .iter()
        .map(|contribution| ContributionHistoryRow {
            contribution_id: contribution.contribution_id.clone(),
            due_date: format_iso_date(&contribution.due_date),
            paid_date: paid_date_text(contribution),
            amount: contribution.amount,
            month_tag: contribution.month_tag.clone(),
            status: ledger_status(contribution, today),
            payment_status: payment_status(contribution, today),
            delay_days: current_delay(contribution, today),
        })
        .collect();

    success(
        "member history",
        ContributionHistoryData {
            member_id: member.member_id,
            rows,
        },
    )
}

pub fn notifications(options: MemberViewOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let limit = options.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    let rows = list_notifications(
        &connection,
        &setup.db_path,
        Some(&member.member_id),
        None,
        limit,
    )?;
    success(
        "member notifications",
        NotificationListData {
            member_id: member.member_id,
            rows,
        },
    )
}

pub(crate) fn summarize_member(
    member: MemberRow,
    contributions: &[ContributionRecord],
    today: NaiveDate,
) -> MemberSummary {
    let (missed_count, avg_delay) = missed_and_average_delay(contributions);
    let current_delay_days = unpaid(contributions)
        .into_iter()
        .map(|contribution| current_delay(contribution, today))
        .max()
        .unwrap_or(0);
    let classification = primary_classification(contributions);
    let trailing = trailing_window_status(contributions, today);

    MemberSummary {
        member_id: member.member_id,
        employee_id: member.employee_id,
        name: member.name,
        phone: member.phone,
        email: member.email,
        role: member.role,
        monthly_amount: member.monthly_amount,
        due_day: member.due_day,
        total_contributions: contributions.len(),
        paid_count: contributions.len() - missed_count,
        missed_count,
        avg_delay_days: round_to(avg_delay, 1),
        current_delay_days,
        classification,
        priority: classification.priority(),
        trailing_status: TrailingStatusView {
            status: trailing,
            badge: status_badge(trailing),
        },
    }
}

fn require_text<'a>(value: &'a str, field: &str, command: &str) -> ClientResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field}` must not be empty."),
            Some(command),
        ));
    }
    Ok(trimmed)
}

fn check_phone(phone: &str, command: &str) -> ClientResult<()> {
    if !validate_phone(phone) {
        return Err(ClientError::invalid_argument_for_command(
            "Invalid phone number. Must be 10 digits.",
            Some(command),
        ));
    }
    Ok(())
}

fn optional_email<'a>(email: Option<&'a str>, command: &str) -> ClientResult<Option<&'a str>> {
    let Some(email) = email.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if !validate_email(email) {
        return Err(ClientError::invalid_argument_for_command(
            "Invalid email format.",
            Some(command),
        ));
    }
    Ok(Some(email))
}

fn check_amount(amount: f64, command: &str) -> ClientResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ClientError::invalid_argument_for_command(
            "Monthly amount must be zero or more.",
            Some(command),
        ));
    }
    Ok(())
}

fn check_due_day(day: u32, command: &str) -> ClientResult<()> {
    if !(1..=31).contains(&day) {
        return Err(ClientError::invalid_argument_for_command(
            "Due day must be between 1 and 31.",
            Some(command),
        ));
    }
    Ok(())
}
