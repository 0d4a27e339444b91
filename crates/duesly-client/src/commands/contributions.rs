use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use tracing::{error, info};

use crate::commands::common::{command_now, command_rng, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    ContributionStatusData, ContributionStatusRow, FailedPaymentRow, FailedPaymentsData,
    GenerateData, GenerationStatus, PayAllData, PaymentData,
};
use crate::import;
use crate::intelligence::classify::primary_classification;
use crate::intelligence::date::{
    due_date_in_month, format_iso_date, format_month_tag, format_timestamp, parse_iso_date_strict,
};
use crate::intelligence::messages::{
    generate_adaptive_reminder, generation_postscript, generation_subject,
};
use crate::intelligence::prediction::{predict_delay, round_to};
use crate::intelligence::query::{load_contributions_by_member, load_member_contributions};
use crate::intelligence::status::{current_delay, days_until_due, ledger_status};
use crate::intelligence::types::Recipient;
use crate::ledger::contributions::{
    NewContribution, contribution_owner, insert_contributions, month_exists, paid_date_text,
    pay_all_for_member, record_payment,
};
use crate::ledger::members::{MemberRow, list_members, require_member};
use crate::notify::templates::reminder_with_stats_html;
use crate::notify::{EmailTransport, Notifier};
use crate::reminders::build_notifier;
use crate::reminders::send::member_stats;
use crate::setup::SetupContext;
use crate::ClientResult;

/// Unpaid contributions this many days past due count as failed payments.
pub const FAILED_PAYMENT_DELAY_DAYS: i64 = 30;
pub const RECENT_FAILURES_LIMIT: usize = 10;

#[derive(Default)]
pub struct GenerateOptions<'a> {
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
    pub rng_seed: Option<u64>,
    pub transport_override: Option<Arc<dyn EmailTransport>>,
}

#[derive(Debug, Default)]
pub struct PaymentOptions<'a> {
    pub contribution_id: String,
    pub paid_date: Option<String>,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct PayAllOptions<'a> {
    pub member_id: String,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct ContributionViewOptions<'a> {
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct ContributionImportOptions<'a> {
    pub path: String,
    pub dry_run: bool,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
struct EmailTally {
    sent: usize,
    skipped: usize,
    errors: usize,
}

/// Creates this month's contribution for every member, then emails each
/// member their statistics. A month that already has rows is left alone.
pub fn generate(options: GenerateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "contribution generate";
    let setup = load_setup(options.home_override)?;
    let now = command_now(options.now_override);
    let today = now.date();
    let month = format_month_tag(&today);
    let due_date = due_date_in_month(today, setup.settings.contributions.generation_due_day);
    let due_text = format_iso_date(&due_date);

    let mut connection = setup.connect()?;
    if month_exists(&connection, &setup.db_path, &month)? {
        return success(
            command,
            generation_result(
                GenerationStatus::AlreadyExists,
                format!("Contributions for {month} already exist"),
                &month,
                &due_text,
                0,
                EmailTally::default(),
            ),
        );
    }

    let members = list_members(&connection, &setup.db_path, Some("member"))?;
    if members.is_empty() {
        return success(
            command,
            generation_result(
                GenerationStatus::NoMembers,
                "No members found to generate contributions for".to_string(),
                &month,
                &due_text,
                0,
                EmailTally::default(),
            ),
        );
    }

    let rows: Vec<NewContribution> = members
        .iter()
        .map(|member| NewContribution {
            member_id: member.member_id.clone(),
            due_date: due_text.clone(),
            amount: member.monthly_amount,
            paid_date: None,
            month_tag: Some(month.clone()),
        })
        .collect();
    let created = insert_contributions(
        &mut connection,
        &setup.db_path,
        &rows,
        &format_timestamp(&now),
    )?
    .len();
    info!(month = %month, created, "monthly contributions generated");

    let notifier = build_notifier(&setup, options.transport_override);
    let mut rng = command_rng(options.rng_seed);
    let notice = GenerationNotice {
        setup: &setup,
        connection: &connection,
        notifier: &notifier,
        now,
        month: &month,
        due_date,
    };
    let mut tally = EmailTally::default();
    for member in &members {
        match notice.send(member, &mut rng) {
            Ok(Some(true)) => tally.sent += 1,
            Ok(Some(false)) => tally.errors += 1,
            Ok(None) => tally.skipped += 1,
            Err(failure) => {
                error!(member_id = %member.member_id, error = %failure, "generation email failed");
                tally.errors += 1;
            }
        }
    }

    success(
        command,
        generation_result(
            GenerationStatus::Created,
            format!("Generated {created} contributions for {month}"),
            &month,
            &due_text,
            created,
            tally,
        ),
    )
}

struct GenerationNotice<'a> {
    setup: &'a SetupContext,
    connection: &'a rusqlite::Connection,
    notifier: &'a Notifier,
    now: NaiveDateTime,
    month: &'a str,
    due_date: NaiveDate,
}

impl GenerationNotice<'_> {
    /// `None` when the member has no usable email channel, otherwise whether
    /// delivery succeeded.
    fn send<R>(&self, member: &MemberRow, rng: &mut R) -> ClientResult<Option<bool>>
    where
        R: Rng + ?Sized,
    {
        let contributions =
            load_member_contributions(self.connection, &self.setup.db_path, &member.member_id)?;
        let today = self.now.date();
        let classification = primary_classification(&contributions);
        let prediction = predict_delay(&contributions, today);
        let recipient = Recipient {
            name: member.name.clone(),
            monthly_amount: member.monthly_amount,
        };
        let mut message = generate_adaptive_reminder(
            &recipient,
            classification,
            &prediction,
            days_until_due(self.due_date, today),
            rng,
        );
        message.push_str(generation_postscript(classification));

        let Some(email) = member
            .deliverable_email()
            .filter(|_| member.preferences.email)
        else {
            return Ok(None);
        };
        let html = reminder_with_stats_html(
            &member.name,
            &message,
            member.monthly_amount,
            &format_iso_date(&self.due_date),
            &member_stats(&contributions, classification),
        );
        let result = self.notifier.send_email(
            email,
            &generation_subject(self.month),
            &message,
            Some(html),
            self.now,
        );
        Ok(Some(result.is_sent()))
    }
}

fn generation_result(
    status: GenerationStatus,
    message: String,
    month: &str,
    due_date: &str,
    contributions_created: usize,
    tally: EmailTally,
) -> GenerateData {
    GenerateData {
        status,
        message,
        month: month.to_string(),
        due_date: due_date.to_string(),
        contributions_created,
        emails_sent: tally.sent,
        emails_skipped: tally.skipped,
        email_errors: tally.errors,
    }
}

/// Records a payment; the paid date defaults to today.
pub fn pay(options: PaymentOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "contribution pay";
    let paid_date = resolve_paid_date(options.paid_date.as_deref(), options.now_override, command)?;
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let contribution_id = options.contribution_id.trim();
    let member_id = contribution_owner(&connection, &setup.db_path, contribution_id)?;
    record_payment(&connection, &setup.db_path, contribution_id, &paid_date)?;
    info!(contribution_id, member_id = %member_id, paid_date = %paid_date, "payment recorded");

    success(
        command,
        PaymentData {
            message: "Payment recorded".to_string(),
            contribution_id: contribution_id.to_string(),
            member_id,
            paid_date,
        },
    )
}

pub fn pay_all(options: PayAllOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let paid_date = format_iso_date(&command_now(options.now_override).date());
    let contributions_paid =
        pay_all_for_member(&connection, &setup.db_path, &member.member_id, &paid_date)?;
    info!(member_id = %member.member_id, contributions_paid, "pending contributions paid");

    success(
        "contribution pay-all",
        PayAllData {
            message: "Successfully paid!".to_string(),
            member_id: member.member_id,
            paid_date,
            contributions_paid,
        },
    )
}

/// Every contribution with a known owner, grouped by member.
pub fn status(options: ContributionViewOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let today = command_now(options.now_override).date();
    let names = member_names(&connection, &setup)?;
    let by_member = load_contributions_by_member(&connection, &setup.db_path)?;

    let mut rows = Vec::new();
    for (member_id, contributions) in &by_member {
        let Some(member_name) = names.get(member_id) else {
            continue;
        };
        rows.extend(contributions.iter().map(|contribution| ContributionStatusRow {
            contribution_id: contribution.contribution_id.clone(),
            member_id: member_id.clone(),
            member_name: member_name.clone(),
            due_date: format_iso_date(&contribution.due_date),
            amount: contribution.amount,
            paid_date: paid_date_text(contribution),
            status: ledger_status(contribution, today),
            delay_days: current_delay(contribution, today),
        }));
    }

    success("contribution status", ContributionStatusData { rows })
}

pub fn failed(options: ContributionViewOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let today = command_now(options.now_override).date();
    let names = member_names(&connection, &setup)?;
    let by_member = load_contributions_by_member(&connection, &setup.db_path)?;

    let mut failures: Vec<FailedPaymentRow> = by_member
        .values()
        .flatten()
        .filter(|contribution| !contribution.is_paid())
        .filter_map(|contribution| {
            let delay_days = current_delay(contribution, today);
            (delay_days > FAILED_PAYMENT_DELAY_DAYS).then(|| FailedPaymentRow {
                member_id: contribution.member_id.clone(),
                member_name: names
                    .get(&contribution.member_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                amount: contribution.amount,
                due_date: format_iso_date(&contribution.due_date),
                delay_days,
            })
        })
        .collect();
    failures.sort_by(|left, right| {
        right
            .due_date
            .cmp(&left.due_date)
            .then_with(|| left.member_id.cmp(&right.member_id))
    });

    let total_amount: f64 = failures.iter().map(|row| row.amount).sum();
    let members_affected = failures
        .iter()
        .map(|row| row.member_id.as_str())
        .collect::<BTreeSet<&str>>()
        .len();
    let total_failed = failures.len();
    failures.truncate(RECENT_FAILURES_LIMIT);

    success(
        "contribution failed",
        FailedPaymentsData {
            total_failed,
            total_amount: round_to(total_amount, 2),
            members_affected,
            recent_failures: failures,
        },
    )
}

pub fn import_history(options: ContributionImportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let now = command_now(options.now_override);
    let data = import::execute(
        &setup,
        options.path.trim(),
        options.dry_run,
        &format_timestamp(&now),
    )?;
    success("contribution import", data)
}

fn resolve_paid_date(
    value: Option<&str>,
    now_override: Option<NaiveDateTime>,
    command: &str,
) -> ClientResult<String> {
    match value.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => {
            let date = parse_iso_date_strict(text, "paid_date", command)?;
            Ok(format_iso_date(&date))
        }
        None => Ok(format_iso_date(&command_now(now_override).date())),
    }
}

fn member_names(
    connection: &rusqlite::Connection,
    setup: &SetupContext,
) -> ClientResult<HashMap<String, String>> {
    Ok(list_members(connection, &setup.db_path, None)?
        .into_iter()
        .map(|member| (member.member_id, member.name))
        .collect())
}
