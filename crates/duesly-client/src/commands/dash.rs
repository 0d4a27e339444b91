use std::path::Path;

use chrono::NaiveDateTime;

use crate::ClientResult;
use crate::commands::common::{command_now, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{CurrentMonthStats, DashboardStatsData};
use crate::intelligence::classify::primary_classification;
use crate::intelligence::date::format_month_tag;
use crate::intelligence::prediction::round_to;
use crate::intelligence::query::load_contributions_by_member;
use crate::intelligence::types::{Classification, ContributionRecord};
use crate::ledger::members::list_members;

#[derive(Debug, Default)]
pub struct DashOptions<'a> {
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

/// Ledger-wide totals for administrators.
pub fn run(options: DashOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let month = format_month_tag(&command_now(options.now_override).date());
    let members = list_members(&connection, &setup.db_path, Some("member"))?;
    let by_member = load_contributions_by_member(&connection, &setup.db_path)?;

    let all: Vec<&ContributionRecord> = by_member.values().flatten().collect();
    let paid: Vec<&ContributionRecord> = all.iter().copied().filter(|c| c.is_paid()).collect();
    let total_collected: f64 = paid.iter().map(|c| c.amount).sum();
    let total_pending: f64 = all
        .iter()
        .filter(|c| !c.is_paid())
        .map(|c| c.amount)
        .sum();

    let this_month: Vec<&ContributionRecord> = all
        .iter()
        .copied()
        .filter(|c| format_month_tag(&c.due_date) == month)
        .collect();
    let month_paid: Vec<&ContributionRecord> =
        this_month.iter().copied().filter(|c| c.is_paid()).collect();

    let high_risk_members = members
        .iter()
        .filter(|member| {
            let contributions = by_member
                .get(&member.member_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            primary_classification(contributions) == Classification::HighRiskDelay
        })
        .count();

    success(
        "dash",
        DashboardStatsData {
            total_members: members.len(),
            total_contributions: all.len(),
            paid_contributions: paid.len(),
            unpaid_contributions: all.len() - paid.len(),
            total_collected: round_to(total_collected, 2),
            total_pending: round_to(total_pending, 2),
            current_month: CurrentMonthStats {
                month,
                total_contributions: this_month.len(),
                paid_contributions: month_paid.len(),
                collected_amount: round_to(month_paid.iter().map(|c| c.amount).sum(), 2),
            },
            high_risk_members,
        },
    )
}
