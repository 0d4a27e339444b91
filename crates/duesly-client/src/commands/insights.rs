use std::path::Path;

use chrono::NaiveDateTime;

use crate::ClientResult;
use crate::commands::common::{command_now, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{MemberInsightsData, PredictionRow, PredictionsData};
use crate::intelligence::insights::member_insights;
use crate::intelligence::policy::PREDICTION_POLICY;
use crate::intelligence::prediction::{predict_delay, round_to};
use crate::intelligence::query::{load_contributions_by_member, load_member_contributions};
use crate::intelligence::risk::risk_score;
use crate::ledger::members::{list_members, require_member};

/// Members above this risk are listed even when no delay is predicted.
pub const WATCHLIST_RISK_THRESHOLD: f64 = 50.0;

#[derive(Debug, Default)]
pub struct PredictionsOptions<'a> {
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct MemberInsightsOptions<'a> {
    pub member_id: String,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

/// Members likely to pay late, highest risk first.
pub fn predictions(options: PredictionsOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let today = command_now(options.now_override).date();
    let members = list_members(&connection, &setup.db_path, None)?;
    let by_member = load_contributions_by_member(&connection, &setup.db_path)?;

    let mut rows: Vec<PredictionRow> = Vec::new();
    for member in members {
        let Some(contributions) = by_member.get(&member.member_id) else {
            continue;
        };
        if contributions.len() < PREDICTION_POLICY.min_history {
            continue;
        }
        let prediction = predict_delay(contributions, today);
        let risk = risk_score(contributions);
        if !prediction.will_delay && risk <= WATCHLIST_RISK_THRESHOLD {
            continue;
        }
        rows.push(PredictionRow {
            member_id: member.member_id,
            member_name: member.name,
            risk_score: round_to(risk, 1),
            will_delay: prediction.will_delay,
            estimated_delay_days: prediction.estimated_delay_days,
            confidence: round_to(prediction.confidence, 2),
            factors: prediction.factors,
        });
    }
    rows.sort_by(|left, right| right.risk_score.total_cmp(&left.risk_score));

    success("insights predictions", PredictionsData { rows })
}

pub fn member(options: MemberInsightsOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let contributions = load_member_contributions(&connection, &setup.db_path, &member.member_id)?;
    let today = command_now(options.now_override).date();

    success(
        "insights member",
        MemberInsightsData {
            member_id: member.member_id,
            member_name: member.name,
            insights: member_insights(&contributions, today),
        },
    )
}
