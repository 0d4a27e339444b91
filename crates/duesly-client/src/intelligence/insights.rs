use chrono::NaiveDate;

use crate::intelligence::patterns::analyze_payment_patterns;
use crate::intelligence::prediction::{predict_delay, round_to};
use crate::intelligence::risk::risk_score;
use crate::intelligence::types::{ContributionRecord, HealthStatus, MemberInsights};

pub fn health_status(risk: f64) -> HealthStatus {
    if risk < 30.0 {
        HealthStatus::Excellent
    } else if risk < 60.0 {
        HealthStatus::Good
    } else if risk < 80.0 {
        HealthStatus::NeedsAttention
    } else {
        HealthStatus::Critical
    }
}

pub fn recommendation(risk: f64) -> &'static str {
    match health_status(risk) {
        HealthStatus::Excellent => "No action needed. Continue standard reminders.",
        HealthStatus::Good => "Send reminder 3-5 days before due date.",
        HealthStatus::NeedsAttention => "Send early reminder (7 days before) and follow-up.",
        HealthStatus::Critical => "Proactive outreach recommended. Consider personal contact.",
    }
}

pub fn member_insights(contributions: &[ContributionRecord], today: NaiveDate) -> MemberInsights {
    let risk = risk_score(contributions);
    let paid_count = contributions
        .iter()
        .filter(|contribution| contribution.is_paid())
        .count();
    let success_rate = if contributions.is_empty() {
        0.0
    } else {
        round_to(paid_count as f64 / contributions.len() as f64 * 100.0, 1)
    };

    MemberInsights {
        risk_score: round_to(risk, 1),
        health_status: health_status(risk),
        prediction: predict_delay(contributions, today),
        payment_patterns: analyze_payment_patterns(contributions),
        recommendation: recommendation(risk).to_string(),
        total_contributions: contributions.len(),
        paid_count,
        success_rate,
    }
}
