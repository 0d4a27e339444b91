use std::collections::HashSet;

use chrono::Datelike;

use crate::intelligence::prediction::round_to;
use crate::intelligence::status::delay_days;
use crate::intelligence::types::{ContributionRecord, PaymentPatterns};

pub fn analyze_payment_patterns(contributions: &[ContributionRecord]) -> PaymentPatterns {
    if contributions.is_empty() {
        return empty_pattern("No data");
    }

    let mut payment_days: Vec<u32> = Vec::new();
    let mut delays: Vec<i64> = Vec::new();
    for contribution in contributions {
        if let Some(paid) = contribution.paid_date {
            payment_days.push(paid.day());
            delays.push(delay_days(contribution.due_date, paid));
        }
    }

    if payment_days.is_empty() {
        return empty_pattern("No payments yet");
    }

    let average_delay = delays.iter().sum::<i64>() as f64 / delays.len() as f64;
    let pattern = if average_delay <= 2.0 {
        "On-time payer"
    } else if average_delay <= 7.0 {
        "Early week delay"
    } else if average_delay <= 15.0 {
        "Mid-month delay"
    } else {
        "Extended delay"
    };

    let distinct_days = payment_days.iter().collect::<HashSet<_>>().len();
    PaymentPatterns {
        pattern: pattern.to_string(),
        preferred_day: modal_day(&payment_days),
        average_delay: Some(round_to(average_delay, 1)),
        consistency: Some(if distinct_days <= 3 { "High" } else { "Variable" }.to_string()),
    }
}

/// Most frequent value; ties go to the value seen first.
fn modal_day(days: &[u32]) -> Option<u32> {
    let mut best: Option<(u32, usize)> = None;
    for day in days {
        let count = days.iter().filter(|other| *other == day).count();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((*day, count)),
        }
    }
    best.map(|(day, _)| day)
}

fn empty_pattern(label: &str) -> PaymentPatterns {
    PaymentPatterns {
        pattern: label.to_string(),
        preferred_day: None,
        average_delay: None,
        consistency: None,
    }
}
