use chrono::NaiveDate;

use crate::intelligence::policy::{CLASSIFICATION_POLICY, TRAILING_WINDOW_POLICY};
use crate::intelligence::status::{delay_days, payment_status};
use crate::intelligence::types::{Classification, ContributionRecord, StatusBadge, TrailingStatus};

/// Unpaid contribution count and mean delay of the paid ones (0 when none are paid).
pub fn missed_and_average_delay(contributions: &[ContributionRecord]) -> (usize, f64) {
    let mut missed = 0usize;
    let mut delays: Vec<i64> = Vec::new();
    for contribution in contributions {
        match contribution.paid_date {
            Some(paid) => delays.push(delay_days(contribution.due_date, paid)),
            None => missed += 1,
        }
    }

    let average = if delays.is_empty() {
        0.0
    } else {
        delays.iter().sum::<i64>() as f64 / delays.len() as f64
    };
    (missed, average)
}

/// Primary policy. A member with nothing outstanding is Regular regardless of past lateness.
pub fn primary_classification(contributions: &[ContributionRecord]) -> Classification {
    let (missed, average_delay) = missed_and_average_delay(contributions);
    classify_counts(missed, average_delay)
}

pub fn classify_counts(missed: usize, average_delay: f64) -> Classification {
    if missed == 0 {
        Classification::Regular
    } else if missed <= CLASSIFICATION_POLICY.max_missed_for_occasional
        && average_delay <= CLASSIFICATION_POLICY.max_avg_delay_for_occasional
    {
        Classification::OccasionalDelay
    } else {
        Classification::HighRiskDelay
    }
}

/// Secondary policy over the trailing window of contributions, oldest first.
pub fn trailing_window_status(
    contributions: &[ContributionRecord],
    today: NaiveDate,
) -> TrailingStatus {
    if contributions.is_empty() {
        return TrailingStatus::New;
    }

    let start = contributions
        .len()
        .saturating_sub(TRAILING_WINDOW_POLICY.window);
    let recent = &contributions[start..];
    let late = recent
        .iter()
        .filter(|contribution| payment_status(contribution, today).counts_as_late())
        .count();

    let fraction = late as f64 / recent.len() as f64;
    if late == 0 {
        TrailingStatus::Regular
    } else if fraction < TRAILING_WINDOW_POLICY.high_risk_fraction {
        TrailingStatus::OccasionalDelay
    } else {
        TrailingStatus::HighRisk
    }
}

pub const fn status_badge(status: TrailingStatus) -> StatusBadge {
    match status {
        TrailingStatus::Regular => StatusBadge {
            color: "green",
            label: "Regular",
            description: "Consistent on-time payments within grace period",
        },
        TrailingStatus::OccasionalDelay => StatusBadge {
            color: "yellow",
            label: "Occasional Delay",
            description: "Some delayed payments, needs attention",
        },
        TrailingStatus::HighRisk => StatusBadge {
            color: "red",
            label: "High Risk",
            description: "Frequent delays, requires proactive outreach",
        },
        TrailingStatus::New => StatusBadge {
            color: "blue",
            label: "New Member",
            description: "Insufficient payment history",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{primary_classification, status_badge, trailing_window_status};
    use crate::intelligence::status::test_support::{date, monthly};
    use crate::intelligence::types::{Classification, TrailingStatus};

    #[test]
    fn nothing_outstanding_is_always_regular() {
        let history = monthly(&[Some(40), Some(60), Some(90)]);
        assert_eq!(primary_classification(&history), Classification::Regular);
        assert_eq!(primary_classification(&[]), Classification::Regular);
    }

    #[test]
    fn few_misses_with_mild_delay_is_occasional() {
        let history = monthly(&[Some(2), Some(10), None, Some(4)]);
        assert_eq!(
            primary_classification(&history),
            Classification::OccasionalDelay
        );
    }

    #[test]
    fn many_misses_or_long_delays_are_high_risk() {
        let many_missed = monthly(&[None, None, None, Some(1)]);
        assert_eq!(
            primary_classification(&many_missed),
            Classification::HighRiskDelay
        );
        let long_delays = monthly(&[Some(20), Some(25), None]);
        assert_eq!(
            primary_classification(&long_delays),
            Classification::HighRiskDelay
        );
    }

    #[test]
    fn trailing_window_only_sees_last_six() {
        let today = date(2026, 12, 31);
        // Two ancient delays fall outside the window.
        let history = monthly(&[
            Some(20),
            Some(20),
            Some(0),
            Some(1),
            Some(2),
            Some(0),
            Some(3),
            Some(5),
        ]);
        assert_eq!(trailing_window_status(&history, today), TrailingStatus::Regular);
        assert_eq!(trailing_window_status(&[], today), TrailingStatus::New);
    }

    #[test]
    fn trailing_fraction_boundaries() {
        let today = date(2026, 12, 31);
        let one_of_six = monthly(&[Some(0), Some(0), Some(9), Some(0), Some(0), Some(0)]);
        assert_eq!(
            trailing_window_status(&one_of_six, today),
            TrailingStatus::OccasionalDelay
        );
        let two_of_six = monthly(&[Some(0), None, Some(9), Some(0), Some(0), Some(0)]);
        assert_eq!(trailing_window_status(&two_of_six, today), TrailingStatus::HighRisk);
    }

    #[test]
    fn badge_labels_match_status() {
        assert_eq!(status_badge(TrailingStatus::HighRisk).color, "red");
        assert_eq!(status_badge(TrailingStatus::New).label, "New Member");
    }
}
