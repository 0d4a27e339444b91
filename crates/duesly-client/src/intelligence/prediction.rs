use chrono::NaiveDate;

use crate::intelligence::policy::PREDICTION_POLICY;
use crate::intelligence::types::{ContributionRecord, DelayPrediction};

/// Predicts whether the next contribution will be late.
///
/// `contributions` must be ordered oldest first; only the trailing window is
/// inspected for delays, while the full length feeds the data-quality term.
pub fn predict_delay(contributions: &[ContributionRecord], today: NaiveDate) -> DelayPrediction {
    let policy = PREDICTION_POLICY;
    if contributions.len() < policy.min_history {
        return DelayPrediction {
            will_delay: false,
            confidence: policy.insufficient_history_confidence,
            estimated_delay_days: 0,
            factors: vec!["Insufficient history".to_string()],
        };
    }

    let start = contributions.len().saturating_sub(policy.recent_window);
    let recent = &contributions[start..];

    let mut recent_delays: Vec<f64> = Vec::new();
    let mut paid_delays: Vec<f64> = Vec::new();
    for contribution in recent {
        match contribution.paid_date {
            Some(paid) => {
                let delay = (paid - contribution.due_date).num_days();
                if delay > 0 {
                    recent_delays.push(delay as f64);
                    paid_delays.push(delay as f64);
                }
            }
            None => {
                let ongoing = (today - contribution.due_date)
                    .num_days()
                    .max(policy.unpaid_delay_floor_days);
                recent_delays.push(ongoing as f64);
            }
        }
    }

    if recent_delays.is_empty() {
        return DelayPrediction {
            will_delay: false,
            confidence: policy.on_time_confidence,
            estimated_delay_days: 0,
            factors: vec!["Consistent on-time payments".to_string()],
        };
    }

    let mean_recent = mean(&recent_delays);
    let (will_delay, estimated_delay_days) = if paid_delays.is_empty() {
        let unpaid_in_recent = recent.iter().filter(|contribution| !contribution.is_paid()).count();
        (
            unpaid_in_recent >= policy.unpaid_recent_threshold,
            mean_recent.trunc() as i64,
        )
    } else {
        let mean_paid = mean(&paid_delays);
        (
            mean_paid > policy.late_paid_delay_days,
            mean_paid.trunc() as i64,
        )
    };

    let paid_ratio = paid_delays.len() as f64 / recent.len() as f64;
    let data_quality = (contributions.len() as f64 / policy.history_saturation).min(1.0);
    let consistency = if recent_delays.len() > 1 {
        (1.0 - sample_stdev(&recent_delays) / policy.stdev_normalizer_days).max(0.0)
    } else {
        policy.single_delay_consistency
    };

    let mut confidence = policy.clamp_confidence(
        paid_ratio * policy.paid_ratio_weight
            + data_quality * policy.data_quality_weight
            + consistency * policy.consistency_weight,
    );

    let mut factors: Vec<String> = Vec::new();
    if mean_recent > policy.consistently_late_days {
        factors.push("Consistently late payments".to_string());
    }
    if mean_recent > policy.extended_delay_days {
        factors.push("Extended delays observed".to_string());
    }
    if let (Some(first), Some(last)) = (recent_delays.first(), recent_delays.last())
        && recent_delays.len() >= 2
        && last > first
    {
        factors.push("Delays are increasing".to_string());
        confidence = (confidence + policy.trend_bonus).min(policy.max_confidence);
    }
    if factors.is_empty() {
        factors.push("Limited data".to_string());
    }

    DelayPrediction {
        will_delay,
        confidence: round_to(confidence, 2),
        estimated_delay_days,
        factors,
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_stdev(values: &[f64]) -> f64 {
    let average = mean(values);
    let squared: f64 = values.iter().map(|value| (value - average).powi(2)).sum();
    (squared / (values.len() as f64 - 1.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::predict_delay;
    use crate::intelligence::status::test_support::{date, monthly};

    #[test]
    fn short_history_is_insufficient() {
        let today = date(2026, 6, 1);
        let prediction = predict_delay(&monthly(&[None]), today);
        assert!(!prediction.will_delay);
        assert!((prediction.confidence - 0.3).abs() < 1e-9);
        assert_eq!(prediction.factors, vec!["Insufficient history".to_string()]);
    }

    #[test]
    fn on_time_recent_window_predicts_no_delay() {
        let today = date(2026, 12, 1);
        let prediction = predict_delay(&monthly(&[Some(40), Some(0), Some(-2), Some(0)]), today);
        assert!(!prediction.will_delay);
        assert!((prediction.confidence - 0.7).abs() < 1e-9);
        assert_eq!(prediction.estimated_delay_days, 0);
        assert_eq!(
            prediction.factors,
            vec!["Consistent on-time payments".to_string()]
        );
    }

    #[test]
    fn punctual_two_day_payer_is_not_predicted_late() {
        let today = date(2026, 12, 1);
        let prediction = predict_delay(&monthly(&[Some(2); 6]), today);
        assert!(!prediction.will_delay);
        assert_eq!(prediction.estimated_delay_days, 2);
        // 0.4 + 0.18 + 0.3, stdev is zero
        assert!((prediction.confidence - 0.88).abs() < 1e-9);
        assert_eq!(prediction.factors, vec!["Limited data".to_string()]);
    }

    #[test]
    fn late_paid_window_predicts_delay_with_increasing_trend() {
        let today = date(2026, 12, 1);
        let prediction = predict_delay(&monthly(&[Some(8), Some(10), Some(20)]), today);
        assert!(prediction.will_delay);
        assert_eq!(prediction.estimated_delay_days, 12);
        assert!(
            prediction
                .factors
                .contains(&"Delays are increasing".to_string())
        );
        assert!(prediction.confidence >= 0.3 && prediction.confidence <= 0.95);
    }

    #[test]
    fn unpaid_window_without_paid_delays_uses_unpaid_count() {
        let today = date(2026, 3, 12);
        let prediction = predict_delay(&monthly(&[Some(0), None, None]), today);
        assert!(prediction.will_delay);
        // Both unpaid items are floored at thirty days.
        assert_eq!(prediction.estimated_delay_days, 30);
        assert!(
            prediction
                .factors
                .contains(&"Consistently late payments".to_string())
        );
        assert!(
            !prediction
                .factors
                .contains(&"Extended delays observed".to_string())
        );
    }

    #[test]
    fn on_time_payments_do_not_count_as_unpaid() {
        let today = date(2026, 3, 12);
        let prediction = predict_delay(&monthly(&[Some(0), Some(0), None]), today);
        assert!(!prediction.will_delay);
        assert_eq!(prediction.estimated_delay_days, 30);
    }

    #[test]
    fn confidence_stays_within_bounds() {
        let today = date(2026, 12, 31);
        let scenarios = [
            monthly(&[None, None, None, None, Some(45), Some(45)]),
            monthly(&[Some(1), None, Some(90)]),
            monthly(&[Some(0), Some(0)]),
            monthly(&[None, Some(3), None, Some(60), None, None, None, None, None, None, None]),
        ];
        for history in scenarios {
            let prediction = predict_delay(&history, today);
            assert!(prediction.confidence >= 0.3);
            assert!(prediction.confidence <= 0.95);
        }
    }
}
