use crate::intelligence::policy::RISK_POLICY;
use crate::intelligence::types::ContributionRecord;

/// Non-payment risk in `[0, 100]`. Members with no history score neutral.
pub fn risk_score(contributions: &[ContributionRecord]) -> f64 {
    if contributions.is_empty() {
        return RISK_POLICY.neutral_score;
    }

    let total = contributions.len() as f64;
    let missed = contributions
        .iter()
        .filter(|contribution| !contribution.is_paid())
        .count() as f64;

    let mut score = missed / total * RISK_POLICY.missed_weight;

    let positive_delays: Vec<i64> = contributions
        .iter()
        .filter_map(|contribution| {
            contribution
                .paid_date
                .map(|paid| (paid - contribution.due_date).num_days())
        })
        .filter(|delay| *delay > 0)
        .collect();
    if !positive_delays.is_empty() {
        let mean = positive_delays.iter().sum::<i64>() as f64 / positive_delays.len() as f64;
        score += RISK_POLICY.delay_component(mean);
    }

    score.min(RISK_POLICY.max_score)
}

#[cfg(test)]
mod tests {
    use super::risk_score;
    use crate::intelligence::status::test_support::monthly;

    #[test]
    fn empty_history_is_neutral() {
        assert!((risk_score(&[]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn punctual_member_scores_low() {
        let history = monthly(&[Some(2); 6]);
        let score = risk_score(&history);
        assert!(score < 10.0);
        assert!((score - 2.0 / 30.0 * 40.0).abs() < 1e-9);
    }

    #[test]
    fn chronic_non_payer_scores_high() {
        let history = monthly(&[None, None, Some(45), None, Some(45), None]);
        let score = risk_score(&history);
        assert!(score > 60.0);
        assert!((score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn early_payments_do_not_count_as_delay() {
        let history = monthly(&[Some(-3), Some(0)]);
        assert!(risk_score(&history).abs() < 1e-9);
    }

    #[test]
    fn score_grows_with_missed_ratio_and_delay() {
        let fewer_missed = risk_score(&monthly(&[Some(5), Some(5), None, Some(5)]));
        let more_missed = risk_score(&monthly(&[Some(5), None, None, Some(5)]));
        assert!(more_missed > fewer_missed);

        let short_delay = risk_score(&monthly(&[Some(3), Some(3), None]));
        let long_delay = risk_score(&monthly(&[Some(20), Some(20), None]));
        assert!(long_delay > short_delay);
        assert!(long_delay <= 100.0);
    }
}
