use crate::intelligence::types::Priority;

/// Reminder-decisioning policy identifier, stored in `internal_meta`.
///
/// Bump together with a migration when any threshold below changes so that
/// past notification records stay attributable to the rules that sent them.
pub const REMINDER_POLICY_VERSION: &str = "v1";

/// Primary three-way classification thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationPolicy {
    pub max_missed_for_occasional: usize,
    pub max_avg_delay_for_occasional: f64,
}

/// Grace-period and ledger-status cutoffs, in days past due.
#[derive(Debug, Clone, Copy)]
pub struct GracePolicy {
    pub grace_days: i64,
    pub ledger_delayed_after_days: i64,
}

/// Trailing-window status badge policy.
#[derive(Debug, Clone, Copy)]
pub struct TrailingWindowPolicy {
    pub window: usize,
    pub high_risk_fraction: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RiskPolicy {
    pub neutral_score: f64,
    pub missed_weight: f64,
    pub delay_weight: f64,
    pub delay_normalizer_days: f64,
    pub max_score: f64,
}

impl RiskPolicy {
    pub fn delay_component(self, mean_positive_delay: f64) -> f64 {
        (mean_positive_delay / self.delay_normalizer_days * self.delay_weight).min(self.delay_weight)
    }
}

/// Delay-likelihood heuristic.
///
/// Notes:
/// - Unpaid items inside the recent window are assumed to be at least
///   `unpaid_delay_floor_days` late.
/// - Confidence is a weighted blend of paid ratio, history depth and delay
///   consistency, then clamped.
#[derive(Debug, Clone, Copy)]
pub struct PredictionPolicy {
    pub min_history: usize,
    pub recent_window: usize,
    pub unpaid_delay_floor_days: i64,
    pub late_paid_delay_days: f64,
    pub unpaid_recent_threshold: usize,
    pub paid_ratio_weight: f64,
    pub data_quality_weight: f64,
    pub history_saturation: f64,
    pub consistency_weight: f64,
    pub stdev_normalizer_days: f64,
    pub single_delay_consistency: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub trend_bonus: f64,
    pub insufficient_history_confidence: f64,
    pub on_time_confidence: f64,
    pub consistently_late_days: f64,
    pub extended_delay_days: f64,
}

impl PredictionPolicy {
    pub fn clamp_confidence(self, value: f64) -> f64 {
        value.clamp(self.min_confidence, self.max_confidence)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReminderPolicy {
    pub early_lead_days: i64,
    pub normal_lead_days: i64,
    pub dedupe_window_days: i64,
    pub urgent_within_days: i64,
}

impl ReminderPolicy {
    pub const fn lead_days(self, priority: Priority) -> i64 {
        match priority {
            Priority::EarlyReminder => self.early_lead_days,
            Priority::Normal => self.normal_lead_days,
        }
    }
}

pub const CLASSIFICATION_POLICY: ClassificationPolicy = ClassificationPolicy {
    max_missed_for_occasional: 2,
    max_avg_delay_for_occasional: 15.0,
};

pub const GRACE_POLICY: GracePolicy = GracePolicy {
    grace_days: 5,
    ledger_delayed_after_days: 30,
};

pub const TRAILING_WINDOW_POLICY: TrailingWindowPolicy = TrailingWindowPolicy {
    window: 6,
    high_risk_fraction: 0.33,
};

pub const RISK_POLICY: RiskPolicy = RiskPolicy {
    neutral_score: 50.0,
    missed_weight: 60.0,
    delay_weight: 40.0,
    delay_normalizer_days: 30.0,
    max_score: 100.0,
};

pub const PREDICTION_POLICY: PredictionPolicy = PredictionPolicy {
    min_history: 2,
    recent_window: 3,
    unpaid_delay_floor_days: 30,
    late_paid_delay_days: 7.0,
    unpaid_recent_threshold: 2,
    paid_ratio_weight: 0.4,
    data_quality_weight: 0.3,
    history_saturation: 10.0,
    consistency_weight: 0.3,
    stdev_normalizer_days: 30.0,
    single_delay_consistency: 0.5,
    min_confidence: 0.3,
    max_confidence: 0.95,
    trend_bonus: 0.1,
    insufficient_history_confidence: 0.3,
    on_time_confidence: 0.7,
    consistently_late_days: 15.0,
    extended_delay_days: 30.0,
};

pub const REMINDER_POLICY: ReminderPolicy = ReminderPolicy {
    early_lead_days: 7,
    normal_lead_days: 3,
    dedupe_window_days: 2,
    urgent_within_days: 3,
};

#[cfg(test)]
mod tests {
    use super::{PREDICTION_POLICY, REMINDER_POLICY, RISK_POLICY};
    use crate::intelligence::types::Priority;

    #[test]
    fn lead_time_follows_priority() {
        assert_eq!(REMINDER_POLICY.lead_days(Priority::EarlyReminder), 7);
        assert_eq!(REMINDER_POLICY.lead_days(Priority::Normal), 3);
    }

    #[test]
    fn risk_delay_component_is_capped() {
        assert!((RISK_POLICY.delay_component(15.0) - 20.0).abs() < 1e-9);
        assert!((RISK_POLICY.delay_component(300.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_clamp_bounds() {
        assert!((PREDICTION_POLICY.clamp_confidence(0.1) - 0.3).abs() < 1e-9);
        assert!((PREDICTION_POLICY.clamp_confidence(1.4) - 0.95).abs() < 1e-9);
        assert!((PREDICTION_POLICY.clamp_confidence(0.6) - 0.6).abs() < 1e-9);
    }
}
