//! Adaptive reminder copy.
//!
//! Tone depends only on classification, the delay prediction and urgency.
//! The concrete template inside a tone is picked with the caller's RNG so
//! tests can pin it.

use rand::Rng;
use serde::Serialize;

use crate::intelligence::policy::REMINDER_POLICY;
use crate::intelligence::types::{Classification, DelayPrediction, Priority, Recipient};

pub const EARLY_REMINDER_POSTSCRIPT: &str =
    "\n\n⚡ Early reminder: We're reaching out in advance to help you plan ahead.";
pub const GENERATION_HIGH_RISK_POSTSCRIPT: &str =
    "\n\n⚡ We're reaching out early to help you plan ahead for this month's contribution.";
pub const GENERATION_POSTSCRIPT: &str =
    "\n\n✨ This month's contribution has been generated. Thank you for your continued support!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStrategy {
    PositiveReinforcement,
    SocialProof,
    SupportUrgent,
    SupportCheckIn,
}

pub fn select_strategy(
    classification: Classification,
    will_delay: bool,
    days_until_due: i64,
) -> MessageStrategy {
    match classification {
        Classification::Regular if !will_delay => MessageStrategy::PositiveReinforcement,
        Classification::OccasionalDelay => MessageStrategy::SocialProof,
        _ if days_until_due <= REMINDER_POLICY.urgent_within_days => {
            MessageStrategy::SupportUrgent
        }
        _ => MessageStrategy::SupportCheckIn,
    }
}

pub fn generate_adaptive_reminder<R>(
    recipient: &Recipient,
    classification: Classification,
    prediction: &DelayPrediction,
    days_until_due: i64,
    rng: &mut R,
) -> String
where
    R: Rng + ?Sized,
{
    let strategy = select_strategy(classification, prediction.will_delay, days_until_due);
    let templates = render_templates(strategy, recipient, days_until_due);
    let index = rng.gen_range(0..templates.len());
    templates.into_iter().nth(index).unwrap_or_default()
}

/// Reminder body as sent by the daily run: adaptive copy plus the early-reminder note.
pub fn reminder_body<R>(
    recipient: &Recipient,
    classification: Classification,
    prediction: &DelayPrediction,
    days_until_due: i64,
    rng: &mut R,
) -> String
where
    R: Rng + ?Sized,
{
    let mut body =
        generate_adaptive_reminder(recipient, classification, prediction, days_until_due, rng);
    if classification.priority() == Priority::EarlyReminder {
        body.push_str(EARLY_REMINDER_POSTSCRIPT);
    }
    body
}

pub fn reminder_subject(priority: Priority) -> &'static str {
    match priority {
        Priority::EarlyReminder => "🔔 Early Payment Reminder",
        Priority::Normal => "Payment Reminder",
    }
}

pub fn generation_subject(month_tag: &str) -> String {
    format!("📅 {month_tag} Contribution Generated")
}

pub fn generation_postscript(classification: Classification) -> &'static str {
    match classification {
        Classification::HighRiskDelay => GENERATION_HIGH_RISK_POSTSCRIPT,
        Classification::Regular | Classification::OccasionalDelay => GENERATION_POSTSCRIPT,
    }
}

/// Whole rupee amounts print without decimals.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

fn render_templates(
    strategy: MessageStrategy,
    recipient: &Recipient,
    days_until_due: i64,
) -> Vec<String> {
    let name = &recipient.name;
    let amount = format_amount(recipient.monthly_amount);
    let days = days_until_due;
    match strategy {
        MessageStrategy::PositiveReinforcement => vec![
            format!(
                "Hi {name}, you've been an amazing supporter! 🌟 Thanks to your 5-month streak of timely contributions, \
                 we've been able to fund essential community projects. Your upcoming contribution of ₹{amount} due in {days} days \
                 helps keep this momentum going. Thank you for being a pillar of our community!"
            ),
            format!(
                "Hello {name}, your consistency is inspiring! 🌠 Your timely support helps us plan better for our community initiatives. \
                 We're looking forward to your contribution of ₹{amount} in {days} days. Thanks for leading by example!"
            ),
            format!(
                "Greetings {name}! Just a quick note to say we appreciate you. Your reliable contributions make a real difference. \
                 Your next payment of ₹{amount} is coming up in {days} days. Thank you for being someone we can count on!"
            ),
        ],
        MessageStrategy::SocialProof => vec![
            format!(
                "Hello {name}, did you know that 92% of our community members have contributed this month? \
                 Your support of ₹{amount} (due in {days} days) makes a huge difference in achieving our collective goals. \
                 Join your neighbors in making an impact today!"
            ),
            format!(
                "Hi {name}, our community is coming together to reach our monthly goal! We're almost there. \
                 Your contribution of ₹{amount} (due in {days} days) would overlap perfectly with others giving this week. \
                 Let's make a difference together."
            ),
            format!(
                "Dear {name}, most members find it easiest to contribute early in the week. \
                 Your upcoming payment of ₹{amount} is due in {days} days. \
                 Join the majority of our community in staying current and supporting our shared vision!"
            ),
        ],
        MessageStrategy::SupportUrgent => vec![
            format!(
                "Dear {name}, we understand that times can be tough. We value you as a member of our family, regardless of financial status. \
                 If you're able to contribute your ₹{amount} coming due in {days} days, it would be greatly appreciated. \
                 If you need more time or assistance, please just reply to this message. We are here to support you, not judge you."
            ),
            format!(
                "Hi {name}, sending you warm wishes. We know managing expenses can be stressful sometimes. \
                 Your contribution of ₹{amount} is coming due, but your well-being comes first. \
                 If you can make the payment, great! If not, let's chat about how we can support you."
            ),
        ],
        MessageStrategy::SupportCheckIn => vec![
            format!(
                "Hi {name}, we're checking in to see how you're doing. \
                 Your managed contribution is coming up in {days} days. \
                 Please know that your presence in our community matters more than money. \
                 Let us know if we can help facilitate your payment in a way that works for you."
            ),
            format!(
                "Hello {name}, just a gentle nudge about your upcoming contribution of ₹{amount}. \
                 We want to make sure you feel supported in our community. \
                 If there's anything we can do to make this easier for you, please reach out."
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{
        EARLY_REMINDER_POSTSCRIPT, MessageStrategy, format_amount, generate_adaptive_reminder,
        reminder_body, select_strategy,
    };
    use crate::intelligence::types::{Classification, DelayPrediction, Recipient};

    fn recipient() -> Recipient {
        Recipient {
            name: "Asha".to_string(),
            monthly_amount: 500.0,
        }
    }

    fn prediction(will_delay: bool) -> DelayPrediction {
        DelayPrediction {
            will_delay,
            confidence: 0.5,
            estimated_delay_days: 0,
            factors: vec!["Limited data".to_string()],
        }
    }

    #[test]
    fn strategy_depends_on_classification_prediction_and_urgency() {
        assert_eq!(
            select_strategy(Classification::Regular, false, 3),
            MessageStrategy::PositiveReinforcement
        );
        assert_eq!(
            select_strategy(Classification::Regular, true, 7),
            MessageStrategy::SupportCheckIn
        );
        assert_eq!(
            select_strategy(Classification::OccasionalDelay, true, 1),
            MessageStrategy::SocialProof
        );
        assert_eq!(
            select_strategy(Classification::HighRiskDelay, false, 3),
            MessageStrategy::SupportUrgent
        );
        assert_eq!(
            select_strategy(Classification::HighRiskDelay, false, 7),
            MessageStrategy::SupportCheckIn
        );
    }

    #[test]
    fn positive_reinforcement_interpolates_name_amount_and_days() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let message = generate_adaptive_reminder(
                &recipient(),
                Classification::Regular,
                &prediction(false),
                3,
                &mut rng,
            );
            assert!(message.contains("Asha"));
            assert!(message.contains("₹500"));
            assert!(message.contains("3 days"));
        }
    }

    #[test]
    fn social_proof_templates_mention_the_community() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let message = generate_adaptive_reminder(
                &recipient(),
                Classification::OccasionalDelay,
                &prediction(true),
                3,
                &mut rng,
            );
            assert!(message.contains("community"));
        }
    }

    #[test]
    fn same_seed_yields_same_message() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        let a = generate_adaptive_reminder(
            &recipient(),
            Classification::HighRiskDelay,
            &prediction(true),
            7,
            &mut first,
        );
        let b = generate_adaptive_reminder(
            &recipient(),
            Classification::HighRiskDelay,
            &prediction(true),
            7,
            &mut second,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn early_reminder_body_carries_postscript() {
        let mut rng = StdRng::seed_from_u64(7);
        let body = reminder_body(
            &recipient(),
            Classification::HighRiskDelay,
            &prediction(true),
            7,
            &mut rng,
        );
        assert!(body.ends_with(EARLY_REMINDER_POSTSCRIPT));

        let mut rng = StdRng::seed_from_u64(7);
        let regular = reminder_body(
            &recipient(),
            Classification::Regular,
            &prediction(false),
            3,
            &mut rng,
        );
        assert!(!regular.contains("Early reminder"));
    }

    #[test]
    fn amounts_render_without_trailing_zeros() {
        assert_eq!(format_amount(750.0), "750");
        assert_eq!(format_amount(499.5), "499.50");
    }
}
