use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::intelligence::policy::REMINDER_POLICY;
use crate::intelligence::status::days_until_due;
use crate::intelligence::types::{ContributionRecord, Priority};

pub const DAILY_JOB_ID: &str = "daily_reminder_check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReminderDecision {
    Send { days_until_due: i64 },
    AlreadyPaid,
    PastDue { days_until_due: i64 },
    RecentlyReminded,
    NotLeadDay { days_until_due: i64, lead_days: i64 },
}

impl ReminderDecision {
    pub const fn should_send(self) -> bool {
        matches!(self, Self::Send { .. })
    }
}

/// Earliest `sent_at` that still suppresses a repeat reminder.
pub fn dedupe_window_start(now: NaiveDateTime) -> NaiveDateTime {
    now - Duration::days(REMINDER_POLICY.dedupe_window_days)
}

/// Eligibility of one contribution for today's reminder.
///
/// Only the exact lead day for the member's priority qualifies; a run that
/// misses the day does not catch up later.
pub fn should_send_reminder(
    contribution: &ContributionRecord,
    priority: Priority,
    today: NaiveDate,
    recently_reminded: bool,
) -> ReminderDecision {
    if contribution.is_paid() {
        return ReminderDecision::AlreadyPaid;
    }

    let days = days_until_due(contribution.due_date, today);
    if days < 0 {
        return ReminderDecision::PastDue {
            days_until_due: days,
        };
    }
    if recently_reminded {
        return ReminderDecision::RecentlyReminded;
    }

    let lead_days = REMINDER_POLICY.lead_days(priority);
    if days == lead_days {
        ReminderDecision::Send {
            days_until_due: days,
        }
    } else {
        ReminderDecision::NotLeadDay {
            days_until_due: days,
            lead_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ReminderDecision, dedupe_window_start, should_send_reminder};
    use crate::intelligence::status::test_support::{date, record};
    use crate::intelligence::types::Priority;

    #[test]
    fn high_risk_member_is_reminded_exactly_seven_days_out() {
        let today = date(2026, 3, 3);
        let due_in_seven = record(date(2026, 3, 10), None);
        assert_eq!(
            should_send_reminder(&due_in_seven, Priority::EarlyReminder, today, false),
            ReminderDecision::Send { days_until_due: 7 }
        );
        assert_eq!(
            should_send_reminder(&due_in_seven, Priority::EarlyReminder, today, true),
            ReminderDecision::RecentlyReminded
        );
        assert!(
            !should_send_reminder(&due_in_seven, Priority::Normal, today, false).should_send()
        );
    }

    #[test]
    fn regular_member_is_reminded_three_days_out() {
        let today = date(2026, 3, 7);
        let due = record(date(2026, 3, 10), None);
        assert!(should_send_reminder(&due, Priority::Normal, today, false).should_send());
        let day_after = date(2026, 3, 8);
        assert_eq!(
            should_send_reminder(&due, Priority::Normal, day_after, false),
            ReminderDecision::NotLeadDay {
                days_until_due: 2,
                lead_days: 3
            }
        );
    }

    #[test]
    fn past_due_and_paid_are_never_eligible() {
        let today = date(2026, 3, 15);
        let overdue = record(date(2026, 3, 10), None);
        assert_eq!(
            should_send_reminder(&overdue, Priority::EarlyReminder, today, false),
            ReminderDecision::PastDue { days_until_due: -5 }
        );
        let paid = record(date(2026, 3, 22), Some(0));
        assert_eq!(
            should_send_reminder(&paid, Priority::EarlyReminder, today, false),
            ReminderDecision::AlreadyPaid
        );
    }

    #[test]
    fn dedupe_window_spans_two_days() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 3).and_then(|day| day.and_hms_opt(9, 0, 0));
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1).and_then(|day| day.and_hms_opt(9, 0, 0));
        assert!(now.is_some());
        if let Some(now) = now {
            assert_eq!(Some(dedupe_window_start(now)), expected);
        }
    }
}
