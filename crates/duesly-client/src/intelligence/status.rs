//! Payment status calculator: delay arithmetic and the two status vocabularies.

use chrono::NaiveDate;

use crate::intelligence::policy::GRACE_POLICY;
use crate::intelligence::types::{ContributionRecord, LedgerStatus, PaymentStatus};

/// Days late, never negative. `compare` is the paid date, or the evaluation date when unpaid.
pub fn delay_days(due: NaiveDate, compare: NaiveDate) -> i64 {
    (compare - due).num_days().max(0)
}

/// Current delay of a contribution as of `today`.
pub fn current_delay(contribution: &ContributionRecord, today: NaiveDate) -> i64 {
    delay_days(contribution.due_date, contribution.paid_date.unwrap_or(today))
}

/// Calendar days from `today` until `due`; negative once the due date has passed.
pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

pub fn payment_status(contribution: &ContributionRecord, today: NaiveDate) -> PaymentStatus {
    payment_status_with_grace(contribution, today, GRACE_POLICY.grace_days)
}

pub fn payment_status_with_grace(
    contribution: &ContributionRecord,
    today: NaiveDate,
    grace_days: i64,
) -> PaymentStatus {
    match contribution.paid_date {
        None => {
            let days_since_due = (today - contribution.due_date).num_days();
            if days_since_due > grace_days {
                PaymentStatus::Overdue
            } else if days_since_due >= 0 {
                PaymentStatus::Pending
            } else {
                PaymentStatus::Future
            }
        }
        Some(paid) => {
            if (paid - contribution.due_date).num_days() <= grace_days {
                PaymentStatus::Regular
            } else {
                PaymentStatus::Delayed
            }
        }
    }
}

pub fn ledger_status(contribution: &ContributionRecord, today: NaiveDate) -> LedgerStatus {
    if contribution.is_paid() {
        return LedgerStatus::Paid;
    }
    let delay = current_delay(contribution, today);
    if delay > GRACE_POLICY.ledger_delayed_after_days {
        LedgerStatus::Delayed
    } else if delay > 0 {
        LedgerStatus::Unpaid
    } else {
        LedgerStatus::Pending
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};

    use crate::intelligence::types::ContributionRecord;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    pub fn record(due: NaiveDate, paid_offset: Option<i64>) -> ContributionRecord {
        ContributionRecord {
            contribution_id: format!("ctb_{}", due.format("%Y%m%d")),
            member_id: "M001".to_string(),
            due_date: due,
            amount: 500.0,
            paid_date: paid_offset.map(|offset| due + Duration::days(offset)),
            month_tag: Some(due.format("%Y-%m").to_string()),
        }
    }

    /// `n` monthly contributions due on the 10th, starting January 2026.
    pub fn monthly(offsets: &[Option<i64>]) -> Vec<ContributionRecord> {
        offsets
            .iter()
            .enumerate()
            .map(|(index, offset)| {
                let month = u32::try_from(index % 12).unwrap_or(0) + 1;
                record(date(2026, month, 10), *offset)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{date, record};
    use super::{days_until_due, delay_days, ledger_status, payment_status};
    use crate::intelligence::types::{LedgerStatus, PaymentStatus};

    #[test]
    fn delay_is_never_negative() {
        let due = date(2026, 3, 10);
        assert_eq!(delay_days(due, due), 0);
        assert_eq!(delay_days(due, date(2026, 3, 1)), 0);
        assert_eq!(delay_days(due, date(2026, 3, 14)), 4);
    }

    #[test]
    fn days_until_due_is_a_calendar_difference() {
        let today = date(2026, 3, 3);
        assert_eq!(days_until_due(date(2026, 3, 10), today), 7);
        assert_eq!(days_until_due(today, today), 0);
        assert_eq!(days_until_due(date(2026, 2, 26), today), -5);
    }

    #[test]
    fn payment_status_respects_grace_period() {
        let due = date(2026, 3, 10);
        assert_eq!(
            payment_status(&record(due, None), date(2026, 3, 9)),
            PaymentStatus::Future
        );
        assert_eq!(
            payment_status(&record(due, None), date(2026, 3, 15)),
            PaymentStatus::Pending
        );
        assert_eq!(
            payment_status(&record(due, None), date(2026, 3, 16)),
            PaymentStatus::Overdue
        );
        assert_eq!(
            payment_status(&record(due, Some(5)), date(2026, 4, 1)),
            PaymentStatus::Regular
        );
        assert_eq!(
            payment_status(&record(due, Some(6)), date(2026, 4, 1)),
            PaymentStatus::Delayed
        );
    }

    #[test]
    fn ledger_status_uses_thirty_day_cutoff() {
        let due = date(2026, 3, 10);
        assert_eq!(ledger_status(&record(due, Some(40)), date(2026, 6, 1)), LedgerStatus::Paid);
        assert_eq!(ledger_status(&record(due, None), date(2026, 3, 10)), LedgerStatus::Pending);
        assert_eq!(ledger_status(&record(due, None), date(2026, 3, 20)), LedgerStatus::Unpaid);
        assert_eq!(ledger_status(&record(due, None), date(2026, 4, 10)), LedgerStatus::Delayed);
    }
}
