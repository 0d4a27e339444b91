//! Reminder decisioning and delivery: the per-contribution eligibility
//! policy, the daily batch run, manual sends and the scheduler service.

pub mod policy;
pub mod run;
pub mod scheduler;
pub mod send;

use std::sync::Arc;

use crate::notify::{EmailTransport, Notifier, OutboxTransport};
use crate::setup::SetupContext;

pub use policy::{DAILY_JOB_ID, ReminderDecision, should_send_reminder};
pub use run::{ReminderRunSummary, RunStatus, RunTrigger, run_reminder_check};
pub use scheduler::{ReminderScheduler, SchedulerStatus};
pub use send::{ReminderContext, ReminderOutcome, ReminderStatus};

/// Notifier for a ledger home: the outbox transport from settings unless a
/// transport is supplied.
pub fn build_notifier(
    setup: &SetupContext,
    transport_override: Option<Arc<dyn EmailTransport>>,
) -> Notifier {
    let transport = transport_override.unwrap_or_else(|| {
        Arc::new(OutboxTransport::new(setup.settings.outbox_dir(&setup.home)))
    });
    Notifier::new(transport, &setup.settings.email.from_address)
}
