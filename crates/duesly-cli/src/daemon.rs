//! `duesly scheduler serve`: hosts the reminder scheduler until Ctrl-C.

use std::path::Path;

use duesly_client::contracts::envelope::success;
use duesly_client::reminders::{ReminderScheduler, build_notifier};
use duesly_client::setup::{SetupContext, ensure_initialized, ensure_initialized_at};
use duesly_client::{ClientError, ClientResult, SuccessEnvelope};
use tracing::{info, warn};

pub fn serve(home: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    let setup = match home {
        Some(home) => ensure_initialized_at(home)?,
        None => ensure_initialized()?,
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| {
            ClientError::new(
                "internal_runtime",
                &format!("Could not start the async runtime: {error}"),
                vec!["Retry `duesly scheduler serve`.".to_string()],
            )
        })?;
    let status = runtime.block_on(serve_until_interrupted(&setup))?;
    success("scheduler serve", status)
}

async fn serve_until_interrupted(
    setup: &SetupContext,
) -> ClientResult<duesly_client::reminders::SchedulerStatus> {
    let mut scheduler = ReminderScheduler::new(setup, build_notifier(setup, None))?;
    scheduler.start();
    info!(
        home = %setup.home.display(),
        reminder_time = %setup.settings.schedule.reminder_time,
        "serving reminders; press Ctrl-C to stop"
    );

    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "could not listen for Ctrl-C; stopping scheduler");
    }
    scheduler.stop().await;
    Ok(scheduler.status())
}
