mod contribution_text;
mod error_text;
mod format;
mod insights_text;
mod json;
mod member_text;
mod mode;
mod reminder_text;
mod ticket_text;

use std::io;

use duesly_client::{ClientError, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, infer_requested_output_mode, mode_for_cli};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    let data = &success.data;
    match success.command.as_str() {
        "member register" | "member signup" => member_text::render_registration(data),
        "member list" => member_text::render_member_list(data),
        "member search" => member_text::render_member_summary(data),
        "member settings" => member_text::render_payment_settings(data),
        "member preferences" => member_text::render_preferences(data),
        "member password" => Ok(format::text(data, "message")),
        "member login" => member_text::render_login(data),
        "member dashboard" => member_text::render_dashboard(data),
        "member history" => member_text::render_history(data),
        "member notifications" => member_text::render_notifications(data),
        "contribution generate" => contribution_text::render_generate(data),
        "contribution pay" => contribution_text::render_payment(data),
        "contribution pay-all" => contribution_text::render_pay_all(data),
        "contribution status" => contribution_text::render_status(data),
        "contribution failed" => contribution_text::render_failed(data),
        "contribution import" => contribution_text::render_import(data),
        "ticket create" | "ticket resolve" => ticket_text::render_ticket(data),
        "ticket list" => ticket_text::render_ticket_list(data),
        "insights predictions" => insights_text::render_predictions(data),
        "insights member" => insights_text::render_member_insights(data),
        "dash" => insights_text::render_dash(data),
        "reminder run" => reminder_text::render_run(data),
        "reminder send" => reminder_text::render_send(data),
        "reminder history" => reminder_text::render_history(data),
        "reminder schedule" => reminder_text::render_schedule(data),
        "scheduler serve" => reminder_text::render_scheduler_stopped(data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
