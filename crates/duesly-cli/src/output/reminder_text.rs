use std::io;

use serde_json::Value;

use super::format::{self, Column, key_value_rows, rows, text};
use super::member_text::notification_table;

pub fn render_run(data: &Value) -> io::Result<String> {
    let status = text(data, "status");
    let mut lines = vec![format!("Reminder check {status} ({}).", text(data, "trigger"))];
    lines.push(String::new());
    lines.extend(key_value_rows(
        &[
            ("Sent:", text(data, "sent")),
            ("Skipped:", text(data, "skipped")),
            ("Errors:", text(data, "errors")),
            ("Finished:", text(data, "timestamp")),
        ],
        2,
    ));
    for key in ["note", "error"] {
        if data.get(key).and_then(Value::as_str).is_some() {
            lines.push(format!("  {}", text(data, key)));
        }
    }

    let reminders = rows(data, "reminders");
    if !reminders.is_empty() {
        lines.push(String::new());
        lines.push("Reminders:".to_string());
        let columns = [
            Column::left("Member"),
            Column::left("Priority"),
            Column::right("Days"),
            Column::left("Channels"),
        ];
        let table_rows = reminders
            .iter()
            .map(|outcome| {
                vec![
                    format!("{} ({})", text(outcome, "member_name"), text(outcome, "member_id")),
                    text(outcome, "priority"),
                    text(outcome, "days_until_due"),
                    channel_summary(outcome),
                ]
            })
            .collect::<Vec<_>>();
        lines.extend(format::render_table_or_blocks(
            &columns,
            &table_rows,
            format::terminal_width(),
            "Reminder",
        ));
    }
    Ok(lines.join("\n"))
}

pub fn render_send(data: &Value) -> io::Result<String> {
    if data.get("status").and_then(Value::as_str) == Some("info") {
        return Ok(text(data, "message"));
    }
    let mut lines = vec![
        format!("Reminder sent to {} ({}).", text(data, "member_name"), text(data, "member_id")),
        String::new(),
    ];
    lines.extend(key_value_rows(
        &[
            ("Contribution:", text(data, "contribution_id")),
            ("Channels:", channel_summary(data)),
            ("Message:", text(data, "message")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

fn channel_summary(outcome: &Value) -> String {
    let channels = rows(outcome, "channels")
        .iter()
        .map(|channel| format!("{} {}", text(channel, "channel"), text(channel, "status")))
        .collect::<Vec<_>>();
    if channels.is_empty() {
        "-".to_string()
    } else {
        channels.join(", ")
    }
}

pub fn render_history(data: &Value) -> io::Result<String> {
    let reminders = rows(data, "reminders");
    if reminders.is_empty() {
        return Ok("No reminders sent yet.".to_string());
    }
    let statistics = data.get("statistics").cloned().unwrap_or(Value::Null);
    let mut lines = vec![format!("{} reminder(s):", reminders.len()), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Early reminders:", text(&statistics, "high_risk_reminders")),
            ("Normal reminders:", text(&statistics, "regular_reminders")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.extend(notification_table(reminders));
    Ok(lines.join("\n"))
}

pub fn render_schedule(data: &Value) -> io::Result<String> {
    let policy = data.get("reminder_policy").cloned().unwrap_or(Value::Null);
    let last_run = data
        .get("last_run")
        .filter(|run| !run.is_null())
        .map(|run| {
            format!(
                "{} ({}, sent {}) at {}",
                text(run, "status"),
                text(run, "trigger"),
                text(run, "sent"),
                text(run, "finished_at")
            )
        })
        .unwrap_or_else(|| "never".to_string());

    let mut lines = vec![format!("{}:", text(data, "job_id")), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Schedule:", text(data, "schedule")),
            ("Next run:", text(data, "next_run")),
            ("High-risk members:", text(&policy, "high_risk")),
            ("Other members:", text(&policy, "regular")),
            ("Last run:", last_run),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_scheduler_stopped(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Reminder scheduler stopped after {} run(s).",
        text(data, "runs_completed")
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_run, render_schedule, render_send};

    #[test]
    fn run_lists_channels_per_reminder() {
        let rendered = render_run(&json!({
            "status": "completed", "trigger": "manual", "sent": 1, "skipped": 3, "errors": 0,
            "timestamp": "2026-06-03T09:00:01",
            "reminders": [{
                "member_id": "M001", "member_name": "Asha", "priority": "Early Reminder",
                "days_until_due": 7,
                "channels": [{"channel": "email", "status": "failed", "to": "a@x.io"}]
            }]
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Reminder check completed (manual)."));
            assert!(text.contains("email failed"));
        }
    }

    #[test]
    fn info_send_prints_the_message_only() {
        let rendered = render_send(&json!({
            "status": "info", "member_id": "M001", "member_name": "Asha",
            "message": "No pending contributions", "channels": []
        }));
        assert!(matches!(rendered.as_deref(), Ok("No pending contributions")));
    }

    #[test]
    fn schedule_without_runs_says_never() {
        let rendered = render_schedule(&json!({
            "job_id": "daily_reminder_check", "schedule": "Daily at 09:00",
            "reminder_time": "09:00", "next_run": "2026-06-04T09:00:00",
            "reminder_policy": {"high_risk": "7 days before due date",
                                "regular": "3 days before due date"},
            "last_run": null
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Last run:"));
            assert!(text.ends_with("never"));
        }
    }
}
