use std::io;

use serde_json::Value;

use super::format::{self, Column, key_value_rows, money, rows, text, yes_no};

pub fn render_registration(data: &Value) -> io::Result<String> {
    let member = data
        .get("member")
        .ok_or_else(|| io::Error::other("registration output requires member"))?;
    let mut lines = vec![text(data, "message"), String::new()];
    lines.extend(member_profile(member));
    lines.push(String::new());
    lines.push("What to do next:".to_string());
    lines.push("  1. Record past payments: duesly contribution import --dry-run <path>".to_string());
    if member.get("must_change_password").and_then(Value::as_bool) == Some(true) {
        lines.push(format!(
            "  2. Rotate the default password: duesly member password {} --current <old> --new <new>",
            text(member, "member_id")
        ));
    }
    Ok(lines.join("\n"))
}

fn member_profile(member: &Value) -> Vec<String> {
    key_value_rows(
        &[
            ("Member id:", text(member, "member_id")),
            ("Employee id:", text(member, "employee_id")),
            ("Name:", text(member, "name")),
            ("Phone:", text(member, "phone")),
            ("Email:", text(member, "email")),
            ("Monthly amount:", money(member, "monthly_amount")),
            ("Due day:", text(member, "due_day")),
        ],
        2,
    )
}

pub fn render_member_list(data: &Value) -> io::Result<String> {
    let members = rows(data, "members");
    if members.is_empty() {
        return Ok([
            "No members yet.",
            "",
            "Register one with:",
            "  duesly member register <name> <phone> --email <address>",
        ]
        .join("\n"));
    }

    let mut lines = vec![format!("{} member(s):", members.len()), String::new()];
    lines.extend(member_table(members));
    Ok(lines.join("\n"))
}

pub fn render_member_summary(data: &Value) -> io::Result<String> {
    let mut lines = vec![format!("{} ({})", text(data, "name"), text(data, "member_id"))];
    lines.push(String::new());
    lines.extend(key_value_rows(
        &[
            ("Employee id:", text(data, "employee_id")),
            ("Phone:", text(data, "phone")),
            ("Email:", text(data, "email")),
            ("Monthly amount:", money(data, "monthly_amount")),
            ("Due day:", text(data, "due_day")),
            ("Contributions:", text(data, "total_contributions")),
            ("Missed:", text(data, "missed_count")),
            ("Average delay:", format!("{} days", text(data, "avg_delay_days"))),
            ("Classification:", text(data, "classification")),
            ("Reminder priority:", text(data, "priority")),
            ("Trailing status:", trailing_label(data)),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

fn trailing_label(member: &Value) -> String {
    member
        .get("trailing_status")
        .map(|status| text(status, "label"))
        .unwrap_or_else(|| "-".to_string())
}

fn member_table(members: &[Value]) -> Vec<String> {
    let columns = [
        Column::left("Member"),
        Column::left("Name"),
        Column::right("Amount"),
        Column::right("Missed"),
        Column::right("Avg delay"),
        Column::left("Classification"),
        Column::left("Status"),
    ];
    let table_rows = members
        .iter()
        .map(|member| {
            vec![
                text(member, "member_id"),
                text(member, "name"),
                money(member, "monthly_amount"),
                text(member, "missed_count"),
                text(member, "avg_delay_days"),
                text(member, "classification"),
                trailing_label(member),
            ]
        })
        .collect::<Vec<_>>();
    format::render_table_or_blocks(&columns, &table_rows, format::terminal_width(), "Member")
}

pub fn render_payment_settings(data: &Value) -> io::Result<String> {
    let mut lines = vec![text(data, "message"), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Member id:", text(data, "member_id")),
            ("Monthly amount:", money(data, "monthly_amount")),
            ("Due day:", text(data, "due_day")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_preferences(data: &Value) -> io::Result<String> {
    let preferences = data
        .get("preferences")
        .ok_or_else(|| io::Error::other("preferences output requires preferences"))?;
    let mut lines = vec![
        format!("Notification preferences for {}:", text(data, "member_id")),
        String::new(),
    ];
    lines.extend(key_value_rows(
        &[
            ("Email:", yes_no(preferences, "email")),
            ("SMS:", yes_no(preferences, "sms")),
            ("WhatsApp:", yes_no(preferences, "whatsapp")),
            ("Remind days before:", text(preferences, "reminder_days_before")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_login(data: &Value) -> io::Result<String> {
    let mut lines = vec![
        format!("Signed in as {} ({}).", text(data, "name"), text(data, "member_id")),
        String::new(),
    ];
    lines.extend(key_value_rows(
        &[
            ("Employee id:", text(data, "employee_id")),
            ("Role:", text(data, "role")),
        ],
        2,
    ));
    if data.get("must_change_password").and_then(Value::as_bool) == Some(true) {
        lines.push(String::new());
        lines.push("This account still uses the default password. Change it with:".to_string());
        lines.push(format!(
            "  duesly member password {} --current <old> --new <new>",
            text(data, "member_id")
        ));
    }
    Ok(lines.join("\n"))
}

pub fn render_dashboard(data: &Value) -> io::Result<String> {
    let info = data
        .get("member_info")
        .ok_or_else(|| io::Error::other("dashboard output requires member_info"))?;
    let statistics = data
        .get("statistics")
        .ok_or_else(|| io::Error::other("dashboard output requires statistics"))?;

    let mut lines = vec![
        format!("{} ({})", text(info, "name"), text(info, "member_id")),
        String::new(),
        "Statistics:".to_string(),
    ];
    lines.extend(key_value_rows(
        &[
            ("Monthly amount:", money(info, "monthly_amount")),
            ("Contributions:", text(statistics, "total_contributions")),
            ("Paid:", text(statistics, "paid_count")),
            ("Missed:", text(statistics, "missed_count")),
            ("Average delay:", format!("{} days", text(statistics, "avg_delay_days"))),
            ("Classification:", text(statistics, "classification")),
            ("Total pending:", money(data, "total_pending")),
        ],
        2,
    ));

    let upcoming = rows(data, "upcoming_dues");
    lines.push(String::new());
    if upcoming.is_empty() {
        lines.push("Nothing due. All contributions are paid.".to_string());
        return Ok(lines.join("\n"));
    }
    lines.push("Upcoming dues:".to_string());
    let columns = [
        Column::left("Contribution"),
        Column::left("Due date"),
        Column::right("Amount"),
        Column::right("Days"),
        Column::left("Status"),
    ];
    let table_rows = upcoming
        .iter()
        .map(|due| {
            vec![
                text(due, "contribution_id"),
                text(due, "due_date"),
                money(due, "amount"),
                text(due, "days_until"),
                text(due, "status"),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Due",
    ));
    Ok(lines.join("\n"))
}

pub fn render_history(data: &Value) -> io::Result<String> {
    let history = rows(data, "rows");
    if history.is_empty() {
        return Ok(format!("No contributions recorded for {}.", text(data, "member_id")));
    }

    let mut lines = vec![
        format!("Contribution history for {}:", text(data, "member_id")),
        String::new(),
    ];
    let columns = [
        Column::left("Contribution"),
        Column::left("Due date"),
        Column::left("Paid"),
        Column::right("Amount"),
        Column::right("Delay"),
        Column::left("Status"),
    ];
    let table_rows = history
        .iter()
        .map(|row| {
            vec![
                text(row, "contribution_id"),
                text(row, "due_date"),
                text(row, "paid_date"),
                money(row, "amount"),
                text(row, "delay_days"),
                text(row, "status"),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Contribution",
    ));
    Ok(lines.join("\n"))
}

pub fn render_notifications(data: &Value) -> io::Result<String> {
    let notifications = rows(data, "rows");
    if notifications.is_empty() {
        return Ok(format!("No notifications sent to {} yet.", text(data, "member_id")));
    }
    let mut lines = vec![
        format!("Notifications for {}:", text(data, "member_id")),
        String::new(),
    ];
    lines.extend(notification_table(notifications));
    Ok(lines.join("\n"))
}

pub fn notification_table(notifications: &[Value]) -> Vec<String> {
    let columns = [
        Column::left("Sent at"),
        Column::left("Member"),
        Column::left("Type"),
        Column::left("Priority"),
        Column::right("Days"),
        Column::left("Status"),
    ];
    let table_rows = notifications
        .iter()
        .map(|row| {
            vec![
                text(row, "sent_at"),
                text(row, "member_id"),
                text(row, "notification_type"),
                text(row, "priority"),
                text(row, "days_before_due"),
                text(row, "status"),
            ]
        })
        .collect::<Vec<_>>();
    format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Notification",
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_dashboard, render_member_list, render_registration};

    #[test]
    fn registration_points_at_the_password_rotation() {
        let data = json!({
            "message": "Member registered with default password 'pass123'",
            "default_password": "pass123",
            "member": {
                "member_id": "M001",
                "employee_id": "EMP-20260314-4821",
                "name": "Asha Rao",
                "phone": "9876543210",
                "email": null,
                "monthly_amount": 500.0,
                "due_day": 5,
                "must_change_password": true
            }
        });
        let rendered = render_registration(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Member registered"));
            assert!(text.contains("₹500"));
            assert!(text.contains("duesly member password M001"));
        }
    }

    #[test]
    fn empty_member_list_suggests_registration() {
        let rendered = render_member_list(&json!({"total": 0, "members": []}));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("No members yet."));
        }
    }

    #[test]
    fn dashboard_without_dues_says_so() {
        let data = json!({
            "member_info": {"member_id": "M001", "name": "Asha", "monthly_amount": 500.0},
            "statistics": {
                "total_contributions": 3, "paid_count": 3, "missed_count": 0,
                "avg_delay_days": 0.0, "classification": "Regular"
            },
            "upcoming_dues": [],
            "total_pending": 0.0
        });
        let rendered = render_dashboard(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Classification:"));
            assert!(text.ends_with("Nothing due. All contributions are paid."));
        }
    }
}
