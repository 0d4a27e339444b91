use std::io;

use serde_json::Value;

use super::format::{self, Column, key_value_rows, money, rows, text};

pub fn render_generate(data: &Value) -> io::Result<String> {
    let mut lines = vec![text(data, "message")];
    if data.get("status").and_then(Value::as_str) != Some("created") {
        return Ok(lines.join("\n"));
    }
    lines.push(String::new());
    lines.extend(key_value_rows(
        &[
            ("Month:", text(data, "month")),
            ("Due date:", text(data, "due_date")),
            ("Contributions created:", text(data, "contributions_created")),
            ("Emails sent:", text(data, "emails_sent")),
            ("Emails skipped:", text(data, "emails_skipped")),
            ("Email errors:", text(data, "email_errors")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_payment(data: &Value) -> io::Result<String> {
    Ok(format!(
        "{}: {} for {} on {}.",
        text(data, "message"),
        text(data, "contribution_id"),
        text(data, "member_id"),
        text(data, "paid_date")
    ))
}

pub fn render_pay_all(data: &Value) -> io::Result<String> {
    let paid = data
        .get("contributions_paid")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if paid == 0 {
        return Ok(format!("Nothing to pay for {}.", text(data, "member_id")));
    }
    Ok(format!(
        "{} Marked {paid} contribution(s) of {} paid on {}.",
        text(data, "message"),
        text(data, "member_id"),
        text(data, "paid_date")
    ))
}

pub fn render_status(data: &Value) -> io::Result<String> {
    let contributions = rows(data, "rows");
    if contributions.is_empty() {
        return Ok([
            "No contributions yet.",
            "",
            "Create this month's contributions with:",
            "  duesly contribution generate",
        ]
        .join("\n"));
    }

    let columns = [
        Column::left("Contribution"),
        Column::left("Member"),
        Column::left("Due date"),
        Column::left("Paid"),
        Column::right("Amount"),
        Column::right("Delay"),
        Column::left("Status"),
    ];
    let table_rows = contributions
        .iter()
        .map(|row| {
            vec![
                text(row, "contribution_id"),
                format!("{} ({})", text(row, "member_name"), text(row, "member_id")),
                text(row, "due_date"),
                text(row, "paid_date"),
                money(row, "amount"),
                text(row, "delay_days"),
                text(row, "status"),
            ]
        })
        .collect::<Vec<_>>();
    let mut lines = vec![format!("{} contribution(s):", contributions.len()), String::new()];
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Contribution",
    ));
    Ok(lines.join("\n"))
}

pub fn render_failed(data: &Value) -> io::Result<String> {
    let total = data.get("total_failed").and_then(Value::as_u64).unwrap_or(0);
    if total == 0 {
        return Ok("No payments are more than 30 days overdue.".to_string());
    }

    let mut lines = vec!["Failed payments (over 30 days overdue):".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Failed payments:", total.to_string()),
            ("Amount outstanding:", money(data, "total_amount")),
            ("Members affected:", text(data, "members_affected")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("Most recent:".to_string());
    let columns = [
        Column::left("Member"),
        Column::left("Due date"),
        Column::right("Amount"),
        Column::right("Days late"),
    ];
    let table_rows = rows(data, "recent_failures")
        .iter()
        .map(|row| {
            vec![
                format!("{} ({})", text(row, "member_name"), text(row, "member_id")),
                text(row, "due_date"),
                money(row, "amount"),
                text(row, "delay_days"),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Failure",
    ));
    Ok(lines.join("\n"))
}

pub fn render_import(data: &Value) -> io::Result<String> {
    let dry_run = data.get("dry_run").and_then(Value::as_bool) == Some(true);
    let heading = if dry_run {
        "Dry run passed. Nothing was written."
    } else {
        "Import complete."
    };
    let mut lines = vec![heading.to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("File:", text(data, "path")),
            ("Rows read:", text(data, "rows_read")),
            ("Rows inserted:", text(data, "inserted")),
            ("Members:", text(data, "members")),
        ],
        2,
    ));
    if dry_run {
        lines.push(String::new());
        lines.push("What to do next:".to_string());
        lines.push(format!(
            "  1. Run `duesly contribution import {}` to write these rows.",
            text(data, "path")
        ));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_failed, render_generate, render_import, render_pay_all};

    #[test]
    fn generate_shows_email_tally_only_when_created() {
        let created = render_generate(&json!({
            "status": "created",
            "message": "Generated 2 contributions for 2026-07",
            "month": "2026-07",
            "due_date": "2026-07-10",
            "contributions_created": 2,
            "emails_sent": 1,
            "emails_skipped": 1,
            "email_errors": 0
        }));
        assert!(created.is_ok());
        if let Ok(text) = created {
            assert!(text.contains("Emails skipped:"));
        }

        let existing = render_generate(&json!({
            "status": "already_exists",
            "message": "Contributions for 2026-07 already exist"
        }));
        assert!(matches!(existing.as_deref(), Ok("Contributions for 2026-07 already exist")));
    }

    #[test]
    fn pay_all_with_nothing_open() {
        let rendered = render_pay_all(&json!({
            "message": "Successfully paid!",
            "member_id": "M001",
            "paid_date": "2026-07-02",
            "contributions_paid": 0
        }));
        assert!(matches!(rendered.as_deref(), Ok("Nothing to pay for M001.")));
    }

    #[test]
    fn failed_lists_recent_rows() {
        let rendered = render_failed(&json!({
            "total_failed": 1,
            "total_amount": 500.0,
            "members_affected": 1,
            "recent_failures": [
                {"member_id": "M001", "member_name": "Asha", "amount": 500.0,
                 "due_date": "2026-05-10", "delay_days": 52}
            ]
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Asha (M001)"));
            assert!(text.contains("2026-05-10"));
        }
    }

    #[test]
    fn dry_run_import_suggests_the_real_run() {
        let rendered = render_import(&json!({
            "dry_run": true, "path": "history.csv", "rows_read": 6, "inserted": 0, "members": 1
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Dry run passed."));
            assert!(text.contains("duesly contribution import history.csv"));
        }
    }
}
