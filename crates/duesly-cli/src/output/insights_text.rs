use std::io;

use serde_json::Value;

use super::format::{self, Column, key_value_rows, money, rows, text};

pub fn render_predictions(data: &Value) -> io::Result<String> {
    let predictions = rows(data, "rows");
    if predictions.is_empty() {
        return Ok("No members are likely to pay late.".to_string());
    }

    let columns = [
        Column::left("Member"),
        Column::right("Risk"),
        Column::left("Will delay"),
        Column::right("Est. days"),
        Column::right("Confidence"),
        Column::left("Factors"),
    ];
    let table_rows = predictions
        .iter()
        .map(|row| {
            vec![
                format!("{} ({})", text(row, "member_name"), text(row, "member_id")),
                text(row, "risk_score"),
                if row.get("will_delay").and_then(Value::as_bool) == Some(true) {
                    "yes".to_string()
                } else {
                    "no".to_string()
                },
                text(row, "estimated_delay_days"),
                text(row, "confidence"),
                joined(row, "factors"),
            ]
        })
        .collect::<Vec<_>>();

    let mut lines = vec![
        format!("{} member(s) at risk, highest first:", predictions.len()),
        String::new(),
    ];
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Member",
    ));
    Ok(lines.join("\n"))
}

pub fn render_member_insights(data: &Value) -> io::Result<String> {
    let prediction = data.get("prediction").cloned().unwrap_or(Value::Null);
    let patterns = data.get("payment_patterns").cloned().unwrap_or(Value::Null);

    let mut lines = vec![
        format!("Insights for {} ({}):", text(data, "member_name"), text(data, "member_id")),
        String::new(),
    ];
    lines.extend(key_value_rows(
        &[
            ("Health:", text(data, "health_status")),
            ("Risk score:", text(data, "risk_score")),
            ("Contributions:", text(data, "total_contributions")),
            ("Paid:", text(data, "paid_count")),
            ("Success rate:", format!("{}%", text(data, "success_rate"))),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("Next payment:".to_string());
    lines.extend(key_value_rows(
        &[
            (
                "Likely late:",
                if prediction.get("will_delay").and_then(Value::as_bool) == Some(true) {
                    "yes".to_string()
                } else {
                    "no".to_string()
                },
            ),
            ("Estimated delay:", format!("{} days", text(&prediction, "estimated_delay_days"))),
            ("Confidence:", text(&prediction, "confidence")),
            ("Factors:", joined(&prediction, "factors")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("Payment pattern:".to_string());
    lines.extend(key_value_rows(
        &[
            ("Pattern:", text(&patterns, "pattern")),
            ("Preferred day:", text(&patterns, "preferred_day")),
            ("Average delay:", text(&patterns, "average_delay")),
            ("Consistency:", text(&patterns, "consistency")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push(format!("Recommendation: {}", text(data, "recommendation")));
    Ok(lines.join("\n"))
}

pub fn render_dash(data: &Value) -> io::Result<String> {
    let month = data.get("current_month").cloned().unwrap_or(Value::Null);
    let mut lines = vec!["Collection overview:".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Members:", text(data, "total_members")),
            ("Contributions:", text(data, "total_contributions")),
            ("Paid:", text(data, "paid_contributions")),
            ("Unpaid:", text(data, "unpaid_contributions")),
            ("Collected:", money(data, "total_collected")),
            ("Pending:", money(data, "total_pending")),
            ("High-risk members:", text(data, "high_risk_members")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push(format!("This month ({}):", text(&month, "month")));
    lines.extend(key_value_rows(
        &[
            ("Contributions:", text(&month, "total_contributions")),
            ("Paid:", text(&month, "paid_contributions")),
            ("Collected:", money(&month, "collected_amount")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

fn joined(data: &Value, key: &str) -> String {
    let values = rows(data, key)
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>();
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_dash, render_member_insights, render_predictions};

    #[test]
    fn predictions_table_joins_factors() {
        let rendered = render_predictions(&json!({"rows": [{
            "member_id": "M001", "member_name": "Asha", "risk_score": 76.7,
            "will_delay": true, "estimated_delay_days": 45, "confidence": 0.61,
            "factors": ["Consistently late payments", "Extended delays observed"]
        }]}));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("1 member(s) at risk"));
            assert!(text.contains("Asha (M001)"));
            assert!(text.contains("Consistently late payments;"));
        }
    }

    #[test]
    fn member_insights_render_missing_pattern_fields_as_dashes() {
        let rendered = render_member_insights(&json!({
            "member_id": "M002", "member_name": "Ravi", "risk_score": 50.0,
            "health_status": "Good", "total_contributions": 0, "paid_count": 0,
            "success_rate": 0.0, "recommendation": "Keep monitoring",
            "prediction": {"will_delay": false, "confidence": 0.3,
                           "estimated_delay_days": 0, "factors": ["Insufficient history"]},
            "payment_patterns": {"pattern": "No payment history", "preferred_day": null}
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Insufficient history"));
            assert!(text.contains("Recommendation: Keep monitoring"));
        }
    }

    #[test]
    fn dash_renders_current_month() {
        let rendered = render_dash(&json!({
            "total_members": 2, "total_contributions": 6, "paid_contributions": 2,
            "unpaid_contributions": 4, "total_collected": 1000.0, "total_pending": 2000.0,
            "high_risk_members": 1,
            "current_month": {"month": "2026-06", "total_contributions": 1,
                              "paid_contributions": 0, "collected_amount": 0.0}
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("This month (2026-06):"));
            assert!(text.contains("₹2000"));
        }
    }
}
