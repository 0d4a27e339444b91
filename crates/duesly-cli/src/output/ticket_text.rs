use std::io;

use serde_json::Value;

use super::format::{self, Column, key_value_rows, rows, text};

pub fn render_ticket(data: &Value) -> io::Result<String> {
    let ticket = data
        .get("ticket")
        .ok_or_else(|| io::Error::other("ticket output requires ticket"))?;
    let mut lines = vec![text(data, "message"), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Ticket id:", text(ticket, "ticket_id")),
            ("Member:", member_label(ticket)),
            ("Request:", text(ticket, "request_type")),
            ("Current value:", text(ticket, "current_value")),
            ("Requested value:", text(ticket, "new_value")),
            ("Reason:", text(ticket, "reason")),
            ("Status:", text(ticket, "status")),
            ("Admin response:", text(ticket, "admin_response")),
        ],
        2,
    ));
    if ticket.get("status").and_then(Value::as_str) == Some("pending") {
        lines.push(String::new());
        lines.push("An admin resolves it with:".to_string());
        lines.push(format!(
            "  duesly ticket resolve {} --status approved|rejected",
            text(ticket, "ticket_id")
        ));
    }
    Ok(lines.join("\n"))
}

pub fn render_ticket_list(data: &Value) -> io::Result<String> {
    let tickets = rows(data, "rows");
    if tickets.is_empty() {
        return Ok("No tickets found.".to_string());
    }

    let columns = [
        Column::left("Ticket"),
        Column::left("Member"),
        Column::left("Request"),
        Column::right("Current"),
        Column::right("New"),
        Column::left("Status"),
        Column::left("Created"),
    ];
    let table_rows = tickets
        .iter()
        .map(|ticket| {
            vec![
                text(ticket, "ticket_id"),
                member_label(ticket),
                text(ticket, "request_type"),
                text(ticket, "current_value"),
                text(ticket, "new_value"),
                text(ticket, "status"),
                text(ticket, "created_at"),
            ]
        })
        .collect::<Vec<_>>();
    let mut lines = vec![format!("{} ticket(s):", tickets.len()), String::new()];
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Ticket",
    ));
    Ok(lines.join("\n"))
}

fn member_label(ticket: &Value) -> String {
    match ticket.get("member_name").and_then(Value::as_str) {
        Some(name) => format!("{name} ({})", text(ticket, "member_id")),
        None => text(ticket, "member_id"),
    }
}
