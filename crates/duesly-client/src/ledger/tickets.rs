use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::Serialize;
use ulid::Ulid;

use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    MonthlyAmount,
    DueDay,
}

impl RequestType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MonthlyAmount => "monthly_amount",
            Self::DueDay => "due_day",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "monthly_amount" => Some(Self::MonthlyAmount),
            "due_day" => Some(Self::DueDay),
            _ => None,
        }
    }

    /// Checks a requested value against the member column it will be written to.
    pub fn validate(self, value: f64) -> Result<(), String> {
        match self {
            Self::MonthlyAmount if value < 0.0 || !value.is_finite() => {
                Err("`monthly_amount` must be a non-negative amount.".to_string())
            }
            Self::DueDay if value.fract() != 0.0 || !(1.0..=31.0).contains(&value) => {
                Err("`due_day` must be a whole day between 1 and 31.".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Approved,
    Rejected,
}

impl Resolution {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketRow {
    pub ticket_id: String,
    pub member_id: String,
    pub member_name: Option<String>,
    pub employee_id: String,
    pub request_type: String,
    pub reason: String,
    pub current_value: f64,
    pub new_value: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub admin_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTicket<'a> {
    pub member_id: &'a str,
    pub employee_id: &'a str,
    pub request_type: RequestType,
    pub reason: &'a str,
    pub current_value: f64,
    pub new_value: f64,
}

const TICKET_SELECT: &str = "SELECT t.ticket_id, t.member_id, m.name, t.employee_id, t.request_type,
        t.reason, t.current_value, t.new_value, t.status, t.created_at, t.updated_at,
        t.admin_response
     FROM tickets t
     LEFT JOIN members m ON m.member_id = t.member_id";

pub fn create_ticket(
    connection: &Connection,
    db_path: &Path,
    ticket: &NewTicket<'_>,
    created_at: &str,
) -> ClientResult<String> {
    let ticket_id = format!("tkt_{}", Ulid::new());
    connection
        .execute(
            "INSERT INTO tickets (
                ticket_id, member_id, employee_id, request_type, reason,
                current_value, new_value, status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)",
            params![
                ticket_id,
                ticket.member_id,
                ticket.employee_id,
                ticket.request_type.as_str(),
                ticket.reason,
                ticket.current_value,
                ticket.new_value,
                created_at,
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(ticket_id)
}

/// Newest first. `member_id` scopes to one member; `status` filters by state.
pub fn list_tickets(
    connection: &Connection,
    db_path: &Path,
    member_id: Option<&str>,
    status: Option<&str>,
) -> ClientResult<Vec<TicketRow>> {
    let sql = format!(
        "{TICKET_SELECT}
         WHERE (?1 IS NULL OR t.member_id = ?1)
           AND (?2 IS NULL OR t.status = ?2)
         ORDER BY t.created_at DESC, t.ticket_id DESC"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows = statement
        .query_map(params![member_id, status], read_ticket)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut tickets = Vec::new();
    for row in rows {
        tickets.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(tickets)
}

pub fn get_ticket(connection: &Connection, db_path: &Path, ticket_id: &str) -> ClientResult<TicketRow> {
    let sql = format!("{TICKET_SELECT} WHERE t.ticket_id = ?1");
    connection
        .query_row(&sql, params![ticket_id], read_ticket)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::ticket_not_found(ticket_id))
}

/// Moves a pending ticket to its terminal state. On approval the requested
/// value is written onto the member in the same transaction.
pub fn resolve_ticket(
    connection: &mut Connection,
    db_path: &Path,
    ticket_id: &str,
    resolution: Resolution,
    admin_response: Option<&str>,
    updated_at: &str,
) -> ClientResult<TicketRow> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let sql = format!("{TICKET_SELECT} WHERE t.ticket_id = ?1");
    let ticket = transaction
        .query_row(&sql, params![ticket_id], read_ticket)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::ticket_not_found(ticket_id))?;
    if ticket.status != "pending" {
        return Err(ClientError::ticket_already_resolved(
            ticket_id,
            &ticket.status,
        ));
    }

    transaction
        .execute(
            "UPDATE tickets SET status = ?2, admin_response = ?3, updated_at = ?4
             WHERE ticket_id = ?1",
            params![ticket_id, resolution.as_str(), admin_response, updated_at],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    if resolution == Resolution::Approved {
        let update = match RequestType::parse(&ticket.request_type) {
            Some(RequestType::MonthlyAmount) => {
                "UPDATE members SET monthly_amount = ?2 WHERE member_id = ?1"
            }
            Some(RequestType::DueDay) => {
                "UPDATE members SET due_day = CAST(?2 AS INTEGER) WHERE member_id = ?1"
            }
            None => {
                return Err(ClientError::ledger_corrupt(db_path));
            }
        };
        transaction
            .execute(update, params![ticket.member_id, ticket.new_value])
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    let resolved = transaction
        .query_row(&sql, params![ticket_id], read_ticket)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(resolved)
}

fn read_ticket(row: &Row<'_>) -> rusqlite::Result<TicketRow> {
    Ok(TicketRow {
        ticket_id: row.get(0)?,
        member_id: row.get(1)?,
        member_name: row.get(2)?,
        employee_id: row.get(3)?,
        request_type: row.get(4)?,
        reason: row.get(5)?,
        current_value: row.get(6)?,
        new_value: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        admin_response: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{RequestType, Resolution};

    #[test]
    fn requested_values_are_checked_per_field() {
        assert!(RequestType::MonthlyAmount.validate(750.0).is_ok());
        assert!(RequestType::MonthlyAmount.validate(-1.0).is_err());
        assert!(RequestType::DueDay.validate(15.0).is_ok());
        assert!(RequestType::DueDay.validate(15.5).is_err());
        assert!(RequestType::DueDay.validate(0.0).is_err());
        assert!(RequestType::DueDay.validate(32.0).is_err());
    }

    #[test]
    fn only_terminal_states_resolve_a_ticket() {
        assert_eq!(Resolution::parse("approved"), Some(Resolution::Approved));
        assert_eq!(Resolution::parse("rejected"), Some(Resolution::Rejected));
        assert_eq!(Resolution::parse("pending"), None);
    }
}
