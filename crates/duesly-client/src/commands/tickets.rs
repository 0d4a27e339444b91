use std::path::Path;

use chrono::NaiveDateTime;
use tracing::info;

use crate::commands::common::{command_now, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{TicketData, TicketListData};
use crate::intelligence::date::format_timestamp;
use crate::ledger::members::require_member;
use crate::ledger::tickets::{
    NewTicket, RequestType, Resolution, create_ticket, get_ticket, list_tickets, resolve_ticket,
};
use crate::{ClientError, ClientResult};

const TICKET_STATUSES: [&str; 3] = ["pending", "approved", "rejected"];

#[derive(Debug, Default)]
pub struct TicketCreateOptions<'a> {
    pub member_id: String,
    pub request_type: String,
    pub new_value: f64,
    pub reason: String,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct TicketListOptions<'a> {
    pub member_id: Option<String>,
    pub status: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct TicketResolveOptions<'a> {
    pub ticket_id: String,
    pub status: String,
    pub admin_response: Option<String>,
    pub home_override: Option<&'a Path>,
    pub now_override: Option<NaiveDateTime>,
}

/// Opens a change request against one of the member's payment settings,
/// snapshotting the value it would replace.
pub fn create(options: TicketCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "ticket create";
    let request_type = RequestType::parse(options.request_type.trim()).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            "`request_type` must be `monthly_amount` or `due_day`.",
            Some(command),
        )
    })?;
    request_type
        .validate(options.new_value)
        .map_err(|message| ClientError::invalid_argument_for_command(&message, Some(command)))?;
    let reason = options.reason.trim();
    if reason.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "`reason` must not be empty.",
            Some(command),
        ));
    }

    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member = require_member(&connection, &setup.db_path, options.member_id.trim())?;
    let current_value = match request_type {
        RequestType::MonthlyAmount => member.monthly_amount,
        RequestType::DueDay => f64::from(member.due_day),
    };
    let now = command_now(options.now_override);
    let ticket_id = create_ticket(
        &connection,
        &setup.db_path,
        &NewTicket {
            member_id: &member.member_id,
            employee_id: &member.employee_id,
            request_type,
            reason,
            current_value,
            new_value: options.new_value,
        },
        &format_timestamp(&now),
    )?;
    info!(
        ticket_id = %ticket_id,
        member_id = %member.member_id,
        request_type = request_type.as_str(),
        "ticket created"
    );
    let ticket = get_ticket(&connection, &setup.db_path, &ticket_id)?;

    success(
        command,
        TicketData {
            message: "Ticket created successfully".to_string(),
            ticket,
        },
    )
}

/// Newest first. Without `member_id` this is the admin view of every ticket.
pub fn list(options: TicketListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "ticket list";
    let status = options
        .status
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(value) = status
        && !TICKET_STATUSES.contains(&value)
    {
        return Err(ClientError::invalid_argument_for_command(
            "`status` must be pending, approved, or rejected.",
            Some(command),
        ));
    }

    let setup = load_setup(options.home_override)?;
    let connection = setup.connect()?;
    let member_id = options
        .member_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(member_id) = member_id {
        require_member(&connection, &setup.db_path, member_id)?;
    }
    let rows = list_tickets(&connection, &setup.db_path, member_id, status)?;

    success(
        command,
        TicketListData {
            member_id: member_id.map(str::to_string),
            status: status.map(str::to_string),
            rows,
        },
    )
}

pub fn resolve(options: TicketResolveOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let command = "ticket resolve";
    let resolution = Resolution::parse(options.status.trim()).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            "Status must be 'approved' or 'rejected'.",
            Some(command),
        )
    })?;

    let setup = load_setup(options.home_override)?;
    let mut connection = setup.connect()?;
    let now = command_now(options.now_override);
    let admin_response = options
        .admin_response
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let ticket = resolve_ticket(
        &mut connection,
        &setup.db_path,
        options.ticket_id.trim(),
        resolution,
        admin_response,
        &format_timestamp(&now),
    )?;
    info!(ticket_id = %ticket.ticket_id, status = resolution.as_str(), "ticket resolved");

    success(
        command,
        TicketData {
            message: format!("Ticket {}", resolution.as_str()),
            ticket,
        },
    )
}
