use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0usize, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|index| bytes[*index].is_ascii_digit());
    if !shaped {
        return Err("date must use YYYY-MM-DD format".to_string());
    }
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }
    Ok(IsoDate(value.to_string()))
}

pub fn parse_due_day(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(day) if (1..=31).contains(&day) => Ok(day),
        _ => Err("due day must be a whole number between 1 and 31".to_string()),
    }
}

pub fn parse_amount(value: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err("amount must be a non-negative number".to_string()),
    }
}

/// Extended help shown after `duesly contribution import --help`.
pub const IMPORT_AFTER_HELP: &str = "\
How import works:
  The file is a CSV with one header row. Every row must be valid;
  a single bad row rejects the whole file and nothing is written.

  Columns:
    member_id  (required)  An existing member id, e.g. M001
    due_date   (required)  YYYY-MM-DD
    amount     (required)  Non-negative number
    paid_date  (optional)  YYYY-MM-DD, blank when unpaid
    month      (optional)  YYYY-MM, defaults to the due date's month

  Example:
    member_id,due_date,amount,paid_date
    M001,2026-01-10,500,2026-01-12
    M001,2026-02-10,500,

What to do next:
  1. Run `duesly contribution import --dry-run <path>` and fix any reported rows.
  2. Run `duesly contribution import <path>` once the dry run passes.
";

#[derive(Debug, Parser)]
#[command(
    name = "duesly",
    version,
    about = "contribution tracker with adaptive payment reminders",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Ledger home directory (defaults to DUESLY_HOME, then ~/.duesly)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register, inspect and update members
    #[command(arg_required_else_help = true)]
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },
    /// Generate, pay and review monthly contributions
    #[command(arg_required_else_help = true)]
    Contribution {
        #[command(subcommand)]
        command: ContributionCommand,
    },
    /// Request and resolve payment-settings changes
    #[command(arg_required_else_help = true)]
    Ticket {
        #[command(subcommand)]
        command: TicketCommand,
    },
    /// Delay predictions and per-member health
    #[command(arg_required_else_help = true)]
    Insights {
        #[command(subcommand)]
        command: InsightsCommand,
    },
    /// Show admin collection statistics
    Dash,
    /// Run, send and review payment reminders
    #[command(arg_required_else_help = true)]
    Reminder {
        #[command(subcommand)]
        command: ReminderCommand,
    },
    /// Host the daily reminder service
    #[command(arg_required_else_help = true)]
    Scheduler {
        #[command(subcommand)]
        command: SchedulerCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum MemberCommand {
    /// Register a member with the default password
    Register {
        name: String,
        phone: String,
        #[arg(long)]
        email: Option<String>,
        /// Monthly contribution amount
        #[arg(long, value_parser = parse_amount)]
        amount: Option<f64>,
        /// Day of month the contribution is due
        #[arg(long, value_parser = parse_due_day)]
        due_day: Option<u32>,
    },
    /// Create a member account with a chosen password
    Signup {
        name: String,
        phone: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List members with their payment classification
    List {
        /// Include admin accounts
        #[arg(long)]
        include_admins: bool,
    },
    /// Find a member by employee id
    Search { employee_id: String },
    /// Change a member's monthly amount or due day
    Settings {
        member_id: String,
        #[arg(long, value_parser = parse_amount)]
        amount: Option<f64>,
        #[arg(long, value_parser = parse_due_day)]
        due_day: Option<u32>,
    },
    /// Update notification channel preferences
    Preferences {
        member_id: String,
        #[arg(long, value_name = "BOOL")]
        email: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        sms: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        whatsapp: Option<bool>,
        #[arg(long, value_name = "DAYS")]
        reminder_days: Option<i64>,
    },
    /// Change a member's password
    Password {
        member_id: String,
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Check credentials
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Member overview with upcoming dues
    Dashboard { member_id: String },
    /// Full contribution history of a member
    History { member_id: String },
    /// Notifications sent to a member
    Notifications {
        member_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ContributionCommand {
    /// Create this month's contributions and email every member
    Generate,
    /// Record a payment
    Pay {
        contribution_id: String,
        /// Payment date (defaults to today)
        #[arg(long, value_parser = parse_iso_date)]
        paid_date: Option<IsoDate>,
    },
    /// Mark every unpaid contribution of a member as paid today
    PayAll { member_id: String },
    /// List every contribution with its status
    Status,
    /// Summarize payments more than 30 days overdue
    Failed,
    /// Import historical contributions from CSV
    #[command(after_long_help = IMPORT_AFTER_HELP)]
    Import {
        /// Validate without writing to the ledger
        #[arg(long)]
        dry_run: bool,
        path: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TicketCommand {
    /// Request a new monthly amount or due day
    Create {
        member_id: String,
        #[arg(long = "type", value_parser = ["monthly_amount", "due_day"])]
        request_type: String,
        #[arg(long)]
        value: f64,
        #[arg(long)]
        reason: String,
    },
    /// List tickets, newest first
    List {
        #[arg(long)]
        member: Option<String>,
        #[arg(long, value_parser = ["pending", "approved", "rejected"])]
        status: Option<String>,
    },
    /// Approve or reject a pending ticket
    Resolve {
        ticket_id: String,
        #[arg(long, value_parser = ["approved", "rejected"])]
        status: String,
        #[arg(long)]
        response: Option<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum InsightsCommand {
    /// Members likely to pay late
    Predictions,
    /// Risk, prediction and payment patterns for one member
    Member { member_id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReminderCommand {
    /// Run the daily reminder check now
    Run,
    /// Send a reminder to one member on every enabled channel
    Send {
        member_id: String,
        /// Custom message text
        #[arg(long)]
        message: Option<String>,
    },
    /// Recent reminder notifications
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the reminder schedule and policy
    Schedule,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SchedulerCommand {
    /// Run the daily reminder check at the configured time until interrupted
    Serve,
}

impl Commands {
    pub fn is_daemon(&self) -> bool {
        matches!(self, Self::Scheduler { .. })
    }
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
