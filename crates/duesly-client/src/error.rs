use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `duesly {cmd} --help` for usage."),
            None => "Run `duesly --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn member_not_found(member_id: &str) -> Self {
        Self::new(
            "member_not_found",
            &format!("Member `{member_id}` was not found."),
            vec![
                "Run `duesly member list` to find a valid member id.".to_string(),
                "Use `duesly member search <employee-id>` when you only know the employee id."
                    .to_string(),
            ],
        )
        .with_data(json!({
            "member_id": member_id,
        }))
    }

    pub fn employee_not_found(employee_id: &str) -> Self {
        Self::new(
            "member_not_found",
            &format!("No member has employee id `{employee_id}`."),
            vec!["Run `duesly member list` to review registered employee ids.".to_string()],
        )
        .with_data(json!({
            "employee_id": employee_id,
        }))
    }

    pub fn member_conflict(field: &str, value: &str) -> Self {
        Self::new(
            "member_conflict",
            &format!("A member with {field} `{value}` already exists."),
            vec![format!("Choose a different {field} and retry.")],
        )
        .with_data(json!({
            "field": field,
            "value": value,
        }))
    }

    pub fn contribution_not_found(contribution_id: &str) -> Self {
        Self::new(
            "contribution_not_found",
            &format!("Contribution `{contribution_id}` was not found."),
            vec![
                "Run `duesly member history <member-id>` to list contribution ids.".to_string(),
            ],
        )
        .with_data(json!({
            "contribution_id": contribution_id,
        }))
    }

    pub fn ticket_not_found(ticket_id: &str) -> Self {
        Self::new(
            "ticket_not_found",
            &format!("Ticket `{ticket_id}` was not found."),
            vec!["Run `duesly ticket list` to find a valid ticket id.".to_string()],
        )
        .with_data(json!({
            "ticket_id": ticket_id,
        }))
    }

    pub fn ticket_already_resolved(ticket_id: &str, status: &str) -> Self {
        Self::new(
            "ticket_already_resolved",
            &format!("Ticket `{ticket_id}` was already {status}."),
            vec![
                "Ask the member to open a new ticket for further changes.".to_string(),
                "Run `duesly ticket list --status pending` to find open tickets.".to_string(),
            ],
        )
        .with_data(json!({
            "ticket_id": ticket_id,
            "status": status,
        }))
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            "invalid_credentials",
            "Incorrect email or password.",
            vec!["Check the email address and password, then retry.".to_string()],
        )
    }

    pub fn settings_invalid(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "settings_invalid",
            &format!("Settings file `{location}` could not be read: {detail}"),
            vec![
                format!("Fix or remove `{location}`; every setting has a default."),
            ],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn internal_credentials(message: &str) -> Self {
        Self::new("internal_credentials_error", message, Vec::new())
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `DUESLY_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid ledger file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }

    pub fn import_unreadable(path: &str, detail: &str) -> Self {
        Self::new(
            "invalid_import_input",
            &format!("Could not read import file `{path}`: {detail}"),
            vec![
                "Verify the path exists and is readable.".to_string(),
                "Rerun `duesly contribution import <path>`.".to_string(),
            ],
        )
    }

    pub fn import_schema_mismatch(expected: Vec<String>, actual: Vec<String>) -> Self {
        Self::new(
            "import_schema_mismatch",
            "CSV headers do not match the contribution history layout.",
            vec![format!("Use the header row `{}`.", expected.join(","))],
        )
        .with_data(json!({
            "expected_headers": expected,
            "actual_headers": actual,
        }))
    }

    pub fn import_rows_invalid(issues: Value) -> Self {
        Self::new(
            "import_validation_failed",
            "Some rows failed validation; nothing was imported.",
            vec![
                "Fix the rows listed in `issues` and rerun the import.".to_string(),
                "Use `--dry-run` to validate without writing.".to_string(),
            ],
        )
        .with_data(json!({ "issues": issues }))
    }

    pub fn is_internal(&self) -> bool {
        self.code.starts_with("internal_")
            || matches!(
                self.code.as_str(),
                "ledger_init_permission_denied"
                    | "ledger_locked"
                    | "ledger_corrupt"
                    | "migration_failed"
                    | "ledger_init_failed"
            )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
