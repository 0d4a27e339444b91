use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::migrations::{EXPECTED_USER_VERSION, REQUIRED_META_KEYS, run_pending};
use crate::settings::Settings;
use crate::state::{
    ensure_ledger_directory, ledger_db_path, map_sqlite_error, open_connection, resolve_ledger_home,
};
use crate::{ClientError, ClientResult};

const INTERNAL_META_COLUMNS: [&str; 2] = ["key", "value"];
const MEMBERS_COLUMNS: [&str; 15] = [
    "member_id",
    "employee_id",
    "name",
    "phone",
    "email",
    "monthly_amount",
    "due_day",
    "role",
    "password_hash",
    "must_change_password",
    "notify_email",
    "notify_sms",
    "notify_whatsapp",
    "reminder_days_before",
    "created_at",
];
const CONTRIBUTIONS_COLUMNS: [&str; 7] = [
    "contribution_id",
    "member_id",
    "due_date",
    "amount",
    "paid_date",
    "month_tag",
    "created_at",
];
const TICKETS_COLUMNS: [&str; 11] = [
    "ticket_id",
    "member_id",
    "employee_id",
    "request_type",
    "reason",
    "current_value",
    "new_value",
    "status",
    "admin_response",
    "created_at",
    "updated_at",
];
const NOTIFICATIONS_COLUMNS: [&str; 9] = [
    "notification_id",
    "member_id",
    "contribution_id",
    "notification_type",
    "message",
    "priority",
    "days_before_due",
    "sent_at",
    "status",
];
const INTERNAL_JOB_LOCKS_COLUMNS: [&str; 3] = ["job_id", "holder", "acquired_at"];
const INTERNAL_JOB_RUNS_COLUMNS: [&str; 10] = [
    "run_id",
    "job_id",
    "trigger",
    "started_at",
    "finished_at",
    "status",
    "sent",
    "skipped",
    "errors",
    "error",
];

const REQUIRED_CORE_TABLES: [(&str, &[&str]); 7] = [
    ("internal_meta", &INTERNAL_META_COLUMNS),
    ("members", &MEMBERS_COLUMNS),
    ("contributions", &CONTRIBUTIONS_COLUMNS),
    ("tickets", &TICKETS_COLUMNS),
    ("notifications", &NOTIFICATIONS_COLUMNS),
    ("internal_job_locks", &INTERNAL_JOB_LOCKS_COLUMNS),
    ("internal_job_runs", &INTERNAL_JOB_RUNS_COLUMNS),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub schema_version: String,
    pub settings: Settings,
}

impl SetupContext {
    pub fn connect(&self) -> ClientResult<Connection> {
        open_connection(&self.db_path)
    }
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(None)
}

pub fn ensure_initialized_at(home: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home))
}

pub(crate) fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let ledger_home = resolve_ledger_home(home_override)?;
    ensure_ledger_directory(&ledger_home)?;
    let settings = Settings::load(&ledger_home)?;

    let db_path = ledger_db_path(&ledger_home);
    let mut connection = open_connection(&db_path)?;

    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    verify_core_tables(&connection, &db_path)?;
    restore_meta_keys(&connection, &db_path)?;
    verify_meta_and_version(&connection, &db_path)?;

    let schema_version = read_schema_version(&connection, &db_path)?;

    Ok(SetupContext {
        home: ledger_home,
        db_path,
        schema_version,
        settings,
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    match error {
        rusqlite_migration::Error::RusqliteError { query: _, err } => {
            let mapped = map_sqlite_error(db_path, err);
            if mapped.code == "ledger_locked"
                || mapped.code == "ledger_corrupt"
                || mapped.code == "ledger_init_permission_denied"
            {
                mapped
            } else {
                ClientError::migration_failed(db_path, &error.to_string())
            }
        }
        _ => ClientError::migration_failed(db_path, &error.to_string()),
    }
}

fn verify_core_tables(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (table_name, required_columns) in REQUIRED_CORE_TABLES {
        if !table_exists(connection, table_name, db_path)? {
            return Err(ClientError::ledger_corrupt(db_path));
        }

        let columns = table_columns(connection, table_name, db_path)?;
        for required_column in required_columns {
            if !columns.iter().any(|column| column == required_column) {
                return Err(ClientError::ledger_corrupt(db_path));
            }
        }
    }

    Ok(())
}

// Missing meta keys are restored; a drifted value is rejected by verification.
fn restore_meta_keys(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (meta_key, default_value) in REQUIRED_META_KEYS {
        connection
            .execute(
                "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                params![meta_key, default_value],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }
    Ok(())
}

fn verify_meta_and_version(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    let user_version = connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if user_version != EXPECTED_USER_VERSION {
        return Err(ClientError::ledger_corrupt(db_path));
    }

    for (meta_key, expected_value) in REQUIRED_META_KEYS {
        let value = connection
            .query_row(
                "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
                [meta_key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        match value {
            Some(actual) if actual == expected_value => {}
            _ => return Err(ClientError::ledger_corrupt(db_path)),
        }
    }

    Ok(())
}

fn table_exists(connection: &Connection, table_name: &str, db_path: &Path) -> ClientResult<bool> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
            params![table_name],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .unwrap_or(false);

    Ok(exists)
}

fn table_columns(
    connection: &Connection,
    table_name: &str,
    db_path: &Path,
) -> ClientResult<Vec<String>> {
    if !is_required_core_table(table_name) {
        return Err(ClientError::ledger_init_failed(
            db_path,
            "Refused PRAGMA table inspection for non-core table.",
        ));
    }

    // `table_name` comes from the REQUIRED_CORE_TABLES allowlist, never from input.
    let sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let column_iter = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut columns: Vec<String> = Vec::new();
    for row in column_iter {
        let column = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        columns.push(column);
    }

    Ok(columns)
}

fn is_required_core_table(table_name: &str) -> bool {
    REQUIRED_CORE_TABLES
        .iter()
        .any(|(required_name, _)| required_name == &table_name)
}

fn read_schema_version(connection: &Connection, db_path: &Path) -> ClientResult<String> {
    let value = connection
        .query_row(
            "SELECT value FROM internal_meta WHERE key = 'schema_version' LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(value.unwrap_or_else(|| "v1".to_string()))
}
