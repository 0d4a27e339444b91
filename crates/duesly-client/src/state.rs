//! Ledger home layout and SQLite connection handling.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

pub const HOME_ENV_VAR: &str = "DUESLY_HOME";

const DEFAULT_HOME_DIR: &str = ".duesly";
const DB_FILE: &str = "ledger.db";
const SETTINGS_FILE: &str = "settings.toml";

// The scheduler daemon and CLI commands share one database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// `--home`, then `DUESLY_HOME`, then `~/.duesly`.
pub fn resolve_ledger_home(home_override: Option<&Path>) -> ClientResult<PathBuf> {
    let candidate = home_override
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(HOME_ENV_VAR).map(PathBuf::from))
        .or_else(|| home::home_dir().map(|dir| dir.join(DEFAULT_HOME_DIR)))
        .ok_or_else(|| {
            ClientError::ledger_init_failed(
                Path::new("."),
                "No home directory found. Pass `--home <dir>` or set `DUESLY_HOME`.",
            )
        })?;
    absolutize(&candidate)
}

pub fn ensure_ledger_directory(path: &Path) -> ClientResult<()> {
    fs::create_dir_all(path).map_err(|error| map_io_error(path, &error))?;
    restrict_to_owner(path);
    Ok(())
}

pub fn ledger_db_path(home: &Path) -> PathBuf {
    home.join(DB_FILE)
}

pub fn settings_path(home: &Path) -> PathBuf {
    home.join(SETTINGS_FILE)
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(BUSY_TIMEOUT)
        .and_then(|()| connection.pragma_update(None, "foreign_keys", "ON"))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

pub fn map_io_error(path: &Path, error: &std::io::Error) -> ClientError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => ClientError::ledger_locked(path),
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => {
            ClientError::ledger_corrupt(path)
        }
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly | ErrorCode::PermissionDenied) => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::ledger_init_failed(path, &error.to_string()))
}

// Member contact details and password hashes live here.
#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rusqlite::{Error as SqliteError, ffi};

    use super::{ledger_db_path, map_sqlite_error, resolve_ledger_home, settings_path};

    fn failure(code: i32) -> SqliteError {
        SqliteError::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn explicit_home_wins_and_is_made_absolute() {
        let resolved = resolve_ledger_home(Some(Path::new("club-ledger")));
        assert!(resolved.is_ok());
        if let Ok(home) = resolved {
            assert!(home.is_absolute());
            assert!(home.ends_with("club-ledger"));
            assert!(ledger_db_path(&home).ends_with("club-ledger/ledger.db"));
            assert!(settings_path(&home).ends_with("club-ledger/settings.toml"));
        }
    }

    #[test]
    fn sqlite_failures_map_to_ledger_error_codes() {
        let path = Path::new("/tmp/ledger.db");
        let cases = [
            (ffi::SQLITE_BUSY, "ledger_locked"),
            (ffi::SQLITE_LOCKED, "ledger_locked"),
            (ffi::SQLITE_NOTADB, "ledger_corrupt"),
            (ffi::SQLITE_CANTOPEN, "ledger_init_permission_denied"),
            (ffi::SQLITE_FULL, "ledger_init_failed"),
        ];
        for (code, expected) in cases {
            assert_eq!(map_sqlite_error(path, &failure(code)).code, expected);
        }
    }
}
