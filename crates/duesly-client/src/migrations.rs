use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

use crate::intelligence::policy::REMINDER_POLICY_VERSION;

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");
const ADD_JOB_TRACKING_SQL: &str = include_str!("migrations/0002_add_job_tracking.sql");

pub const EXPECTED_USER_VERSION: i64 = 2;

pub const REQUIRED_META_KEYS: [(&str, &str); 2] =
    [("schema_version", "v1"), ("reminder_policy_version", REMINDER_POLICY_VERSION)];

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(BOOTSTRAP_SQL), M::up(ADD_JOB_TRACKING_SQL)])
}

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    migrations().to_latest(conn)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{EXPECTED_USER_VERSION, migrations, run_pending};

    #[test]
    fn migration_set_is_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn pending_migrations_reach_expected_user_version() {
        let connection = Connection::open_in_memory();
        assert!(connection.is_ok());
        if let Ok(mut conn) = connection {
            assert!(run_pending(&mut conn).is_ok());
            let version = conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0));
            assert!(matches!(version, Ok(value) if value == EXPECTED_USER_VERSION));
        }
    }
}
