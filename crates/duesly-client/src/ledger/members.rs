use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rand::Rng;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok()
});

const MEMBER_COLUMNS: &str = "member_id, employee_id, name, phone, email, monthly_amount, due_day,
    role, must_change_password, notify_email, notify_sms, notify_whatsapp,
    reminder_days_before, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub sms: bool,
    pub whatsapp: bool,
    pub reminder_days_before: i64,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
            whatsapp: false,
            reminder_days_before: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRow {
    pub member_id: String,
    pub employee_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub monthly_amount: f64,
    pub due_day: u32,
    pub role: String,
    pub must_change_password: bool,
    pub preferences: NotificationPreferences,
    pub created_at: String,
}

impl MemberRow {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn deliverable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct NewMember<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: Option<&'a str>,
    pub monthly_amount: f64,
    pub due_day: u32,
    pub role: &'a str,
    pub password_hash: &'a str,
    pub must_change_password: bool,
}

pub fn validate_phone(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '+')
        .collect();
    cleaned.len() == 10 && cleaned.chars().all(|ch| ch.is_ascii_digit())
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Next `M###` id: one past the highest numeric suffix in use.
pub fn next_member_id(connection: &Connection, db_path: &Path) -> ClientResult<String> {
    let mut statement = connection
        .prepare("SELECT member_id FROM members")
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let ids = statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut max_number = 0u32;
    for id in ids {
        let id = id.map_err(|error| map_sqlite_error(db_path, &error))?;
        if let Some(number) = id
            .strip_prefix('M')
            .and_then(|digits| digits.parse::<u32>().ok())
        {
            max_number = max_number.max(number);
        }
    }
    Ok(format!("M{:03}", max_number + 1))
}

/// `EMP-YYYYMMDD-NNNN`, re-drawn until unused.
pub fn generate_employee_id<R>(
    connection: &Connection,
    db_path: &Path,
    today: NaiveDate,
    rng: &mut R,
) -> ClientResult<String>
where
    R: Rng + ?Sized,
{
    let date_part = today.format("%Y%m%d");
    loop {
        let candidate = format!("EMP-{date_part}-{}", rng.gen_range(1000..=9999));
        if find_by_employee_id(connection, db_path, &candidate)?.is_none() {
            return Ok(candidate);
        }
    }
}

pub fn insert_member(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
    employee_id: &str,
    member: &NewMember<'_>,
    created_at: &str,
) -> ClientResult<MemberRow> {
    if let Some(email) = member.email
        && email_in_use(connection, db_path, email)?
    {
        return Err(ClientError::member_conflict("email", email));
    }

    let preferences = NotificationPreferences::default();
    connection
        .execute(
            "INSERT INTO members (
                member_id, employee_id, name, phone, email, monthly_amount, due_day,
                role, password_hash, must_change_password, notify_email, notify_sms,
                notify_whatsapp, reminder_days_before, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                member_id,
                employee_id,
                member.name,
                member.phone,
                member.email,
                member.monthly_amount,
                member.due_day,
                member.role,
                member.password_hash,
                member.must_change_password,
                preferences.email,
                preferences.sms,
                preferences.whatsapp,
                preferences.reminder_days_before,
                created_at,
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    require_member(connection, db_path, member_id)
}

pub fn get_member(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
) -> ClientResult<Option<MemberRow>> {
    let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1");
    connection
        .query_row(&sql, params![member_id], read_member)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub fn require_member(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
) -> ClientResult<MemberRow> {
    get_member(connection, db_path, member_id)?
        .ok_or_else(|| ClientError::member_not_found(member_id))
}

pub fn find_by_employee_id(
    connection: &Connection,
    db_path: &Path,
    employee_id: &str,
) -> ClientResult<Option<MemberRow>> {
    let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE employee_id = ?1");
    connection
        .query_row(&sql, params![employee_id], read_member)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Member plus stored password hash, looked up by email for credential checks.
pub fn find_credentials_by_email(
    connection: &Connection,
    db_path: &Path,
    email: &str,
) -> ClientResult<Option<(MemberRow, String)>> {
    let sql =
        format!("SELECT {MEMBER_COLUMNS}, password_hash FROM members WHERE email = ?1 LIMIT 1");
    connection
        .query_row(&sql, params![email], |row| {
            Ok((read_member(row)?, row.get::<_, String>(14)?))
        })
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub fn password_hash(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
) -> ClientResult<String> {
    connection
        .query_row(
            "SELECT password_hash FROM members WHERE member_id = ?1",
            params![member_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::member_not_found(member_id))
}

/// Members ordered by id; `role` narrows to `member` or `admin`.
pub fn list_members(
    connection: &Connection,
    db_path: &Path,
    role: Option<&str>,
) -> ClientResult<Vec<MemberRow>> {
    let sql = format!(
        "SELECT {MEMBER_COLUMNS} FROM members
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY member_id ASC"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows = statement
        .query_map(params![role], read_member)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut members = Vec::new();
    for row in rows {
        members.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(members)
}

pub fn update_payment_settings(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
    monthly_amount: Option<f64>,
    due_day: Option<u32>,
) -> ClientResult<MemberRow> {
    let changed = connection
        .execute(
            "UPDATE members
             SET monthly_amount = COALESCE(?2, monthly_amount),
                 due_day = COALESCE(?3, due_day)
             WHERE member_id = ?1",
            params![member_id, monthly_amount, due_day],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if changed == 0 {
        return Err(ClientError::member_not_found(member_id));
    }
    require_member(connection, db_path, member_id)
}

pub fn update_preferences(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
    preferences: &NotificationPreferences,
) -> ClientResult<MemberRow> {
    let changed = connection
        .execute(
            "UPDATE members
             SET notify_email = ?2, notify_sms = ?3, notify_whatsapp = ?4,
                 reminder_days_before = ?5
             WHERE member_id = ?1",
            params![
                member_id,
                preferences.email,
                preferences.sms,
                preferences.whatsapp,
                preferences.reminder_days_before,
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if changed == 0 {
        return Err(ClientError::member_not_found(member_id));
    }
    require_member(connection, db_path, member_id)
}

pub fn update_password(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
    password_hash: &str,
) -> ClientResult<()> {
    let changed = connection
        .execute(
            "UPDATE members SET password_hash = ?2, must_change_password = 0 WHERE member_id = ?1",
            params![member_id, password_hash],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if changed == 0 {
        return Err(ClientError::member_not_found(member_id));
    }
    Ok(())
}

fn email_in_use(connection: &Connection, db_path: &Path, email: &str) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM members WHERE email = ?1 LIMIT 1",
            params![email],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(found.unwrap_or(false))
}

fn read_member(row: &Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        member_id: row.get(0)?,
        employee_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        monthly_amount: row.get(5)?,
        due_day: row.get(6)?,
        role: row.get(7)?,
        must_change_password: row.get(8)?,
        preferences: NotificationPreferences {
            email: row.get(9)?,
            sms: row.get(10)?,
            whatsapp: row.get(11)?,
            reminder_days_before: row.get(12)?,
        },
        created_at: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{validate_email, validate_phone};

    #[test]
    fn phone_accepts_ten_digits_after_separators() {
        assert!(validate_phone("98765 43210"));
        assert!(validate_phone("987-654-3210"));
        assert!(validate_phone("+9876543210"));
        assert!(!validate_phone("+91 98765 43210"));
        assert!(!validate_phone("98765abcde"));
    }

    #[test]
    fn email_requires_domain_and_tld() {
        assert!(validate_email("asha.k+dues@example.org"));
        assert!(!validate_email("asha@localhost"));
        assert!(!validate_email("not an email"));
    }
}
