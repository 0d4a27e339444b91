use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use ulid::Ulid;

use crate::ClientResult;
use crate::state::map_sqlite_error;

pub const REMINDER_TYPE: &str = "reminder";

#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub member_id: &'a str,
    pub contribution_id: Option<&'a str>,
    pub notification_type: &'a str,
    pub message: &'a str,
    pub priority: Option<&'a str>,
    pub days_before_due: Option<i64>,
    pub status: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRow {
    pub notification_id: String,
    pub member_id: String,
    pub member_name: Option<String>,
    pub contribution_id: Option<String>,
    pub notification_type: String,
    pub message: String,
    pub priority: Option<String>,
    pub days_before_due: Option<i64>,
    pub sent_at: String,
    pub status: String,
}

const NOTIFICATION_SELECT: &str = "SELECT n.notification_id, n.member_id, m.name, n.contribution_id,
        n.notification_type, n.message, n.priority, n.days_before_due, n.sent_at, n.status
     FROM notifications n
     LEFT JOIN members m ON m.member_id = n.member_id";

/// Appends a notification record. Records are never updated.
pub fn insert_notification(
    connection: &Connection,
    db_path: &Path,
    notification: &NewNotification<'_>,
    sent_at: &str,
) -> ClientResult<String> {
    let notification_id = format!("ntf_{}", Ulid::new());
    connection
        .execute(
            "INSERT INTO notifications (
                notification_id, member_id, contribution_id, notification_type, message,
                priority, days_before_due, sent_at, status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                notification_id,
                notification.member_id,
                notification.contribution_id,
                notification.notification_type,
                notification.message,
                notification.priority,
                notification.days_before_due,
                sent_at,
                notification.status,
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(notification_id)
}

/// Whether a reminder for this member and contribution was recorded at or after `since`.
pub fn reminder_sent_since(
    connection: &Connection,
    db_path: &Path,
    member_id: &str,
    contribution_id: &str,
    since: &str,
) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM notifications
             WHERE member_id = ?1
               AND contribution_id = ?2
               AND notification_type = ?3
               AND sent_at >= ?4
             LIMIT 1",
            params![member_id, contribution_id, REMINDER_TYPE, since],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(found.unwrap_or(false))
}

/// Latest records first, optionally scoped to one member or one type.
pub fn list_notifications(
    connection: &Connection,
    db_path: &Path,
    member_id: Option<&str>,
    notification_type: Option<&str>,
    limit: usize,
) -> ClientResult<Vec<NotificationRow>> {
    let sql = format!(
        "{NOTIFICATION_SELECT}
         WHERE (?1 IS NULL OR n.member_id = ?1)
           AND (?2 IS NULL OR n.notification_type = ?2)
         ORDER BY n.sent_at DESC, n.notification_id DESC
         LIMIT ?3"
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows = statement
        .query_map(params![member_id, notification_type, limit], read_notification)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut notifications = Vec::new();
    for row in rows {
        notifications.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(notifications)
}

fn read_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        notification_id: row.get(0)?,
        member_id: row.get(1)?,
        member_name: row.get(2)?,
        contribution_id: row.get(3)?,
        notification_type: row.get(4)?,
        message: row.get(5)?,
        priority: row.get(6)?,
        days_before_due: row.get(7)?,
        sent_at: row.get(8)?,
        status: row.get(9)?,
    })
}
