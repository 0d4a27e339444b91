use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

use crate::{ClientError, ClientResult};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Local wall-clock time unless a command pins it.
pub fn resolve_now(now_override: Option<NaiveDateTime>) -> NaiveDateTime {
    now_override.unwrap_or_else(|| Local::now().naive_local())
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_month_tag(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Lenient parse for stored values; malformed rows are skipped by callers.
pub fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    if !looks_like_iso_date(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

pub fn parse_iso_date_strict(
    value: &str,
    field_name: &str,
    command: &str,
) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

/// Due date for `due_day` in the month of `anchor`, clamped to the month's last day.
pub fn due_date_in_month(anchor: NaiveDate, due_day: u32) -> NaiveDate {
    let day = due_day.clamp(1, days_in_month(anchor.year(), anchor.month()));
    NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day).unwrap_or(anchor)
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
