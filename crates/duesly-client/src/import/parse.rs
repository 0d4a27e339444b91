use std::collections::HashMap;

use chrono::NaiveDate;

use crate::contracts::types::ImportIssue;
use crate::intelligence::date::{format_month_tag, parse_stored_date};
use crate::ledger::contributions::NewContribution;
use crate::{ClientError, ClientResult};

const REQUIRED_FIELDS: [&str; 3] = ["member_id", "due_date", "amount"];
const OPTIONAL_FIELDS: [&str; 2] = ["paid_date", "month"];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedRow {
    pub(crate) row: usize,
    pub(crate) member_id: Option<String>,
    pub(crate) due_date: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) paid_date: Option<String>,
    pub(crate) month: Option<String>,
}

pub(crate) fn parse_csv(content: &str) -> ClientResult<Vec<ParsedRow>> {
    if content.trim().is_empty() {
        return Err(ClientError::invalid_argument_with_recovery(
            "Import file is empty.",
            vec![format!("Start the file with the header row `{}`.", expected_headers().join(","))],
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| {
            ClientError::import_schema_mismatch(expected_headers(), Vec::new())
        })?
        .iter()
        .map(|value| value.trim().to_string())
        .collect::<Vec<String>>();

    if !headers_are_valid(&headers) {
        return Err(ClientError::import_schema_mismatch(expected_headers(), headers));
    }

    let index_by_name = headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), index))
        .collect::<HashMap<String, usize>>();

    let mut rows = Vec::new();
    for (row_index, result_row) in reader.records().enumerate() {
        let record = result_row.map_err(|error| {
            ClientError::invalid_argument_with_recovery(
                &format!("CSV row {} is malformed: {error}", row_index + 1),
                vec!["Check quoting and column counts, then rerun the import.".to_string()],
            )
        })?;
        rows.push(ParsedRow {
            row: row_index + 1,
            member_id: value_for(&record, &index_by_name, "member_id"),
            due_date: value_for(&record, &index_by_name, "due_date"),
            amount: value_for(&record, &index_by_name, "amount"),
            paid_date: value_for(&record, &index_by_name, "paid_date"),
            month: value_for(&record, &index_by_name, "month"),
        });
    }
    Ok(rows)
}

/// Turns parsed rows into insertable contributions, collecting every problem
/// instead of stopping at the first.
pub(crate) fn validate_rows(rows: Vec<ParsedRow>) -> (Vec<NewContribution>, Vec<ImportIssue>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut issues = Vec::new();

    for row in rows {
        let mut problem = |message: String| {
            issues.push(ImportIssue {
                row: row.row,
                message,
            });
        };

        let member_id = row.member_id.clone().unwrap_or_default();
        if member_id.is_empty() {
            problem("`member_id` is required.".to_string());
        }
        let due_date = match row.due_date.as_deref().and_then(parse_stored_date) {
            Some(date) => Some(date),
            None => {
                problem("`due_date` must use YYYY-MM-DD.".to_string());
                None
            }
        };
        let amount = match row.amount.as_deref().map(str::parse::<f64>) {
            Some(Ok(value)) if value.is_finite() && value > 0.0 => Some(value),
            _ => {
                problem("`amount` must be a positive number.".to_string());
                None
            }
        };
        let paid_date = match row.paid_date.as_deref() {
            None => Ok(None),
            Some(text) => parse_stored_date(text).map(Some).ok_or(()),
        };
        if paid_date.is_err() {
            problem("`paid_date` must use YYYY-MM-DD or be left empty.".to_string());
        }
        if let Some(month) = row.month.as_deref()
            && !month_tag_is_valid(month)
        {
            problem("`month` must use YYYY-MM or be left empty.".to_string());
        }

        if let (false, Some(due), Some(amount), Ok(paid)) =
            (member_id.is_empty(), due_date, amount, paid_date)
            && month_is_acceptable(row.month.as_deref())
        {
            valid.push(NewContribution {
                member_id,
                due_date: due.to_string(),
                amount,
                paid_date: paid.map(|date: NaiveDate| date.to_string()),
                month_tag: Some(row.month.unwrap_or_else(|| format_month_tag(&due))),
            });
        }
    }

    (valid, issues)
}

fn month_is_acceptable(month: Option<&str>) -> bool {
    month.is_none_or(month_tag_is_valid)
}

fn month_tag_is_valid(month: &str) -> bool {
    parse_stored_date(&format!("{month}-01")).is_some()
}

fn value_for(
    record: &csv::StringRecord,
    index_by_name: &HashMap<String, usize>,
    field_name: &str,
) -> Option<String> {
    let index = index_by_name.get(field_name)?;
    let value = record.get(*index)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn headers_are_valid(actual_headers: &[String]) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|required| actual_headers.iter().any(|value| value == required))
        && actual_headers.iter().all(|header| {
            REQUIRED_FIELDS.contains(&header.as_str()) || OPTIONAL_FIELDS.contains(&header.as_str())
        })
}

fn expected_headers() -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .chain(OPTIONAL_FIELDS.iter())
        .map(|value| value.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_csv, validate_rows};

    #[test]
    fn valid_history_rows_become_contributions() {
        let parsed = parse_csv(
            "member_id,due_date,amount,paid_date\nM001,2026-01-10,500,2026-01-12\nM001,2026-02-10,500,\n",
        );
        assert!(parsed.is_ok());
        if let Ok(rows) = parsed {
            let (valid, issues) = validate_rows(rows);
            assert!(issues.is_empty());
            assert_eq!(valid.len(), 2);
            assert_eq!(valid[0].paid_date.as_deref(), Some("2026-01-12"));
            assert_eq!(valid[1].paid_date, None);
            assert_eq!(valid[1].month_tag.as_deref(), Some("2026-02"));
        }
    }

    #[test]
    fn every_bad_row_is_reported() {
        let parsed = parse_csv(
            "member_id,due_date,amount,month\n,2026-01-10,500,\nM002,2026-13-10,abc,2026-1\n",
        );
        assert!(parsed.is_ok());
        if let Ok(rows) = parsed {
            let (valid, issues) = validate_rows(rows);
            assert!(valid.is_empty());
            assert_eq!(issues.iter().filter(|issue| issue.row == 1).count(), 1);
            assert_eq!(issues.iter().filter(|issue| issue.row == 2).count(), 3);
        }
    }

    #[test]
    fn unknown_columns_are_a_schema_mismatch() {
        let parsed = parse_csv("member_id,due_date,amount,currency\nM001,2026-01-10,500,INR\n");
        assert!(matches!(parsed, Err(ref error) if error.code == "import_schema_mismatch"));
    }
}
