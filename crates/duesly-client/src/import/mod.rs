pub(crate) mod parse;

use std::collections::BTreeSet;
use std::fs;

use tracing::info;

use crate::contracts::types::{ContributionImportData, ImportIssue};
use crate::ledger::contributions::insert_contributions;
use crate::ledger::members::get_member;
use crate::setup::SetupContext;
use crate::{ClientError, ClientResult};

/// Reads a contribution history CSV and inserts it in one transaction.
/// Any invalid row rejects the whole file.
pub(crate) fn execute(
    setup: &SetupContext,
    path: &str,
    dry_run: bool,
    created_at: &str,
) -> ClientResult<ContributionImportData> {
    let content = fs::read_to_string(path)
        .map_err(|error| ClientError::import_unreadable(path, &error.to_string()))?;
    let parsed_rows = parse::parse_csv(&content)?;
    let rows_read = parsed_rows.len();
    let (valid_rows, mut issues) = parse::validate_rows(parsed_rows);

    let mut connection = setup.connect()?;
    let db_path = setup.db_path.as_path();

    let mut members = BTreeSet::new();
    let mut unknown = BTreeSet::new();
    for row in &valid_rows {
        if members.contains(&row.member_id) || unknown.contains(&row.member_id) {
            continue;
        }
        if get_member(&connection, db_path, &row.member_id)?.is_some() {
            members.insert(row.member_id.clone());
        } else {
            unknown.insert(row.member_id.clone());
        }
    }
    if !unknown.is_empty() {
        issues.extend(unknown.iter().map(|member_id| ImportIssue {
            row: 0,
            message: format!("Member `{member_id}` does not exist."),
        }));
    }

    if !issues.is_empty() {
        issues.sort_by_key(|issue| issue.row);
        let serialized = serde_json::to_value(&issues)
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
        return Err(ClientError::import_rows_invalid(serialized));
    }

    let inserted = if dry_run {
        0
    } else {
        insert_contributions(&mut connection, db_path, &valid_rows, created_at)?.len()
    };

    info!(
        path,
        rows_read,
        inserted,
        dry_run,
        members = members.len(),
        "contribution history import finished"
    );

    Ok(ContributionImportData {
        dry_run,
        path: path.to_string(),
        rows_read,
        inserted,
        members: members.len(),
    })
}
