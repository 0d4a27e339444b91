#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use duesly_client::commands::contributions::{self, ContributionImportOptions};
use duesly_client::commands::members::{self, MemberRegisterOptions};
use duesly_client::notify::{DeliveryError, EmailMessage, EmailTransport};
use duesly_client::{ClientResult, SuccessEnvelope};
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub fn temp_home(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir()?;
    let home = dir.path().join("ledger-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .unwrap_or_default()
}

/// The `data` object of a successful envelope, or `Null` on failure.
pub fn payload(result: ClientResult<SuccessEnvelope>) -> Value {
    assert!(result.is_ok(), "command failed: {:?}", result.as_ref().err());
    if let Ok(envelope) = result {
        return envelope.data;
    }
    Value::Null
}

pub fn register_member(home: &Path, name: &str, phone: &str, email: Option<&str>) -> String {
    let data = payload(members::register(MemberRegisterOptions {
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.map(str::to_string),
        monthly_amount: Some(500.0),
        due_day: Some(10),
        home_override: Some(home),
        now_override: Some(at(2026, 1, 2, 9)),
        rng_seed: Some(7),
    }));
    data["member"]["member_id"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

pub fn import_history(home: &Path, csv: &str) -> Value {
    let fixture = home.join("history.csv");
    assert!(fs::write(&fixture, csv).is_ok());
    payload(contributions::import_history(ContributionImportOptions {
        path: fixture.display().to_string(),
        dry_run: false,
        home_override: Some(home),
        now_override: Some(at(2026, 1, 2, 9)),
    }))
}

/// Six monthly contributions due on the 10th, January to June 2026. The first
/// two were paid 45 days late and the rest are open.
pub fn high_risk_history(member_id: &str) -> String {
    let mut csv = String::from("member_id,due_date,amount,paid_date\n");
    let paid = ["2026-02-24", "2026-03-27"];
    for month in 1..=6 {
        let paid_date = paid.get(month - 1).copied().unwrap_or("");
        csv.push_str(&format!("{member_id},2026-{month:02}-10,500,{paid_date}\n"));
    }
    csv
}

#[derive(Default)]
pub struct CapturingTransport {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl CapturingTransport {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|message| message.subject.clone()).collect())
            .unwrap_or_default()
    }
}

impl EmailTransport for CapturingTransport {
    fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| DeliveryError::Rejected("poisoned".to_string()))?;
        sent.push(message.clone());
        Ok(format!("captured-{}", sent.len()))
    }
}

pub struct FailingTransport;

impl EmailTransport for FailingTransport {
    fn send(&self, _message: &EmailMessage) -> Result<String, DeliveryError> {
        Err(DeliveryError::Rejected("relay unavailable".to_string()))
    }
}
