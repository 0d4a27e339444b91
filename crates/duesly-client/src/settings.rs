//! Operator settings loaded from `settings.toml` in the ledger home.
//!
//! Every field has a default, so a missing file is equivalent to an empty one.
//! Reminder lead times and thresholds are policy constants and deliberately
//! not configurable here (see `reminders::policy`).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::state::settings_path;
use crate::{ClientError, ClientResult};

pub const REMINDER_TIME_ENV_VAR: &str = "DUESLY_REMINDER_TIME";
pub const EMAIL_FROM_ENV_VAR: &str = "DUESLY_EMAIL_FROM";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub schedule: ScheduleSettings,
    pub contributions: ContributionSettings,
    pub members: MemberSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Local wall-clock time of the daily reminder check, `HH:MM`.
    pub reminder_time: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            reminder_time: "09:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContributionSettings {
    /// Day of month used for the due date of generated contributions.
    pub generation_due_day: u32,
    pub default_monthly_amount: f64,
    pub default_due_day: u32,
}

impl Default for ContributionSettings {
    fn default() -> Self {
        Self {
            generation_due_day: 10,
            default_monthly_amount: 500.0,
            default_due_day: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSettings {
    /// Credential issued to admin-registered members; rotated on first login.
    pub default_password: String,
}

impl Default for MemberSettings {
    fn default() -> Self {
        Self {
            default_password: "pass123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub from_address: String,
    /// Pickup directory for outgoing mail. Relative paths resolve against the ledger home.
    pub outbox_dir: Option<PathBuf>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from_address: "noreply@contribution-tracker.local".to_string(),
            outbox_dir: None,
        }
    }
}

impl Settings {
    pub fn load(home: &Path) -> ClientResult<Self> {
        let path = settings_path(home);
        let mut settings = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|error| ClientError::settings_invalid(&path, &error.to_string()))?;
            Self::from_toml(&raw).map_err(|detail| ClientError::settings_invalid(&path, &detail))?
        } else {
            Self::default()
        };

        settings.apply_env_overrides();
        settings.validate(&path)?;
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|error| error.to_string())
    }

    pub fn reminder_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.schedule.reminder_time.trim(), "%H:%M").ok()
    }

    pub fn outbox_dir(&self, home: &Path) -> PathBuf {
        match &self.email.outbox_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => home.join(dir),
            None => home.join("outbox"),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(REMINDER_TIME_ENV_VAR)
            && !value.trim().is_empty()
        {
            self.schedule.reminder_time = value.trim().to_string();
        }
        if let Ok(value) = std::env::var(EMAIL_FROM_ENV_VAR)
            && !value.trim().is_empty()
        {
            self.email.from_address = value.trim().to_string();
        }
    }

    fn validate(&self, path: &Path) -> ClientResult<()> {
        if self.reminder_time().is_none() {
            return Err(ClientError::settings_invalid(
                path,
                "`schedule.reminder_time` must use HH:MM (24-hour) format.",
            ));
        }
        for (field, day) in [
            (
                "contributions.generation_due_day",
                self.contributions.generation_due_day,
            ),
            ("contributions.default_due_day", self.contributions.default_due_day),
        ] {
            if !(1..=31).contains(&day) {
                return Err(ClientError::settings_invalid(
                    path,
                    &format!("`{field}` must be between 1 and 31."),
                ));
            }
        }
        if self.contributions.default_monthly_amount < 0.0 {
            return Err(ClientError::settings_invalid(
                path,
                "`contributions.default_monthly_amount` must not be negative.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::Settings;

    #[test]
    fn empty_document_yields_defaults() {
        let parsed = Settings::from_toml("");
        assert!(parsed.is_ok());
        if let Ok(settings) = parsed {
            assert_eq!(settings.schedule.reminder_time, "09:00");
            assert_eq!(settings.contributions.generation_due_day, 10);
            assert_eq!(settings.members.default_password, "pass123");
            assert!(settings.reminder_time().is_some());
        }
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let parsed = Settings::from_toml(
            "[schedule]\nreminder_time = \"07:30\"\n\n[email]\noutbox_dir = \"mail\"\n",
        );
        assert!(parsed.is_ok());
        if let Ok(settings) = parsed {
            assert_eq!(settings.schedule.reminder_time, "07:30");
            assert_eq!(settings.contributions.default_due_day, 5);
            assert_eq!(
                settings.outbox_dir(Path::new("/srv/duesly")),
                Path::new("/srv/duesly/mail")
            );
        }
    }

    #[test]
    fn malformed_reminder_time_is_rejected() {
        let parsed = Settings::from_toml("[schedule]\nreminder_time = \"9am\"\n");
        assert!(parsed.is_ok());
        if let Ok(settings) = parsed {
            assert!(settings.reminder_time().is_none());
            assert!(settings.validate(Path::new("settings.toml")).is_err());
        }
    }
}
