use chrono::NaiveDate;
use serde::Serialize;

/// A contribution as seen by the intelligence layer: dates already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRecord {
    pub contribution_id: String,
    pub member_id: String,
    pub due_date: NaiveDate,
    pub amount: f64,
    pub paid_date: Option<NaiveDate>,
    pub month_tag: Option<String>,
}

impl ContributionRecord {
    pub fn is_paid(&self) -> bool {
        self.paid_date.is_some()
    }
}

/// Recipient fields the message generator interpolates.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub name: String,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    #[serde(rename = "Regular")]
    Regular,
    #[serde(rename = "Occasional Delay")]
    OccasionalDelay,
    #[serde(rename = "High-risk Delay")]
    HighRiskDelay,
}

impl Classification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::OccasionalDelay => "Occasional Delay",
            Self::HighRiskDelay => "High-risk Delay",
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            Self::HighRiskDelay => Priority::EarlyReminder,
            Self::Regular | Self::OccasionalDelay => Priority::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Priority {
    #[serde(rename = "Early Reminder")]
    EarlyReminder,
    #[serde(rename = "Normal")]
    Normal,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarlyReminder => "Early Reminder",
            Self::Normal => "Normal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Early Reminder" => Some(Self::EarlyReminder),
            "Normal" => Some(Self::Normal),
            _ => None,
        }
    }
}

/// Grace-period vocabulary used by the trailing-window policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Future,
    Pending,
    Overdue,
    Regular,
    Delayed,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Future => "future",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Regular => "regular",
            Self::Delayed => "delayed",
        }
    }

    pub const fn counts_as_late(self) -> bool {
        matches!(self, Self::Delayed | Self::Overdue)
    }
}

/// Vocabulary shown next to each contribution in history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LedgerStatus {
    Paid,
    Unpaid,
    Pending,
    Delayed,
}

impl LedgerStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
            Self::Pending => "Pending",
            Self::Delayed => "Delayed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingStatus {
    New,
    Regular,
    OccasionalDelay,
    HighRisk,
}

impl TrailingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Regular => "regular",
            Self::OccasionalDelay => "occasional_delay",
            Self::HighRisk => "high_risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub color: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayPrediction {
    pub will_delay: bool,
    pub confidence: f64,
    pub estimated_delay_days: i64,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPatterns {
    pub pattern: String,
    pub preferred_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    Critical,
}

impl HealthStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsAttention => "Needs Attention",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberInsights {
    pub risk_score: f64,
    pub health_status: HealthStatus,
    pub prediction: DelayPrediction,
    pub payment_patterns: PaymentPatterns,
    pub recommendation: String,
    pub total_contributions: usize,
    pub paid_count: usize,
    pub success_rate: f64,
}
