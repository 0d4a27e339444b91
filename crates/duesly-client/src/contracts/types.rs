use serde::Serialize;

use crate::intelligence::types::{
    Classification, LedgerStatus, MemberInsights, PaymentStatus, Priority, StatusBadge,
    TrailingStatus,
};
use crate::ledger::jobs::JobRunRow;
use crate::ledger::members::{MemberRow, NotificationPreferences};
use crate::ledger::notifications::NotificationRow;
use crate::ledger::tickets::TicketRow;

#[derive(Debug, Clone, Serialize)]
pub struct MemberRegisterData {
    pub message: String,
    pub member: MemberRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrailingStatusView {
    pub status: TrailingStatus,
    #[serde(flatten)]
    pub badge: StatusBadge,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub member_id: String,
    pub employee_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: String,
    pub monthly_amount: f64,
    pub due_day: u32,
    pub total_contributions: usize,
    pub paid_count: usize,
    pub missed_count: usize,
    pub avg_delay_days: f64,
    pub current_delay_days: i64,
    pub classification: Classification,
    pub priority: Priority,
    pub trailing_status: TrailingStatusView,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberListData {
    pub total: usize,
    pub members: Vec<MemberSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSettingsData {
    pub message: String,
    pub member_id: String,
    pub monthly_amount: f64,
    pub due_day: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencesData {
    pub member_id: String,
    pub preferences: NotificationPreferences,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChangeData {
    pub message: String,
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginData {
    pub member_id: String,
    pub employee_id: String,
    pub name: String,
    pub role: String,
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberInfo {
    pub member_id: String,
    pub name: String,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberStatistics {
    pub total_contributions: usize,
    pub paid_count: usize,
    pub missed_count: usize,
    pub avg_delay_days: f64,
    pub classification: Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueState {
    Overdue,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingDue {
    pub contribution_id: String,
    pub due_date: String,
    pub amount: f64,
    pub days_until: i64,
    pub status: DueState,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDashboardData {
    pub member_info: MemberInfo,
    pub statistics: MemberStatistics,
    pub upcoming_dues: Vec<UpcomingDue>,
    pub total_pending: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionHistoryRow {
    pub contribution_id: String,
    pub due_date: String,
    pub paid_date: Option<String>,
    pub amount: f64,
    pub month_tag: Option<String>,
    pub status: LedgerStatus,
    pub payment_status: PaymentStatus,
    pub delay_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionHistoryData {
    pub member_id: String,
    pub rows: Vec<ContributionHistoryRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationListData {
    pub member_id: String,
    pub rows: Vec<NotificationRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Created,
    AlreadyExists,
    NoMembers,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateData {
    pub status: GenerationStatus,
    pub message: String,
    pub month: String,
    pub due_date: String,
    pub contributions_created: usize,
    pub emails_sent: usize,
    pub emails_skipped: usize,
    pub email_errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentData {
    pub message: String,
    pub contribution_id: String,
    pub member_id: String,
    pub paid_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayAllData {
    pub message: String,
    pub member_id: String,
    pub paid_date: String,
    pub contributions_paid: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionStatusRow {
    pub contribution_id: String,
    pub member_id: String,
    pub member_name: String,
    pub due_date: String,
    pub amount: f64,
    pub paid_date: Option<String>,
    pub status: LedgerStatus,
    pub delay_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionStatusData {
    pub rows: Vec<ContributionStatusRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedPaymentRow {
    pub member_id: String,
    pub member_name: String,
    pub amount: f64,
    pub due_date: String,
    pub delay_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedPaymentsData {
    pub total_failed: usize,
    pub total_amount: f64,
    pub members_affected: usize,
    pub recent_failures: Vec<FailedPaymentRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportIssue {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionImportData {
    pub dry_run: bool,
    pub path: String,
    pub rows_read: usize,
    pub inserted: usize,
    pub members: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketData {
    pub message: String,
    pub ticket: TicketRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketListData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub rows: Vec<TicketRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionRow {
    pub member_id: String,
    pub member_name: String,
    pub risk_score: f64,
    pub will_delay: bool,
    pub estimated_delay_days: i64,
    pub confidence: f64,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionsData {
    pub rows: Vec<PredictionRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberInsightsData {
    pub member_id: String,
    pub member_name: String,
    #[serde(flatten)]
    pub insights: MemberInsights,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentMonthStats {
    pub month: String,
    pub total_contributions: usize,
    pub paid_contributions: usize,
    pub collected_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatsData {
    pub total_members: usize,
    pub total_contributions: usize,
    pub paid_contributions: usize,
    pub unpaid_contributions: usize,
    pub total_collected: f64,
    pub total_pending: f64,
    pub current_month: CurrentMonthStats,
    pub high_risk_members: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderHistoryStats {
    pub high_risk_reminders: usize,
    pub regular_reminders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderHistoryData {
    pub total: usize,
    pub statistics: ReminderHistoryStats,
    pub reminders: Vec<NotificationRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderPolicyView {
    pub high_risk: String,
    pub regular: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderScheduleData {
    pub job_id: String,
    pub schedule: String,
    pub reminder_time: String,
    pub next_run: String,
    pub reminder_policy: ReminderPolicyView,
    pub last_run: Option<JobRunRow>,
}
