use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Application lifecycle. Applications are never deleted; they terminate in
/// `approved` or `rejected`.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    sqlx::Type,
    ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeaveStatus {
    PendingHodApproval,
    PendingPrincipalSecretaryApproval,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }

    /// Both review stages count as "pending" wherever statuses are summarized.
    pub fn is_pending(self) -> bool {
        !self.is_terminal()
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    sqlx::Type,
    ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SalaryPaymentPreference {
    BankAccount,
    Address,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveApplication {
    pub id: u64,
    pub applicant_id: u64,
    pub leave_type_id: u64,
    pub subject: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// Working days in the range, weekends excluded.
    pub days_requested: u32,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_leave_from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_leave_to: Option<NaiveDate>,
    pub contact_info: String,
    pub salary_payment_preference: SalaryPaymentPreference,
    pub salary_payment_address: Option<String>,
    pub permission_note_country: Option<String>,
    pub person_handling_duties_id: Option<u64>,
    pub status: LeaveStatus,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_comments: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveApplication {
    /// Approved and the range contains `today`.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved
            && self.start_date <= today
            && self.end_date >= today
    }

    /// Approved and starting after `today`.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.start_date > today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn application(status: LeaveStatus) -> LeaveApplication {
        LeaveApplication {
            id: 1,
            applicant_id: 10,
            leave_type_id: 1,
            subject: None,
            start_date: ymd(2026, 3, 2),
            end_date: ymd(2026, 3, 6),
            days_requested: 5,
            last_leave_from: None,
            last_leave_to: None,
            contact_info: "0712345678".into(),
            salary_payment_preference: SalaryPaymentPreference::BankAccount,
            salary_payment_address: None,
            permission_note_country: None,
            person_handling_duties_id: None,
            status,
            approved_by: None,
            decided_at: None,
            decision_comments: None,
            created_at: None,
        }
    }

    #[test]
    fn status_wire_names_are_snake_case() {
        let value = serde_json::to_value(LeaveStatus::PendingPrincipalSecretaryApproval).unwrap();
        assert_eq!(value, serde_json::json!("pending_principal_secretary_approval"));
        let parsed: LeaveStatus = serde_json::from_str("\"pending_hod_approval\"").unwrap();
        assert_eq!(parsed, LeaveStatus::PendingHodApproval);
    }

    #[test]
    fn pending_aggregates_both_review_stages() {
        assert!(LeaveStatus::PendingHodApproval.is_pending());
        assert!(LeaveStatus::PendingPrincipalSecretaryApproval.is_pending());
        assert!(!LeaveStatus::Approved.is_pending());
        assert!(LeaveStatus::Rejected.is_terminal());
    }

    #[test]
    fn current_and_upcoming_need_approval() {
        let approved = application(LeaveStatus::Approved);
        assert!(approved.is_current(ymd(2026, 3, 4)));
        assert!(!approved.is_current(ymd(2026, 3, 9)));
        assert!(approved.is_upcoming(ymd(2026, 2, 20)));

        let pending = application(LeaveStatus::PendingHodApproval);
        assert!(!pending.is_current(ymd(2026, 3, 4)));
        assert!(!pending.is_upcoming(ymd(2026, 2, 20)));
    }
}
