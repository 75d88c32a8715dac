use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum LeaveType {
    #[serde(rename = "Annual Leave")]
    Annual,
    #[serde(rename = "Medical Leave")]
    Medical,
    #[serde(rename = "Other")]
    Other,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "Annual Leave",
            LeaveType::Medical => "Medical Leave",
            LeaveType::Other => "Other",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveResponse {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "Annual Leave")]
    pub leave_type: String,
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(example = "2026-03-04", value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub days: i64,
    pub reason: String,
    #[schema(example = "Pending")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Leave row joined with the requesting user's public fields, for the admin
/// list view.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveWithUser {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    #[schema(value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub days: i64,
    pub reason: String,
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    pub user_name: String,
    pub user_role_id: u8,
    pub user_avatar: String,
    pub user_employee_code: String,
    pub user_email: String,
    pub user_department: String,
}
