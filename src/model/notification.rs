use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Notification kinds; stored lowercase in the `kind` column.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NotificationKind {
    Leave,
    Attendance,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Leave => "leave",
            NotificationKind::Attendance => "attendance",
            NotificationKind::System => "system",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationResponse {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "Jane Doe (employee) was marked late.")]
    pub text: String,
    #[schema(example = "attendance")]
    pub kind: String,
    #[schema(example = "/Reports")]
    pub link: Option<String>,
    pub is_read: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A pending insert into the notification sink. Delivery is fire-and-forget;
/// a failed insert is logged and never surfaced to the caller.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub user_id: u64,
    pub text: String,
    pub kind: NotificationKind,
    pub link: &'static str,
}
