use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Full `users` row, password hash included. Never serialized directly;
/// handlers map it to [`UserResponse`].
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub avatar: String,
    pub employee_code: String,
    pub department: String,
    pub phone: Option<String>,
    pub report_to: String,
    pub status: String,
    pub joined_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Jane Doe",
    "email": "jane.doe@company.com",
    "role_id": 3,
    "avatar": "https://i.pravatar.cc/150",
    "employee_code": "EMP-001",
    "department": "Engineering",
    "phone": "+8801712345678",
    "report_to": "Admin",
    "status": "Active",
    "joined_on": "2026-01-01T00:00:00Z"
}))]
pub struct UserResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role_id: u8,
    pub avatar: String,
    pub employee_code: String,
    pub department: String,
    pub phone: Option<String>,
    pub report_to: String,
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub joined_on: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        UserResponse {
            id: row.id,
            name: row.name,
            email: row.email,
            role_id: row.role_id,
            avatar: row.avatar,
            employee_code: row.employee_code,
            department: row.department,
            phone: row.phone,
            report_to: row.report_to,
            status: row.status,
            joined_on: row.joined_on,
        }
    }
}
