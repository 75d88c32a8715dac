use crate::api::attendance::{ActionReq, ActionResponse, HistoryEntry, HourStats, HoursBucket};
use crate::api::dashboard::{
    AdminDashboard, AttendanceOverview, ClockFeedEntry, DepartmentStat, EmployeeStatus,
    EmployeeType, MostPunctual, OverviewSlice, SuperAdminDashboard,
};
use crate::api::fun::StreakResponse;
use crate::api::leave::{
    AdminCreateLeave, CreateLeave, LeaveStats, LeaveTypeTaken, LeaveTypeUsage, UpdateLeaveStatus,
};
use crate::api::report::{AttendanceChart, ReportEmployee, ReportRecord, ReportStat};
use crate::api::scanner::ScanReq;
use crate::api::settings::{AppSettings, UpdateAppSettings, UpdateCompanySettings};
use crate::api::user::{
    BulkCreateUsers, BulkError, ChangePassword, CreateUser, UpdateProfile, UpdateUser,
};
use crate::auth::handlers::LoginResponse;
use crate::engine::day_cycle::{ClockState, StatusView};
use crate::model::attendance::AttendanceStatus;
use crate::model::leave::{LeaveResponse, LeaveStatus, LeaveType, LeaveWithUser};
use crate::model::notification::NotificationResponse;
use crate::model::policy::{CompanyPolicy, DateOverride, Holiday, LeavePolicies, WorkingHours};
use crate::model::user::UserResponse;
use crate::models::LoginReqDto;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Leave Management API",
        version = "1.0.0",
        description = r#"
## Employee Attendance & Leave Management

Backend for a company attendance system: daily clock-in/out with breaks,
late detection against company policy, leave requests with approval
workflow, notifications and dashboards for three roles (super admin,
admin, employee), plus a hardware badge-scanner entry point.

### 🔹 Key Features
- **Attendance**
  - Clock-in / break / clock-out day cycle with per-day records
  - Late detection from configurable working hours, grace period, date overrides and holidays
- **Leave Management**
  - Request, approve/reject, balances against company leave policies
- **Dashboards & Reports**
  - Admin and super admin stats, monthly charts, formatted record tables
- **Scanner**
  - Clock-in by employee badge code, authenticated with a pre-shared API key

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
The scanner endpoint uses an `x-api-key` header instead.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::attendance::get_status,
        crate::api::attendance::clock_action,
        crate::api::attendance::history,
        crate::api::attendance::hour_stats,

        crate::api::scanner::handle_scan,

        crate::api::leave::list_leaves,
        crate::api::leave::create_leave,
        crate::api::leave::admin_create_leave,
        crate::api::leave::update_leave_status,
        crate::api::leave::my_requests,
        crate::api::leave::leave_stats,
        crate::api::leave::leave_balance,
        crate::api::leave::employee_leave_balance,

        crate::api::notification::list_notifications,
        crate::api::notification::mark_as_read,
        crate::api::notification::mark_all_as_read,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::bulk_create_users,
        crate::api::user::update_user,
        crate::api::user::delete_user,
        crate::api::user::update_profile,
        crate::api::user::change_password,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,
        crate::api::settings::get_company_settings,
        crate::api::settings::update_company_settings,

        crate::api::dashboard::admin_dashboard,
        crate::api::dashboard::super_admin_dashboard,

        crate::api::report::report_stats,
        crate::api::report::attendance_chart,
        crate::api::report::attendance_records,

        crate::api::fun::attendance_streak,
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserResponse,
            ActionReq,
            ActionResponse,
            ClockState,
            StatusView,
            AttendanceStatus,
            HistoryEntry,
            HoursBucket,
            HourStats,
            ScanReq,
            LeaveType,
            LeaveStatus,
            LeaveResponse,
            LeaveWithUser,
            CreateLeave,
            AdminCreateLeave,
            UpdateLeaveStatus,
            LeaveTypeUsage,
            LeaveTypeTaken,
            LeaveStats,
            NotificationResponse,
            CreateUser,
            BulkCreateUsers,
            BulkError,
            UpdateUser,
            UpdateProfile,
            ChangePassword,
            AppSettings,
            UpdateAppSettings,
            CompanyPolicy,
            UpdateCompanySettings,
            WorkingHours,
            DateOverride,
            Holiday,
            LeavePolicies,
            AdminDashboard,
            SuperAdminDashboard,
            DepartmentStat,
            EmployeeStatus,
            EmployeeType,
            MostPunctual,
            ClockFeedEntry,
            AttendanceOverview,
            OverviewSlice,
            ReportStat,
            AttendanceChart,
            ReportRecord,
            ReportEmployee,
            StreakResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and session APIs"),
        (name = "Attendance", description = "Clock-in/out day cycle APIs"),
        (name = "Scanner", description = "Badge scanner clock-in"),
        (name = "Leave", description = "Leave request and balance APIs"),
        (name = "Notifications", description = "In-app notification APIs"),
        (name = "Users", description = "User management APIs"),
        (name = "Settings", description = "Application and company policy settings"),
        (name = "Dashboard", description = "Role dashboards"),
        (name = "Reports", description = "Attendance reporting APIs"),
        (name = "Fun", description = "Attendance streaks"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
