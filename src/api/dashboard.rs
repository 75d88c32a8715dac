use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceStatus;
use crate::model::notification::NotificationResponse;
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

fn internal(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Dashboard query failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentStat {
    pub name: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeType {
    pub name: String,
    pub value: i64,
    pub percentage: f64,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeStatus {
    pub total: i64,
    pub types: Vec<EmployeeType>,
}

#[derive(Serialize, ToSchema)]
pub struct MostPunctual {
    pub name: String,
    pub avatar: String,
    pub role: String,
    pub lates: i64,
    /// Average break length in minutes over the window.
    pub avg_break: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ClockFeedEntry {
    pub name: String,
    pub avatar: String,
    pub role: String,
    #[schema(example = "09:01 AM")]
    pub time: String,
    /// "in" while the cycle is open, "out" once clocked out.
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct OverviewSlice {
    pub status: String,
    pub percentage: f64,
    pub color: String,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceOverview {
    pub total: i64,
    pub stats: Vec<OverviewSlice>,
}

#[derive(Serialize, ToSchema)]
pub struct AdminDashboard {
    pub total_employees: i64,
    pub attendance_today_count: i64,
    pub on_leave_count: i64,
    pub pending_requests_count: i64,
    pub departments: Vec<DepartmentStat>,
    pub employee_status: EmployeeStatus,
    pub most_punctual: MostPunctual,
    pub clock_in_outs: Vec<ClockFeedEntry>,
    pub attendance_overview: AttendanceOverview,
}

fn role_name(role_id: u8) -> String {
    Role::from_id(role_id)
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| Role::Employee.as_str().to_string())
}

/// A NULL status is a completed cycle (clock-out resets it in place), not an
/// absence; only an explicit Absent row is excluded from attendance counts.
fn counts_as_attendance(status: Option<&str>) -> bool {
    status != Some(AttendanceStatus::Absent.as_str())
}

/// Aggregate stats behind the admin dashboard; employee population only
#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    responses(
        (status = 200, description = "Dashboard stats", body = AdminDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn admin_dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let pool = pool.get_ref();
    let today = Local::now().date_naive();
    let employee_role = Role::Employee.id();

    let total_employees =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role_id = ?")
            .bind(employee_role)
            .fetch_one(pool)
            .await
            .map_err(internal)?;

    let today_statuses = sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT a.status FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ? AND u.role_id = ?
        "#,
    )
    .bind(today)
    .bind(employee_role)
    .fetch_all(pool)
    .await
    .map_err(internal)?;
    let attendance_today_count = today_statuses
        .iter()
        .filter(|s| counts_as_attendance(s.as_deref()))
        .count() as i64;

    let on_leave_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role_id = ? AND status = 'On Leave'",
    )
    .bind(employee_role)
    .fetch_one(pool)
    .await
    .map_err(internal)?;

    let pending_requests_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leave_requests l
        JOIN users u ON u.id = l.user_id
        WHERE l.status = 'Pending' AND u.role_id = ?
        "#,
    )
    .bind(employee_role)
    .fetch_one(pool)
    .await
    .map_err(internal)?;

    let dept_rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT department, COUNT(*) AS cnt
        FROM users
        WHERE role_id = ?
        GROUP BY department
        ORDER BY cnt DESC
        "#,
    )
    .bind(employee_role)
    .fetch_all(pool)
    .await
    .map_err(internal)?;

    let dept_total: i64 = dept_rows.iter().map(|(_, c)| c).sum();
    let departments = dept_rows
        .into_iter()
        .map(|(name, count)| DepartmentStat {
            name,
            count,
            percentage: if dept_total > 0 {
                count as f64 / dept_total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    let employee_status = EmployeeStatus {
        total: total_employees,
        types: vec![EmployeeType {
            name: "Fulltime".to_string(),
            value: total_employees,
            percentage: 100.0,
        }],
    };

    // Fewest lates over the last 30 days, ties broken by shortest breaks.
    let window_start = today - Duration::days(30);
    let punctual_row = sqlx::query_as::<_, (String, String, u8, i64, i64)>(
        r#"
        SELECT u.name, u.avatar, u.role_id,
               CAST(COALESCE(SUM(a.status = 'Late'), 0) AS SIGNED) AS lates,
               CAST(COALESCE(AVG(a.total_break_ms), 0) / 60000 AS SIGNED) AS avg_break
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date >= ? AND (a.status IS NULL OR a.status <> 'Absent') AND u.role_id = ?
        GROUP BY a.user_id, u.name, u.avatar, u.role_id
        ORDER BY lates ASC, avg_break ASC
        LIMIT 1
        "#,
    )
    .bind(window_start)
    .bind(employee_role)
    .fetch_optional(pool)
    .await
    .map_err(internal)?;

    let most_punctual = match punctual_row {
        Some((name, avatar, role_id, lates, avg_break)) => MostPunctual {
            name,
            avatar,
            role: role_name(role_id),
            lates,
            avg_break,
        },
        None => {
            let any = sqlx::query_as::<_, (String, String)>(
                "SELECT name, avatar FROM users WHERE role_id = ? LIMIT 1",
            )
            .bind(employee_role)
            .fetch_optional(pool)
            .await
            .map_err(internal)?;
            match any {
                Some((name, avatar)) => MostPunctual {
                    name,
                    avatar,
                    role: Role::Employee.as_str().to_string(),
                    lates: 0,
                    avg_break: 0,
                },
                None => MostPunctual {
                    name: "N/A".to_string(),
                    avatar: "https://i.pravatar.cc/150".to_string(),
                    role: Role::Employee.as_str().to_string(),
                    lates: 0,
                    avg_break: 0,
                },
            }
        }
    };

    // Today's feed covers admins and employees, never super admins.
    let feed_rows = sqlx::query_as::<
        _,
        (String, String, u8, Option<NaiveDateTime>, Option<NaiveDateTime>),
    >(
        r#"
        SELECT u.name, u.avatar, u.role_id, a.clock_in_time, a.clock_out_time
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ? AND a.clock_in_time IS NOT NULL AND u.role_id IN (?, ?)
        ORDER BY a.clock_in_time DESC
        LIMIT 5
        "#,
    )
    .bind(today)
    .bind(Role::Admin.id())
    .bind(employee_role)
    .fetch_all(pool)
    .await
    .map_err(internal)?;

    let clock_in_outs = feed_rows
        .into_iter()
        .map(|(name, avatar, role_id, clock_in, clock_out)| ClockFeedEntry {
            name,
            avatar,
            role: role_name(role_id),
            time: clock_in
                .map(|t| t.format("%I:%M %p").to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: if clock_out.is_some() { "out" } else { "in" }.to_string(),
        })
        .collect();

    let count_today = |status: &'static str| {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM attendance a
            JOIN users u ON u.id = a.user_id
            WHERE a.date = ? AND a.status = ? AND u.role_id = ?
            "#,
        )
        .bind(today)
        .bind(status)
        .bind(employee_role)
        .fetch_one(pool)
    };
    let total_present = count_today("Present").await.map_err(internal)?;
    let total_late = count_today("Late").await.map_err(internal)?;
    let total_absent = total_employees - (total_present + total_late);

    let slice = |status: &str, count: i64, color: &str| OverviewSlice {
        status: status.to_string(),
        percentage: if total_employees > 0 {
            count as f64 / total_employees as f64 * 100.0
        } else {
            0.0
        },
        color: color.to_string(),
    };
    let attendance_overview = AttendanceOverview {
        total: total_employees,
        stats: vec![
            slice("Present", total_present, "text-green-500"),
            slice("Late", total_late, "text-yellow-500"),
            slice("Absent", total_absent, "text-red-500"),
        ]
        .into_iter()
        .filter(|s| s.percentage > 0.0)
        .collect(),
    };

    Ok(HttpResponse::Ok().json(AdminDashboard {
        total_employees,
        attendance_today_count,
        on_leave_count,
        pending_requests_count,
        departments,
        employee_status,
        most_punctual,
        clock_in_outs,
        attendance_overview,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct SuperAdminDashboard {
    pub total_admins: i64,
    pub total_employees: i64,
    pub attendance_today_count: i64,
    pub pending_requests_count: i64,
    /// Most recent notifications across the whole company.
    pub activities: Vec<NotificationResponse>,
}

/// Company-wide stats behind the super admin dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard/super-admin",
    responses(
        (status = 200, description = "Dashboard stats", body = SuperAdminDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn super_admin_dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_super_admin()?;

    let pool = pool.get_ref();
    let today = Local::now().date_naive();

    let count_role = |role: Role| {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role_id = ?")
            .bind(role.id())
            .fetch_one(pool)
    };
    let total_admins = count_role(Role::Admin).await.map_err(internal)?;
    let total_employees = count_role(Role::Employee).await.map_err(internal)?;

    let today_statuses =
        sqlx::query_scalar::<_, Option<String>>("SELECT status FROM attendance WHERE date = ?")
            .bind(today)
            .fetch_all(pool)
            .await
            .map_err(internal)?;
    let attendance_today_count = today_statuses
        .iter()
        .filter(|s| counts_as_attendance(s.as_deref()))
        .count() as i64;

    let pending_requests_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests WHERE status = 'Pending'")
            .fetch_one(pool)
            .await
            .map_err(internal)?;

    let activities = sqlx::query_as::<_, NotificationResponse>(
        r#"
        SELECT id, user_id, text, kind, link, is_read, created_at
        FROM notifications
        ORDER BY created_at DESC
        LIMIT 7
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(internal)?;

    Ok(HttpResponse::Ok().json(SuperAdminDashboard {
        total_admins,
        total_employees,
        attendance_today_count,
        pending_requests_count,
        activities,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_day_still_counts_as_attendance() {
        // Clock-out resets the stored status to NULL; that row is a worked
        // day, not an absence.
        assert!(counts_as_attendance(None));
        assert!(counts_as_attendance(Some("Present")));
        assert!(counts_as_attendance(Some("Late")));
        assert!(!counts_as_attendance(Some("Absent")));
    }

    #[test]
    fn today_count_skips_only_absent_rows() {
        let statuses: Vec<Option<String>> = vec![
            Some("Present".to_string()),
            Some("Late".to_string()),
            None,
            Some("Absent".to_string()),
        ];
        let count = statuses
            .iter()
            .filter(|s| counts_as_attendance(s.as_deref()))
            .count();
        assert_eq!(count, 3);
    }
}
