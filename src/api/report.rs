use crate::auth::auth::AuthUser;
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

fn internal(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Report query failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

#[derive(Serialize, ToSchema)]
pub struct ReportStat {
    pub icon: String,
    pub title: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub progress: f64,
    pub trend: String,
    pub icon_bg_color: String,
    pub icon_color: String,
}

fn avg_hours(rows: &[(i64, i64, Option<String>)]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let total_ms: i64 = rows.iter().map(|(work, _, _)| work).sum();
    total_ms as f64 / rows.len() as f64 / 3_600_000.0
}

/// Headline cards for the reports page, this month vs last month
#[utoipa::path(
    get,
    path = "/api/reports/stats",
    responses(
        (status = 200, description = "Report cards", body = [ReportStat]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let pool = pool.get_ref();
    let today = Local::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);
    let last_month_end = month_start - Duration::days(1);
    let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);

    let fetch_range = |from: NaiveDate, to: NaiveDate| {
        sqlx::query_as::<_, (i64, i64, Option<String>)>(
            r#"
            SELECT work_duration_ms, overtime_ms, status
            FROM attendance
            WHERE date >= ? AND date <= ?
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
    };
    let this_month = fetch_range(month_start, today).await.map_err(internal)?;
    let last_month = fetch_range(last_month_start, last_month_end)
        .await
        .map_err(internal)?;

    let this_avg = avg_hours(&this_month);
    let last_avg = avg_hours(&last_month);

    let trend = if last_avg > 0.0 {
        let change = (this_avg - last_avg) / last_avg * 100.0;
        format!("{}{:.1}%", if change >= 0.0 { "+" } else { "" }, change)
    } else if this_avg > 0.0 {
        "+100.0%".to_string()
    } else {
        "+0.0%".to_string()
    };
    let trend_text = format!("{trend} vs last month");

    let total_employees =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role_id = ?")
            .bind(Role::Employee.id())
            .fetch_one(pool)
            .await
            .map_err(internal)?;

    let total_overtime: f64 =
        this_month.iter().map(|(_, over, _)| *over).sum::<i64>() as f64 / 3_600_000.0;
    let total_lates = this_month
        .iter()
        .filter(|(_, _, status)| status.as_deref() == Some("Late"))
        .count() as i64;

    let stats = vec![
        ReportStat {
            icon: "schedule".to_string(),
            title: "Avg. Working Hours".to_string(),
            value: serde_json::json!(format!("{this_avg:.2}h")),
            progress: this_avg / 9.0 * 100.0,
            trend: trend_text,
            icon_bg_color: "bg-blue-300".to_string(),
            icon_color: "text-blue-800".to_string(),
        },
        ReportStat {
            icon: "groups".to_string(),
            title: "Total Employees".to_string(),
            value: serde_json::json!(total_employees),
            progress: 100.0,
            trend: "All active employees".to_string(),
            icon_bg_color: "bg-green-300".to_string(),
            icon_color: "text-green-800".to_string(),
        },
        ReportStat {
            icon: "hourglass_bottom".to_string(),
            title: "Total Overtime".to_string(),
            value: serde_json::json!(format!("{total_overtime:.2}h")),
            progress: total_overtime / 50.0 * 100.0,
            trend: "This month".to_string(),
            icon_bg_color: "bg-pink-300".to_string(),
            icon_color: "text-pink-800".to_string(),
        },
        ReportStat {
            icon: "running_with_errors".to_string(),
            title: "Total Lates".to_string(),
            value: serde_json::json!(total_lates),
            progress: total_lates as f64 / 30.0 * 100.0,
            trend: "This month".to_string(),
            icon_bg_color: "bg-yellow-300".to_string(),
            icon_color: "text-yellow-800".to_string(),
        },
    ];

    Ok(HttpResponse::Ok().json(stats))
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceChart {
    pub labels: Vec<&'static str>,
    pub present: Vec<i64>,
    pub absent: Vec<i64>,
}

/// Present/absent counts per month for the current year
#[utoipa::path(
    get,
    path = "/api/reports/attendance-chart",
    responses(
        (status = 200, description = "Chart series", body = AttendanceChart),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn attendance_chart(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let year = Local::now().year();
    let rows = sqlx::query_as::<_, (i32, i64, i64)>(
        r#"
        SELECT MONTH(date) AS m,
               CAST(SUM(status IN ('Present', 'Late')) AS SIGNED) AS present,
               CAST(SUM(status = 'Absent') AS SIGNED) AS absent
        FROM attendance
        WHERE YEAR(date) = ?
        GROUP BY m
        ORDER BY m
        "#,
    )
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(internal)?;

    let mut present = vec![0i64; 12];
    let mut absent = vec![0i64; 12];
    for (month, p, a) in rows {
        if (1..=12).contains(&month) {
            present[(month - 1) as usize] = p;
            absent[(month - 1) as usize] = a;
        }
    }

    Ok(HttpResponse::Ok().json(AttendanceChart {
        labels: vec![
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ],
        present,
        absent,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct ReportEmployee {
    pub name: String,
    pub avatar: String,
    pub role: String,
    pub employee_code: String,
    pub email: String,
    pub department: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportRecord {
    pub id: u64,
    pub employee: ReportEmployee,
    #[schema(example = "03/02/2026")]
    pub date: String,
    pub check_in: String,
    pub check_out: String,
    pub status: Option<String>,
    #[serde(rename = "break")]
    pub break_time: String,
    pub late: String,
    pub overtime: String,
    /// Worked hours as a raw number for the production column.
    pub production: f64,
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: u64,
    date: NaiveDate,
    clock_in_time: Option<NaiveDateTime>,
    clock_out_time: Option<NaiveDateTime>,
    status: Option<String>,
    work_duration_ms: i64,
    overtime_ms: i64,
    total_break_ms: i64,
    name: String,
    avatar: String,
    role_id: u8,
    employee_code: String,
    email: String,
    department: String,
}

/// Latest 100 attendance rows for the reports table, super admins excluded
#[utoipa::path(
    get,
    path = "/api/reports/attendance-records",
    responses(
        (status = 200, description = "Formatted records", body = [ReportRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn attendance_records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, ReportRow>(
        r#"
        SELECT a.id, a.date, a.clock_in_time, a.clock_out_time, a.status,
               a.work_duration_ms, a.overtime_ms, a.total_break_ms,
               u.name, u.avatar, u.role_id, u.employee_code, u.email, u.department
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE u.role_id <> ?
        ORDER BY a.date DESC
        LIMIT 100
        "#,
    )
    .bind(Role::SuperAdmin.id())
    .fetch_all(pool.get_ref())
    .await
    .map_err(internal)?;

    let format_time = |t: Option<NaiveDateTime>| {
        t.map(|t| t.format("%I:%M:%S %p").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    let records: Vec<ReportRecord> = rows
        .into_iter()
        .map(|row| ReportRecord {
            id: row.id,
            employee: ReportEmployee {
                name: row.name,
                avatar: row.avatar,
                role: Role::from_id(row.role_id)
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_else(|| Role::Employee.as_str().to_string()),
                employee_code: row.employee_code,
                email: row.email,
                department: row.department,
            },
            date: row.date.format("%m/%d/%Y").to_string(),
            check_in: format_time(row.clock_in_time),
            check_out: format_time(row.clock_out_time),
            late: if row.status.as_deref() == Some("Late") {
                "Yes"
            } else {
                "No"
            }
            .to_string(),
            status: row.status,
            break_time: format!("{} min", row.total_break_ms / 60_000),
            overtime: if row.overtime_ms > 0 {
                format!("{:.2} hrs", row.overtime_ms as f64 / 3_600_000.0)
            } else {
                "0 hrs".to_string()
            },
            production: if row.work_duration_ms > 0 {
                row.work_duration_ms as f64 / 3_600_000.0
            } else {
                0.0
            },
        })
        .collect();

    Ok(HttpResponse::Ok().json(records))
}
