use crate::auth::auth::AuthUser;
use crate::engine::day_cycle::{self, ClockAction};
use crate::model::attendance::{AttendanceDay, AttendanceStatus};
use crate::utils::store::{self, SaveOutcome};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ActionReq {
    /// One of CLOCK_IN, START_BREAK, END_BREAK, CLOCK_OUT.
    #[schema(example = "CLOCK_IN")]
    pub action: String,
}

#[derive(Serialize, ToSchema)]
pub struct ActionResponse {
    pub status: day_cycle::ClockState,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub work_start_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub break_start_time: Option<NaiveDateTime>,
}

/// Current clock state for the logged-in user
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Current display state", body = day_cycle::StatusView),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let record = store::fetch_attendance(pool.get_ref(), auth.user_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Status fetch failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .map(|row| row.into_day());

    Ok(HttpResponse::Ok().json(day_cycle::status_view(record.as_ref())))
}

/// Clock-in/out and break actions for the logged-in user
#[utoipa::path(
    post,
    path = "/api/attendance/action",
    request_body = ActionReq,
    responses(
        (status = 200, description = "New state after the action", body = ActionResponse),
        (status = 400, description = "Unknown action keyword or precondition violation",
         body = Object, example = json!({"message": "Already clocked in for today"})),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Concurrent update on the same record, retry")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_action(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ActionReq>,
) -> actix_web::Result<impl Responder> {
    let Some(action) = ClockAction::parse(&payload.action) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid action"
        })));
    };

    let today = Local::now().date_naive();
    let now = Local::now().naive_local();

    let internal = |e: sqlx::Error| {
        tracing::error!(error = %e, user_id = auth.user_id, "Clock action failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    };

    // Read-modify-write on the (user, date) record, created lazily.
    let row = store::fetch_attendance(pool.get_ref(), auth.user_id, today)
        .await
        .map_err(internal)?;
    let (existing, mut day) = match row {
        Some(row) => (Some((row.id, row.version)), row.into_day()),
        None => (None, AttendanceDay::new(auth.user_id, today)),
    };

    let policy = store::fetch_policy(pool.get_ref()).await.map_err(internal)?;

    let outcome = match day_cycle::apply(&mut day, action, now, &policy) {
        Ok(outcome) => outcome,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": e.to_string()
            })));
        }
    };

    let saved = match existing {
        Some((id, version)) => store::update_attendance(pool.get_ref(), id, version, &day)
            .await
            .map_err(internal)?,
        None => store::insert_attendance(pool.get_ref(), &day)
            .await
            .map_err(internal)?,
    };
    if saved == SaveOutcome::Conflict {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Attendance changed concurrently, please retry"
        })));
    }

    // Best-effort fan-out, after the record is durable.
    if outcome.clock_in_status == Some(AttendanceStatus::Late) {
        store::notify_late_clock_in(pool.get_ref(), &auth.name, auth.role).await;
    }

    if let Some(cycle) = outcome.completed_cycle {
        tracing::info!(
            user_id = auth.user_id,
            work_ms = cycle.work_duration_ms,
            overtime_ms = cycle.overtime_ms,
            break_ms = cycle.total_break_ms,
            "Cycle completed"
        );
    }

    Ok(HttpResponse::Ok().json(ActionResponse {
        status: outcome.state,
        work_start_time: day.clock_in_time,
        break_start_time: (action == ClockAction::StartBreak).then_some(now),
    }))
}

#[derive(Serialize, ToSchema)]
pub struct HistoryEntry {
    #[schema(example = "March 2, 2026")]
    pub date: String,
    #[schema(example = "09:01 AM")]
    pub clock_in: String,
    #[schema(example = "05:30 PM")]
    pub clock_out: String,
    #[schema(example = "8.00 hrs")]
    pub hours: String,
    #[schema(example = "Present")]
    pub status: Option<String>,
}

fn format_clock(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%I:%M %p").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Last 30 attendance records for the logged-in user, display formatted
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    responses(
        (status = 200, description = "Recent records", body = [HistoryEntry]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rows = sqlx::query_as::<
        _,
        (
            NaiveDate,
            Option<NaiveDateTime>,
            Option<NaiveDateTime>,
            i64,
            Option<String>,
        ),
    >(
        r#"
        SELECT date, clock_in_time, clock_out_time, work_duration_ms, status
        FROM attendance
        WHERE user_id = ?
        ORDER BY date DESC
        LIMIT 30
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "History fetch failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let entries: Vec<HistoryEntry> = rows
        .into_iter()
        .map(|(date, clock_in, clock_out, work_ms, status)| HistoryEntry {
            date: date.format("%B %-d, %Y").to_string(),
            clock_in: format_clock(clock_in),
            clock_out: format_clock(clock_out),
            hours: if work_ms > 0 {
                format!("{:.2} hrs", work_ms as f64 / 3_600_000.0)
            } else {
                "-".to_string()
            },
            status,
        })
        .collect();

    Ok(HttpResponse::Ok().json(entries))
}

#[derive(Serialize, Default, ToSchema)]
pub struct HoursBucket {
    /// Hours worked.
    pub worked: f64,
    /// Overtime hours.
    pub overtime: f64,
}

#[derive(Serialize, ToSchema)]
pub struct HourStats {
    pub today: HoursBucket,
    pub week: HoursBucket,
    pub month: HoursBucket,
}

/// Worked/overtime hour totals for today, this week (Mon-start) and this month
#[utoipa::path(
    get,
    path = "/api/attendance/hours",
    responses(
        (status = 200, description = "Hour totals", body = HourStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn hour_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);
    let week_start = today.week(Weekday::Mon).first_day();

    let rows = sqlx::query_as::<_, (NaiveDate, i64, i64)>(
        r#"
        SELECT date, work_duration_ms, overtime_ms
        FROM attendance
        WHERE user_id = ? AND date >= ?
        "#,
    )
    .bind(auth.user_id)
    .bind(month_start)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Hour stats fetch failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let bucket = |from: NaiveDate| {
        let (worked_ms, overtime_ms) = rows
            .iter()
            .filter(|(date, _, _)| *date >= from)
            .fold((0i64, 0i64), |(w, o), (_, work, over)| {
                (w + work, o + over)
            });
        HoursBucket {
            worked: worked_ms as f64 / 3_600_000.0,
            overtime: overtime_ms as f64 / 3_600_000.0,
        }
    };

    Ok(HttpResponse::Ok().json(HourStats {
        today: bucket(today),
        week: bucket(week_start),
        month: bucket(month_start),
    }))
}
