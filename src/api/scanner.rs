use crate::config::Config;
use crate::engine::day_cycle::{self, ClockAction};
use crate::model::attendance::{AttendanceDay, AttendanceStatus};
use crate::model::role::Role;
use crate::utils::store::{self, SaveOutcome};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ScanReq {
    /// Badge / employee code printed on the scanned card.
    #[schema(example = "EMP-001")]
    pub employee_code: String,
}

/// Clock-in from the hardware ID scanner. Authenticated by the pre-shared
/// `x-api-key` header instead of a session; clock-in only, and unlike the
/// interactive path it rejects any second scan of the day with a friendly
/// message rather than allowing re-entry.
#[utoipa::path(
    post,
    path = "/scanner/scan",
    request_body = ScanReq,
    responses(
        (status = 200, description = "Clocked in", body = Object,
         example = json!({"success": true, "message": "Jane Doe clocked in successfully at 09:01:12 AM."})),
        (status = 400, description = "Missing code or already clocked in"),
        (status = 401, description = "Invalid API key"),
        (status = 404, description = "Unknown employee code"),
        (status = 409, description = "Concurrent update, retry")
    ),
    tag = "Scanner"
)]
pub async fn handle_scan(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ScanReq>,
) -> actix_web::Result<impl Responder> {
    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    if api_key.is_empty() || api_key != config.scanner_api_key {
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "message": "Unauthorized: Invalid API Key."
        })));
    }

    let code = payload.employee_code.trim();
    if code.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "Bad Request: employee_code is required."
        })));
    }

    let internal = |e: sqlx::Error| {
        tracing::error!(error = %e, employee_code = %code, "Scan failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    };

    let user = sqlx::query_as::<_, (u64, String, u8)>(
        "SELECT id, name, role_id FROM users WHERE employee_code = ?",
    )
    .bind(code)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(internal)?;

    let Some((user_id, name, role_id)) = user else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "message": format!("User with ID {code} not found.")
        })));
    };

    let today = Local::now().date_naive();
    let now = Local::now().naive_local();

    let row = store::fetch_attendance(pool.get_ref(), user_id, today)
        .await
        .map_err(internal)?;
    let (existing, mut day) = match row {
        Some(row) => (Some((row.id, row.version)), row.into_day()),
        None => (None, AttendanceDay::new(user_id, today)),
    };

    // Stricter than the interactive path: any earlier clock-in today blocks
    // the scan, even after a clock-out.
    if day.clock_in_time.is_some() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": format!("{name} is already clocked in for today.")
        })));
    }

    let policy = store::fetch_policy(pool.get_ref()).await.map_err(internal)?;
    let outcome = match day_cycle::apply(&mut day, ClockAction::ClockIn, now, &policy) {
        Ok(outcome) => outcome,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
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
            "success": false,
            "message": "Attendance changed concurrently, please retry."
        })));
    }

    if outcome.clock_in_status == Some(AttendanceStatus::Late) {
        if let Some(role) = Role::from_id(role_id) {
            store::notify_late_clock_in(pool.get_ref(), &name, role).await;
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("{name} clocked in successfully at {}.", now.format("%I:%M:%S %p"))
    })))
}
