use crate::auth::auth::AuthUser;
use crate::model::notification::NotificationResponse;
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

fn internal(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Notification query failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Newest 50 notifications addressed to the logged-in user
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Own notifications", body = [NotificationResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let notifications = sqlx::query_as::<_, NotificationResponse>(
        r#"
        SELECT id, user_id, text, kind, link, is_read, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(internal)?;

    Ok(HttpResponse::Ok().json(notifications))
}

/// Mark one of your notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = u64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not addressed to you")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_as_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    // Ownership is enforced in the WHERE clause, not by a prior read.
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(auth.user_id)
            .execute(pool.get_ref())
            .await
            .map_err(internal)?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Notification not found or not authorized"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Notification marked as read"
    })))
}

/// Mark all your notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All marked as read"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_as_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE")
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(internal)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "All notifications marked as read"
    })))
}
