use crate::auth::auth::AuthUser;
use crate::model::leave::{LeaveResponse, LeaveStatus, LeaveType, LeaveWithUser};
use crate::model::notification::{NotificationDraft, NotificationKind};
use crate::model::role::Role;
use crate::utils::store;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Annual Leave")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(example = "2026-03-04", value_type = String, format = "date")]
    pub to_date: NaiveDate,
    #[schema(example = 3)]
    pub days: i64,
    #[schema(example = "Family trip")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AdminCreateLeave {
    /// The employee the leave is filed for.
    pub user_id: u64,
    #[serde(flatten)]
    pub leave: CreateLeave,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = "Approved")]
    pub status: LeaveStatus,
}

fn internal(context: &'static str) -> impl Fn(sqlx::Error) -> actix_web::Error {
    move |e| {
        tracing::error!(error = %e, context, "Leave query failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    }
}

fn validate(leave: &CreateLeave) -> Option<&'static str> {
    if leave.from_date > leave.to_date {
        return Some("from_date cannot be after to_date");
    }
    if leave.days <= 0 {
        return Some("days must be positive");
    }
    if leave.reason.trim().is_empty() {
        return Some("reason is required");
    }
    None
}

async fn insert_leave(
    pool: &MySqlPool,
    user_id: u64,
    leave: &CreateLeave,
    status: LeaveStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, leave_type, from_date, to_date, days, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(leave.leave_type.as_str())
    .bind(leave.from_date)
    .bind(leave.to_date)
    .bind(leave.days)
    .bind(leave.reason.trim())
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// All leave requests with requester details (admin view)
#[utoipa::path(
    get,
    path = "/api/leaves",
    responses(
        (status = 200, description = "Leave requests", body = [LeaveWithUser]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leaves = sqlx::query_as::<_, LeaveWithUser>(
        r#"
        SELECT l.id, l.user_id, l.leave_type, l.from_date, l.to_date, l.days,
               l.reason, l.status, l.created_at,
               u.name AS user_name, u.role_id AS user_role_id, u.avatar AS user_avatar,
               u.employee_code AS user_employee_code, u.email AS user_email,
               u.department AS user_department
        FROM leave_requests l
        INNER JOIN users u ON u.id = l.user_id
        ORDER BY l.created_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(internal("list"))?;

    Ok(HttpResponse::Ok().json(leaves))
}

/// File a leave request for yourself
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Submitted", body = Object,
         example = json!({"message": "Leave request submitted", "status": "Pending"})),
        (status = 400, description = "Invalid dates, days or reason"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if let Some(reason) = validate(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": reason })));
    }

    insert_leave(pool.get_ref(), auth.user_id, &payload, LeaveStatus::Pending)
        .await
        .map_err(internal("create"))?;

    // Both role slots hear about a new request.
    let mut drafts = Vec::new();
    for role in [Role::Admin, Role::SuperAdmin] {
        match store::first_user_with_role(pool.get_ref(), role).await {
            Ok(Some((user_id, _))) => drafts.push(NotificationDraft {
                user_id,
                text: format!("New leave request from {}.", auth.name),
                kind: NotificationKind::Leave,
                link: "/Leave Requests",
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Role lookup failed for leave notification"),
        }
    }
    store::push_notifications(pool.get_ref(), drafts).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": LeaveStatus::Pending.as_str()
    })))
}

/// File a pre-approved leave for an employee (admin)
#[utoipa::path(
    post,
    path = "/api/leaves/admin",
    request_body = AdminCreateLeave,
    responses(
        (status = 201, description = "Created approved"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn admin_create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AdminCreateLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Some(reason) = validate(&payload.leave) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": reason })));
    }

    insert_leave(
        pool.get_ref(),
        payload.user_id,
        &payload.leave,
        LeaveStatus::Approved,
    )
    .await
    .map_err(internal("admin create"))?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave created",
        "status": LeaveStatus::Approved.as_str()
    })))
}

/// Approve or reject a pending request (admin)
#[utoipa::path(
    put,
    path = "/api/leaves/{id}/status",
    params(("id" = u64, Path, description = "Leave request id")),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Updated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, (u64, i64, NaiveDate)>(
        "SELECT user_id, days, from_date FROM leave_requests WHERE id = ?",
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(internal("status lookup"))?;

    let Some((owner_id, days, from_date)) = leave else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        })));
    };

    sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
        .bind(payload.status.as_str())
        .bind(leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(internal("status update"))?;

    let verdict = payload.status.as_str().to_lowercase();
    let mut drafts = vec![NotificationDraft {
        user_id: owner_id,
        text: format!(
            "Your leave request for {days} day(s) from {} has been {verdict}.",
            from_date.format("%B %-d, %Y")
        ),
        kind: NotificationKind::Leave,
        link: "/Leave Request",
    }];

    match store::first_user_with_role(pool.get_ref(), Role::SuperAdmin).await {
        Ok(Some((super_admin_id, _))) => {
            let employee_name =
                sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
                    .bind(owner_id)
                    .fetch_optional(pool.get_ref())
                    .await
                    .unwrap_or(None)
                    .unwrap_or_else(|| "an employee".to_string());
            drafts.push(NotificationDraft {
                user_id: super_admin_id,
                text: format!("Leave request for {employee_name} was {verdict} by an admin."),
                kind: NotificationKind::Leave,
                link: "/Leave Requests",
            });
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Super admin lookup failed for leave notification"),
    }
    store::push_notifications(pool.get_ref(), drafts).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {verdict}")
    })))
}

/// Leave requests of the logged-in user
#[utoipa::path(
    get,
    path = "/api/leaves/my-requests",
    responses(
        (status = 200, description = "Own requests", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let leaves = sqlx::query_as::<_, LeaveResponse>(
        r#"
        SELECT id, user_id, leave_type, from_date, to_date, days, reason, status, created_at
        FROM leave_requests
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(internal("my requests"))?;

    Ok(HttpResponse::Ok().json(leaves))
}

#[derive(Serialize, ToSchema)]
pub struct LeaveTypeUsage {
    #[serde(rename = "type")]
    #[schema(example = "Annual Leave")]
    pub leave_type: &'static str,
    pub total: i64,
    pub used: i64,
    /// Frontend accent class carried through from the dashboard design.
    pub color: &'static str,
}

/// Stats-card variant of the breakdown; the dashboard reads `taken` here
/// where the balance endpoints read `used`.
#[derive(Serialize, ToSchema)]
pub struct LeaveTypeTaken {
    #[serde(rename = "type")]
    #[schema(example = "Annual Leave")]
    pub leave_type: &'static str,
    pub total: i64,
    pub taken: i64,
    pub color: &'static str,
}

impl From<LeaveTypeUsage> for LeaveTypeTaken {
    fn from(usage: LeaveTypeUsage) -> Self {
        LeaveTypeTaken {
            leave_type: usage.leave_type,
            total: usage.total,
            taken: usage.used,
            color: usage.color,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveStats {
    pub total_allowed: i64,
    pub taken: i64,
    pub pending: i64,
    pub available: i64,
    pub breakdown: Vec<LeaveTypeTaken>,
}

async fn fetch_user_leaves(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Vec<(String, String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String, i64)>(
        "SELECT leave_type, status, days FROM leave_requests WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

fn sum_days(leaves: &[(String, String, i64)], status: LeaveStatus) -> i64 {
    leaves
        .iter()
        .filter(|(_, s, _)| s == status.as_str())
        .map(|(_, _, days)| days)
        .sum()
}

fn usage_breakdown(
    leaves: &[(String, String, i64)],
    policy: &crate::model::policy::LeavePolicies,
) -> Vec<LeaveTypeUsage> {
    let used_for = |leave_type: LeaveType| {
        leaves
            .iter()
            .filter(|(t, s, _)| t == leave_type.as_str() && s == LeaveStatus::Approved.as_str())
            .map(|(_, _, days)| days)
            .sum()
    };
    vec![
        LeaveTypeUsage {
            leave_type: LeaveType::Annual.as_str(),
            total: policy.annual,
            used: used_for(LeaveType::Annual),
            color: "bg-blue-500",
        },
        LeaveTypeUsage {
            leave_type: LeaveType::Medical.as_str(),
            total: policy.medical,
            used: used_for(LeaveType::Medical),
            color: "bg-green-500",
        },
        LeaveTypeUsage {
            leave_type: LeaveType::Other.as_str(),
            total: policy.other,
            used: used_for(LeaveType::Other),
            color: "bg-yellow-500",
        },
    ]
}

/// Allowance usage summary for the logged-in user
#[utoipa::path(
    get,
    path = "/api/leaves/stats",
    responses(
        (status = 200, description = "Usage against policy allowances", body = LeaveStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let policy = store::fetch_policy(pool.get_ref())
        .await
        .map_err(internal("stats policy"))?;
    let leaves = fetch_user_leaves(pool.get_ref(), auth.user_id)
        .await
        .map_err(internal("stats leaves"))?;

    let policies = &policy.leave_policies;
    let total_allowed = policies.annual + policies.medical + policies.other;
    let taken = sum_days(&leaves, LeaveStatus::Approved);
    let pending = sum_days(&leaves, LeaveStatus::Pending);

    Ok(HttpResponse::Ok().json(LeaveStats {
        total_allowed,
        taken,
        pending,
        available: total_allowed - taken,
        breakdown: usage_breakdown(&leaves, policies)
            .into_iter()
            .map(LeaveTypeTaken::from)
            .collect(),
    }))
}

async fn balance_response(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Vec<LeaveTypeUsage>, actix_web::Error> {
    let policy = store::fetch_policy(pool)
        .await
        .map_err(internal("balance policy"))?;
    let leaves = fetch_user_leaves(pool, user_id)
        .await
        .map_err(internal("balance leaves"))?;
    Ok(usage_breakdown(&leaves, &policy.leave_policies))
}

/// Per-type leave balance for the logged-in user
#[utoipa::path(
    get,
    path = "/api/leaves/balance",
    responses(
        (status = 200, description = "Balance per leave type", body = [LeaveTypeUsage]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let balance = balance_response(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Per-type leave balance for a specific employee (admin)
#[utoipa::path(
    get,
    path = "/api/leaves/balance/{user_id}",
    params(("user_id" = u64, Path, description = "Employee's user id")),
    responses(
        (status = 200, description = "Balance per leave type", body = [LeaveTypeUsage]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn employee_leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(internal("balance user lookup"))?;
    if exists == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "User not found"
        })));
    }

    let balance = balance_response(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::policy::LeavePolicies;

    fn row(leave_type: LeaveType, status: LeaveStatus, days: i64) -> (String, String, i64) {
        (
            leave_type.as_str().to_string(),
            status.as_str().to_string(),
            days,
        )
    }

    #[test]
    fn breakdown_sums_approved_days_per_type() {
        let leaves = vec![
            row(LeaveType::Annual, LeaveStatus::Approved, 3),
            row(LeaveType::Annual, LeaveStatus::Approved, 2),
            row(LeaveType::Annual, LeaveStatus::Pending, 4),
            row(LeaveType::Medical, LeaveStatus::Approved, 1),
            row(LeaveType::Other, LeaveStatus::Rejected, 2),
        ];
        let breakdown = usage_breakdown(&leaves, &LeavePolicies::default());

        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].leave_type, LeaveType::Annual.as_str());
        assert_eq!(breakdown[0].total, 14);
        assert_eq!(breakdown[0].used, 5);
        assert_eq!(breakdown[1].leave_type, LeaveType::Medical.as_str());
        assert_eq!(breakdown[1].total, 6);
        assert_eq!(breakdown[1].used, 1);
        assert_eq!(breakdown[2].leave_type, LeaveType::Other.as_str());
        assert_eq!(breakdown[2].total, 5);
        assert_eq!(breakdown[2].used, 0);
    }

    #[test]
    fn taken_and_pending_are_summed_separately() {
        let leaves = vec![
            row(LeaveType::Annual, LeaveStatus::Approved, 4),
            row(LeaveType::Medical, LeaveStatus::Approved, 2),
            row(LeaveType::Annual, LeaveStatus::Pending, 3),
            row(LeaveType::Other, LeaveStatus::Rejected, 5),
        ];
        assert_eq!(sum_days(&leaves, LeaveStatus::Approved), 6);
        assert_eq!(sum_days(&leaves, LeaveStatus::Pending), 3);
    }

    #[test]
    fn available_is_allowance_minus_taken() {
        let policies = LeavePolicies::default();
        let total_allowed = policies.annual + policies.medical + policies.other;
        let leaves = vec![
            row(LeaveType::Annual, LeaveStatus::Approved, 4),
            row(LeaveType::Medical, LeaveStatus::Approved, 2),
            row(LeaveType::Annual, LeaveStatus::Pending, 7),
        ];
        let taken = sum_days(&leaves, LeaveStatus::Approved);

        assert_eq!(total_allowed, 25);
        assert_eq!(total_allowed - taken, 19);
    }

    #[test]
    fn stats_breakdown_serializes_taken_and_balance_serializes_used() {
        let usage = LeaveTypeUsage {
            leave_type: LeaveType::Annual.as_str(),
            total: 14,
            used: 5,
            color: "bg-blue-500",
        };
        let balance_json = serde_json::to_value(&usage).unwrap();
        assert_eq!(balance_json["used"], 5);
        assert!(balance_json.get("taken").is_none());

        let stats_json = serde_json::to_value(LeaveTypeTaken::from(usage)).unwrap();
        assert_eq!(stats_json["taken"], 5);
        assert!(stats_json.get("used").is_none());
        assert_eq!(stats_json["type"], "Annual Leave");
    }
}
