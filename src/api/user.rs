use crate::auth::auth::AuthUser;
use crate::auth::handlers::fetch_user_by_id;
use crate::auth::password::{hash_password, verify_password};
use crate::model::role::Role;
use crate::model::user::UserResponse;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

/// Admin-created accounts start with this password until changed.
const DEFAULT_PASSWORD: &str = "password123";

fn internal(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "User query failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UserFilter {
    /// Super admins may pass "ADMIN" to list admins only.
    #[schema(example = "ADMIN")]
    pub role: Option<String>,
}

/// List users visible to the requester's role
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilter),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // Super admins see admins and employees (or admins only, on request);
    // admins see employees only.
    let role_ids: &[u8] = match auth.role {
        Role::SuperAdmin if query.role.as_deref() == Some("ADMIN") => &[Role::Admin.id()],
        Role::SuperAdmin => &[Role::Admin.id(), Role::Employee.id()],
        _ => &[Role::Employee.id()],
    };

    let placeholders = vec!["?"; role_ids.len()].join(", ");
    let sql = format!(
        "SELECT id, name, email, role_id, avatar, employee_code, department, phone, \
         report_to, status, joined_on \
         FROM users WHERE role_id IN ({placeholders}) ORDER BY name"
    );
    let mut q = sqlx::query_as::<_, UserResponse>(&sql);
    for role_id in role_ids {
        q = q.bind(role_id);
    }

    let users = q.fetch_all(pool.get_ref()).await.map_err(internal)?;
    Ok(HttpResponse::Ok().json(users))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@company.com")]
    pub email: String,
    #[schema(example = 3)]
    pub role_id: u8,
    #[schema(example = "Engineering")]
    pub department: String,
    pub phone: Option<String>,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
}

async fn insert_user(pool: &MySqlPool, user: &CreateUser) -> Result<u64, String> {
    let hashed = hash_password(DEFAULT_PASSWORD).map_err(|e| e.to_string())?;
    let avatar = format!("https://i.pravatar.cc/150?u={}", user.email);

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, role_id, avatar, employee_code, department, phone)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&hashed)
    .bind(user.role_id)
    .bind(&avatar)
    .bind(&user.employee_code)
    .bind(&user.department)
    .bind(&user.phone)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_id()),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Err("User already exists".to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, email = %user.email, "User insert failed");
            Err("Failed to create user".to_string())
        }
    }
}

fn check_creatable(auth: &AuthUser, role_id: u8) -> actix_web::Result<()> {
    if Role::from_id(role_id).is_none() || role_id == Role::SuperAdmin.id() {
        return Err(actix_web::error::ErrorBadRequest("Invalid role"));
    }
    if auth.role == Role::Admin && role_id == Role::Admin.id() {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to create Admin users.",
        ));
    }
    Ok(())
}

/// Create a user account with the default password (admin)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Duplicate email/code or invalid role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    check_creatable(&auth, payload.role_id)?;

    match insert_user(pool.get_ref(), &payload).await {
        Ok(id) => Ok(HttpResponse::Created().json(serde_json::json!({
            "id": id,
            "name": payload.name,
            "email": payload.email,
            "role_id": payload.role_id
        }))),
        Err(reason) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": reason
        }))),
    }
}

#[derive(Deserialize, ToSchema)]
pub struct BulkCreateUsers {
    pub employees: Vec<CreateUser>,
}

#[derive(Serialize, ToSchema)]
pub struct BulkError {
    pub email: String,
    pub reason: String,
}

/// Create many accounts at once (admin); partial failures return 207
#[utoipa::path(
    post,
    path = "/api/users/bulk",
    request_body = BulkCreateUsers,
    responses(
        (status = 201, description = "All created"),
        (status = 207, description = "Completed with per-row errors"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn bulk_create_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BulkCreateUsers>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut created = 0usize;
    let mut errors: Vec<BulkError> = Vec::new();

    for employee in &payload.employees {
        if let Err(e) = check_creatable(&auth, employee.role_id) {
            errors.push(BulkError {
                email: employee.email.clone(),
                reason: e.to_string(),
            });
            continue;
        }
        match insert_user(pool.get_ref(), employee).await {
            Ok(_) => created += 1,
            Err(reason) => errors.push(BulkError {
                email: employee.email.clone(),
                reason,
            }),
        }
    }

    if errors.is_empty() {
        Ok(HttpResponse::Created().json(serde_json::json!({
            "message": format!("{created} users created successfully."),
            "created_count": created
        })))
    } else {
        Ok(HttpResponse::MultiStatus().json(serde_json::json!({
            "message": format!("Bulk operation completed with {} errors.", errors.len()),
            "created_count": created,
            "failed_count": errors.len(),
            "errors": errors
        })))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<u8>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub employee_code: Option<String>,
}

/// Update a user account (admin); super-admin accounts are immutable here
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let Some(mut user) = fetch_user_by_id(pool.get_ref(), user_id)
        .await
        .map_err(internal)?
    else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "User not found"
        })));
    };

    if user.role_id == Role::SuperAdmin.id() {
        return Err(actix_web::error::ErrorForbidden(
            "Cannot modify a Super Admin account via this route.",
        ));
    }
    if auth.role == Role::Admin && user.role_id == Role::Admin.id() {
        return Err(actix_web::error::ErrorForbidden(
            "Admins are not authorized to modify other admin accounts.",
        ));
    }

    if let Some(role_id) = payload.role_id {
        check_creatable(&auth, role_id)?;
        user.role_id = role_id;
    }
    if let Some(name) = &payload.name {
        user.name = name.clone();
    }
    if let Some(email) = &payload.email {
        user.email = email.clone();
    }
    if let Some(department) = &payload.department {
        user.department = department.clone();
    }
    if let Some(status) = &payload.status {
        user.status = status.clone();
    }
    if let Some(phone) = &payload.phone {
        user.phone = Some(phone.clone());
    }
    if let Some(code) = &payload.employee_code {
        user.employee_code = code.clone();
    }

    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, email = ?, role_id = ?, department = ?, status = ?,
            phone = ?, employee_code = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role_id)
    .bind(&user.department)
    .bind(&user.status)
    .bind(&user.phone)
    .bind(&user.employee_code)
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(internal)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete a user and their attendance/leave/notification rows (admin)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let role_id = sqlx::query_scalar::<_, u8>("SELECT role_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(internal)?;

    let Some(role_id) = role_id else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "User not found"
        })));
    };
    if role_id == Role::SuperAdmin.id() {
        return Err(actix_web::error::ErrorForbidden(
            "Cannot delete a Super Admin account.",
        ));
    }

    // Cascade the user's owned rows in one transaction.
    let mut tx = pool.get_ref().begin().await.map_err(internal)?;
    for sql in [
        "DELETE FROM attendance WHERE user_id = ?",
        "DELETE FROM leave_requests WHERE user_id = ?",
        "DELETE FROM notifications WHERE user_id = ?",
        "DELETE FROM refresh_tokens WHERE user_id = ?",
        "DELETE FROM users WHERE id = ?",
    ] {
        sqlx::query(sql)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
    }
    tx.commit().await.map_err(internal)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User removed" })))
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Update your own name/email/phone
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateProfile>,
) -> actix_web::Result<impl Responder> {
    let Some(mut user) = fetch_user_by_id(pool.get_ref(), auth.user_id)
        .await
        .map_err(internal)?
    else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "User not found"
        })));
    };

    if let Some(name) = &payload.name {
        user.name = name.clone();
    }
    if let Some(email) = &payload.email {
        user.email = email.clone();
    }
    if let Some(phone) = &payload.phone {
        user.phone = Some(phone.clone());
    }

    sqlx::query("UPDATE users SET name = ?, email = ?, phone = ? WHERE id = ?")
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(internal)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

/// Change your own password
#[utoipa::path(
    put,
    path = "/api/users/profile/change-password",
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "Invalid old password")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ChangePassword>,
) -> actix_web::Result<impl Responder> {
    let Some(user) = fetch_user_by_id(pool.get_ref(), auth.user_id)
        .await
        .map_err(internal)?
    else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "User not found"
        })));
    };

    if verify_password(&payload.old_password, &user.password).is_err() {
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "message": "Invalid old password"
        })));
    }

    let hashed = hash_password(&payload.new_password).map_err(|e| {
        tracing::error!(error = %e, "Password hash failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(&hashed)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(internal)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password updated successfully"
    })))
}
