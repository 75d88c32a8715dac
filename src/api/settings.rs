use crate::auth::auth::AuthUser;
use crate::model::policy::{CompanyPolicy, DateOverride, Holiday, LeavePolicies, WorkingHours};
use crate::utils::store;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

fn internal(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Settings query failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/* =========================
Company policy (super admin)
========================= */

#[derive(Deserialize, ToSchema)]
pub struct UpdateCompanySettings {
    /// Absent sections keep their stored values.
    pub leave_policies: Option<LeavePolicies>,
    pub working_hours: Option<WorkingHours>,
    /// Arrays are replaced wholesale.
    #[serde(default)]
    pub date_overrides: Vec<DateOverride>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

async fn save_policy(
    pool: &MySqlPool,
    existing_id: Option<u64>,
    policy: &CompanyPolicy,
) -> Result<(), sqlx::Error> {
    let overrides = serde_json::to_string(&policy.date_overrides).unwrap_or_else(|_| "[]".into());
    let holidays = serde_json::to_string(&policy.holidays).unwrap_or_else(|_| "[]".into());

    match existing_id {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE company_settings
                SET leave_annual = ?, leave_medical = ?, leave_other = ?,
                    clock_in = ?, late_grace_minutes = ?, date_overrides = ?, holidays = ?
                WHERE id = ?
                "#,
            )
            .bind(policy.leave_policies.annual)
            .bind(policy.leave_policies.medical)
            .bind(policy.leave_policies.other)
            .bind(&policy.working_hours.clock_in)
            .bind(policy.working_hours.late_grace_minutes)
            .bind(overrides)
            .bind(holidays)
            .bind(id)
            .execute(pool)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO company_settings
                    (leave_annual, leave_medical, leave_other, clock_in,
                     late_grace_minutes, date_overrides, holidays)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(policy.leave_policies.annual)
            .bind(policy.leave_policies.medical)
            .bind(policy.leave_policies.other)
            .bind(&policy.working_hours.clock_in)
            .bind(policy.working_hours.late_grace_minutes)
            .bind(overrides)
            .bind(holidays)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

/// Company policy document: working hours, grace, overrides, holidays
#[utoipa::path(
    get,
    path = "/api/company-settings",
    responses(
        (status = 200, description = "Policy document", body = CompanyPolicy),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_company_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_super_admin()?;

    // Find-or-create keeps the table a singleton by convention.
    let row = store::fetch_policy_row(pool.get_ref())
        .await
        .map_err(internal)?;
    let policy = match row {
        Some(row) => row.into_policy(),
        None => {
            let policy = CompanyPolicy::default();
            save_policy(pool.get_ref(), None, &policy)
                .await
                .map_err(internal)?;
            policy
        }
    };

    Ok(HttpResponse::Ok().json(policy))
}

/// Replace the company policy document (super admin)
#[utoipa::path(
    put,
    path = "/api/company-settings",
    request_body = UpdateCompanySettings,
    responses(
        (status = 200, description = "Saved policy", body = CompanyPolicy),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_company_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateCompanySettings>,
) -> actix_web::Result<impl Responder> {
    auth.require_super_admin()?;

    let row = store::fetch_policy_row(pool.get_ref())
        .await
        .map_err(internal)?;
    let (existing_id, current) = match row {
        Some(row) => (Some(row.id), row.into_policy()),
        None => (None, CompanyPolicy::default()),
    };

    let payload = payload.into_inner();
    let policy = CompanyPolicy {
        leave_policies: payload.leave_policies.unwrap_or(current.leave_policies),
        working_hours: payload.working_hours.unwrap_or(current.working_hours),
        date_overrides: payload.date_overrides,
        holidays: payload.holidays,
    };

    save_policy(pool.get_ref(), existing_id, &policy)
        .await
        .map_err(internal)?;

    Ok(HttpResponse::Ok().json(policy))
}

/* =========================
Application settings
========================= */

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AppSettings {
    #[schema(example = "Martex Inc.")]
    pub company_name: String,
    pub company_logo: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            company_name: "Martex Inc.".to_string(),
            company_logo: None,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAppSettings {
    pub company_name: Option<String>,
    pub company_logo: Option<String>,
}

async fn fetch_app_settings(
    pool: &MySqlPool,
) -> Result<Option<(u64, AppSettings)>, sqlx::Error> {
    let row = sqlx::query_as::<_, (u64, String, Option<String>)>(
        "SELECT id, company_name, company_logo FROM app_settings LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, company_name, company_logo)| {
        (
            id,
            AppSettings {
                company_name,
                company_logo,
            },
        )
    }))
}

/// Application settings (any authenticated user)
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Settings", body = AppSettings),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_settings(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let settings = match fetch_app_settings(pool.get_ref()).await.map_err(internal)? {
        Some((_, settings)) => settings,
        None => {
            let settings = AppSettings::default();
            sqlx::query("INSERT INTO app_settings (company_name, company_logo) VALUES (?, ?)")
                .bind(&settings.company_name)
                .bind(&settings.company_logo)
                .execute(pool.get_ref())
                .await
                .map_err(internal)?;
            settings
        }
    };

    Ok(HttpResponse::Ok().json(settings))
}

/// Update application settings (admin)
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = UpdateAppSettings,
    responses(
        (status = 200, description = "Saved settings", body = AppSettings),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateAppSettings>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let existing = fetch_app_settings(pool.get_ref()).await.map_err(internal)?;
    let (existing_id, mut settings) = match existing {
        Some((id, settings)) => (Some(id), settings),
        None => (None, AppSettings::default()),
    };

    if let Some(name) = &payload.company_name {
        settings.company_name = name.clone();
    }
    if let Some(logo) = &payload.company_logo {
        settings.company_logo = Some(logo.clone());
    }

    match existing_id {
        Some(id) => {
            sqlx::query("UPDATE app_settings SET company_name = ?, company_logo = ? WHERE id = ?")
                .bind(&settings.company_name)
                .bind(&settings.company_logo)
                .bind(id)
                .execute(pool.get_ref())
                .await
                .map_err(internal)?;
        }
        None => {
            sqlx::query("INSERT INTO app_settings (company_name, company_logo) VALUES (?, ?)")
                .bind(&settings.company_name)
                .bind(&settings.company_logo)
                .execute(pool.get_ref())
                .await
                .map_err(internal)?;
        }
    }

    Ok(HttpResponse::Ok().json(settings))
}
