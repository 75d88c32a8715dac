//! Shared SQL helpers used by more than one handler module: the attendance
//! record read-modify-write, the singleton policy document, and the
//! fire-and-forget notification sink.

use chrono::NaiveDate;
use sqlx::{FromRow, MySqlPool};

use crate::model::attendance::{AttendanceDay, AttendanceRow};
use crate::model::notification::{NotificationDraft, NotificationKind};
use crate::model::policy::{CompanyPolicy, LeavePolicies, WorkingHours};
use crate::model::role::Role;

/// Result of an attendance save attempt. `Conflict` means another request
/// won the race on the same (user, date) record; the caller should ask the
/// client to retry.
#[derive(Debug, Eq, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Conflict,
}

pub async fn fetch_attendance(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRow>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, user_id, date, clock_in_time, clock_out_time, status,
               work_duration_ms, overtime_ms, total_break_ms, breaks, version
        FROM attendance
        WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// First write of a (user, date) record. The UNIQUE key turns a lost
/// creation race into `Conflict` instead of a duplicate row.
pub async fn insert_attendance(
    pool: &MySqlPool,
    day: &AttendanceDay,
) -> Result<SaveOutcome, sqlx::Error> {
    let breaks = serde_json::to_string(&day.breaks).unwrap_or_else(|_| "[]".into());

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
            (user_id, date, clock_in_time, clock_out_time, status,
             work_duration_ms, overtime_ms, total_break_ms, breaks)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(day.user_id)
    .bind(day.date)
    .bind(day.clock_in_time)
    .bind(day.clock_out_time)
    .bind(day.status.map(|s| s.as_str()))
    .bind(day.work_duration_ms)
    .bind(day.overtime_ms)
    .bind(day.total_break_ms)
    .bind(breaks)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(SaveOutcome::Saved),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Ok(SaveOutcome::Conflict)
        }
        Err(e) => Err(e),
    }
}

/// Optimistic update: the version read with the row must still match, or the
/// record was changed by a concurrent action and nothing is written.
pub async fn update_attendance(
    pool: &MySqlPool,
    id: u64,
    version: u64,
    day: &AttendanceDay,
) -> Result<SaveOutcome, sqlx::Error> {
    let breaks = serde_json::to_string(&day.breaks).unwrap_or_else(|_| "[]".into());

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_in_time = ?, clock_out_time = ?, status = ?,
            work_duration_ms = ?, overtime_ms = ?, total_break_ms = ?,
            breaks = ?, version = version + 1
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(day.clock_in_time)
    .bind(day.clock_out_time)
    .bind(day.status.map(|s| s.as_str()))
    .bind(day.work_duration_ms)
    .bind(day.overtime_ms)
    .bind(day.total_break_ms)
    .bind(breaks)
    .bind(id)
    .bind(version)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        Ok(SaveOutcome::Conflict)
    } else {
        Ok(SaveOutcome::Saved)
    }
}

/// Row shape of the singleton `company_settings` table.
#[derive(Debug, FromRow)]
pub struct CompanySettingsRow {
    pub id: u64,
    pub leave_annual: i64,
    pub leave_medical: i64,
    pub leave_other: i64,
    pub clock_in: String,
    pub late_grace_minutes: i64,
    pub date_overrides: String,
    pub holidays: String,
}

impl CompanySettingsRow {
    pub fn into_policy(self) -> CompanyPolicy {
        CompanyPolicy {
            leave_policies: LeavePolicies {
                annual: self.leave_annual,
                medical: self.leave_medical,
                other: self.leave_other,
            },
            working_hours: WorkingHours {
                clock_in: self.clock_in,
                late_grace_minutes: self.late_grace_minutes,
            },
            date_overrides: serde_json::from_str(&self.date_overrides).unwrap_or_default(),
            holidays: serde_json::from_str(&self.holidays).unwrap_or_default(),
        }
    }
}

pub async fn fetch_policy_row(
    pool: &MySqlPool,
) -> Result<Option<CompanySettingsRow>, sqlx::Error> {
    sqlx::query_as::<_, CompanySettingsRow>(
        r#"
        SELECT id, leave_annual, leave_medical, leave_other, clock_in,
               late_grace_minutes, date_overrides, holidays
        FROM company_settings
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

/// The policy document, or the hardcoded defaults when none was ever saved.
pub async fn fetch_policy(pool: &MySqlPool) -> Result<CompanyPolicy, sqlx::Error> {
    Ok(fetch_policy_row(pool)
        .await?
        .map(CompanySettingsRow::into_policy)
        .unwrap_or_default())
}

/// The first-found user holding a role slot. Notification routing assumes a
/// single designated admin and super admin.
pub async fn first_user_with_role(
    pool: &MySqlPool,
    role: Role,
) -> Result<Option<(u64, String)>, sqlx::Error> {
    sqlx::query_as::<_, (u64, String)>(
        "SELECT id, name FROM users WHERE role_id = ? ORDER BY id LIMIT 1",
    )
    .bind(role.id())
    .fetch_optional(pool)
    .await
}

/// Append-only, best-effort inserts. Failures are logged and swallowed; a
/// dropped notification must never fail the action that produced it.
pub async fn push_notifications(pool: &MySqlPool, drafts: Vec<NotificationDraft>) {
    for draft in drafts {
        if let Err(e) = sqlx::query(
            "INSERT INTO notifications (user_id, text, kind, link) VALUES (?, ?, ?, ?)",
        )
        .bind(draft.user_id)
        .bind(&draft.text)
        .bind(draft.kind.as_str())
        .bind(draft.link)
        .execute(pool)
        .await
        {
            tracing::warn!(error = %e, user_id = draft.user_id, "Dropped notification");
        }
    }
}

/// Late clock-in fan-out: the super admin always hears about it (unless the
/// late user is the super admin), the admin additionally hears about late
/// employees.
pub async fn notify_late_clock_in(pool: &MySqlPool, name: &str, role: Role) {
    if role == Role::SuperAdmin {
        return;
    }

    let mut drafts = Vec::new();

    match first_user_with_role(pool, Role::SuperAdmin).await {
        Ok(Some((super_admin_id, _))) => drafts.push(NotificationDraft {
            user_id: super_admin_id,
            text: format!("{} ({}) was marked late.", name, role.display_name()),
            kind: NotificationKind::Attendance,
            link: "/Reports",
        }),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Super admin lookup failed for late notification"),
    }

    if role == Role::Employee {
        match first_user_with_role(pool, Role::Admin).await {
            Ok(Some((admin_id, _))) => drafts.push(NotificationDraft {
                user_id: admin_id,
                text: format!("{} has been marked late.", name),
                kind: NotificationKind::Attendance,
                link: "/Reports",
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Admin lookup failed for late notification"),
        }
    }

    push_notifications(pool, drafts).await;
}
