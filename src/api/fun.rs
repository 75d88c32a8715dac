use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    pub streak: u32,
}

fn current_streak(records: &[(NaiveDate, Option<String>)]) -> u32 {
    let mut streak = 0u32;
    let mut last: Option<NaiveDate> = None;
    // Newest first; a Late or Absent day ends the run, as does a calendar gap.
    for (date, status) in records {
        if status.as_deref() != Some("Present") {
            break;
        }
        match last {
            None => streak = 1,
            Some(prev) => {
                if *date == prev - Duration::days(1) {
                    streak += 1;
                } else {
                    break;
                }
            }
        }
        last = Some(*date);
    }
    streak
}

/// Consecutive on-time days ending at the most recent record
#[utoipa::path(
    get,
    path = "/api/fun/streak",
    responses(
        (status = 200, description = "Current streak", body = StreakResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Fun"
)]
pub async fn attendance_streak(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let records = sqlx::query_as::<_, (NaiveDate, Option<String>)>(
        "SELECT date, status FROM attendance WHERE user_id = ? ORDER BY date DESC",
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Streak fetch failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(StreakResponse {
        streak: current_streak(&records),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn present(s: &str) -> (NaiveDate, Option<String>) {
        (d(s), Some("Present".to_string()))
    }

    #[test]
    fn counts_consecutive_present_days() {
        let records = vec![
            present("2026-03-04"),
            present("2026-03-03"),
            present("2026-03-02"),
        ];
        assert_eq!(current_streak(&records), 3);
    }

    #[test]
    fn gap_in_dates_breaks_the_run() {
        let records = vec![
            present("2026-03-04"),
            present("2026-03-02"),
            present("2026-03-01"),
        ];
        assert_eq!(current_streak(&records), 1);
    }

    #[test]
    fn late_day_ends_the_streak() {
        let records = vec![
            present("2026-03-04"),
            (d("2026-03-03"), Some("Late".to_string())),
            present("2026-03-02"),
        ];
        assert_eq!(current_streak(&records), 1);
    }

    #[test]
    fn late_most_recent_day_means_zero() {
        let records = vec![(d("2026-03-04"), Some("Late".to_string()))];
        assert_eq!(current_streak(&records), 0);
    }

    #[test]
    fn no_records_means_zero() {
        assert_eq!(current_streak(&[]), 0);
    }
}
