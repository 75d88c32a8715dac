//! Arrival punctuality against the company policy: holiday exemption, then
//! the per-date override or company default, plus the grace window.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::model::attendance::AttendanceStatus;
use crate::model::policy::{self, CompanyPolicy};

/// Latest non-late clock-in instant for a date: the effective "HH:MM" rule
/// plus grace minutes. Seconds are zeroed by construction; grace minutes may
/// roll into the following hours.
pub fn deadline_for(policy: &CompanyPolicy, date: NaiveDate) -> NaiveDateTime {
    let rule = policy::parse_clock_in(policy.clock_in_rule(date));
    date.and_time(rule) + Duration::minutes(policy.working_hours.late_grace_minutes)
}

/// Classify a clock-in. Run once per CLOCK_IN, never on break or clock-out
/// actions. A listed holiday exempts the whole day.
pub fn evaluate(policy: &CompanyPolicy, date: NaiveDate, now: NaiveDateTime) -> AttendanceStatus {
    if policy.is_holiday(date) {
        return AttendanceStatus::Present;
    }
    if now > deadline_for(policy, date) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::policy::{DateOverride, Holiday};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn default_deadline_is_nine_forty_five() {
        let policy = CompanyPolicy::default();
        assert_eq!(deadline_for(&policy, date()), at(9, 45, 0));
    }

    #[test]
    fn just_inside_grace_is_present() {
        let policy = CompanyPolicy::default();
        assert_eq!(
            evaluate(&policy, date(), at(9, 44, 59)),
            AttendanceStatus::Present
        );
        // The deadline instant itself is still on time.
        assert_eq!(
            evaluate(&policy, date(), at(9, 45, 0)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn just_past_grace_is_late() {
        let policy = CompanyPolicy::default();
        assert_eq!(
            evaluate(&policy, date(), at(9, 45, 1)),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn holiday_exempts_any_arrival_time() {
        let mut policy = CompanyPolicy::default();
        policy.holidays.push(Holiday {
            name: "Founders Day".into(),
            date: date(),
        });
        assert_eq!(
            evaluate(&policy, date(), at(17, 0, 0)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn override_shifts_deadline_for_its_date_only() {
        let mut policy = CompanyPolicy::default();
        policy.date_overrides.push(DateOverride {
            date: date(),
            clock_in: "11:00".into(),
        });
        assert_eq!(deadline_for(&policy, date()), at(11, 15, 0));
        assert_eq!(
            evaluate(&policy, date(), at(10, 30, 0)),
            AttendanceStatus::Present
        );

        let next = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert_eq!(
            deadline_for(&policy, next),
            next.and_hms_opt(9, 45, 0).unwrap()
        );
    }

    #[test]
    fn grace_minutes_roll_into_the_next_hour() {
        let mut policy = CompanyPolicy::default();
        policy.working_hours.clock_in = "09:50".into();
        policy.working_hours.late_grace_minutes = 25;
        assert_eq!(deadline_for(&policy, date()), at(10, 15, 0));
    }
}
