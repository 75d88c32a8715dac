//! The per-(user, date) attendance state machine:
//! CLOCKED_OUT -> CLOCKED_IN -> ON_BREAK -> CLOCKED_IN -> CLOCKED_OUT,
//! re-enterable within the same day. All transitions are synchronous
//! read-modify-write over one [`AttendanceDay`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::lateness;
use crate::model::attendance::{AttendanceDay, AttendanceStatus, BreakEntry};
use crate::model::policy::CompanyPolicy;

pub const STANDARD_WORK_DAY_MS: i64 = 8 * 60 * 60 * 1000;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, ToSchema)]
pub enum ClockAction {
    #[serde(rename = "CLOCK_IN")]
    ClockIn,
    #[serde(rename = "START_BREAK")]
    StartBreak,
    #[serde(rename = "END_BREAK")]
    EndBreak,
    #[serde(rename = "CLOCK_OUT")]
    ClockOut,
}

impl ClockAction {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "CLOCK_IN" => Some(ClockAction::ClockIn),
            "START_BREAK" => Some(ClockAction::StartBreak),
            "END_BREAK" => Some(ClockAction::EndBreak),
            "CLOCK_OUT" => Some(ClockAction::ClockOut),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
pub enum ClockState {
    #[serde(rename = "CLOCKED_OUT")]
    ClockedOut,
    #[serde(rename = "CLOCKED_IN")]
    ClockedIn,
    #[serde(rename = "ON_BREAK")]
    OnBreak,
}

/// Precondition violations. All are local, user-correctable rejections; the
/// record is left untouched when one is returned.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum TransitionError {
    #[error("Already clocked in for today")]
    AlreadyClockedIn,
    #[error("Must be clocked in to start a break")]
    NotClockedInForBreak,
    #[error("Already on a break")]
    AlreadyOnBreak,
    #[error("Not on a break")]
    NotOnBreak,
    #[error("Not clocked in")]
    NotClockedIn,
}

/// Derived totals of a completed cycle. The record itself is reset in place
/// at clock-out, so this is the only place the numbers survive.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CycleSummary {
    pub work_duration_ms: i64,
    pub overtime_ms: i64,
    pub total_break_ms: i64,
}

#[derive(Debug)]
pub struct ActionOutcome {
    pub state: ClockState,
    /// Set when the action was a CLOCK_IN, with the lateness verdict.
    pub clock_in_status: Option<AttendanceStatus>,
    /// Set when the action was a CLOCK_OUT.
    pub completed_cycle: Option<CycleSummary>,
}

/// Apply one action to the day's record. Lateness is evaluated on CLOCK_IN
/// only; notification fan-out from a Late verdict is the caller's concern.
pub fn apply(
    record: &mut AttendanceDay,
    action: ClockAction,
    now: NaiveDateTime,
    policy: &CompanyPolicy,
) -> Result<ActionOutcome, TransitionError> {
    match action {
        ClockAction::ClockIn => {
            if record.is_clocked_in() {
                return Err(TransitionError::AlreadyClockedIn);
            }
            // Re-entry after an earlier clock-out the same day: clear the
            // clock-out so the new cycle is open.
            if record.clock_in_time.is_some() && record.clock_out_time.is_some() {
                record.clock_out_time = None;
            }
            record.clock_in_time = Some(now);
            let status = lateness::evaluate(policy, record.date, now);
            record.status = Some(status);
            Ok(ActionOutcome {
                state: ClockState::ClockedIn,
                clock_in_status: Some(status),
                completed_cycle: None,
            })
        }

        ClockAction::StartBreak => {
            if !record.is_clocked_in() {
                return Err(TransitionError::NotClockedInForBreak);
            }
            if record.open_break().is_some() {
                return Err(TransitionError::AlreadyOnBreak);
            }
            record.breaks.push(BreakEntry::open(now));
            Ok(ActionOutcome {
                state: ClockState::OnBreak,
                clock_in_status: None,
                completed_cycle: None,
            })
        }

        ClockAction::EndBreak => {
            let open = record
                .open_break_mut()
                .ok_or(TransitionError::NotOnBreak)?;
            close_break(open, now);
            Ok(ActionOutcome {
                state: ClockState::ClockedIn,
                clock_in_status: None,
                completed_cycle: None,
            })
        }

        ClockAction::ClockOut => {
            let Some(clock_in) = record.clock_in_time.filter(|_| record.is_clocked_in()) else {
                return Err(TransitionError::NotClockedIn);
            };
            if let Some(open) = record.open_break_mut() {
                close_break(open, now);
            }
            record.clock_out_time = Some(now);

            let total_break_ms: i64 = record.breaks.iter().map(|b| b.duration_ms).sum();
            let work_duration_ms = (now - clock_in).num_milliseconds() - total_break_ms;
            let overtime_ms = (work_duration_ms - STANDARD_WORK_DAY_MS).max(0);
            let summary = CycleSummary {
                work_duration_ms,
                overtime_ms,
                total_break_ms,
            };

            // Reset in place for a possible second cycle later the same day;
            // the clock-in/out timestamps are deliberately retained.
            record.breaks.clear();
            record.total_break_ms = 0;
            record.work_duration_ms = 0;
            record.overtime_ms = 0;
            record.status = None;

            Ok(ActionOutcome {
                state: ClockState::ClockedOut,
                clock_in_status: None,
                completed_cycle: Some(summary),
            })
        }
    }
}

fn close_break(entry: &mut BreakEntry, now: NaiveDateTime) {
    entry.end = Some(now);
    entry.duration_ms = (now - entry.start).num_milliseconds();
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusView {
    pub status: ClockState,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub work_start_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub break_start_time: Option<NaiveDateTime>,
}

/// Read-only projection of today's record for the polling status endpoint.
/// Idempotent and side-effect-free.
pub fn status_view(record: Option<&AttendanceDay>) -> StatusView {
    let Some(record) = record else {
        return StatusView {
            status: ClockState::ClockedOut,
            work_start_time: None,
            break_start_time: None,
        };
    };

    if record.clock_in_time.is_none() || record.clock_out_time.is_some() {
        // After a completed cycle the last clock-in is still reported for
        // the client's reference.
        return StatusView {
            status: ClockState::ClockedOut,
            work_start_time: record.clock_in_time,
            break_start_time: None,
        };
    }

    if let Some(open) = record.open_break() {
        return StatusView {
            status: ClockState::OnBreak,
            work_start_time: record.clock_in_time,
            break_start_time: Some(open.start),
        };
    }

    StatusView {
        status: ClockState::ClockedIn,
        work_start_time: record.clock_in_time,
        break_start_time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day() -> AttendanceDay {
        AttendanceDay::new(7, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn policy() -> CompanyPolicy {
        CompanyPolicy::default()
    }

    #[test]
    fn full_cycle_computes_work_minus_breaks() {
        let mut rec = day();
        let p = policy();

        let t1 = at(9, 0);
        let out = apply(&mut rec, ClockAction::ClockIn, t1, &p).unwrap();
        assert_eq!(out.state, ClockState::ClockedIn);
        assert_eq!(out.clock_in_status, Some(AttendanceStatus::Present));
        assert_eq!(status_view(Some(&rec)).status, ClockState::ClockedIn);

        let t2 = at(12, 0);
        apply(&mut rec, ClockAction::StartBreak, t2, &p).unwrap();
        assert_eq!(status_view(Some(&rec)).status, ClockState::OnBreak);

        let t3 = at(12, 45);
        apply(&mut rec, ClockAction::EndBreak, t3, &p).unwrap();
        assert_eq!(rec.breaks[0].duration_ms, 45 * 60 * 1000);

        let t4 = at(17, 0);
        let out = apply(&mut rec, ClockAction::ClockOut, t4, &p).unwrap();
        let summary = out.completed_cycle.unwrap();
        assert_eq!(
            summary.work_duration_ms,
            (t4 - t1).num_milliseconds() - (t3 - t2).num_milliseconds()
        );
        assert_eq!(summary.total_break_ms, (t3 - t2).num_milliseconds());
        assert_eq!(summary.overtime_ms, 0);

        // Reset in place: breaks cleared, status unset, timestamps kept.
        assert!(rec.breaks.is_empty());
        assert_eq!(rec.status, None);
        assert_eq!(rec.clock_in_time, Some(t1));
        assert_eq!(rec.clock_out_time, Some(t4));
    }

    #[test]
    fn double_clock_in_is_rejected_and_state_unchanged() {
        let mut rec = day();
        let p = policy();
        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        let before = rec.clone();
        let err = apply(&mut rec, ClockAction::ClockIn, at(9, 5), &p).unwrap_err();
        assert_eq!(err, TransitionError::AlreadyClockedIn);
        assert_eq!(err.to_string(), "Already clocked in for today");
        assert_eq!(rec, before);
    }

    #[test]
    fn clock_in_after_clock_out_starts_a_fresh_cycle() {
        let mut rec = day();
        let p = policy();
        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        apply(&mut rec, ClockAction::ClockOut, at(12, 0), &p).unwrap();

        let out = apply(&mut rec, ClockAction::ClockIn, at(14, 0), &p).unwrap();
        assert_eq!(out.state, ClockState::ClockedIn);
        assert_eq!(rec.clock_in_time, Some(at(14, 0)));
        assert_eq!(rec.clock_out_time, None);
    }

    #[test]
    fn never_two_open_breaks() {
        let mut rec = day();
        let p = policy();
        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        apply(&mut rec, ClockAction::StartBreak, at(10, 0), &p).unwrap();
        let err = apply(&mut rec, ClockAction::StartBreak, at(10, 5), &p).unwrap_err();
        assert_eq!(err, TransitionError::AlreadyOnBreak);
        assert_eq!(rec.breaks.iter().filter(|b| b.is_open()).count(), 1);
    }

    #[test]
    fn break_requires_clock_in_and_end_requires_open_break() {
        let mut rec = day();
        let p = policy();
        assert_eq!(
            apply(&mut rec, ClockAction::StartBreak, at(9, 0), &p).unwrap_err(),
            TransitionError::NotClockedInForBreak
        );
        assert_eq!(
            apply(&mut rec, ClockAction::EndBreak, at(9, 0), &p).unwrap_err(),
            TransitionError::NotOnBreak
        );
        assert_eq!(
            apply(&mut rec, ClockAction::ClockOut, at(9, 0), &p).unwrap_err(),
            TransitionError::NotClockedIn
        );
    }

    #[test]
    fn clock_out_auto_closes_the_open_break() {
        let mut rec = day();
        let p = policy();
        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        apply(&mut rec, ClockAction::StartBreak, at(13, 0), &p).unwrap();

        let out = apply(&mut rec, ClockAction::ClockOut, at(13, 30), &p).unwrap();
        let summary = out.completed_cycle.unwrap();
        assert_eq!(summary.total_break_ms, 30 * 60 * 1000);
        assert_eq!(
            summary.work_duration_ms,
            Duration::hours(4).num_milliseconds()
        );
    }

    #[test]
    fn overtime_is_excess_over_eight_hours() {
        let mut rec = day();
        let p = policy();
        apply(&mut rec, ClockAction::ClockIn, at(8, 0), &p).unwrap();
        let out = apply(&mut rec, ClockAction::ClockOut, at(18, 30), &p).unwrap();
        let summary = out.completed_cycle.unwrap();
        assert_eq!(summary.work_duration_ms, Duration::hours(10).num_milliseconds() + Duration::minutes(30).num_milliseconds());
        assert_eq!(
            summary.overtime_ms,
            summary.work_duration_ms - STANDARD_WORK_DAY_MS
        );

        // An exactly-8h day has no overtime.
        let mut rec = day();
        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        let out = apply(&mut rec, ClockAction::ClockOut, at(17, 0), &p).unwrap();
        assert_eq!(out.completed_cycle.unwrap().overtime_ms, 0);
    }

    #[test]
    fn multiple_breaks_all_count() {
        let mut rec = day();
        let p = policy();
        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        for (start, end) in [(10, 15), (12, 30), (15, 45)] {
            apply(&mut rec, ClockAction::StartBreak, at(start, 0), &p).unwrap();
            apply(&mut rec, ClockAction::EndBreak, at(start, end as u32), &p).unwrap();
        }
        let out = apply(&mut rec, ClockAction::ClockOut, at(17, 0), &p).unwrap();
        let summary = out.completed_cycle.unwrap();
        assert_eq!(
            summary.total_break_ms,
            Duration::minutes(15 + 30 + 45).num_milliseconds()
        );
        assert_eq!(
            summary.work_duration_ms,
            Duration::hours(8).num_milliseconds() - summary.total_break_ms
        );
    }

    #[test]
    fn late_clock_in_sets_late_status() {
        let mut rec = day();
        let p = policy();
        let out = apply(&mut rec, ClockAction::ClockIn, at(10, 0), &p).unwrap();
        assert_eq!(out.clock_in_status, Some(AttendanceStatus::Late));
        assert_eq!(rec.status, Some(AttendanceStatus::Late));
    }

    #[test]
    fn status_view_covers_all_display_states() {
        let p = policy();

        assert_eq!(status_view(None).status, ClockState::ClockedOut);

        let mut rec = day();
        assert_eq!(status_view(Some(&rec)).status, ClockState::ClockedOut);

        apply(&mut rec, ClockAction::ClockIn, at(9, 0), &p).unwrap();
        let view = status_view(Some(&rec));
        assert_eq!(view.status, ClockState::ClockedIn);
        assert_eq!(view.work_start_time, Some(at(9, 0)));
        assert_eq!(view.break_start_time, None);

        apply(&mut rec, ClockAction::StartBreak, at(11, 0), &p).unwrap();
        let view = status_view(Some(&rec));
        assert_eq!(view.status, ClockState::OnBreak);
        assert_eq!(view.break_start_time, Some(at(11, 0)));

        apply(&mut rec, ClockAction::EndBreak, at(11, 10), &p).unwrap();
        apply(&mut rec, ClockAction::ClockOut, at(17, 0), &p).unwrap();
        let view = status_view(Some(&rec));
        assert_eq!(view.status, ClockState::ClockedOut);
        assert_eq!(view.work_start_time, Some(at(9, 0)));
    }

    #[test]
    fn action_keywords_parse() {
        assert_eq!(ClockAction::parse("CLOCK_IN"), Some(ClockAction::ClockIn));
        assert_eq!(ClockAction::parse("CLOCK_OUT"), Some(ClockAction::ClockOut));
        assert_eq!(
            ClockAction::parse("START_BREAK"),
            Some(ClockAction::StartBreak)
        );
        assert_eq!(ClockAction::parse("END_BREAK"), Some(ClockAction::EndBreak));
        assert_eq!(ClockAction::parse("NAP"), None);
    }
}
