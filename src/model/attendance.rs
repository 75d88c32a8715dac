use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "Present" => Some(AttendanceStatus::Present),
            "Late" => Some(AttendanceStatus::Late),
            "Absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

/// One entry in a day's break timeline. At most one entry may be open
/// (`end == None`) at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEntry {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_ms: i64,
}

impl BreakEntry {
    pub fn open(start: NaiveDateTime) -> Self {
        BreakEntry {
            start,
            end: None,
            duration_ms: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// One attendance record per (user, calendar date). Durations are stored in
/// milliseconds; the derived fields are only populated transiently at
/// clock-out and then reset in place (the clock-in/out timestamps survive so
/// a second cycle can start within the same record).
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceDay {
    pub user_id: u64,
    pub date: NaiveDate,
    pub clock_in_time: Option<NaiveDateTime>,
    pub clock_out_time: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
    pub work_duration_ms: i64,
    pub overtime_ms: i64,
    pub total_break_ms: i64,
    pub breaks: Vec<BreakEntry>,
}

impl AttendanceDay {
    pub fn new(user_id: u64, date: NaiveDate) -> Self {
        AttendanceDay {
            user_id,
            date,
            clock_in_time: None,
            clock_out_time: None,
            status: None,
            work_duration_ms: 0,
            overtime_ms: 0,
            total_break_ms: 0,
            breaks: Vec::new(),
        }
    }

    /// Clocked in and not yet clocked out for the current cycle.
    pub fn is_clocked_in(&self) -> bool {
        self.clock_in_time.is_some() && self.clock_out_time.is_none()
    }

    pub fn open_break(&self) -> Option<&BreakEntry> {
        self.breaks.iter().find(|b| b.is_open())
    }

    pub fn open_break_mut(&mut self) -> Option<&mut BreakEntry> {
        self.breaks.iter_mut().find(|b| b.is_open())
    }
}

/// Row shape of the `attendance` table; `breaks` is a JSON column.
#[derive(Debug, FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub clock_in_time: Option<NaiveDateTime>,
    pub clock_out_time: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub work_duration_ms: i64,
    pub overtime_ms: i64,
    pub total_break_ms: i64,
    pub breaks: String,
    pub version: u64,
}

impl AttendanceRow {
    pub fn into_day(self) -> AttendanceDay {
        let breaks = serde_json::from_str(&self.breaks).unwrap_or_default();
        AttendanceDay {
            user_id: self.user_id,
            date: self.date,
            clock_in_time: self.clock_in_time,
            clock_out_time: self.clock_out_time,
            status: self.status.as_deref().and_then(AttendanceStatus::from_db),
            work_duration_ms: self.work_duration_ms,
            overtime_ms: self.overtime_ms,
            total_break_ms: self.total_break_ms,
            breaks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn breaks_survive_json_round_trip() {
        let entries = vec![
            BreakEntry {
                start: dt(12, 0),
                end: Some(dt(12, 30)),
                duration_ms: 30 * 60 * 1000,
            },
            BreakEntry::open(dt(15, 0)),
        ];
        let json = serde_json::to_string(&entries).unwrap();
        let parsed: Vec<BreakEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entries);
        assert!(parsed[1].is_open());
    }

    #[test]
    fn row_with_garbage_breaks_degrades_to_empty() {
        let row = AttendanceRow {
            id: 1,
            user_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            clock_in_time: None,
            clock_out_time: None,
            status: Some("Late".into()),
            work_duration_ms: 0,
            overtime_ms: 0,
            total_break_ms: 0,
            breaks: "not json".into(),
            version: 0,
        };
        let day = row.into_day();
        assert!(day.breaks.is_empty());
        assert_eq!(day.status, Some(AttendanceStatus::Late));
    }
}
