use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_CLOCK_IN: &str = "09:30";
pub const DEFAULT_GRACE_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkingHours {
    /// Nominal clock-in time of day, "HH:MM".
    #[schema(example = "09:30")]
    pub clock_in: String,
    #[schema(example = 15)]
    pub late_grace_minutes: i64,
}

impl Default for WorkingHours {
    fn default() -> Self {
        WorkingHours {
            clock_in: DEFAULT_CLOCK_IN.to_string(),
            late_grace_minutes: DEFAULT_GRACE_MINUTES,
        }
    }
}

/// Per-date exception to the nominal clock-in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DateOverride {
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "11:00")]
    pub clock_in: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[schema(example = "May Day")]
    pub name: String,
    #[schema(example = "2026-05-01", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeavePolicies {
    #[schema(example = 14)]
    pub annual: i64,
    #[schema(example = 6)]
    pub medical: i64,
    #[schema(example = 5)]
    pub other: i64,
}

impl Default for LeavePolicies {
    fn default() -> Self {
        LeavePolicies {
            annual: 14,
            medical: 6,
            other: 5,
        }
    }
}

/// Company-wide policy document. A single row by convention; an absent row
/// means the hardcoded defaults apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompanyPolicy {
    pub leave_policies: LeavePolicies,
    pub working_hours: WorkingHours,
    pub date_overrides: Vec<DateOverride>,
    pub holidays: Vec<Holiday>,
}

impl CompanyPolicy {
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.iter().any(|h| h.date == date)
    }

    /// Effective "HH:MM" clock-in rule for a date: the override if one
    /// exists, otherwise the company default.
    pub fn clock_in_rule(&self, date: NaiveDate) -> &str {
        self.date_overrides
            .iter()
            .find(|o| o.date == date)
            .map(|o| o.clock_in.as_str())
            .unwrap_or(&self.working_hours.clock_in)
    }
}

/// Parse an "HH:MM" rule, falling back to the default on malformed input.
pub fn parse_clock_in(rule: &str) -> NaiveTime {
    NaiveTime::parse_from_str(rule, "%H:%M")
        .ok()
        .or_else(|| NaiveTime::from_hms_opt(9, 30, 0))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_policy_matches_hardcoded_rules() {
        let policy = CompanyPolicy::default();
        assert_eq!(policy.working_hours.clock_in, "09:30");
        assert_eq!(policy.working_hours.late_grace_minutes, 15);
        assert_eq!(policy.leave_policies.annual, 14);
        assert!(policy.holidays.is_empty());
    }

    #[test]
    fn override_applies_only_to_its_date() {
        let mut policy = CompanyPolicy::default();
        policy.date_overrides.push(DateOverride {
            date: date(2026, 3, 2),
            clock_in: "11:00".into(),
        });
        assert_eq!(policy.clock_in_rule(date(2026, 3, 2)), "11:00");
        assert_eq!(policy.clock_in_rule(date(2026, 3, 3)), "09:30");
    }

    #[test]
    fn malformed_rule_falls_back_to_default() {
        assert_eq!(
            parse_clock_in("not a time"),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_clock_in("08:05"),
            NaiveTime::from_hms_opt(8, 5, 0).unwrap()
        );
    }
}
