//! Attendance day-cycle engine: the pure state machine and the lateness
//! evaluator. No I/O here; handlers feed in the current time and the policy
//! document and persist the mutated record themselves.

pub mod day_cycle;
pub mod lateness;
