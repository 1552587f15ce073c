//! Time conversions between wall clock and "minutes from now", plus the ledger's
//! on-disk timestamp format.
//!
//! Per the REDESIGN FLAG in spec §9, the source's hard-coded `"queue"`/`"drop"` string
//! flag for choosing a time representation is replaced by this tagged union.

use chrono::NaiveDateTime;

pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a caller wants a moment in time expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRepr {
    /// Integer minutes relative to the planning clock's `now`.
    MinutesFromNow,
    /// An absolute `NaiveDateTime`.
    Wallclock,
}

/// Converts a wallclock instant to whole minutes from `now`, clamping negative results
/// (instants in the past) to zero — the busy-window rebasing rule from spec §3/§4.1.
pub fn minutes_from_now(now: NaiveDateTime, at: NaiveDateTime) -> i64 {
    let delta = (at - now).num_minutes();
    delta.max(0)
}

/// Converts minutes-from-now back to an absolute instant.
pub fn wallclock_from_minutes(now: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    now + chrono::Duration::minutes(minutes)
}

pub fn format_ledger_timestamp(at: NaiveDateTime) -> String {
    at.format(LEDGER_TIMESTAMP_FORMAT).to_string()
}

pub fn parse_ledger_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, LEDGER_TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        parse_ledger_timestamp(s).unwrap()
    }

    #[test]
    fn minutes_from_now_clamps_past_instants_to_zero() {
        let now = dt("2026-01-01 12:00:00");
        assert_eq!(minutes_from_now(now, dt("2026-01-01 11:00:00")), 0);
        assert_eq!(minutes_from_now(now, dt("2026-01-01 12:30:00")), 30);
    }

    #[test]
    fn ledger_timestamp_round_trips() {
        let at = dt("2026-03-05 08:15:30");
        assert_eq!(format_ledger_timestamp(at), "2026-03-05 08:15:30");
    }
}
