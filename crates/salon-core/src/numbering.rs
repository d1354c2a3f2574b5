//! # Business Numbers
//!
//! Human-readable daily sequential identifiers: `APP-20240501-001`,
//! `SES-20240501-014`.
//!
//! The sequence restarts every day per kind. The next value is one past the
//! larger of the day's record count and the highest sequence already issued,
//! so a hard delete never causes a number to be handed out twice.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    Appointment,
    Session,
}

impl NumberKind {
    pub const fn prefix(&self) -> &'static str {
        match self {
            NumberKind::Appointment => "APP",
            NumberKind::Session => "SES",
        }
    }

    /// `APP-20240501`: shared by every number of this kind issued that day.
    pub fn day_prefix(&self, date: NaiveDate) -> String {
        format!("{}-{}", self.prefix(), date.format("%Y%m%d"))
    }

    /// `APP-20240501-007`. Widens past three digits instead of wrapping.
    pub fn format(&self, date: NaiveDate, seq: u32) -> String {
        format!("{}-{:03}", self.day_prefix(date), seq)
    }
}

/// Sequence part of `number` if it belongs to `day_prefix`.
pub fn parse_sequence(number: &str, day_prefix: &str) -> Option<u32> {
    number
        .strip_prefix(day_prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// Next sequence for a day given the numbers already issued under it.
pub fn next_sequence<'a>(day_prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut count = 0u32;
    let mut highest = 0u32;
    for number in existing {
        count += 1;
        if let Some(seq) = parse_sequence(number, day_prefix) {
            highest = highest.max(seq);
        }
    }
    count.max(highest) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_format() {
        let d = may_first();
        assert_eq!(NumberKind::Appointment.format(d, 1), "APP-20240501-001");
        assert_eq!(NumberKind::Session.format(d, 42), "SES-20240501-042");
        assert_eq!(NumberKind::Session.format(d, 1000), "SES-20240501-1000");
    }

    #[test]
    fn test_next_sequence_serial() {
        let prefix = NumberKind::Appointment.day_prefix(may_first());
        assert_eq!(next_sequence(&prefix, []), 1);
        assert_eq!(next_sequence(&prefix, ["APP-20240501-001"]), 2);
    }

    #[test]
    fn test_next_sequence_after_delete() {
        // 002 was deleted; count is 2 but 003 is taken
        let prefix = NumberKind::Appointment.day_prefix(may_first());
        let existing = ["APP-20240501-001", "APP-20240501-003"];
        assert_eq!(next_sequence(&prefix, existing), 4);
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("SES-20240501-014", "SES-20240501"), Some(14));
        assert_eq!(parse_sequence("SES-20240502-014", "SES-20240501"), None);
        assert_eq!(parse_sequence("SES-20240501-x", "SES-20240501"), None);
    }
}
