//! # Schedule Rules
//!
//! The bookable slot grid and the double-booking rule.
//!
//! ## Conflict Modes
//! ```text
//! ExactSlot (default)           Overlap (opt-in)
//! ──────────────────            ─────────────────────────────────
//! 10:00 booked                  10:00 booked for 45 min
//! 10:00 → conflict              10:30 → conflict  [10:00, 10:45)
//! 10:15 → free                  10:45 → free
//! ```

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// How two appointments for the same staff member and day collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConflictMode {
    /// Same start time only.
    #[default]
    ExactSlot,
    /// `[time, time + duration)` intervals may not intersect.
    Overlap,
}

/// An active booking already holding time on a staff member's day.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookedSlot {
    pub appointment_id: String,
    pub appointment_time: NaiveTime,
    pub duration_minutes: i64,
}

fn minute_of_day(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

/// Whether a candidate booking collides with any of `booked`.
///
/// `exclude` skips the appointment being edited.
pub fn has_conflict(
    mode: ConflictMode,
    time: NaiveTime,
    duration_minutes: i64,
    booked: &[BookedSlot],
    exclude: Option<&str>,
) -> bool {
    let start = minute_of_day(time);
    let end = start + duration_minutes.max(1);

    booked
        .iter()
        .filter(|b| exclude != Some(b.appointment_id.as_str()))
        .any(|b| match mode {
            ConflictMode::ExactSlot => b.appointment_time == time,
            ConflictMode::Overlap => {
                let b_start = minute_of_day(b.appointment_time);
                let b_end = b_start + b.duration_minutes.max(1);
                start < b_end && b_start < end
            }
        })
}

// =============================================================================
// Slot Grid
// =============================================================================

/// Opening hours cut into equal slots. The closing time is itself bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    open: NaiveTime,
    close: NaiveTime,
    interval_minutes: u32,
}

impl SlotGrid {
    pub fn new(open: NaiveTime, close: NaiveTime, interval_minutes: u32) -> ValidationResult<Self> {
        if interval_minutes == 0 || interval_minutes > 240 {
            return Err(ValidationError::OutOfRange {
                field: "slot_minutes".to_string(),
                min: 1,
                max: 240,
            });
        }
        if close < open {
            return Err(ValidationError::InvalidFormat {
                field: "closing_time".to_string(),
                reason: "must not be before opening time".to_string(),
            });
        }
        Ok(Self {
            open,
            close,
            interval_minutes,
        })
    }

    pub fn slots(&self) -> Vec<NaiveTime> {
        let open = minute_of_day(self.open);
        let close = minute_of_day(self.close);
        (open..=close)
            .step_by(self.interval_minutes as usize)
            .filter_map(|m| NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0))
            .collect()
    }

    /// Whether `time` is exactly one of the grid's slots.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if time.second() != 0 || time.nanosecond() != 0 {
            return false;
        }
        let m = minute_of_day(time);
        let open = minute_of_day(self.open);
        m >= open
            && m <= minute_of_day(self.close)
            && (m - open) % self.interval_minutes as i64 == 0
    }

    pub fn check(&self, time: NaiveTime) -> ValidationResult<()> {
        if self.contains(time) {
            Ok(())
        } else {
            Err(ValidationError::InvalidFormat {
                field: "appointment_time".to_string(),
                reason: format!(
                    "{} is not a bookable slot ({}-{} every {} min)",
                    format_slot(time),
                    format_slot(self.open),
                    format_slot(self.close),
                    self.interval_minutes
                ),
            })
        }
    }
}

impl Default for SlotGrid {
    /// 09:00 to 22:00 every 15 minutes.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            interval_minutes: 15,
        }
    }
}

/// `HH:MM` label of a slot.
pub fn format_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parses an `HH:MM` slot label.
pub fn parse_slot(label: &str) -> ValidationResult<NaiveTime> {
    NaiveTime::parse_from_str(label.trim(), "%H:%M").map_err(|e| ValidationError::InvalidFormat {
        field: "time".to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
