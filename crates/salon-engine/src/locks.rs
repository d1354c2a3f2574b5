//! # In-Process Locks
//!
//! Named async mutexes that serialize work on one resource while leaving
//! unrelated work free to run.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────┬──────────────────┐
//! │ Resource             │ Key                          │ Contended        │
//! ├──────────────────────┼──────────────────────────────┼──────────────────┤
//! │ Booking slot         │ staff + date + time          │ fail fast        │
//! │                      │ (staff + date in overlap)    │                  │
//! │ Appointment          │ appointment id               │ fail fast        │
//! │ Number bucket        │ APP/SES + day                │ bounded wait     │
//! └──────────────────────┴──────────────────────────────┴──────────────────┘
//! ```
//!
//! Acquisition order is appointment, then slot, then number bucket. Guards
//! are held until the transaction that needed them has committed or rolled
//! back.
//!
//! These locks only see this process. Another process writing to the same
//! file is caught by the unique indexes instead.

use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use salon_core::schedule::format_slot;
use salon_core::{ConflictMode, NumberKind};

type LockMap<K> = Arc<DashMap<K, Arc<Mutex<()>>>>;

/// Held for as long as the resource must stay reserved. Dropping it frees
/// the resource and forgets its mutex once nobody else is holding or
/// waiting on it.
pub struct LockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish_non_exhaustive()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // unlock first so the map holds the last reference
        drop(self.guard.take());
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlotKey {
    staff_id: String,
    date: NaiveDate,
    /// `None` locks the whole day (overlap mode).
    time: Option<NaiveTime>,
}

#[derive(Debug)]
pub struct LockRegistry {
    slots: LockMap<SlotKey>,
    appointments: LockMap<String>,
    numbers: LockMap<(NumberKind, NaiveDate)>,
    number_wait: Duration,
}

/// Returns the mutex for `key`, creating it on first use.
fn entry<K>(map: &LockMap<K>, key: K) -> Arc<Mutex<()>>
where
    K: Eq + Hash,
{
    map.entry(key).or_default().clone()
}

/// Drops the entry for `key` when the map holds the only reference.
fn forget_if_idle<K>(map: &LockMap<K>, key: &K)
where
    K: Eq + Hash,
{
    map.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
}

fn held<K>(map: &LockMap<K>, key: K, guard: OwnedMutexGuard<()>) -> LockGuard
where
    K: Eq + Hash + Send + Sync + 'static,
{
    let map = Arc::clone(map);
    LockGuard {
        guard: Some(guard),
        release: Some(Box::new(move || forget_if_idle(&map, &key))),
    }
}

/// Fail-fast acquisition shared by slots and appointments.
fn try_acquire<K>(map: &LockMap<K>, key: K) -> Option<LockGuard>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    let mutex = entry(map, key.clone());
    match mutex.try_lock_owned() {
        Ok(guard) => Some(held(map, key, guard)),
        Err(_) => {
            forget_if_idle(map, &key);
            None
        }
    }
}

impl LockRegistry {
    pub fn new(number_wait: Duration) -> Self {
        LockRegistry {
            slots: Arc::new(DashMap::new()),
            appointments: Arc::new(DashMap::new()),
            numbers: Arc::new(DashMap::new()),
            number_wait,
        }
    }

    /// Reserves a booking slot or fails immediately with `Conflict`.
    pub fn try_slot(
        &self,
        mode: ConflictMode,
        staff_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> EngineResult<LockGuard> {
        let key = SlotKey {
            staff_id: staff_id.to_string(),
            date,
            time: match mode {
                ConflictMode::ExactSlot => Some(time),
                ConflictMode::Overlap => None,
            },
        };

        try_acquire(&self.slots, key).ok_or_else(|| {
            warn!(staff_id = %staff_id, date = %date, time = %format_slot(time), "Slot is being booked");
            EngineError::Conflict(format!(
                "Slot {} {} is being booked by another request",
                date,
                format_slot(time)
            ))
        })
    }

    /// Reserves an appointment or fails immediately with `Conflict`.
    pub fn try_appointment(&self, id: &str) -> EngineResult<LockGuard> {
        try_acquire(&self.appointments, id.to_string()).ok_or_else(|| {
            warn!(id = %id, "Appointment is being modified");
            EngineError::Conflict(format!("Appointment {id} is being modified"))
        })
    }

    /// Waits up to the configured bound for a number bucket.
    pub async fn number_bucket(&self, kind: NumberKind, date: NaiveDate) -> EngineResult<LockGuard> {
        let key = (kind, date);
        let mutex = entry(&self.numbers, key);

        match tokio::time::timeout(self.number_wait, mutex.lock_owned()).await {
            Ok(guard) => Ok(held(&self.numbers, key, guard)),
            Err(_) => {
                forget_if_idle(&self.numbers, &key);
                warn!(kind = ?kind, date = %date, wait = ?self.number_wait, "Number bucket wait timed out");
                Err(EngineError::Conflict(format!(
                    "Timed out waiting to issue a {} number",
                    kind.prefix()
                )))
            }
        }
    }

    /// Resources with a live mutex, held or awaited.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.len() + self.appointments.len() + self.numbers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_slot_lock_fails_fast_and_releases() {
        let locks = LockRegistry::new(Duration::from_millis(50));

        let held = locks
            .try_slot(ConflictMode::ExactSlot, "ali", day(), at(10, 0))
            .unwrap();
        let err = locks
            .try_slot(ConflictMode::ExactSlot, "ali", day(), at(10, 0))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);

        // other slots and other staff are independent
        locks
            .try_slot(ConflictMode::ExactSlot, "ali", day(), at(10, 15))
            .unwrap();
        locks
            .try_slot(ConflictMode::ExactSlot, "sami", day(), at(10, 0))
            .unwrap();

        drop(held);
        locks
            .try_slot(ConflictMode::ExactSlot, "ali", day(), at(10, 0))
            .unwrap();
    }

    #[test]
    fn test_overlap_mode_locks_the_day() {
        let locks = LockRegistry::new(Duration::from_millis(50));

        let _held = locks
            .try_slot(ConflictMode::Overlap, "ali", day(), at(10, 0))
            .unwrap();
        assert!(locks
            .try_slot(ConflictMode::Overlap, "ali", day(), at(15, 0))
            .is_err());
    }

    #[test]
    fn test_appointment_lock() {
        let locks = LockRegistry::new(Duration::from_millis(50));
        let _held = locks.try_appointment("a1").unwrap();
        assert!(locks.try_appointment("a1").is_err());
        assert!(locks.try_appointment("a2").is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = LockRegistry::new(Duration::from_millis(20));

        for i in 0..1000 {
            let guard = locks.try_appointment(&format!("a{i}")).unwrap();
            drop(guard);
        }
        assert_eq!(locks.tracked(), 0);

        let slot = locks
            .try_slot(ConflictMode::ExactSlot, "ali", day(), at(10, 0))
            .unwrap();
        let bucket = locks.number_bucket(NumberKind::Appointment, day()).await.unwrap();
        assert_eq!(locks.tracked(), 2);

        // a losing contender does not leave anything behind either
        assert!(locks
            .try_slot(ConflictMode::ExactSlot, "ali", day(), at(10, 0))
            .is_err());
        assert!(locks.number_bucket(NumberKind::Appointment, day()).await.is_err());
        assert_eq!(locks.tracked(), 2);

        drop(slot);
        drop(bucket);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_number_bucket_times_out() {
        let locks = LockRegistry::new(Duration::from_millis(20));

        let held = locks.number_bucket(NumberKind::Session, day()).await.unwrap();
        let err = locks
            .number_bucket(NumberKind::Session, day())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);

        // a different kind is a different bucket
        locks
            .number_bucket(NumberKind::Appointment, day())
            .await
            .unwrap();

        drop(held);
        locks.number_bucket(NumberKind::Session, day()).await.unwrap();
    }
}
