use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use std::sync::Mutex;

/// Source of "now" for everything that needs today's date.
///
/// The offset carried by `now()` defines which calendar day an instant
/// belongs to.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// The calendar day `now()` falls on, in the clock's own offset
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock in the machine's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Settable clock for deterministic behaviour
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Clock pinned to 08:00 UTC on the given day
    pub fn at_day(day: NaiveDate) -> Self {
        let naive = day.and_hms_opt(8, 0, 0).unwrap_or_default();
        Self::new(naive.and_utc().fixed_offset())
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn set_day(&self, day: NaiveDate) {
        let naive = day.and_hms_opt(8, 0, 0).unwrap_or_default();
        self.set(naive.and_utc().fixed_offset());
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
