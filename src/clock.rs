// src/clock.rs
// Where the store gets "now" and "today" from.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};

use crate::scheduler::day_start;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    /// The calendar day reviews are scheduled against.
    fn today(&self) -> NaiveDate;
}

/// The wall clock. "Today" is the user's local calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to. Clones share the same time.
///
/// "Today" is the calendar day at `offset`, UTC unless built with
/// `with_offset`.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    /// A clock whose local calendar day is taken at `offset`, like a
    /// `SystemClock` running in that zone.
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        ManualClock { now: Arc::new(Mutex::new(now)), offset }
    }

    /// Starts at midnight UTC of `day`.
    pub fn at_day(day: NaiveDate) -> Self {
        Self::new(day_start(day))
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }
}
