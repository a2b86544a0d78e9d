// src/scheduler.rs
// Contains the logic for the spaced repetition system.
//
// This is the SM-2 algorithm. Quality ratings (0-5):
// - 0: Complete blackout, no recall
// - 1: Incorrect, but remembered once the answer was shown
// - 2: Incorrect, but the answer felt familiar
// - 3: Correct response with serious difficulty
// - 4: Correct response after hesitation
// - 5: Perfect response with no hesitation

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::deck::{SchedulingState, MIN_EASE_FACTOR};
use crate::error::{Error, Result};

/// Lowest quality that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;
/// Upper bound on any interval, keeping date arithmetic in range.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// A validated recall grade in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Rejects anything outside `0..=5`. Callers facing user input go through here.
    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(Error::InvalidQuality(value))
        }
    }

    /// Forces a value into range instead of failing.
    pub fn clamped(value: i64) -> Self {
        Quality(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self.0 >= PASSING_QUALITY
    }

    /// Every quality from 0 to 5, in order.
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=Self::MAX).map(Quality)
    }
}

impl TryFrom<i64> for Quality {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Quality::new(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents the user's rating on a two-button "knew it / didn't" screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Knew,
    DidNotKnow,
}

impl Rating {
    pub fn quality(self) -> Quality {
        match self {
            Rating::Knew => Quality(5),
            Rating::DidNotKnow => Quality(2),
        }
    }
}

impl From<Rating> for Quality {
    fn from(rating: Rating) -> Self {
        rating.quality()
    }
}

/// Midnight UTC at the start of `day`. All stored review dates sit on one.
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Computes the state a card moves to after being reviewed on `today`
/// with the given quality.
///
/// Pure: the same inputs always produce the same output. Intervals
/// saturate at `MAX_INTERVAL_DAYS`.
pub fn schedule(state: &SchedulingState, quality: Quality, today: NaiveDate) -> SchedulingState {
    let (interval, repetitions) = next_interval(state, quality);
    let reviewed_on = day_start(today);

    SchedulingState {
        interval,
        repetitions,
        ease_factor: next_ease_factor(state.ease_factor, quality),
        next_review_date: reviewed_on + Duration::days(interval as i64),
        last_review_date: Some(reviewed_on),
    }
}

/// Returns `(interval, repetitions)` after a review of the given quality.
fn next_interval(state: &SchedulingState, quality: Quality) -> (u32, u32) {
    if !quality.is_passing() {
        return (1, 0);
    }

    let repetitions = state.repetitions.saturating_add(1);
    let interval = match repetitions {
        1 => 1,
        2 => 6,
        // Grows from the interval before this review, using the ease factor before this review.
        _ => {
            let grown = (state.interval as f64 * state.ease_factor).round();
            (grown.min(MAX_INTERVAL_DAYS as f64) as u32).max(1)
        }
    };
    (interval, repetitions)
}

/// EF' = max(1.3, EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)))
///
/// Applied on failed reviews too.
fn next_ease_factor(ease_factor: f64, quality: Quality) -> f64 {
    let miss = (Quality::MAX - quality.value()) as f64;
    (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR)
}

/// The interval each quality 0..=5 would give, indexed by quality.
/// Used to show the user what a rating means before they pick one.
pub fn preview_intervals(state: &SchedulingState) -> [u32; 6] {
    let mut intervals = [0; 6];
    for quality in Quality::all() {
        intervals[quality.value() as usize] = next_interval(state, quality).0;
    }
    intervals
}

/// Format an interval in days to a short human-readable string.
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
