// src/deck/mod.rs
// Cards, decks and the records they are persisted as.

pub mod loader;
pub mod preloaded;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Ease factor given to every new card.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Deck assigned to legacy records that were saved before decks existed.
pub const DEFAULT_DECK_ID: &str = "user-created";
pub const DEFAULT_DECK_NAME: &str = "My Custom Cards";

/// A single question/answer unit under spaced repetition.
///
/// Serializes to the flat record the stores persist: camelCase field names,
/// dates as RFC 3339 timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_image_url: Option<String>,
    pub deck_id: String,
    pub deck_name: String,
    /// Days until the next review. Zero only before the first review.
    pub interval: u32,
    /// Consecutive passing reviews.
    pub repetitions: u32,
    pub ease_factor: f64,
    pub next_review_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review_date: Option<DateTime<Utc>>,
}

impl Card {
    /// Builds a never-reviewed card, first due at `due`.
    pub fn new(id: String, new_card: NewCard, due: DateTime<Utc>) -> Self {
        Card {
            id,
            front: new_card.front,
            back: new_card.back,
            front_image_url: new_card.front_image_url,
            back_image_url: new_card.back_image_url,
            deck_id: new_card.deck_id,
            deck_name: new_card.deck_name,
            interval: 0,
            repetitions: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            next_review_date: due,
            last_review_date: None,
        }
    }

    pub fn scheduling_state(&self) -> SchedulingState {
        SchedulingState {
            interval: self.interval,
            repetitions: self.repetitions,
            ease_factor: self.ease_factor,
            next_review_date: self.next_review_date,
            last_review_date: self.last_review_date,
        }
    }

    /// Overwrites the scheduling fields with the scheduler's output.
    pub fn apply(&mut self, state: SchedulingState) {
        self.interval = state.interval;
        self.repetitions = state.repetitions;
        self.ease_factor = state.ease_factor;
        self.next_review_date = state.next_review_date;
        self.last_review_date = state.last_review_date;
    }

    /// A card is due once its review day has arrived. Review dates are day
    /// labels: the UTC date of `next_review_date` is the day, on the same
    /// calendar as `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date.date_naive() <= today
    }
}

/// The part of a card the scheduler reads and writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulingState {
    pub interval: u32,
    pub repetitions: u32,
    pub ease_factor: f64,
    pub next_review_date: DateTime<Utc>,
    pub last_review_date: Option<DateTime<Utc>>,
}

/// Everything a caller supplies when creating a card. Scheduling state is
/// never part of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCard {
    pub front: String,
    pub back: String,
    pub deck_id: String,
    pub deck_name: String,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
}

impl NewCard {
    pub fn new(front: &str, back: &str, deck_id: &str, deck_name: &str) -> Self {
        NewCard {
            front: front.to_string(),
            back: back.to_string(),
            deck_id: deck_id.to_string(),
            deck_name: deck_name.to_string(),
            front_image_url: None,
            back_image_url: None,
        }
    }

    pub fn with_images(mut self, front_image_url: Option<String>, back_image_url: Option<String>) -> Self {
        self.front_image_url = front_image_url;
        self.back_image_url = back_image_url;
        self
    }
}

/// One row of the deck selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSummary {
    pub deck_id: String,
    pub deck_name: String,
    pub due_count: usize,
}
