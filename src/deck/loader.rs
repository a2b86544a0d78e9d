// src/deck/loader.rs
// Turns persisted card records back into cards.
//
// Stored data is not trusted: records written by older versions may lack
// fields, and hand-edited files may hold anything. Fields with a sensible
// default are repaired; records missing anything else are dropped. Every
// repair or drop is reported as a `LoadWarning`, and one bad record never
// stops the rest from loading.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{Card, DEFAULT_DECK_ID, DEFAULT_DECK_NAME, INITIAL_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::error::Result;
use crate::scheduler::day_start;

/// A persisted record exactly as read, before any validation.
///
/// A field holding a value of the wrong type reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCardRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub front: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub back: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub front_image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub back_image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub deck_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub deck_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub interval: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub repetitions: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ease_factor: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub next_review_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_review_date: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl From<&Card> for RawCardRecord {
    fn from(card: &Card) -> Self {
        RawCardRecord {
            id: Some(card.id.clone()),
            front: Some(card.front.clone()),
            back: Some(card.back.clone()),
            front_image_url: card.front_image_url.clone(),
            back_image_url: card.back_image_url.clone(),
            deck_id: Some(card.deck_id.clone()),
            deck_name: Some(card.deck_name.clone()),
            interval: Some(card.interval as i64),
            repetitions: Some(card.repetitions as i64),
            ease_factor: Some(card.ease_factor),
            next_review_date: Some(card.next_review_date.to_rfc3339()),
            last_review_date: card.last_review_date.map(|d| d.to_rfc3339()),
        }
    }
}

/// One entry from storage: either its fields, or the reason it could not be read at all.
pub type StoredRecord = std::result::Result<RawCardRecord, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningAction {
    /// A field was missing or invalid and was replaced by its default.
    Defaulted,
    /// The record was unusable and was skipped.
    Dropped,
}

/// Something the loader had to repair or skip.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWarning {
    /// Position of the record in storage order.
    pub index: usize,
    pub card_id: Option<String>,
    pub action: WarningAction,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            WarningAction::Defaulted => "repaired",
            WarningAction::Dropped => "dropped",
        };
        match &self.card_id {
            Some(id) => write!(f, "record #{} ({}) {}: {}", self.index, id, verb, self.message),
            None => write!(f, "record #{} {}: {}", self.index, verb, self.message),
        }
    }
}

/// Splits a JSON array of records into entries. Elements that are not
/// objects become unreadable entries; a document that is not an array
/// at all is an error.
pub fn parse_records(json: &str) -> Result<Vec<StoredRecord>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(values
        .into_iter()
        .map(|value| {
            if !value.is_object() {
                return Err(format!("expected an object, found `{}`", value));
            }
            serde_json::from_value(value).map_err(|e| e.to_string())
        })
        .collect())
}

/// Validates stored entries in order, keeping the first card for any repeated id.
pub fn read_records(records: Vec<StoredRecord>) -> (Vec<Card>, Vec<LoadWarning>) {
    let mut cards = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let raw = match record {
            Ok(raw) => raw,
            Err(reason) => {
                warnings.push(LoadWarning { index, card_id: None, action: WarningAction::Dropped, message: reason });
                continue;
            }
        };

        if let Some(card) = read_record(index, raw, &mut warnings) {
            if seen.insert(card.id.clone()) {
                cards.push(card);
            } else {
                warnings.push(LoadWarning {
                    index,
                    card_id: Some(card.id),
                    action: WarningAction::Dropped,
                    message: "duplicate card id".to_string(),
                });
            }
        }
    }

    (cards, warnings)
}

/// Validates a single record. Returns `None` if it had to be dropped.
pub fn read_record(index: usize, raw: RawCardRecord, warnings: &mut Vec<LoadWarning>) -> Option<Card> {
    let card_id = raw.id.clone().filter(|id| !id.is_empty());
    let warn = |warnings: &mut Vec<LoadWarning>, action: WarningAction, message: String| {
        warnings.push(LoadWarning { index, card_id: card_id.clone(), action, message });
    };

    let Some(id) = card_id.clone() else {
        warn(warnings, WarningAction::Dropped, "missing id".to_string());
        return None;
    };
    let (Some(front), Some(back)) = (raw.front, raw.back) else {
        warn(warnings, WarningAction::Dropped, "missing front or back".to_string());
        return None;
    };
    let Some(interval) = raw.interval.and_then(|n| u32::try_from(n).ok()) else {
        warn(warnings, WarningAction::Dropped, format!("invalid interval {:?}", raw.interval));
        return None;
    };
    let Some(repetitions) = raw.repetitions.and_then(|n| u32::try_from(n).ok()) else {
        warn(warnings, WarningAction::Dropped, format!("invalid repetitions {:?}", raw.repetitions));
        return None;
    };
    let Some(next_review_date) = raw.next_review_date.as_deref().and_then(parse_date) else {
        warn(warnings, WarningAction::Dropped, format!("invalid nextReviewDate {:?}", raw.next_review_date));
        return None;
    };

    let deck_id = raw.deck_id.unwrap_or_else(|| {
        warn(warnings, WarningAction::Defaulted, format!("missing deckId, using `{}`", DEFAULT_DECK_ID));
        DEFAULT_DECK_ID.to_string()
    });
    let deck_name = raw.deck_name.unwrap_or_else(|| {
        warn(warnings, WarningAction::Defaulted, format!("missing deckName, using `{}`", DEFAULT_DECK_NAME));
        DEFAULT_DECK_NAME.to_string()
    });

    let ease_factor = match raw.ease_factor {
        Some(ef) if ef.is_finite() && ef >= MIN_EASE_FACTOR => ef,
        Some(ef) if ef.is_finite() && ef > 0.0 => {
            warn(warnings, WarningAction::Defaulted, format!("easeFactor {} below minimum, raised to {}", ef, MIN_EASE_FACTOR));
            MIN_EASE_FACTOR
        }
        other => {
            warn(warnings, WarningAction::Defaulted, format!("invalid easeFactor {:?}, using {}", other, INITIAL_EASE_FACTOR));
            INITIAL_EASE_FACTOR
        }
    };

    let last_review_date = match raw.last_review_date.as_deref() {
        None => None,
        Some(text) => {
            let parsed = parse_date(text);
            if parsed.is_none() {
                warn(warnings, WarningAction::Defaulted, format!("invalid lastReviewDate `{}`, treating as never reviewed", text));
            }
            parsed
        }
    };

    Some(Card {
        id,
        front,
        back,
        front_image_url: raw.front_image_url,
        back_image_url: raw.back_image_url,
        deck_id,
        deck_name,
        interval,
        repetitions,
        ease_factor,
        next_review_date,
        last_review_date,
    })
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(day_start)
}
