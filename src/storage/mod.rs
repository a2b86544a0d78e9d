// src/storage/mod.rs
// This module handles all data persistence: the card backends and the review log.

pub mod db;
pub mod json_file;
pub mod replay_log;

use crate::deck::loader::{RawCardRecord, StoredRecord};
use crate::deck::Card;
use crate::error::Result;

// Re-export the main structs for easier access.
pub use self::db::SqliteStorage;
pub use self::json_file::JsonFileStorage;
pub use self::replay_log::ReviewLogger;

/// Where a `CardStore` keeps its cards.
///
/// Backends store the flat card record and hand it back unvalidated;
/// repairing or rejecting bad records is the loader's job.
pub trait CardStorage {
    /// Every stored record, oldest first.
    fn load(&mut self) -> Result<Vec<StoredRecord>>;
    /// Inserts the card, or replaces the stored copy without changing its position.
    fn save(&mut self, card: &Card) -> Result<()>;
    /// Deleting an unknown id is not an error.
    fn delete(&mut self, card_id: &str) -> Result<()>;
    /// Deleting an unknown deck is not an error.
    fn delete_deck(&mut self, deck_id: &str) -> Result<()>;
}

/// Keeps cards in memory only. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    records: Vec<Card>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CardStorage for MemoryStorage {
    fn load(&mut self) -> Result<Vec<StoredRecord>> {
        Ok(self.records.iter().map(|card| Ok(RawCardRecord::from(card))).collect())
    }

    fn save(&mut self, card: &Card) -> Result<()> {
        match self.records.iter_mut().find(|stored| stored.id == card.id) {
            Some(stored) => *stored = card.clone(),
            None => self.records.push(card.clone()),
        }
        Ok(())
    }

    fn delete(&mut self, card_id: &str) -> Result<()> {
        self.records.retain(|card| card.id != card_id);
        Ok(())
    }

    fn delete_deck(&mut self, deck_id: &str) -> Result<()> {
        self.records.retain(|card| card.deck_id != deck_id);
        Ok(())
    }
}
