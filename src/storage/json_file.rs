// src/storage/json_file.rs
// Keeps every card in one JSON array file, the record format the cards are
// exported in.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::CardStorage;
use crate::deck::loader::{parse_records, read_records, StoredRecord};
use crate::deck::Card;
use crate::error::Result;

pub struct JsonFileStorage {
    path: PathBuf,
    /// The cards as last written, kept in file order.
    cards: Vec<Card>,
}

impl JsonFileStorage {
    /// Does not touch the file; it is first read by `load` and first
    /// written by the first change.
    pub fn new(path: &Path) -> Self {
        JsonFileStorage { path: path.to_path_buf(), cards: Vec::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a temporary file beside the target and renames it into
    /// place, so a crash mid-write leaves the previous file intact.
    fn flush(&self) -> Result<()> {
        let dir = match self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(serde_json::to_string_pretty(&self.cards)?.as_bytes())?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        debug!("Wrote {} cards to {:?}", self.cards.len(), self.path);
        Ok(())
    }
}

impl CardStorage for JsonFileStorage {
    fn load(&mut self) -> Result<Vec<StoredRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.cards.clear();
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records = parse_records(&content)?;
        // Mirror only what would load; unreadable entries are gone after the next write.
        let (cards, _) = read_records(records.clone());
        self.cards = cards;
        Ok(records)
    }

    fn save(&mut self, card: &Card) -> Result<()> {
        match self.cards.iter_mut().find(|stored| stored.id == card.id) {
            Some(stored) => *stored = card.clone(),
            None => self.cards.push(card.clone()),
        }
        self.flush()
    }

    fn delete(&mut self, card_id: &str) -> Result<()> {
        let before = self.cards.len();
        self.cards.retain(|card| card.id != card_id);
        if self.cards.len() == before {
            return Ok(());
        }
        self.flush()
    }

    fn delete_deck(&mut self, deck_id: &str) -> Result<()> {
        let before = self.cards.len();
        self.cards.retain(|card| card.deck_id != deck_id);
        if self.cards.len() == before {
            return Ok(());
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::NewCard;
    use chrono::{TimeZone, Utc};

    fn card(id: &str, deck: &str) -> Card {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Card::new(id.to_string(), NewCard::new("front", "back", deck, "Deck"), now)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFileStorage::new(&dir.path().join("cards.json"));
        assert!(storage.load().unwrap().is_empty());
        storage.delete("nothing").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_changes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");

        let mut storage = JsonFileStorage::new(&path);
        storage.load().unwrap();
        storage.save(&card("a", "d1")).unwrap();
        storage.save(&card("b", "d2")).unwrap();
        storage.delete_deck("d2").unwrap();

        let mut reopened = JsonFileStorage::new(&path);
        let (cards, warnings) = read_records(reopened.load().unwrap());
        assert!(warnings.is_empty());
        assert_eq!(cards, vec![card("a", "d1")]);
    }

    #[test]
    fn test_corrupt_entries_survive_load_but_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let good = serde_json::to_string(&card("a", "d1")).unwrap();
        fs::write(&path, format!("[{}, \"junk\"]", good)).unwrap();

        let mut storage = JsonFileStorage::new(&path);
        assert_eq!(storage.load().unwrap().len(), 2);
        storage.save(&card("b", "d1")).unwrap();

        let records = JsonFileStorage::new(&path).load().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_non_array_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        fs::write(&path, "{}").unwrap();
        assert!(JsonFileStorage::new(&path).load().is_err());
    }
}
