// src/storage/db.rs
// Manages the SQLite database that holds the cards.

use std::fs;
use std::path::Path;

use log::debug;
use rusqlite::{params, Connection, Row};

use super::CardStorage;
use crate::deck::loader::{RawCardRecord, StoredRecord};
use crate::deck::Card;
use crate::error::Result;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file, creating its directory if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        debug!("Opening card database at {:?}", path);
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let storage = SqliteStorage { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Creates the cards table if it doesn't already exist.
    ///
    /// Only the id is enforced here; every other column may be missing on
    /// rows written by older versions, and the loader decides what to do.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cards (
                id                  TEXT PRIMARY KEY NOT NULL,
                front               TEXT,
                back                TEXT,
                front_image_url     TEXT,
                back_image_url      TEXT,
                deck_id             TEXT,
                deck_name           TEXT,
                interval            INTEGER,
                repetitions         INTEGER,
                ease_factor         REAL,
                next_review_date    TEXT,
                last_review_date    TEXT
            )",
            [],
        )?;
        self.conn.execute("CREATE INDEX IF NOT EXISTS cards_deck ON cards (deck_id)", [])?;
        Ok(())
    }
}

fn read_row(row: &Row<'_>) -> StoredRecord {
    let fields = || -> rusqlite::Result<RawCardRecord> {
        Ok(RawCardRecord {
            id: row.get(0)?,
            front: row.get(1)?,
            back: row.get(2)?,
            front_image_url: row.get(3)?,
            back_image_url: row.get(4)?,
            deck_id: row.get(5)?,
            deck_name: row.get(6)?,
            interval: row.get(7)?,
            repetitions: row.get(8)?,
            ease_factor: row.get(9)?,
            next_review_date: row.get(10)?,
            last_review_date: row.get(11)?,
        })
    };
    fields().map_err(|e| format!("unreadable row: {}", e))
}

impl CardStorage for SqliteStorage {
    fn load(&mut self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, front, back, front_image_url, back_image_url, deck_id, deck_name,
                    interval, repetitions, ease_factor, next_review_date, last_review_date
             FROM cards ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| Ok(read_row(row)))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        debug!("Read {} card rows.", records.len());
        Ok(records)
    }

    /// Upserts rather than `INSERT OR REPLACE` so the row keeps its rowid,
    /// and with it its place in creation order.
    fn save(&mut self, card: &Card) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cards (id, front, back, front_image_url, back_image_url, deck_id, deck_name,
                                interval, repetitions, ease_factor, next_review_date, last_review_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                front = excluded.front,
                back = excluded.back,
                front_image_url = excluded.front_image_url,
                back_image_url = excluded.back_image_url,
                deck_id = excluded.deck_id,
                deck_name = excluded.deck_name,
                interval = excluded.interval,
                repetitions = excluded.repetitions,
                ease_factor = excluded.ease_factor,
                next_review_date = excluded.next_review_date,
                last_review_date = excluded.last_review_date",
            params![
                card.id,
                card.front,
                card.back,
                card.front_image_url,
                card.back_image_url,
                card.deck_id,
                card.deck_name,
                card.interval,
                card.repetitions,
                card.ease_factor,
                card.next_review_date.to_rfc3339(),
                card.last_review_date.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn delete(&mut self, card_id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM cards WHERE id = ?1", [card_id])?;
        Ok(())
    }

    fn delete_deck(&mut self, deck_id: &str) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM cards WHERE deck_id = ?1", [deck_id])?;
        debug!("Deleted {} rows for deck {}", removed, deck_id);
        Ok(())
    }
}
