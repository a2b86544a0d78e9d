// src/storage/replay_log.rs
// Manages the plain-text review log kept for recovery purposes.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::deck::Card;
use crate::error::Result;
use crate::scheduler::Quality;

pub struct ReviewLogger {
    log_path: PathBuf,
}

impl ReviewLogger {
    /// Creates the log's directory if needed. The file itself appears on the first review.
    pub fn new(log_path: &Path) -> Result<Self> {
        if let Some(dir) = log_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(ReviewLogger { log_path: log_path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Appends one review, with the card's state after it was rescheduled.
    pub fn log_review(&self, card: &Card, quality: Quality, at: DateTime<Utc>) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        // Format: timestamp_iso,card_id,quality,ease,ivl,next_review
        let log_entry = format!(
            "{},{},{},{:.2},{},{}\n",
            at.to_rfc3339(),
            card.id,
            quality,
            card.ease_factor,
            card.interval,
            card.next_review_date.date_naive()
        );

        file.write_all(log_entry.as_bytes())?;
        Ok(())
    }
}
