// src/session.rs
// A review session: a snapshot of one deck's cards, served one at a time.

use chrono::{DateTime, Utc};
use log::warn;

use crate::deck::Card;
use crate::error::{Error, Result};
use crate::scheduler::Quality;
use crate::storage::ReviewLogger;
use crate::store::CardStore;

pub struct ReviewSession {
    deck_id: String,
    /// Card ids still to show. The next card is at the end, for `pop`.
    review_queue: Vec<String>,
    current: Option<String>,
    session_total: usize,
    session_reviews_complete: usize,
    failed_cards_this_session: Vec<String>,
    logger: Option<ReviewLogger>,
}

impl ReviewSession {
    /// A session over the deck's due cards.
    pub fn due(store: &CardStore, deck_id: &str) -> Self {
        Self::from_cards(deck_id, store.due_cards(Some(deck_id)))
    }

    /// A session over every card in the deck, due or not.
    pub fn all(store: &CardStore, deck_id: &str) -> Self {
        Self::from_cards(deck_id, store.deck_cards(deck_id))
    }

    fn from_cards(deck_id: &str, cards: Vec<Card>) -> Self {
        let review_queue: Vec<String> = cards.into_iter().rev().map(|card| card.id).collect();
        let session_total = review_queue.len();

        ReviewSession {
            deck_id: deck_id.to_string(),
            review_queue,
            current: None,
            session_total,
            session_reviews_complete: 0,
            failed_cards_this_session: Vec::new(),
            logger: None,
        }
    }

    /// Appends every answer to the review log as well.
    pub fn with_logger(mut self, logger: ReviewLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    /// Moves to the next card. Cards deleted since the session started are skipped.
    pub fn next_card(&mut self, store: &CardStore) -> Option<Card> {
        self.current = None;
        while let Some(id) = self.review_queue.pop() {
            if let Some(card) = store.get(&id) {
                self.current = Some(id);
                return Some(card.clone());
            }
            self.session_total = self.session_total.saturating_sub(1);
        }
        None
    }

    /// Records the rating for the card on screen.
    pub fn answer(&mut self, store: &mut CardStore, quality: Quality, at: DateTime<Utc>) -> Result<Card> {
        let card_id = self.current.take().ok_or(Error::NoCardInProgress)?;
        let card = match store.review(&card_id, quality) {
            Ok(card) => card,
            Err(e) => {
                self.current = Some(card_id);
                return Err(e);
            }
        };

        self.session_reviews_complete += 1;
        if !quality.is_passing() && !self.failed_cards_this_session.contains(&card_id) {
            self.failed_cards_this_session.push(card_id);
        }

        if let Some(logger) = &self.logger {
            // The review is already saved; losing the log line is not worth failing over.
            if let Err(e) = logger.log_review(&card, quality, at) {
                warn!("Could not write review log {:?}: {}", logger.path(), e);
            }
        }
        Ok(card)
    }

    pub fn reviews_complete(&self) -> usize {
        self.session_reviews_complete
    }

    pub fn total_session_cards(&self) -> usize {
        self.session_total
    }

    /// Cards rated below passing at least once this session.
    pub fn failed_cards(&self) -> &[String] {
        &self.failed_cards_this_session
    }

    pub fn is_done(&self) -> bool {
        self.current.is_none() && self.review_queue.is_empty()
    }
}
