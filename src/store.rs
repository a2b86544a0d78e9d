// src/store.rs
// The card collection: creation, review recording, due-card queries and deletion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::clock::Clock;
use crate::debug::Tracer;
use crate::deck::loader::{read_records, LoadWarning};
use crate::deck::preloaded::PreloadedDeck;
use crate::deck::{Card, DeckSummary, NewCard};
use crate::error::{Error, Result};
use crate::scheduler::{self, Quality};
use crate::storage::CardStorage;

/// A store shared between threads. The mutex serialises every review and
/// delete, so concurrent submissions for one card never lose an update.
pub type SharedCardStore = Arc<Mutex<CardStore>>;

/// Owns the cards and keeps the injected storage in step with them.
///
/// Cards are held in creation order. Every change is written to storage
/// first and applied in memory only once that succeeds.
pub struct CardStore {
    storage: Box<dyn CardStorage + Send>,
    clock: Box<dyn Clock + Send>,
    cards: Vec<Card>,
}

impl CardStore {
    /// Loads every readable card from `storage`. Records that had to be
    /// repaired or dropped come back as warnings.
    pub fn open(
        mut storage: Box<dyn CardStorage + Send>,
        clock: Box<dyn Clock + Send>,
    ) -> Result<(Self, Vec<LoadWarning>)> {
        let _tracer = Tracer::new("Load cards");
        let (cards, warnings) = read_records(storage.load()?);
        info!("Loaded {} cards ({} load warnings).", cards.len(), warnings.len());
        Ok((CardStore { storage, clock, cards }, warnings))
    }

    pub fn into_shared(self) -> SharedCardStore {
        Arc::new(Mutex::new(self))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// All cards, in creation order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    /// Creates a never-reviewed card, due immediately. Its first review
    /// date is today's day label, so it is due whatever the time zone.
    pub fn create(&mut self, new_card: NewCard) -> Result<Card> {
        let id = self.unused_id(self.clock.now());
        let card = Card::new(id, new_card, scheduler::day_start(self.clock.today()));

        self.storage.save(&card)?;
        debug!("Created card {} in deck {}", card.id, card.deck_id);
        self.cards.push(card.clone());
        Ok(card)
    }

    /// Creates one card per `(front, back)` pair, all in the same deck.
    pub fn create_many<I>(&mut self, deck_id: &str, deck_name: &str, entries: I) -> Result<Vec<Card>>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let _tracer = Tracer::new("Bulk create");
        entries
            .into_iter()
            .map(|(front, back)| self.create(NewCard::new(&front, &back, deck_id, deck_name)))
            .collect()
    }

    /// Adds the entries of a preloaded deck that aren't already in it.
    /// An entry counts as present if its deck holds a card with the same
    /// front and back. Returns how many cards were added.
    pub fn import_preloaded(&mut self, deck: &PreloadedDeck) -> Result<usize> {
        let _tracer = Tracer::new("Import preloaded deck");
        let mut added = 0;
        for new_card in deck.new_cards() {
            let exists = self.cards.iter().any(|card| {
                card.deck_id == new_card.deck_id && card.front == new_card.front && card.back == new_card.back
            });
            if !exists {
                self.create(new_card)?;
                added += 1;
            }
        }
        info!("Imported {} new cards from {}", added, deck.name);
        Ok(added)
    }

    /// Records a review given as a raw grade. Grades outside `0..=5` are
    /// rejected, never clamped.
    pub fn record_review(&mut self, card_id: &str, quality: i64) -> Result<Card> {
        self.review(card_id, Quality::new(quality)?)
    }

    /// Reschedules the card as of today and persists the result.
    pub fn review(&mut self, card_id: &str, quality: Quality) -> Result<Card> {
        let today = self.clock.today();
        let index = self
            .cards
            .iter()
            .position(|card| card.id == card_id)
            .ok_or_else(|| Error::NotFound(card_id.to_string()))?;

        let mut updated = self.cards[index].clone();
        updated.apply(scheduler::schedule(&updated.scheduling_state(), quality, today));

        self.storage.save(&updated)?;
        debug!(
            "Reviewed card {} with quality {}: interval {}d, ease {:.2}",
            updated.id, quality, updated.interval, updated.ease_factor
        );
        self.cards[index] = updated.clone();
        Ok(updated)
    }

    /// Cards due today or earlier, optionally limited to one deck, soonest
    /// first. Cards due at the same moment stay in creation order.
    pub fn due_cards(&self, deck_id: Option<&str>) -> Vec<Card> {
        let today = self.clock.today();
        let mut due: Vec<Card> = self
            .cards
            .iter()
            .filter(|card| deck_id.map_or(true, |id| card.deck_id == id))
            .filter(|card| card.is_due(today))
            .cloned()
            .collect();
        due.sort_by_key(|card| card.next_review_date);
        due
    }

    /// Every card in a deck regardless of due date, in the same order as `due_cards`.
    pub fn deck_cards(&self, deck_id: &str) -> Vec<Card> {
        let mut cards: Vec<Card> = self.cards.iter().filter(|card| card.deck_id == deck_id).cloned().collect();
        cards.sort_by_key(|card| card.next_review_date);
        cards
    }

    /// When the deck's next card comes up for review, if it has any cards.
    pub fn next_review_date(&self, deck_id: &str) -> Option<DateTime<Utc>> {
        self.cards
            .iter()
            .filter(|card| card.deck_id == deck_id)
            .map(|card| card.next_review_date)
            .min()
    }

    /// One entry per deck in the store, including decks with nothing due,
    /// sorted by deck name ignoring case. A deck is named after its oldest card.
    pub fn decks_summary(&self) -> Vec<DeckSummary> {
        let today = self.clock.today();
        let mut by_deck: HashMap<&str, DeckSummary> = HashMap::new();

        for card in &self.cards {
            let summary = by_deck.entry(card.deck_id.as_str()).or_insert_with(|| DeckSummary {
                deck_id: card.deck_id.clone(),
                deck_name: card.deck_name.clone(),
                due_count: 0,
            });
            if card.is_due(today) {
                summary.due_count += 1;
            }
        }

        let mut decks: Vec<DeckSummary> = by_deck.into_values().collect();
        decks.sort_by(|a, b| {
            a.deck_name
                .to_lowercase()
                .cmp(&b.deck_name.to_lowercase())
                .then_with(|| a.deck_name.cmp(&b.deck_name))
                .then_with(|| a.deck_id.cmp(&b.deck_id))
        });
        decks
    }

    /// Removes a card. Returns whether it existed; a missing card is not an error.
    pub fn delete(&mut self, card_id: &str) -> Result<bool> {
        if self.get(card_id).is_none() {
            return Ok(false);
        }
        self.storage.delete(card_id)?;
        self.cards.retain(|card| card.id != card_id);
        debug!("Deleted card {}", card_id);
        Ok(true)
    }

    /// Removes every card in the deck. Returns how many were removed.
    pub fn delete_deck(&mut self, deck_id: &str) -> Result<usize> {
        let count = self.cards.iter().filter(|card| card.deck_id == deck_id).count();
        if count == 0 {
            return Ok(0);
        }
        self.storage.delete_deck(deck_id)?;
        self.cards.retain(|card| card.deck_id != deck_id);
        info!("Deleted deck {} ({} cards)", deck_id, count);
        Ok(count)
    }

    /// Creation time in milliseconds plus a random suffix, retried on the
    /// off chance it collides.
    fn unused_id(&self, now: DateTime<Utc>) -> String {
        loop {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(7)
                .map(|c| (c as char).to_ascii_lowercase())
                .collect();
            let id = format!("{}-{}", now.timestamp_millis(), suffix);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::deck::preloaded;
    use crate::deck::INITIAL_EASE_FACTOR;
    use crate::scheduler::day_start;
    use crate::storage::{MemoryStorage, SqliteStorage};
    use chrono::{Duration, FixedOffset, TimeZone};
    use std::thread;

    const EPSILON: f64 = 1e-9;

    fn t0() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn empty_store() -> (CardStore, ManualClock) {
        let clock = ManualClock::at_day(t0());
        let (store, warnings) = CardStore::open(Box::new(MemoryStorage::new()), Box::new(clock.clone())).unwrap();
        assert!(warnings.is_empty());
        (store, clock)
    }

    /// 04:00 UTC on 2 March is still the evening of 1 March at UTC-8.
    fn pacific_evening() -> ManualClock {
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        ManualClock::with_offset(Utc.with_ymd_and_hms(2024, 3, 2, 4, 0, 0).unwrap(), pacific)
    }

    /// A store whose cards sit at the given next-review days, all in one deck.
    fn store_with_due_dates(days: &[NaiveDate]) -> CardStore {
        store_with_due_dates_at(days, ManualClock::at_day(t0()))
    }

    fn store_with_due_dates_at(days: &[NaiveDate], clock: ManualClock) -> CardStore {
        let mut storage = MemoryStorage::new();
        for (i, day) in days.iter().enumerate() {
            let mut card = Card::new(format!("c{}", i), NewCard::new("F", "B", "d1", "Deck"), day_start(t0()));
            card.next_review_date = day_start(*day) + Duration::hours(13);
            storage.save(&card).unwrap();
        }
        CardStore::open(Box::new(storage), Box::new(clock)).unwrap().0
    }

    fn add(store: &mut CardStore, deck_id: &str, deck_name: &str) -> Card {
        store.create(NewCard::new("front", "back", deck_id, deck_name)).unwrap()
    }

    #[test]
    fn test_create_defaults_and_is_due() {
        let (mut store, _) = empty_store();
        let card = add(&mut store, "d1", "Deck");
        assert_eq!(card.interval, 0);
        assert_eq!(card.repetitions, 0);
        assert_eq!(card.ease_factor, INITIAL_EASE_FACTOR);
        assert!(card.last_review_date.is_none());
        assert_eq!(store.due_cards(None), vec![card.clone()]);

        let other = add(&mut store, "d1", "Deck");
        assert_ne!(card.id, other.id);
    }

    #[test]
    fn test_new_card_due_when_local_day_lags_utc() {
        let clock = pacific_evening();
        let (mut store, _) = CardStore::open(Box::new(MemoryStorage::new()), Box::new(clock.clone())).unwrap();
        assert_eq!(store.today(), t0());

        let card = add(&mut store, "d1", "Deck");
        assert_eq!(card.next_review_date, day_start(t0()));
        assert_eq!(store.due_cards(None), vec![card.clone()]);
        assert_eq!(store.decks_summary()[0].due_count, 1);

        let reviewed = store.record_review(&card.id, 5).unwrap();
        assert_eq!(reviewed.last_review_date, Some(day_start(t0())));
        assert_eq!(reviewed.next_review_date, day_start(t0()) + Duration::days(1));
        assert!(store.due_cards(None).is_empty());

        clock.advance_days(1);
        assert_eq!(store.due_cards(None).len(), 1);
    }

    #[test]
    fn test_review_scenario() {
        let (mut store, clock) = empty_store();
        let card = add(&mut store, "d1", "Deck");

        let first = store.record_review(&card.id, 5).unwrap();
        assert_eq!(first.interval, 1);
        assert_eq!(first.repetitions, 1);
        assert!((first.ease_factor - 2.6).abs() < EPSILON);
        assert_eq!(first.next_review_date, day_start(t0()) + Duration::days(1));
        assert_eq!(first.last_review_date, Some(day_start(t0())));
        assert!(store.due_cards(None).is_empty());

        clock.advance_days(1);
        assert_eq!(store.due_cards(None).len(), 1);
        let second = store.record_review(&card.id, 2).unwrap();
        assert_eq!(second.repetitions, 0);
        assert_eq!(second.interval, 1);
        assert!((second.ease_factor - 2.28).abs() < EPSILON);
        assert_eq!(second.next_review_date, day_start(t0()) + Duration::days(2));
        assert_eq!(store.get(&card.id), Some(&second));
    }

    #[test]
    fn test_review_rejects_bad_input() {
        let (mut store, _) = empty_store();
        let card = add(&mut store, "d1", "Deck");
        assert!(matches!(store.record_review(&card.id, 6), Err(Error::InvalidQuality(6))));
        assert!(matches!(store.record_review(&card.id, -1), Err(Error::InvalidQuality(-1))));
        assert!(matches!(store.record_review("nope", 4), Err(Error::NotFound(id)) if id == "nope"));
        assert_eq!(store.get(&card.id), Some(&card));
    }

    #[test]
    fn test_due_filtering_by_day() {
        let yesterday = t0() - Duration::days(1);
        let tomorrow = t0() + Duration::days(1);
        let store = store_with_due_dates(&[tomorrow, t0(), yesterday]);

        let due: Vec<String> = store.due_cards(None).into_iter().map(|c| c.id).collect();
        assert_eq!(due, ["c2", "c1"]);
    }

    #[test]
    fn test_due_filtering_by_local_day() {
        let yesterday = t0() - Duration::days(1);
        let tomorrow = t0() + Duration::days(1);
        let store = store_with_due_dates_at(&[tomorrow, t0(), yesterday], pacific_evening());

        let due: Vec<String> = store.due_cards(None).into_iter().map(|c| c.id).collect();
        assert_eq!(due, ["c2", "c1"]);
        assert_eq!(store.decks_summary()[0].due_count, 2);
    }

    #[test]
    fn test_due_ties_keep_creation_order() {
        let store = store_with_due_dates(&[t0(), t0() - Duration::days(3), t0(), t0()]);
        let due: Vec<String> = store.due_cards(Some("d1")).into_iter().map(|c| c.id).collect();
        assert_eq!(due, ["c1", "c0", "c2", "c3"]);
        assert!(store.due_cards(Some("other")).is_empty());
    }

    #[test]
    fn test_decks_summary() {
        let (mut store, _) = empty_store();
        let a = add(&mut store, "zz", "Algebra");
        add(&mut store, "zz", "Algebra");
        add(&mut store, "aa", "Zoology");
        add(&mut store, "mm", "apple");
        store.record_review(&a.id, 5).unwrap();
        let z = store.cards().iter().find(|c| c.deck_id == "aa").unwrap().id.clone();
        store.record_review(&z, 4).unwrap();

        let summary = store.decks_summary();
        assert_eq!(
            summary,
            vec![
                DeckSummary { deck_id: "zz".into(), deck_name: "Algebra".into(), due_count: 1 },
                DeckSummary { deck_id: "mm".into(), deck_name: "apple".into(), due_count: 1 },
                DeckSummary { deck_id: "aa".into(), deck_name: "Zoology".into(), due_count: 0 },
            ]
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (mut store, _) = empty_store();
        let card = add(&mut store, "d1", "Deck");
        let keep = add(&mut store, "d1", "Deck");

        assert!(store.delete(&card.id).unwrap());
        let after_first: Vec<Card> = store.cards().to_vec();
        assert!(!store.delete(&card.id).unwrap());
        assert!(!store.delete("never-existed").unwrap());
        assert_eq!(store.cards(), after_first.as_slice());
        assert_eq!(store.cards(), &[keep]);
    }

    #[test]
    fn test_delete_deck_cascades() {
        let (mut store, _) = empty_store();
        add(&mut store, "d1", "One");
        add(&mut store, "d2", "Two");
        add(&mut store, "d1", "One");

        assert_eq!(store.delete_deck("d1").unwrap(), 2);
        assert_eq!(store.delete_deck("d1").unwrap(), 0);
        assert!(store.cards().iter().all(|c| c.deck_id != "d1"));
        let decks: Vec<String> = store.decks_summary().into_iter().map(|d| d.deck_id).collect();
        assert_eq!(decks, ["d2"]);
    }

    #[test]
    fn test_import_preloaded_skips_existing() {
        let (mut store, _) = empty_store();
        let deck = preloaded::find("basic-math").unwrap();
        assert_eq!(store.import_preloaded(&deck).unwrap(), deck.entries.len());
        assert_eq!(store.import_preloaded(&deck).unwrap(), 0);
        assert_eq!(store.due_cards(Some("basic-math")).len(), deck.entries.len());
    }

    #[test]
    fn test_create_many_and_deck_queries() {
        let (mut store, clock) = empty_store();
        let cards = store
            .create_many("ai", "Generated", vec![("Q1".into(), "A1".into()), ("Q2".into(), "A2".into())])
            .unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| c.deck_name == "Generated"));

        store.record_review(&cards[0].id, 5).unwrap();
        store.record_review(&cards[1].id, 5).unwrap();
        clock.advance_days(1);
        store.record_review(&cards[1].id, 5).unwrap();

        assert_eq!(store.deck_cards("ai").len(), 2);
        assert_eq!(store.next_review_date("ai"), Some(day_start(t0()) + Duration::days(1)));
        assert_eq!(store.next_review_date("missing"), None);
    }

    #[test]
    fn test_reopen_from_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.db");
        let clock = ManualClock::at_day(t0());

        let (mut store, _) =
            CardStore::open(Box::new(SqliteStorage::open(&path).unwrap()), Box::new(clock.clone())).unwrap();
        let card = add(&mut store, "d1", "Deck");
        let reviewed = store.record_review(&card.id, 4).unwrap();
        add(&mut store, "d2", "Other");
        drop(store);

        let (reopened, warnings) =
            CardStore::open(Box::new(SqliteStorage::open(&path).unwrap()), Box::new(clock)).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.cards()[0], reviewed);
    }

    #[test]
    fn test_shared_store_serialises_reviews() {
        let (mut store, _) = empty_store();
        let card = add(&mut store, "d1", "Deck");
        let shared = store.into_shared();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let id = card.id.clone();
                thread::spawn(move || {
                    let mut store = shared.lock().unwrap();
                    store.record_review(&id, 4).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = shared.lock().unwrap();
        assert_eq!(store.get(&card.id).unwrap().repetitions, 8);
    }
}
