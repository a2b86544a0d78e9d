// CardForge - lib.rs
// Flash cards under SM-2 spaced repetition: the scheduler, the card store
// and the storage backends behind it.

pub mod clock;
pub mod config;
pub mod debug;
pub mod deck;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, StorageBackend};
pub use deck::loader::LoadWarning;
pub use deck::{Card, DeckSummary, NewCard, SchedulingState};
pub use error::{Error, Result};
pub use scheduler::{schedule, Quality, Rating};
pub use session::ReviewSession;
pub use storage::CardStorage;
pub use store::{CardStore, SharedCardStore};
