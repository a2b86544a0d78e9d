// src/error.rs
// The error type shared by the store, the storage backends and the binary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid quality {0}: expected an integer between 0 and 5")]
    InvalidQuality(i64),

    #[error("card not found: {0}")]
    NotFound(String),

    #[error("unknown preloaded deck: {0}")]
    UnknownPreloadedDeck(String),

    #[error("no card is currently being reviewed")]
    NoCardInProgress,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
