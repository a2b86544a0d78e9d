// src/config.rs
// Where the data lives and which storage backend holds it.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::storage::{CardStorage, JsonFileStorage, MemoryStorage, ReviewLogger, SqliteStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Json,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::InvalidConfig(format!("unknown storage backend `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    pub database_file: &'static str,
    pub json_file: &'static str,
    pub review_log_file: &'static str,
    pub review_log_enabled: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::from("cardforge-data"),
            backend: StorageBackend::Sqlite,
            database_file: "cards.db",
            json_file: "cards.json",
            review_log_file: "reviews.log",
            review_log_enabled: true,
        }
    }

    /// Defaults, overridden by `CARDFORGE_DATA_DIR`, `CARDFORGE_BACKEND`
    /// and `CARDFORGE_REVIEW_LOG`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(dir) = lookup("CARDFORGE_DATA_DIR").filter(|dir| !dir.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("CARDFORGE_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(flag) = lookup("CARDFORGE_REVIEW_LOG") {
            config.review_log_enabled = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => return Err(Error::InvalidConfig(format!("CARDFORGE_REVIEW_LOG=`{}`", other))),
            };
        }
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(self.database_file)
    }

    pub fn json_path(&self) -> PathBuf {
        self.data_dir.join(self.json_file)
    }

    pub fn review_log_path(&self) -> PathBuf {
        self.data_dir.join(self.review_log_file)
    }

    pub fn open_storage(&self) -> Result<Box<dyn CardStorage + Send>> {
        Ok(match self.backend {
            StorageBackend::Sqlite => Box::new(SqliteStorage::open(&self.database_path())?),
            StorageBackend::Json => Box::new(JsonFileStorage::new(&self.json_path())),
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
        })
    }

    pub fn review_logger(&self) -> Result<Option<ReviewLogger>> {
        if !self.review_log_enabled {
            return Ok(None);
        }
        ReviewLogger::new(&self.review_log_path()).map(Some)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.database_path(), PathBuf::from("cardforge-data/cards.db"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CARDFORGE_DATA_DIR", "/tmp/cards"),
            ("CARDFORGE_BACKEND", "JSON"),
            ("CARDFORGE_REVIEW_LOG", "off"),
        ]))
        .unwrap();
        assert_eq!(config.backend, StorageBackend::Json);
        assert_eq!(config.json_path(), PathBuf::from("/tmp/cards/cards.json"));
        assert!(config.review_logger().unwrap().is_none());
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("CARDFORGE_BACKEND", "redis")])),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Config::from_lookup(lookup(&[("CARDFORGE_REVIEW_LOG", "maybe")])).is_err());
    }

    #[test]
    fn test_open_storage_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new();
        config.data_dir = dir.path().join("data");
        let mut storage = config.open_storage().unwrap();
        assert!(storage.load().unwrap().is_empty());
        assert!(config.database_path().exists());
    }
}
