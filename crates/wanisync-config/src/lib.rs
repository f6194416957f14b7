use anyhow::Result;
use serde::{Deserialize, Serialize};

use self::anki::AnkiConfig;
use self::cache::CacheConfig;
use self::deck::DeckConfig;
use self::wanikani::WaniKaniConfig;

pub mod anki;
pub mod cache;
pub mod deck;
pub mod wanikani;

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub wanikani: WaniKaniConfig,
    pub anki: AnkiConfig,
    pub deck: DeckConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Load from the environment. The binary loads a `.env` file first,
    /// so both work.
    pub fn load() -> Result<Self> {
        Ok(Config {
            wanikani: WaniKaniConfig::from_env()?,
            anki: AnkiConfig::from_env(),
            deck: DeckConfig::from_env()?,
            cache: CacheConfig::from_env(),
        })
    }
}
