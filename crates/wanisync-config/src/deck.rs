use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wanisync_types::AudioFormat;

#[derive(Serialize, Deserialize)]
pub struct DeckConfig {
    /// Parent deck name; subjects land in `{name}::{Radicals,Kanji,Vocab}`.
    pub name: String,
    /// Preferred pronunciation audio encoding.
    pub audio_format: AudioFormat,
    /// A card counts as learned once its strength reaches this many days.
    pub learned_threshold_days: f64,
}

impl DeckConfig {
    pub fn from_env() -> Result<Self> {
        let name = env::var("WANISYNC_DECK").unwrap_or_else(|_| "WaniKani".to_string());

        let audio_format = match env::var("WANISYNC_AUDIO_FORMAT") {
            Ok(v) => AudioFormat::from_str(&v)
                .with_context(|| format!("unknown audio format {v:?} (use webm or mpeg)"))?,
            Err(_) => AudioFormat::Webm,
        };

        let learned_threshold_days = match env::var("WANISYNC_LEARNED_DAYS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("WANISYNC_LEARNED_DAYS {v:?} is not a number"))?,
            Err(_) => 21.0,
        };

        Ok(Self {
            name,
            audio_format,
            learned_threshold_days,
        })
    }
}
