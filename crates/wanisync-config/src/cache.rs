use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory downloaded media is kept in between runs.
    pub dir: PathBuf,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let dir = env::var("WANISYNC_CACHE_DIR").map(PathBuf::from).unwrap_or_else(|_| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wanisync")
        });

        Self { dir }
    }
}
