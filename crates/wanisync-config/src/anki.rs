use std::env;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct AnkiConfig {
    /// AnkiConnect URL
    pub url: String,
}

impl AnkiConfig {
    pub fn from_env() -> Self {
        let url =
            env::var("ANKICONNECT_URL").unwrap_or_else(|_| "http://127.0.0.1:8765".to_string());

        Self { url }
    }
}
