use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct WaniKaniConfig {
    /// Personal access token (wanikani.com settings page).
    pub api_token: String,
}

impl WaniKaniConfig {
    pub fn from_env() -> Result<Self> {
        let api_token =
            env::var("WANIKANI_API_TOKEN").context("WANIKANI_API_TOKEN is not set")?;

        Ok(Self { api_token })
    }
}
