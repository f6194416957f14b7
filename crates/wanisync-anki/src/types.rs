use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One note field as AnkiConnect reports it: the value plus its position
/// in the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
    pub order: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: u64,
    pub model_name: String,
    pub tags: Vec<String>,
    pub fields: HashMap<String, FieldValue>,
    #[serde(rename = "mod", default)]
    pub modified: u64,
    pub cards: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub card_id: u64,
    /// Owning note id.
    pub note: u64,
    pub deck_name: String,
    pub model_name: String,
    pub fields: HashMap<String, FieldValue>,
    /// Scheduler interval in days.
    pub interval: i64,
    #[serde(default, deserialize_with = "memory_state_or_null")]
    pub fsrs: Option<MemoryState>,
}

/// FSRS memory model numbers; absent for legacy-scheduled cards.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MemoryState {
    pub stability: f64,
    pub difficulty: f64,
}

/// AnkiConnect reports `fsrs` as null or an empty object when the card
/// carries no memory state.
fn memory_state_or_null<'de, D>(deserializer: D) -> Result<Option<MemoryState>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) if v.as_object().is_some_and(|o| o.is_empty()) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: HashMap<String, String>,
    pub options: NoteOptions,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
    pub duplicate_scope: String,
}

impl Default for NoteOptions {
    fn default() -> Self {
        Self {
            allow_duplicate: false,
            duplicate_scope: "deck".to_string(),
        }
    }
}

/// Note model description for `createModel` / model reconciliation.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    /// Field names in model order.
    pub fields: Vec<String>,
    pub templates: Vec<CardTemplate>,
    pub css: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTemplate {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
}
