use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{CardInfo, CardTemplate, Model, NewNote, NoteInfo};

#[derive(Clone)]
pub struct AnkiConnectClient {
    base_url: String,
    client: reqwest::Client,
}

impl AnkiConnectClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Check if AnkiConnect is available
    pub async fn check_connection(&self) -> Result<u32> {
        self.invoke("version", json!({})).await?.into_result()
    }

    /// Trigger a sync with AnkiWeb
    pub async fn sync(&self) -> Result<()> {
        self.invoke::<serde_json::Value>("sync", json!({}))
            .await?
            .check()
    }

    pub async fn create_deck(&self, deck: &str) -> Result<u64> {
        self.invoke("createDeck", json!({ "deck": deck }))
            .await?
            .into_result()
    }

    pub async fn deck_names(&self) -> Result<Vec<String>> {
        self.invoke("deckNames", json!({})).await?.into_result()
    }

    pub async fn create_model(&self, model: &Model) -> Result<()> {
        let mut params = json!({
            "modelName": model.name,
            "inOrderFields": model.fields,
            "cardTemplates": model.templates,
        });
        if let Some(css) = &model.css {
            params["css"] = json!(css);
        }

        self.invoke::<serde_json::Value>("createModel", params)
            .await?
            .check()
    }

    pub async fn model_names(&self) -> Result<Vec<String>> {
        self.invoke("modelNames", json!({})).await?.into_result()
    }

    pub async fn model_field_names(&self, model: &str) -> Result<Vec<String>> {
        self.invoke("modelFieldNames", json!({ "modelName": model }))
            .await?
            .into_result()
    }

    pub async fn add_model_field(&self, model: &str, field: &str) -> Result<()> {
        self.invoke::<serde_json::Value>(
            "modelFieldAdd",
            json!({ "modelName": model, "fieldName": field }),
        )
        .await?
        .check()
    }

    pub async fn model_styling(&self, model: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Styling {
            css: String,
        }

        let styling: Styling = self
            .invoke("modelStyling", json!({ "modelName": model }))
            .await?
            .into_result()?;
        Ok(styling.css)
    }

    pub async fn update_model_styling(&self, model: &str, css: &str) -> Result<()> {
        self.invoke::<serde_json::Value>(
            "updateModelStyling",
            json!({ "model": { "name": model, "css": css } }),
        )
        .await?
        .check()
    }

    pub async fn model_templates(&self, model: &str) -> Result<Vec<CardTemplate>> {
        #[derive(Deserialize)]
        struct Sides {
            #[serde(rename = "Front")]
            front: String,
            #[serde(rename = "Back")]
            back: String,
        }

        let data: HashMap<String, Sides> = self
            .invoke("modelTemplates", json!({ "modelName": model }))
            .await?
            .into_result()?;

        Ok(data
            .into_iter()
            .map(|(name, sides)| CardTemplate {
                name,
                front: sides.front,
                back: sides.back,
            })
            .collect())
    }

    pub async fn update_model_templates(
        &self,
        model: &str,
        templates: &[CardTemplate],
    ) -> Result<()> {
        let templates: HashMap<&str, serde_json::Value> = templates
            .iter()
            .map(|t| (t.name.as_str(), json!({ "Front": t.front, "Back": t.back })))
            .collect();

        self.invoke::<serde_json::Value>(
            "updateModelTemplates",
            json!({ "model": { "name": model, "templates": templates } }),
        )
        .await?
        .check()
    }

    pub async fn add_model_template(&self, model: &str, template: &CardTemplate) -> Result<()> {
        self.invoke::<serde_json::Value>(
            "modelTemplateAdd",
            json!({ "modelName": model, "template": template }),
        )
        .await?
        .check()
    }

    pub async fn remove_model_template(&self, model: &str, template_name: &str) -> Result<()> {
        self.invoke::<serde_json::Value>(
            "modelTemplateRemove",
            json!({ "modelName": model, "templateName": template_name }),
        )
        .await?
        .check()
    }

    pub async fn add_note(&self, note: &NewNote) -> Result<u64> {
        self.invoke("addNote", json!({ "note": note }))
            .await?
            .into_result()
    }

    /// Add a batch of notes; the result carries one id per input, null
    /// where the note could not be added.
    pub async fn add_notes(&self, notes: &[NewNote]) -> Result<Vec<Option<u64>>> {
        self.invoke("addNotes", json!({ "notes": notes }))
            .await?
            .into_result()
    }

    pub async fn update_note_fields(&self, id: u64, fields: &HashMap<String, String>) -> Result<()> {
        self.invoke::<serde_json::Value>(
            "updateNoteFields",
            json!({ "note": { "id": id, "fields": fields } }),
        )
        .await?
        .check()
    }

    pub async fn find_notes(&self, query: &str) -> Result<Vec<u64>> {
        self.invoke("findNotes", json!({ "query": query }))
            .await?
            .into_result()
    }

    pub async fn find_cards(&self, query: &str) -> Result<Vec<u64>> {
        self.invoke("findCards", json!({ "query": query }))
            .await?
            .into_result()
    }

    pub async fn notes_info(&self, notes: &[u64]) -> Result<Vec<NoteInfo>> {
        self.invoke("notesInfo", json!({ "notes": notes }))
            .await?
            .into_result()
    }

    pub async fn cards_info(&self, cards: &[u64]) -> Result<Vec<CardInfo>> {
        self.invoke("cardsInfo", json!({ "cards": cards }))
            .await?
            .into_result()
    }

    /// One entry per input card, null for unknown card ids.
    pub async fn are_suspended(&self, cards: &[u64]) -> Result<Vec<Option<bool>>> {
        self.invoke("areSuspended", json!({ "cards": cards }))
            .await?
            .into_result()
    }

    pub async fn suspend(&self, cards: &[u64]) -> Result<()> {
        self.invoke::<serde_json::Value>("suspend", json!({ "cards": cards }))
            .await?
            .check()
    }

    pub async fn unsuspend(&self, cards: &[u64]) -> Result<()> {
        self.invoke::<serde_json::Value>("unsuspend", json!({ "cards": cards }))
            .await?
            .check()
    }

    /// `days` uses Anki's syntax: "0" (today), "1", "3-7", ...
    pub async fn set_due_date(&self, cards: &[u64], days: &str) -> Result<()> {
        self.invoke::<serde_json::Value>("setDueDate", json!({ "cards": cards, "days": days }))
            .await?
            .check()
    }

    pub async fn store_media_file(&self, filename: &str, data_b64: &str) -> Result<()> {
        let _stored: String = self
            .invoke(
                "storeMediaFile",
                json!({ "filename": filename, "data": data_b64 }),
            )
            .await?
            .into_result()?;
        Ok(())
    }

    /// Invoke an AnkiConnect API action
    async fn invoke<T>(&self, action: &str, params: serde_json::Value) -> Result<AnkiResponse<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request = AnkiRequest {
            action: action.to_string(),
            version: 6,
            params,
        };

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to AnkiConnect")?;

        response
            .json::<AnkiResponse<T>>()
            .await
            .context("Failed to parse AnkiConnect response")
    }
}

#[derive(Serialize)]
struct AnkiRequest {
    action: String,
    version: u32,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct AnkiResponse<T> {
    result: Option<T>,
    error: Option<String>,
}

impl<T> AnkiResponse<T> {
    fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            anyhow::bail!("AnkiConnect error: {}", error);
        }

        self.result.context("AnkiConnect returned null result")
    }

    /// For actions whose result is null on success.
    fn check(self) -> Result<()> {
        if let Some(error) = self.error {
            anyhow::bail!("AnkiConnect error: {}", error);
        }

        Ok(())
    }
}
