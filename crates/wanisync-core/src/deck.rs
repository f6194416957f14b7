use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result, bail};
use wanisync_anki::AnkiConnectClient;
use wanisync_anki::types::{Model, NewNote, NoteInfo};
use wanisync_types::{ReviewCard, Strength, SubjectKind};

use crate::subjects::{self, ParsedSubject, SubjectNote};
use crate::templates::{self, METADATA_MODEL_NAME};

/// Builds and maintains the Anki side: the deck tree, the note models,
/// the hidden metadata note, and bulk note/card access.
pub struct DeckBuilder {
    anki: AnkiConnectClient,
    deck_name: String,
}

/// A note as it exists in Anki, parsed back into its typed form.
#[derive(Debug, Clone)]
pub struct StoredNote {
    pub note_id: u64,
    pub cards: Vec<u64>,
    pub level: u32,
    pub note: SubjectNote,
}

impl DeckBuilder {
    pub fn new(anki: AnkiConnectClient, deck_name: impl Into<String>) -> Self {
        Self {
            anki,
            deck_name: deck_name.into(),
        }
    }

    pub fn deck_for(&self, kind: Option<SubjectKind>) -> String {
        match kind {
            None => self.deck_name.clone(),
            Some(kind) => format!("{}::{}", self.deck_name, kind.tag()),
        }
    }

    /// Create the deck tree, the note models and the hidden metadata
    /// note. Safe to run on an existing deck; everything is brought up to
    /// date instead of duplicated.
    pub async fn create_deck(&self) -> Result<()> {
        self.anki.create_deck(&self.deck_for(None)).await?;
        for kind in SubjectKind::ALL {
            self.anki.create_deck(&self.deck_for(Some(kind))).await?;
        }

        self.check_model(&templates::METADATA_MODEL).await?;
        for kind in SubjectKind::ALL {
            self.check_model(templates::model_for(kind)).await?;
        }

        let id = match self.find_metadata_note().await? {
            Some(id) => id,
            None => {
                tracing::debug!("creating metadata note");
                let mut fields = HashMap::new();
                fields.insert("last_updated".to_string(), "0".to_string());

                self.anki
                    .add_note(&NewNote {
                        deck_name: self.deck_for(None),
                        model_name: METADATA_MODEL_NAME.to_string(),
                        fields,
                        options: Default::default(),
                        tags: Vec::new(),
                    })
                    .await?
            }
        };

        // the metadata card is bookkeeping, never reviewable
        let info = self.note_info(id).await?;
        self.anki.suspend(&info.cards).await?;

        tracing::info!("successfully created deck {}", self.deck_for(None));
        Ok(())
    }

    /// Bring an existing model up to date (fields, styling, templates) or
    /// create it.
    pub async fn check_model(&self, model: &Model) -> Result<()> {
        if !self.anki.model_names().await?.contains(&model.name) {
            tracing::info!("model: creating new model {}", model.name);
            return self.anki.create_model(model).await;
        }

        let existing: HashSet<String> = self
            .anki
            .model_field_names(&model.name)
            .await?
            .into_iter()
            .collect();
        for field in &model.fields {
            if !existing.contains(field) {
                tracing::info!("model: adding field {field:?} to model {}", model.name);
                self.anki.add_model_field(&model.name, field).await?;
            }
        }

        if let Some(css) = &model.css {
            if self.anki.model_styling(&model.name).await? != *css {
                tracing::info!("updating styling for model {}", model.name);
                self.anki.update_model_styling(&model.name, css).await?;
            }
        }

        let existing_templates = self.anki.model_templates(&model.name).await?;

        for existing in &existing_templates {
            match model.templates.iter().find(|t| t.name == existing.name) {
                None => {
                    self.anki
                        .remove_model_template(&model.name, &existing.name)
                        .await?;
                }
                Some(wanted) if wanted != existing => {
                    self.anki
                        .update_model_templates(&model.name, std::slice::from_ref(wanted))
                        .await?;
                }
                Some(_) => {}
            }
        }

        for wanted in &model.templates {
            if !existing_templates.iter().any(|t| t.name == wanted.name) {
                self.anki.add_model_template(&model.name, wanted).await?;
            }
        }

        Ok(())
    }

    async fn find_metadata_note(&self) -> Result<Option<u64>> {
        let query = format!(
            "\"deck:{}\" \"note:{}\"",
            self.deck_for(None),
            METADATA_MODEL_NAME
        );

        let notes = self.anki.find_notes(&query).await?;
        match notes.as_slice() {
            [] => Ok(None),
            [id] => Ok(Some(*id)),
            more => bail!("expected one metadata note, found {}", more.len()),
        }
    }

    async fn metadata_note(&self) -> Result<u64> {
        self.find_metadata_note()
            .await?
            .context("metadata note is missing, run init first")
    }

    async fn note_info(&self, id: u64) -> Result<NoteInfo> {
        self.anki
            .notes_info(&[id])
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("note {id} has no info"))
    }

    /// Last successful sync, as epoch seconds (0 when never synced).
    pub async fn last_update(&self) -> Result<i64> {
        let id = self.metadata_note().await?;
        let info = self.note_info(id).await?;

        let raw = info
            .fields
            .get("last_updated")
            .map(|f| f.value.as_str())
            .context("metadata note has no last_updated field")?;
        raw.parse()
            .with_context(|| format!("bad last_updated value {raw:?}"))
    }

    pub async fn set_last_update(&self, ts: i64) -> Result<()> {
        let id = self.metadata_note().await?;
        let mut fields = HashMap::new();
        fields.insert("last_updated".to_string(), ts.to_string());
        self.anki.update_note_fields(id, &fields).await
    }

    /// Insert new notes and update already-known ones, identified by
    /// their unique `url` field. Returns the ids of notes that are new.
    pub async fn add_or_update_notes(&self, parsed: &[ParsedSubject]) -> Result<Vec<u64>> {
        let mut unknown = Vec::new();
        let mut updates = Vec::new();

        for subject in parsed {
            let url = &subject.note.common().url;
            let query = format!("\"deck:{}\" \"url:{}\"", self.deck_for(None), url);

            let note = self.build_note(subject);
            let ids = self.anki.find_notes(&query).await?;
            match ids.as_slice() {
                [] => unknown.push(note),
                [id] => updates.push((*id, note)),
                more => bail!("url {url:?} matches {} notes", more.len()),
            }
        }

        tracing::info!("inserting {} new notes", unknown.len());
        let new_ids = if unknown.is_empty() {
            Vec::new()
        } else {
            self.anki
                .add_notes(&unknown)
                .await?
                .into_iter()
                .flatten()
                .collect()
        };

        tracing::info!("updating {} notes", updates.len());
        for (id, note) in updates {
            self.anki.update_note_fields(id, &note.fields).await?;
        }

        Ok(new_ids)
    }

    fn build_note(&self, subject: &ParsedSubject) -> NewNote {
        NewNote {
            deck_name: self.deck_for(Some(subject.note.kind())),
            model_name: subject.note.kind().model_name().to_string(),
            fields: subject
                .note
                .to_fields()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            options: Default::default(),
            tags: subject.note.tags(subject.level),
        }
    }

    /// Suspend every card belonging to the given notes.
    pub async fn suspend_new_cards(&self, note_ids: &[u64]) -> Result<()> {
        if note_ids.is_empty() {
            return Ok(());
        }

        let cards: Vec<u64> = self
            .anki
            .notes_info(note_ids)
            .await?
            .into_iter()
            .flat_map(|n| n.cards)
            .collect();
        self.anki.suspend(&cards).await
    }

    /// Store base64 payloads in Anki's media collection.
    pub async fn insert_media(&self, media: &[(String, String)]) -> Result<()> {
        tracing::info!("storing {} media files (duplicates are overwritten)", media.len());
        for (filename, data) in media {
            self.anki.store_media_file(filename, data).await?;
        }
        Ok(())
    }

    /// All subject notes of this deck, parsed into typed form.
    pub async fn get_all_notes(&self) -> Result<Vec<StoredNote>> {
        let mut notes = Vec::new();

        for kind in SubjectKind::ALL {
            let query = format!("\"deck:{}\" \"tag:{}\"", self.deck_for(None), kind.tag());
            let ids = self.anki.find_notes(&query).await?;
            if ids.is_empty() {
                continue;
            }

            for info in self.anki.notes_info(&ids).await? {
                let note = SubjectNote::from_fields(kind, &info.fields)
                    .with_context(|| format!("note {} is not a valid {kind:?} note", info.note_id))?;

                notes.push(StoredNote {
                    note_id: info.note_id,
                    level: level_from_tags(&info.tags)
                        .with_context(|| format!("note {}", info.note_id))?,
                    cards: info.cards,
                    note,
                });
            }
        }

        Ok(notes)
    }

    /// Write back notes whose derived fields changed.
    pub async fn update_notes(&self, changed: &[(u64, SubjectNote)]) -> Result<()> {
        tracing::info!("updating {} cross-referenced notes", changed.len());
        for (id, note) in changed {
            let fields = note
                .to_fields()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            self.anki.update_note_fields(*id, &fields).await?;
        }
        Ok(())
    }

    /// Every reviewable card of the deck joined with the owning note's
    /// level, ready for progression evaluation.
    pub async fn get_all_cards(&self) -> Result<Vec<ReviewCard>> {
        let query = format!("\"deck:{}\"", self.deck_for(None));
        let card_ids = self.anki.find_cards(&query).await?;
        if card_ids.is_empty() {
            return Ok(Vec::new());
        }

        let infos = self.anki.cards_info(&card_ids).await?;
        let suspended = self.anki.are_suspended(&card_ids).await?;
        if infos.len() != suspended.len() {
            bail!("cardsInfo and areSuspended disagree on card count");
        }

        let mut note_ids: Vec<u64> = infos.iter().map(|c| c.note).collect();
        note_ids.sort_unstable();
        note_ids.dedup();
        let notes: HashMap<u64, NoteInfo> = self
            .anki
            .notes_info(&note_ids)
            .await?
            .into_iter()
            .map(|n| (n.note_id, n))
            .collect();

        let mut cards = Vec::new();
        for (info, suspended) in infos.into_iter().zip(suspended) {
            // metadata and foreign-model cards are not reviewable subjects
            let Some(kind) = SubjectKind::from_model(&info.model_name) else {
                continue;
            };

            let note = notes
                .get(&info.note)
                .with_context(|| format!("card {} has no owning note", info.card_id))?;

            let subject_id = subjects::field(&info.fields, "sub_id")?
                .parse()
                .with_context(|| format!("card {} has a bad sub_id", info.card_id))?;

            let strength = match info.fsrs {
                Some(state) => Strength::Stability(state.stability),
                None => Strength::IntervalDays(info.interval),
            };

            cards.push(ReviewCard {
                card_id: info.card_id,
                subject_id,
                kind,
                level: level_from_tags(&note.tags)
                    .with_context(|| format!("card {}", info.card_id))?,
                suspended: suspended
                    .with_context(|| format!("card {} has no suspend state", info.card_id))?,
                strength,
            });
        }

        Ok(cards)
    }

    pub async fn unsuspend(&self, cards: &[u64]) -> Result<()> {
        if cards.is_empty() {
            return Ok(());
        }
        self.anki.unsuspend(cards).await
    }
}

/// Every subject note carries a `level{n}` tag; a note without one cannot
/// be classified and fails the run.
fn level_from_tags(tags: &[String]) -> Result<u32> {
    tags.iter()
        .find_map(|tag| tag.strip_prefix("level"))
        .context("note has no level tag")?
        .parse()
        .context("bad level tag")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_tags() {
        let tags = vec!["Kanji".to_string(), "level12".to_string()];
        assert_eq!(level_from_tags(&tags).expect("level"), 12);
    }

    #[test]
    fn test_missing_level_tag_is_fatal() {
        let tags = vec!["Kanji".to_string()];
        assert!(level_from_tags(&tags).is_err());

        let tags = vec!["levelx".to_string()];
        assert!(level_from_tags(&tags).is_err());
    }
}
