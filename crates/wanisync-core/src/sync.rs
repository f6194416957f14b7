use std::collections::HashMap;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};

use wanisync_anki::AnkiConnectClient;
use wanisync_config::Config;
use wanisync_types::{Media, NoteRequirements};
use wanisync_wanikani::WaniKaniClient;

use crate::deck::DeckBuilder;
use crate::media::MediaCache;
use crate::progress;
use crate::subjects::{ParsedSubject, SubjectNote};

/// One user's WaniKani -> Anki pipeline.
pub struct WaniSync {
    config: Config,
    wk: WaniKaniClient,
    anki: AnkiConnectClient,
    deck: DeckBuilder,
}

impl WaniSync {
    pub fn new(config: Config) -> Self {
        let wk = WaniKaniClient::new(config.wanikani.api_token.clone());
        let anki = AnkiConnectClient::new(config.anki.url.clone());
        let deck = DeckBuilder::new(anki.clone(), config.deck.name.clone());

        Self {
            config,
            wk,
            anki,
            deck,
        }
    }

    pub async fn create_deck(&self) -> Result<()> {
        self.ensure_connected().await?;
        self.deck.create_deck().await
    }

    /// Pull changed subjects from WaniKani into Anki.
    ///
    /// Anki is only mutated after the full fetch succeeded, and the
    /// last-update stamp is only written once the whole run went through;
    /// an interrupted run loses progress but corrupts nothing.
    pub async fn update_cards(&self, suspend_new: bool) -> Result<()> {
        self.ensure_connected().await?;
        let cache = MediaCache::new(&self.config.cache.dir)?;

        let last_update = self.deck.last_update().await?;
        let run_started = Utc::now();

        let max_level = self.wk.max_level().await?;
        let updated_after = match last_update {
            0 => None,
            ts => Some(
                DateTime::from_timestamp(ts, 0)
                    .with_context(|| format!("bad last_updated timestamp {ts}"))?,
            ),
        };

        let records = self.wk.fetch_all_subjects(updated_after, max_level).await?;
        tracing::info!(
            "downloaded {} new subjects after ts {last_update}",
            records.len()
        );

        let mut parsed: Vec<ParsedSubject> = Vec::new();
        let mut wanted_media: Vec<Media> = Vec::new();
        for record in &records {
            if let Some(subject) =
                SubjectNote::parse_record(record, self.config.deck.audio_format)?
            {
                wanted_media.extend(subject.media.iter().cloned());
                parsed.push(subject);
            }
        }

        let mut media_payloads = Vec::with_capacity(wanted_media.len());
        for media in &wanted_media {
            let bytes = cache.fetch(&self.wk, media).await?;
            media_payloads.push((media.filename.clone(), BASE64.encode(bytes)));
        }

        let new_note_ids = self.deck.add_or_update_notes(&parsed).await?;
        self.deck.insert_media(&media_payloads).await?;

        // resolve cross references over the complete, just-persisted set,
        // so same-run forward references land too
        let mut all_notes = self.deck.get_all_notes().await?;
        let by_sub: HashMap<u64, SubjectNote> = all_notes
            .iter()
            .map(|stored| (stored.note.common().sub_id, stored.note.clone()))
            .collect();

        let mut changed = Vec::new();
        for stored in &mut all_notes {
            if stored.note.crossreference(&by_sub)? {
                changed.push((stored.note_id, stored.note.clone()));
            }
        }
        self.deck.update_notes(&changed).await?;

        if suspend_new {
            self.deck.suspend_new_cards(&new_note_ids).await?;
        }

        self.deck.set_last_update(run_started.timestamp()).await?;
        Ok(())
    }

    /// Evaluate review progress and unlock whatever the user has earned.
    pub async fn process_progress(&self) -> Result<()> {
        self.ensure_connected().await?;

        let cards = self.deck.get_all_cards().await?;
        let notes = self.deck.get_all_notes().await?;

        let requirements: Vec<NoteRequirements> = notes
            .iter()
            .map(|stored| NoteRequirements {
                level: stored.level,
                requirements: stored.note.requirements().to_vec(),
                cards: stored.cards.clone(),
            })
            .collect();

        let unlocks = progress::evaluate(
            &cards,
            &requirements,
            self.config.deck.learned_threshold_days,
        );
        tracing::info!(
            "unsuspending {} cards up to level {}",
            unlocks.card_ids.len(),
            unlocks.working_level
        );

        self.deck.unsuspend(&unlocks.card_ids).await
    }

    /// Kick off Anki's own sync with AnkiWeb.
    pub async fn sync_anki(&self) -> Result<()> {
        self.ensure_connected().await?;
        self.anki.sync().await
    }

    async fn ensure_connected(&self) -> Result<()> {
        let version = self
            .anki
            .check_connection()
            .await
            .context("AnkiConnect is not reachable, is Anki running?")?;
        tracing::debug!("ankiconnect version {version}");
        Ok(())
    }
}
