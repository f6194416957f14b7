use serde::Deserialize;

/// One page of a WaniKani collection response.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    pub pages: Pages,
    pub data: Vec<SubjectRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pages {
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRecord {
    pub id: u64,
    /// Kind discriminator: `radical`, `kanji`, `vocabulary`, ...
    pub object: String,
    pub data: SubjectData,
}

/// Union of the per-kind payload fields; kinds that lack a field simply
/// leave it at its default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectData {
    pub level: u32,
    pub slug: String,
    #[serde(default)]
    pub lesson_position: u32,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub component_subject_ids: Vec<u64>,
    #[serde(default)]
    pub amalgamation_subject_ids: Vec<u64>,
    #[serde(default)]
    pub meaning_mnemonic: String,
    #[serde(default)]
    pub meaning_hint: Option<String>,
    #[serde(default)]
    pub reading_mnemonic: Option<String>,
    #[serde(default)]
    pub reading_hint: Option<String>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
    #[serde(default)]
    pub context_sentences: Vec<ContextSentence>,
    #[serde(default)]
    pub pronunciation_audios: Vec<PronunciationAudio>,
    #[serde(default)]
    pub character_images: Vec<CharacterImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meaning {
    pub meaning: String,
    pub primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reading {
    pub reading: String,
    pub primary: bool,
    /// `onyomi` / `kunyomi` / `nanori` for kanji, absent for vocabulary.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextSentence {
    pub ja: String,
    pub en: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PronunciationAudio {
    pub url: String,
    pub content_type: String,
    pub metadata: AudioMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioMetadata {
    pub gender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterImage {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub data: UserData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub active: bool,
    pub max_level_granted: u32,
}
