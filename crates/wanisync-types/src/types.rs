use serde::{Deserialize, Serialize};

/// The three WaniKani subject kinds mirrored into Anki.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    Radical,
    Kanji,
    Vocabulary,
}

impl SubjectKind {
    pub const ALL: [SubjectKind; 3] = [
        SubjectKind::Radical,
        SubjectKind::Kanji,
        SubjectKind::Vocabulary,
    ];

    /// Parse the `object` discriminator of a WaniKani API record.
    /// Unknown kinds (e.g. `kana_vocabulary`) map to `None`.
    pub fn from_object(object: &str) -> Option<Self> {
        match object {
            "radical" => Some(SubjectKind::Radical),
            "kanji" => Some(SubjectKind::Kanji),
            "vocabulary" => Some(SubjectKind::Vocabulary),
            _ => None,
        }
    }

    pub fn object_name(&self) -> &'static str {
        match self {
            SubjectKind::Radical => "radical",
            SubjectKind::Kanji => "kanji",
            SubjectKind::Vocabulary => "vocabulary",
        }
    }

    /// Used both as the subdeck name and as the note tag.
    pub fn tag(&self) -> &'static str {
        match self {
            SubjectKind::Radical => "Radicals",
            SubjectKind::Kanji => "Kanji",
            SubjectKind::Vocabulary => "Vocab",
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            SubjectKind::Radical => "Radical Model - wanisync",
            SubjectKind::Kanji => "Kanji Model - wanisync",
            SubjectKind::Vocabulary => "Vocab Model - wanisync",
        }
    }

    pub fn from_model(model_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.model_name() == model_name)
    }
}

/// A media file a subject wants stored in Anki's collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub filename: String,
    pub url: String,
}

/// Pronunciation audio encoding offered by WaniKani.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Webm,
    Mpeg,
}

impl AudioFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "webm" => Some(AudioFormat::Webm),
            "mpeg" | "mp3" => Some(AudioFormat::Mpeg),
            _ => None,
        }
    }

    /// The `content_type` WaniKani reports for this encoding.
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Mpeg => "audio/mpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Webm => "webm",
            AudioFormat::Mpeg => "mp3",
        }
    }
}

/// Review strength of a single card.
///
/// Exactly one representation is authoritative per card: FSRS-scheduled
/// cards report a memory stability, legacy-scheduled cards only an
/// interval. Both are denominated in days, which is not a perfect mapping
/// but mirrors how Anki itself reports them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strength {
    Stability(f64),
    IntervalDays(i64),
}

impl Strength {
    pub fn days(&self) -> f64 {
        match self {
            Strength::Stability(stability) => *stability,
            Strength::IntervalDays(days) => *days as f64,
        }
    }
}

/// A reviewable Anki card joined with the subject metadata the
/// progression pass needs.
#[derive(Debug, Clone)]
pub struct ReviewCard {
    pub card_id: u64,
    pub subject_id: u64,
    pub kind: SubjectKind,
    pub level: u32,
    pub suspended: bool,
    pub strength: Strength,
}

/// Unlock inputs derived from one stored note.
#[derive(Debug, Clone)]
pub struct NoteRequirements {
    pub level: u32,
    pub requirements: Vec<u64>,
    pub cards: Vec<u64>,
}
