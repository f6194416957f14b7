use std::collections::HashMap;

use anyhow::{Context, Result};
use wanisync_anki::types::FieldValue;
use wanisync_types::{AudioFormat, Media, SubjectKind};
use wanisync_wanikani::types::{PronunciationAudio, SubjectRecord};

use super::{
    SubjectCommon, SubjectNote, field, ids_from_field, ids_to_field, join_meanings, join_readings,
    resolve_components,
};

#[derive(Debug, Clone, PartialEq)]
pub struct VocabFields {
    pub vocab: String,
    pub vocab_meaning: String,
    pub reading: String,
    pub speech_type: String,
    pub meaning_exp: String,
    pub reading_exp: String,
    /// Kanji subject ids this word is built from.
    pub components: Vec<u64>,
    /// Derived: component kanji glyphs, filled by cross-referencing.
    pub kanjis: String,
    /// Derived: component kanji meanings, filled by cross-referencing.
    pub kanji_names: String,
    pub audio_m: String,
    pub audio_f: String,
    pub context_jp1: String,
    pub context_en1: String,
    pub context_jp2: String,
    pub context_en2: String,
    pub context_jp3: String,
    pub context_en3: String,
    pub common: SubjectCommon,
}

impl VocabFields {
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "vocab",
        "vocab_meaning",
        "reading",
        "speech_type",
        "meaning_exp",
        "reading_exp",
        "components",
        "kanjis",
        "kanji_names",
        "audio_m",
        "audio_f",
        "context_jp1",
        "context_en1",
        "context_jp2",
        "context_en2",
        "context_jp3",
        "context_en3",
        "lesson_pos",
        "follow_up_ids",
        "sub_id",
        "url",
    ];

    pub fn from_record(record: &SubjectRecord, audio: AudioFormat) -> Result<(Self, Vec<Media>)> {
        let data = &record.data;

        let vocab = data
            .characters
            .clone()
            .context("vocabulary record has no characters")?;

        let mut fields = Self {
            vocab_meaning: join_meanings(&data.meanings),
            reading: join_readings(&data.readings, None),
            speech_type: natural_list(&data.parts_of_speech),
            meaning_exp: data.meaning_mnemonic.clone(),
            reading_exp: data.reading_mnemonic.clone().unwrap_or_default(),
            components: data.component_subject_ids.clone(),
            kanjis: String::new(),
            kanji_names: String::new(),
            audio_m: format!("[sound:{vocab}_m.{}]", audio.extension()),
            audio_f: format!("[sound:{vocab}_f.{}]", audio.extension()),
            context_jp1: String::new(),
            context_en1: String::new(),
            context_jp2: String::new(),
            context_en2: String::new(),
            context_jp3: String::new(),
            context_en3: String::new(),
            common: SubjectCommon::from_record(record),
            vocab,
        };

        let mut sentences = data.context_sentences.iter();
        if let Some(s) = sentences.next() {
            fields.context_jp1 = s.ja.clone();
            fields.context_en1 = s.en.clone();
        }
        if let Some(s) = sentences.next() {
            fields.context_jp2 = s.ja.clone();
            fields.context_en2 = s.en.clone();
        }
        if let Some(s) = sentences.next() {
            fields.context_jp3 = s.ja.clone();
            fields.context_en3 = s.en.clone();
        }

        let media = fields.wanted_audio(&data.pronunciation_audios, audio);
        Ok((fields, media))
    }

    /// One download per gendered recording in the configured encoding.
    /// A word without usable audio still becomes a card, just silent.
    fn wanted_audio(&self, audios: &[PronunciationAudio], audio: AudioFormat) -> Vec<Media> {
        if audios.is_empty() {
            tracing::warn!("vocab: {} could not find audios", self.vocab);
            return Vec::new();
        }

        ["male", "female"]
            .iter()
            .filter_map(|gender| {
                let found = audios.iter().find(|a| {
                    a.content_type == audio.content_type() && a.metadata.gender == *gender
                })?;
                Some(Media {
                    filename: format!(
                        "{}_{}.{}",
                        self.vocab,
                        &gender[..1],
                        audio.extension()
                    ),
                    url: found.url.clone(),
                })
            })
            .collect()
    }

    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("vocab", self.vocab.clone()),
            ("vocab_meaning", self.vocab_meaning.clone()),
            ("reading", self.reading.clone()),
            ("speech_type", self.speech_type.clone()),
            ("meaning_exp", self.meaning_exp.clone()),
            ("reading_exp", self.reading_exp.clone()),
            ("components", ids_to_field(&self.components)),
            ("kanjis", self.kanjis.clone()),
            ("kanji_names", self.kanji_names.clone()),
            ("audio_m", self.audio_m.clone()),
            ("audio_f", self.audio_f.clone()),
            ("context_jp1", self.context_jp1.clone()),
            ("context_en1", self.context_en1.clone()),
            ("context_jp2", self.context_jp2.clone()),
            ("context_en2", self.context_en2.clone()),
            ("context_jp3", self.context_jp3.clone()),
            ("context_en3", self.context_en3.clone()),
        ];
        self.common.push_fields(&mut out);
        out
    }

    pub fn from_fields(fields: &HashMap<String, FieldValue>) -> Result<Self> {
        Ok(Self {
            vocab: field(fields, "vocab")?.to_string(),
            vocab_meaning: field(fields, "vocab_meaning")?.to_string(),
            reading: field(fields, "reading")?.to_string(),
            speech_type: field(fields, "speech_type")?.to_string(),
            meaning_exp: field(fields, "meaning_exp")?.to_string(),
            reading_exp: field(fields, "reading_exp")?.to_string(),
            components: ids_from_field(field(fields, "components")?)?,
            kanjis: field(fields, "kanjis")?.to_string(),
            kanji_names: field(fields, "kanji_names")?.to_string(),
            audio_m: field(fields, "audio_m")?.to_string(),
            audio_f: field(fields, "audio_f")?.to_string(),
            context_jp1: field(fields, "context_jp1")?.to_string(),
            context_en1: field(fields, "context_en1")?.to_string(),
            context_jp2: field(fields, "context_jp2")?.to_string(),
            context_en2: field(fields, "context_en2")?.to_string(),
            context_jp3: field(fields, "context_jp3")?.to_string(),
            context_en3: field(fields, "context_en3")?.to_string(),
            common: SubjectCommon::from_fields(fields)?,
        })
    }

    /// Rebuild the derived kanji fields; true when they changed.
    pub fn crossreference(&mut self, by_sub: &HashMap<u64, SubjectNote>) -> Result<bool> {
        let (kanjis, kanji_names) =
            resolve_components(&self.components, by_sub, SubjectKind::Kanji)?;

        let changed = kanjis != self.kanjis || kanji_names != self.kanji_names;
        self.kanjis = kanjis;
        self.kanji_names = kanji_names;

        Ok(changed)
    }
}

/// "a", "a and b", "a, b and c"
fn natural_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wanisync_wanikani::types::{AudioMetadata, ContextSentence, Meaning, SubjectData};

    fn volcano_record() -> SubjectRecord {
        SubjectRecord {
            id: 20,
            object: "vocabulary".to_string(),
            data: SubjectData {
                level: 2,
                slug: "火山".to_string(),
                characters: Some("火山".to_string()),
                meanings: vec![Meaning {
                    meaning: "Volcano".to_string(),
                    primary: true,
                }],
                parts_of_speech: vec!["noun".to_string(), "na adjective".to_string()],
                component_subject_ids: vec![10, 11],
                meaning_mnemonic: "fire mountain".to_string(),
                reading_mnemonic: Some("かざん".to_string()),
                context_sentences: vec![ContextSentence {
                    ja: "火山が噴火した。".to_string(),
                    en: "The volcano erupted.".to_string(),
                }],
                pronunciation_audios: vec![
                    PronunciationAudio {
                        url: "https://cdn.wanikani.com/kazan-f.webm".to_string(),
                        content_type: "audio/webm".to_string(),
                        metadata: AudioMetadata {
                            gender: "female".to_string(),
                        },
                    },
                    PronunciationAudio {
                        url: "https://cdn.wanikani.com/kazan-f.mp3".to_string(),
                        content_type: "audio/mpeg".to_string(),
                        metadata: AudioMetadata {
                            gender: "female".to_string(),
                        },
                    },
                ],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_parse_picks_audio_matching_format_and_gender() {
        let (fields, media) =
            VocabFields::from_record(&volcano_record(), AudioFormat::Webm).expect("from_record");

        assert_eq!(fields.vocab, "火山");
        assert_eq!(fields.speech_type, "noun and na adjective");
        assert_eq!(fields.audio_f, "[sound:火山_f.webm]");
        assert_eq!(fields.context_jp1, "火山が噴火した。");
        assert_eq!(fields.context_jp2, "");

        // only the female webm recording exists
        assert_eq!(
            media,
            vec![Media {
                filename: "火山_f.webm".to_string(),
                url: "https://cdn.wanikani.com/kazan-f.webm".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_audio_is_not_fatal() {
        let mut record = volcano_record();
        record.data.pronunciation_audios.clear();

        let (_, media) =
            VocabFields::from_record(&record, AudioFormat::Webm).expect("from_record");
        assert!(media.is_empty());
    }

    #[test]
    fn test_field_order_matches_schema() {
        let (fields, _) =
            VocabFields::from_record(&volcano_record(), AudioFormat::Webm).expect("from_record");
        let names: Vec<&str> = fields.to_fields().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, VocabFields::FIELD_NAMES);
    }

    #[test]
    fn test_natural_list() {
        let items: Vec<String> = vec!["noun".into(), "verb".into(), "suffix".into()];
        assert_eq!(natural_list(&items), "noun, verb and suffix");
        assert_eq!(natural_list(&items[..1]), "noun");
        assert_eq!(natural_list(&[]), "");
    }
}
