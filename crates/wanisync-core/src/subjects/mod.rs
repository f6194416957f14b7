use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use wanisync_anki::types::FieldValue;
use wanisync_types::{AudioFormat, Media, SubjectKind};
use wanisync_wanikani::types::{Meaning, Reading, SubjectRecord};

pub mod kanji;
pub mod radical;
pub mod vocab;

pub use kanji::KanjiFields;
pub use radical::RadicalFields;
pub use vocab::VocabFields;

/// Fields every subject kind shares. They come last in every model's
/// field order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectCommon {
    pub lesson_pos: u32,
    /// Subjects that build on this one (amalgamations).
    pub follow_up_ids: Vec<u64>,
    pub sub_id: u64,
    /// `{object}/{slug}`; unique per subject, used to find the note again.
    pub url: String,
}

impl SubjectCommon {
    pub const FIELD_NAMES: &'static [&'static str] =
        &["lesson_pos", "follow_up_ids", "sub_id", "url"];

    pub fn from_record(record: &SubjectRecord) -> Self {
        Self {
            lesson_pos: record.data.lesson_position,
            follow_up_ids: record.data.amalgamation_subject_ids.clone(),
            sub_id: record.id,
            url: format!("{}/{}", record.object, record.data.slug),
        }
    }

    fn push_fields(&self, out: &mut Vec<(&'static str, String)>) {
        out.push(("lesson_pos", self.lesson_pos.to_string()));
        out.push(("follow_up_ids", ids_to_field(&self.follow_up_ids)));
        out.push(("sub_id", self.sub_id.to_string()));
        out.push(("url", self.url.clone()));
    }

    fn from_fields(fields: &HashMap<String, FieldValue>) -> Result<Self> {
        Ok(Self {
            lesson_pos: field(fields, "lesson_pos")?
                .parse()
                .context("lesson_pos is not a number")?,
            follow_up_ids: ids_from_field(field(fields, "follow_up_ids")?)?,
            sub_id: field(fields, "sub_id")?
                .parse()
                .context("sub_id is not a number")?,
            url: field(fields, "url")?.to_string(),
        })
    }
}

/// A subject in its note form. Closed set; all per-kind behavior is
/// dispatched by matching here.
#[derive(Debug, Clone, PartialEq)]
pub enum SubjectNote {
    Radical(RadicalFields),
    Kanji(KanjiFields),
    Vocab(VocabFields),
}

/// A freshly parsed subject plus everything else the record demanded.
#[derive(Debug, Clone)]
pub struct ParsedSubject {
    pub note: SubjectNote,
    pub level: u32,
    pub media: Vec<Media>,
}

impl SubjectNote {
    /// Parse a remote record. `None` for subject kinds this tool does not
    /// mirror (e.g. kana-only vocabulary).
    pub fn parse_record(
        record: &SubjectRecord,
        audio: AudioFormat,
    ) -> Result<Option<ParsedSubject>> {
        let Some(kind) = SubjectKind::from_object(&record.object) else {
            tracing::debug!("skipping unhandled subject kind {:?}", record.object);
            return Ok(None);
        };

        let (note, media) = match kind {
            SubjectKind::Radical => {
                let (fields, media) = RadicalFields::from_record(record)?;
                (SubjectNote::Radical(fields), media)
            }
            SubjectKind::Kanji => (
                SubjectNote::Kanji(KanjiFields::from_record(record)?),
                Vec::new(),
            ),
            SubjectKind::Vocabulary => {
                let (fields, media) = VocabFields::from_record(record, audio)?;
                (SubjectNote::Vocab(fields), media)
            }
        };

        Ok(Some(ParsedSubject {
            note,
            level: record.data.level,
            media,
        }))
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            SubjectNote::Radical(_) => SubjectKind::Radical,
            SubjectNote::Kanji(_) => SubjectKind::Kanji,
            SubjectNote::Vocab(_) => SubjectKind::Vocabulary,
        }
    }

    pub fn common(&self) -> &SubjectCommon {
        match self {
            SubjectNote::Radical(f) => &f.common,
            SubjectNote::Kanji(f) => &f.common,
            SubjectNote::Vocab(f) => &f.common,
        }
    }

    /// Ordered note payload, matching the kind's model field order.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            SubjectNote::Radical(f) => f.to_fields(),
            SubjectNote::Kanji(f) => f.to_fields(),
            SubjectNote::Vocab(f) => f.to_fields(),
        }
    }

    /// Parse a stored note of the given kind back into its typed form.
    /// Reads by field name, so the wire order does not matter.
    pub fn from_fields(kind: SubjectKind, fields: &HashMap<String, FieldValue>) -> Result<Self> {
        match kind {
            SubjectKind::Radical => Ok(SubjectNote::Radical(RadicalFields::from_fields(fields)?)),
            SubjectKind::Kanji => Ok(SubjectNote::Kanji(KanjiFields::from_fields(fields)?)),
            SubjectKind::Vocabulary => Ok(SubjectNote::Vocab(VocabFields::from_fields(fields)?)),
        }
    }

    /// Subject ids that must be learned before this note's cards unlock.
    pub fn requirements(&self) -> &[u64] {
        match self {
            SubjectNote::Radical(_) => &[],
            SubjectNote::Kanji(f) => &f.components,
            SubjectNote::Vocab(f) => &f.components,
        }
    }

    /// Display glyph used when another subject references this one.
    pub fn glyph(&self) -> &str {
        match self {
            SubjectNote::Radical(f) => &f.radical,
            SubjectNote::Kanji(f) => &f.kanji,
            SubjectNote::Vocab(f) => &f.vocab,
        }
    }

    /// Display name used when another subject references this one.
    pub fn display_name(&self) -> &str {
        match self {
            SubjectNote::Radical(f) => &f.radical_name,
            SubjectNote::Kanji(f) => &f.kanji_meaning,
            SubjectNote::Vocab(f) => &f.vocab_meaning,
        }
    }

    /// Resolve prerequisite references against the full local note set.
    /// Returns true when a derived field actually changed. Radicals have
    /// no prerequisites and never change here.
    pub fn crossreference(&mut self, by_sub: &HashMap<u64, SubjectNote>) -> Result<bool> {
        match self {
            SubjectNote::Radical(_) => Ok(false),
            SubjectNote::Kanji(f) => f.crossreference(by_sub),
            SubjectNote::Vocab(f) => f.crossreference(by_sub),
        }
    }

    pub fn tags(&self, level: u32) -> Vec<String> {
        vec![format!("level{level}"), self.kind().tag().to_string()]
    }
}

/// Walk `components` in the order they are listed, demanding each to
/// resolve to a note of kind `want`. A missing or wrong-kind entry is a
/// data consistency error, never a silently shorter list.
pub(crate) fn resolve_components(
    components: &[u64],
    by_sub: &HashMap<u64, SubjectNote>,
    want: SubjectKind,
) -> Result<(String, String)> {
    let mut glyphs = Vec::with_capacity(components.len());
    let mut names = Vec::with_capacity(components.len());

    for sub_id in components {
        let note = by_sub
            .get(sub_id)
            .with_context(|| format!("component subject {sub_id} is not present locally"))?;
        if note.kind() != want {
            bail!(
                "component subject {sub_id} is a {:?}, expected {:?}",
                note.kind(),
                want
            );
        }
        glyphs.push(note.glyph().to_string());
        names.push(note.display_name().to_string());
    }

    Ok((glyphs.join(", "), names.join(", ")))
}

/// Read one named field of a stored note.
pub(crate) fn field<'a>(fields: &'a HashMap<String, FieldValue>, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .map(|f| f.value.as_str())
        .with_context(|| format!("note is missing field {name:?}"))
}

pub(crate) fn ids_to_field(ids: &[u64]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn ids_from_field(raw: &str) -> Result<Vec<u64>> {
    serde_json::from_str(raw).with_context(|| format!("bad subject id list {raw:?}"))
}

/// Comma+space list with the primary entry underlined.
pub(crate) fn join_meanings(meanings: &[Meaning]) -> String {
    meanings
        .iter()
        .map(|m| wrap_primary(&m.meaning, m.primary))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Like `join_meanings`; `kind_filter` selects on'yomi or kun'yomi.
pub(crate) fn join_readings(readings: &[Reading], kind_filter: Option<&str>) -> String {
    readings
        .iter()
        .filter(|r| match kind_filter {
            Some(kind) => r.kind.as_deref() == Some(kind),
            None => true,
        })
        .map(|r| wrap_primary(&r.reading, r.primary))
        .collect::<Vec<_>>()
        .join(", ")
}

fn wrap_primary(text: &str, primary: bool) -> String {
    if primary {
        format!("<u>{text}</u>")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn common(sub_id: u64) -> SubjectCommon {
        SubjectCommon {
            lesson_pos: 1,
            follow_up_ids: Vec::new(),
            sub_id,
            url: format!("test/{sub_id}"),
        }
    }

    pub fn radical_note(sub_id: u64, glyph: &str, name: &str) -> SubjectNote {
        SubjectNote::Radical(RadicalFields {
            radical_name: name.to_string(),
            radical: glyph.to_string(),
            radical_meaning: String::new(),
            common: common(sub_id),
        })
    }

    pub fn kanji_note(sub_id: u64, glyph: &str, meaning: &str, components: Vec<u64>) -> SubjectNote {
        SubjectNote::Kanji(KanjiFields {
            kanji: glyph.to_string(),
            kanji_meaning: meaning.to_string(),
            reading_on: String::new(),
            reading_kun: String::new(),
            components,
            radicals: String::new(),
            radicals_names: String::new(),
            meaning_mnemonic: String::new(),
            meaning_hint: String::new(),
            reading_mnemonic: String::new(),
            reading_hint: String::new(),
            common: common(sub_id),
        })
    }

    pub fn lookup(notes: Vec<SubjectNote>) -> HashMap<u64, SubjectNote> {
        notes
            .into_iter()
            .map(|n| (n.common().sub_id, n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{kanji_note, lookup, radical_note};
    use super::*;
    use wanisync_wanikani::types::SubjectData;

    fn record(id: u64, object: &str, data: SubjectData) -> SubjectRecord {
        SubjectRecord {
            id,
            object: object.to_string(),
            data,
        }
    }

    #[test]
    fn test_kanji_resolves_radicals_in_listed_order() {
        let by_sub = lookup(vec![
            radical_note(1, "a", "A"),
            radical_note(2, "b", "B"),
            kanji_note(10, "火", "fire", vec![1, 2]),
        ]);

        let mut kanji = by_sub[&10].clone();
        let changed = kanji.crossreference(&by_sub).expect("crossreference");
        assert!(changed, "first resolution must report a change");

        match &kanji {
            SubjectNote::Kanji(f) => {
                assert_eq!(f.radicals, "a, b");
                assert_eq!(f.radicals_names, "A, B");
            }
            _ => unreachable!(),
        }

        // same inputs again: nothing changes
        assert!(!kanji.crossreference(&by_sub).expect("crossreference"));

        // a prerequisite changed its glyph, so the kanji is dirty again
        let by_sub = lookup(vec![radical_note(1, "a", "A"), radical_note(2, "c", "B")]);
        assert!(kanji.crossreference(&by_sub).expect("crossreference"));
        match &kanji {
            SubjectNote::Kanji(f) => assert_eq!(f.radicals, "a, c"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_missing_prerequisite_is_fatal() {
        let by_sub = lookup(vec![radical_note(1, "a", "A")]);
        let mut kanji = kanji_note(10, "火", "fire", vec![1, 2]);

        let err = kanji
            .crossreference(&by_sub)
            .expect_err("missing component must not resolve");
        assert!(err.to_string().contains("component subject 2"));
    }

    #[test]
    fn test_wrong_kind_prerequisite_is_fatal() {
        let by_sub = lookup(vec![
            kanji_note(1, "口", "mouth", vec![]),
            kanji_note(10, "火", "fire", vec![1]),
        ]);
        let mut kanji = by_sub[&10].clone();

        assert!(kanji.crossreference(&by_sub).is_err());
    }

    #[test]
    fn test_radicals_never_change_from_resolution() {
        let by_sub = lookup(vec![radical_note(1, "a", "A")]);
        let mut radical = by_sub[&1].clone();
        assert!(!radical.crossreference(&by_sub).expect("crossreference"));
    }

    #[test]
    fn test_vocab_resolves_kanji_components() {
        let mut vocab = {
            let data = SubjectData {
                level: 2,
                slug: "火山".to_string(),
                characters: Some("火山".to_string()),
                meanings: vec![Meaning {
                    meaning: "Volcano".to_string(),
                    primary: true,
                }],
                component_subject_ids: vec![10, 11],
                meaning_mnemonic: "m".to_string(),
                ..Default::default()
            };
            match SubjectNote::parse_record(&record(20, "vocabulary", data), AudioFormat::Webm)
                .expect("parse_record")
                .expect("vocabulary is a handled kind")
                .note
            {
                note @ SubjectNote::Vocab(_) => note,
                _ => unreachable!(),
            }
        };

        let by_sub = lookup(vec![
            kanji_note(10, "火", "<u>fire</u>", vec![]),
            kanji_note(11, "山", "<u>mountain</u>", vec![]),
        ]);

        assert!(vocab.crossreference(&by_sub).expect("crossreference"));
        match &vocab {
            SubjectNote::Vocab(f) => {
                assert_eq!(f.kanjis, "火, 山");
                assert_eq!(f.kanji_names, "<u>fire</u>, <u>mountain</u>");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_join_meanings_underlines_primary() {
        let meanings = vec![
            Meaning {
                meaning: "Fire".to_string(),
                primary: true,
            },
            Meaning {
                meaning: "Flame".to_string(),
                primary: false,
            },
        ];
        assert_eq!(join_meanings(&meanings), "<u>Fire</u>, Flame");
    }

    #[test]
    fn test_join_readings_filters_by_type() {
        let readings = vec![
            Reading {
                reading: "か".to_string(),
                primary: true,
                kind: Some("onyomi".to_string()),
            },
            Reading {
                reading: "ひ".to_string(),
                primary: false,
                kind: Some("kunyomi".to_string()),
            },
        ];
        assert_eq!(join_readings(&readings, Some("onyomi")), "<u>か</u>");
        assert_eq!(join_readings(&readings, Some("kunyomi")), "ひ");
        assert_eq!(join_readings(&readings, None), "<u>か</u>, ひ");
    }

    #[test]
    fn test_unknown_subject_kind_is_skipped() {
        let data = SubjectData {
            level: 1,
            slug: "かな".to_string(),
            ..Default::default()
        };
        let parsed = SubjectNote::parse_record(&record(1, "kana_vocabulary", data), AudioFormat::Webm)
            .expect("parse_record");
        assert!(parsed.is_none());
    }
}
