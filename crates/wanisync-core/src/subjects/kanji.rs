use std::collections::HashMap;

use anyhow::{Context, Result};
use wanisync_anki::types::FieldValue;
use wanisync_types::SubjectKind;
use wanisync_wanikani::types::SubjectRecord;

use super::{
    SubjectCommon, SubjectNote, field, ids_from_field, ids_to_field, join_meanings, join_readings,
    resolve_components,
};

#[derive(Debug, Clone, PartialEq)]
pub struct KanjiFields {
    pub kanji: String,
    pub kanji_meaning: String,
    pub reading_on: String,
    pub reading_kun: String,
    /// Radical subject ids this kanji is built from.
    pub components: Vec<u64>,
    /// Derived: component radical glyphs, filled by cross-referencing.
    pub radicals: String,
    /// Derived: component radical names, filled by cross-referencing.
    pub radicals_names: String,
    pub meaning_mnemonic: String,
    pub meaning_hint: String,
    pub reading_mnemonic: String,
    pub reading_hint: String,
    pub common: SubjectCommon,
}

impl KanjiFields {
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "kanji",
        "kanji_meaning",
        "reading_on",
        "reading_kun",
        "components",
        "radicals",
        "radicals_names",
        "meaning_mnemonic",
        "meaning_hint",
        "reading_mnemonic",
        "reading_hint",
        "lesson_pos",
        "follow_up_ids",
        "sub_id",
        "url",
    ];

    pub fn from_record(record: &SubjectRecord) -> Result<Self> {
        let data = &record.data;

        Ok(Self {
            kanji: data
                .characters
                .clone()
                .context("kanji record has no characters")?,
            kanji_meaning: join_meanings(&data.meanings),
            reading_on: join_readings(&data.readings, Some("onyomi")),
            reading_kun: join_readings(&data.readings, Some("kunyomi")),
            components: data.component_subject_ids.clone(),
            radicals: String::new(),
            radicals_names: String::new(),
            meaning_mnemonic: data.meaning_mnemonic.clone(),
            meaning_hint: data.meaning_hint.clone().unwrap_or_default(),
            reading_mnemonic: data.reading_mnemonic.clone().unwrap_or_default(),
            reading_hint: data.reading_hint.clone().unwrap_or_default(),
            common: SubjectCommon::from_record(record),
        })
    }

    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("kanji", self.kanji.clone()),
            ("kanji_meaning", self.kanji_meaning.clone()),
            ("reading_on", self.reading_on.clone()),
            ("reading_kun", self.reading_kun.clone()),
            ("components", ids_to_field(&self.components)),
            ("radicals", self.radicals.clone()),
            ("radicals_names", self.radicals_names.clone()),
            ("meaning_mnemonic", self.meaning_mnemonic.clone()),
            ("meaning_hint", self.meaning_hint.clone()),
            ("reading_mnemonic", self.reading_mnemonic.clone()),
            ("reading_hint", self.reading_hint.clone()),
        ];
        self.common.push_fields(&mut out);
        out
    }

    pub fn from_fields(fields: &HashMap<String, FieldValue>) -> Result<Self> {
        Ok(Self {
            kanji: field(fields, "kanji")?.to_string(),
            kanji_meaning: field(fields, "kanji_meaning")?.to_string(),
            reading_on: field(fields, "reading_on")?.to_string(),
            reading_kun: field(fields, "reading_kun")?.to_string(),
            components: ids_from_field(field(fields, "components")?)?,
            radicals: field(fields, "radicals")?.to_string(),
            radicals_names: field(fields, "radicals_names")?.to_string(),
            meaning_mnemonic: field(fields, "meaning_mnemonic")?.to_string(),
            meaning_hint: field(fields, "meaning_hint")?.to_string(),
            reading_mnemonic: field(fields, "reading_mnemonic")?.to_string(),
            reading_hint: field(fields, "reading_hint")?.to_string(),
            common: SubjectCommon::from_fields(fields)?,
        })
    }

    /// Rebuild the derived radical fields; true when they changed.
    pub fn crossreference(&mut self, by_sub: &HashMap<u64, SubjectNote>) -> Result<bool> {
        let (radicals, radicals_names) =
            resolve_components(&self.components, by_sub, SubjectKind::Radical)?;

        let changed = radicals != self.radicals || radicals_names != self.radicals_names;
        self.radicals = radicals;
        self.radicals_names = radicals_names;

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wanisync_wanikani::types::{Meaning, Reading, SubjectData};

    fn fire_record() -> SubjectRecord {
        SubjectRecord {
            id: 10,
            object: "kanji".to_string(),
            data: SubjectData {
                level: 2,
                slug: "火".to_string(),
                characters: Some("火".to_string()),
                meanings: vec![
                    Meaning {
                        meaning: "Fire".to_string(),
                        primary: true,
                    },
                    Meaning {
                        meaning: "Flame".to_string(),
                        primary: false,
                    },
                ],
                readings: vec![
                    Reading {
                        reading: "か".to_string(),
                        primary: true,
                        kind: Some("onyomi".to_string()),
                    },
                    Reading {
                        reading: "ひ".to_string(),
                        primary: true,
                        kind: Some("kunyomi".to_string()),
                    },
                ],
                component_subject_ids: vec![1, 2],
                meaning_mnemonic: "meaning mnemonic".to_string(),
                meaning_hint: Some("meaning hint".to_string()),
                reading_mnemonic: Some("reading mnemonic".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_parse_splits_readings_by_type() {
        let fields = KanjiFields::from_record(&fire_record()).expect("from_record");

        assert_eq!(fields.kanji, "火");
        assert_eq!(fields.kanji_meaning, "<u>Fire</u>, Flame");
        assert_eq!(fields.reading_on, "<u>か</u>");
        assert_eq!(fields.reading_kun, "<u>ひ</u>");
        assert_eq!(fields.components, vec![1, 2]);
        assert_eq!(fields.radicals, "");
    }

    #[test]
    fn test_field_order_matches_schema() {
        let fields = KanjiFields::from_record(&fire_record()).expect("from_record");
        let names: Vec<&str> = fields.to_fields().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, KanjiFields::FIELD_NAMES);
    }

    #[test]
    fn test_fields_roundtrip_with_component_list() {
        let fields = KanjiFields::from_record(&fire_record()).expect("from_record");

        let stored: HashMap<String, FieldValue> = fields
            .to_fields()
            .into_iter()
            .enumerate()
            .map(|(i, (name, value))| {
                (
                    name.to_string(),
                    FieldValue {
                        value,
                        order: i as u32,
                    },
                )
            })
            .collect();

        let parsed = KanjiFields::from_fields(&stored).expect("from_fields");
        assert_eq!(parsed, fields);
        assert_eq!(parsed.components, vec![1, 2]);
    }
}
