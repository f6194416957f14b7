use std::collections::HashMap;

use anyhow::{Context, Result};
use wanisync_anki::types::FieldValue;
use wanisync_types::Media;
use wanisync_wanikani::types::SubjectRecord;

use super::{SubjectCommon, field};

#[derive(Debug, Clone, PartialEq)]
pub struct RadicalFields {
    pub radical_name: String,
    /// Unicode glyph, or an `<img>` referencing the downloaded SVG.
    pub radical: String,
    pub radical_meaning: String,
    pub common: SubjectCommon,
}

impl RadicalFields {
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "radical_name",
        "radical",
        "radical_meaning",
        "lesson_pos",
        "follow_up_ids",
        "sub_id",
        "url",
    ];

    /// Some radicals have no unicode representation; those come with
    /// character images instead, and the SVG becomes a media download.
    pub fn from_record(record: &SubjectRecord) -> Result<(Self, Vec<Media>)> {
        let data = &record.data;

        let radical_name = data
            .meanings
            .first()
            .map(|m| m.meaning.clone())
            .context("radical record has no meanings")?;

        let (radical, media) = match &data.characters {
            Some(characters) => (characters.clone(), Vec::new()),
            None => {
                let filename = format!("{}_{}.svg", record.object, data.slug);
                let svg = data
                    .character_images
                    .iter()
                    .find(|img| img.content_type == "image/svg+xml")
                    .context("radical without characters has no svg image")?;

                (
                    format!("<img src=\"{filename}\">"),
                    vec![Media {
                        filename,
                        url: svg.url.clone(),
                    }],
                )
            }
        };

        Ok((
            Self {
                radical_name,
                radical,
                radical_meaning: data.meaning_mnemonic.clone(),
                common: SubjectCommon::from_record(record),
            },
            media,
        ))
    }

    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("radical_name", self.radical_name.clone()),
            ("radical", self.radical.clone()),
            ("radical_meaning", self.radical_meaning.clone()),
        ];
        self.common.push_fields(&mut out);
        out
    }

    pub fn from_fields(fields: &HashMap<String, FieldValue>) -> Result<Self> {
        Ok(Self {
            radical_name: field(fields, "radical_name")?.to_string(),
            radical: field(fields, "radical")?.to_string(),
            radical_meaning: field(fields, "radical_meaning")?.to_string(),
            common: SubjectCommon::from_fields(fields)?,
        })
    }
}
