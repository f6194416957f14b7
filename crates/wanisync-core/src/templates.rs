use once_cell::sync::Lazy;
use wanisync_anki::types::{CardTemplate, Model};
use wanisync_types::SubjectKind;

use crate::subjects::{KanjiFields, RadicalFields, VocabFields};

pub const METADATA_MODEL_NAME: &str = "metadata - wanisync";
pub const METADATA_FIELD_NAMES: &'static [&'static str] = &["last_updated"];

const MAIN_CSS: &str = r#".card {
    font-family: "Noto Sans JP", "Hiragino Kaku Gothic Pro", sans-serif;
    font-size: 22px;
    text-align: center;
    color: #fff;
}

.card-type {
    font-size: 14px;
    text-transform: uppercase;
    letter-spacing: 2px;
    opacity: 0.8;
}

.card.radical { background-color: #00aaff; }
.card.kanji { background-color: #ff00aa; }
.card.vocab { background-color: #9e00ed; }

.glyph {
    font-size: 96px;
    margin: 24px 0;
}

.glyph img { height: 96px; }

.prompt { opacity: 0.8; }

.answer {
    font-size: 32px;
    margin: 12px 0;
}

.mnemonic {
    font-size: 18px;
    text-align: left;
    margin: 16px 24px;
}

.hint {
    font-size: 16px;
    text-align: left;
    margin: 0 24px;
    opacity: 0.85;
}

.breakdown {
    font-size: 18px;
    margin: 8px 0;
}
"#;

fn template(name: &str, front: &str, back: &str) -> CardTemplate {
    CardTemplate {
        name: name.to_string(),
        front: front.to_string(),
        back: back.to_string(),
    }
}

fn model(name: &str, field_names: &[&str], templates: Vec<CardTemplate>) -> Model {
    Model {
        name: name.to_string(),
        fields: field_names.iter().map(|f| f.to_string()).collect(),
        templates,
        css: Some(MAIN_CSS.to_string()),
    }
}

/// The hidden bookkeeping model; its single note stores the sync state.
pub static METADATA_MODEL: Lazy<Model> = Lazy::new(|| Model {
    name: METADATA_MODEL_NAME.to_string(),
    fields: METADATA_FIELD_NAMES.iter().map(|f| f.to_string()).collect(),
    templates: vec![template(
        "hidden",
        "This card should always be suspended<br>{{last_updated}}",
        "-",
    )],
    css: None,
});

pub static RADICAL_MODEL: Lazy<Model> = Lazy::new(|| {
    model(
        SubjectKind::Radical.model_name(),
        RadicalFields::FIELD_NAMES,
        vec![template(
            "Recognition",
            r#"<div class="card radical">
<div class="card-type">Radical</div>
<div class="glyph">{{radical}}</div>
<div class="prompt">Name?</div>
</div>"#,
            r#"<div class="card radical">
<div class="card-type">Radical</div>
<div class="glyph">{{radical}}</div>
<hr id="answer">
<div class="answer">{{radical_name}}</div>
<div class="mnemonic">{{radical_meaning}}</div>
</div>"#,
        )],
    )
});

pub static KANJI_MODEL: Lazy<Model> = Lazy::new(|| {
    model(
        SubjectKind::Kanji.model_name(),
        KanjiFields::FIELD_NAMES,
        vec![
            template(
                "Recognition",
                r#"<div class="card kanji">
<div class="card-type">Kanji</div>
<div class="glyph">{{kanji}}</div>
<div class="prompt">Meaning?</div>
</div>"#,
                r#"<div class="card kanji">
<div class="card-type">Kanji</div>
<div class="glyph">{{kanji}}</div>
<hr id="answer">
<div class="answer">{{kanji_meaning}}</div>
<div class="breakdown">{{radicals}} &mdash; {{radicals_names}}</div>
<div class="mnemonic">{{meaning_mnemonic}}</div>
<div class="hint">{{meaning_hint}}</div>
</div>"#,
            ),
            template(
                "Reading",
                r#"<div class="card kanji">
<div class="card-type">Kanji</div>
<div class="glyph">{{kanji}}</div>
<div class="prompt">Reading?</div>
</div>"#,
                r#"<div class="card kanji">
<div class="card-type">Kanji</div>
<div class="glyph">{{kanji}}</div>
<hr id="answer">
<div class="answer">{{reading_on}}</div>
<div class="answer">{{reading_kun}}</div>
<div class="mnemonic">{{reading_mnemonic}}</div>
<div class="hint">{{reading_hint}}</div>
</div>"#,
            ),
        ],
    )
});

pub static VOCAB_MODEL: Lazy<Model> = Lazy::new(|| {
    model(
        SubjectKind::Vocabulary.model_name(),
        VocabFields::FIELD_NAMES,
        vec![
            template(
                "Recognition",
                r#"<div class="card vocab">
<div class="card-type">Vocabulary</div>
<div class="glyph">{{vocab}}</div>
<div class="prompt">Meaning?</div>
</div>"#,
                r#"<div class="card vocab">
<div class="card-type">Vocabulary</div>
<div class="glyph">{{vocab}}</div>
<hr id="answer">
<div class="answer">{{vocab_meaning}}</div>
<div class="breakdown">{{speech_type}}</div>
<div class="breakdown">{{kanjis}} &mdash; {{kanji_names}}</div>
<div class="mnemonic">{{meaning_exp}}</div>
<div class="mnemonic">{{context_jp1}}<br>{{context_en1}}</div>
</div>"#,
            ),
            template(
                "Reading",
                r#"<div class="card vocab">
<div class="card-type">Vocabulary</div>
<div class="glyph">{{vocab}}</div>
<div class="prompt">Reading?</div>
</div>"#,
                r#"<div class="card vocab">
<div class="card-type">Vocabulary</div>
<div class="glyph">{{vocab}}</div>
<hr id="answer">
<div class="answer">{{reading}}</div>
<div class="breakdown">{{audio_m}} {{audio_f}}</div>
<div class="mnemonic">{{reading_exp}}</div>
</div>"#,
            ),
        ],
    )
});

pub fn model_for(kind: SubjectKind) -> &'static Model {
    match kind {
        SubjectKind::Radical => &RADICAL_MODEL,
        SubjectKind::Kanji => &KANJI_MODEL,
        SubjectKind::Vocabulary => &VOCAB_MODEL,
    }
}
