use std::collections::HashMap;

use wanisync_types::{NoteRequirements, ReviewCard, SubjectKind};

/// Fraction of the current level's kanji that must be learned before the
/// working level advances.
const LEVEL_UP_RATIO: f64 = 0.9;

/// What one evaluation pass decided.
#[derive(Debug, Clone, PartialEq)]
pub struct Unlocks {
    /// Current level, possibly advanced by one within this pass.
    pub working_level: u32,
    /// Cards to make reviewable. Unsuspending an already-visible card is
    /// a no-op, so the set is safe to apply repeatedly.
    pub card_ids: Vec<u64>,
}

/// Highest level among unlocked radicals; level 1 before any radical is
/// visible.
pub fn current_level(cards: &[ReviewCard]) -> u32 {
    cards
        .iter()
        .filter(|c| c.kind == SubjectKind::Radical && !c.suspended)
        .map(|c| c.level)
        .fold(1, u32::max)
}

/// A subject counts as learned only when every one of its cards meets
/// the threshold.
pub fn learned_subjects(cards: &[ReviewCard], threshold_days: f64) -> HashMap<u64, bool> {
    let mut learned: HashMap<u64, bool> = HashMap::new();

    for card in cards {
        let card_learned = card.strength.days() >= threshold_days;
        learned
            .entry(card.subject_id)
            .and_modify(|l| *l &= card_learned)
            .or_insert(card_learned);
    }

    learned
}

/// Run the unlock algorithm over the full card set.
///
/// A subject that never appears in the learned-set (it has no cards yet)
/// counts as not learned, which keeps its dependents locked.
pub fn evaluate(cards: &[ReviewCard], notes: &[NoteRequirements], threshold_days: f64) -> Unlocks {
    let mut level = current_level(cards);
    let learned = learned_subjects(cards, threshold_days);

    let level_kanji: Vec<u64> = cards
        .iter()
        .filter(|c| c.kind == SubjectKind::Kanji && c.level == level)
        .map(|c| c.subject_id)
        .collect();
    let learned_kanji = level_kanji
        .iter()
        .filter(|id| learned.get(id).copied().unwrap_or(false))
        .count();

    tracing::info!(
        "{}/{} kanji of level {} are considered learned",
        learned_kanji,
        level_kanji.len(),
        level
    );

    if learned_kanji as f64 >= level_kanji.len() as f64 * LEVEL_UP_RATIO {
        level += 1;
        tracing::info!("reached a new level ({} -> {})", level - 1, level);
    }

    let mut card_ids = Vec::new();
    for note in notes {
        if note.level > level {
            continue;
        }

        let requirements_met = note
            .requirements
            .iter()
            .all(|id| learned.get(id).copied().unwrap_or(false));
        if requirements_met {
            card_ids.extend(note.cards.iter().copied());
        }
    }

    Unlocks {
        working_level: level,
        card_ids,
    }
}
