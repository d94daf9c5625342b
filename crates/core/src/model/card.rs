use std::collections::BTreeSet;

use crate::model::ids::{CardId, DeckId};

/// Difficulty assumed when the server omits the field (mid-point of the
/// 1–5 scale).
pub const DEFAULT_DIFFICULTY: u8 = 3;

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// A single vocabulary card as presented during a study session.
///
/// Exactly one card is "current" at a time; the session controller owns it
/// from fetch until the graded response for it has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    /// Language-pair example sentences, 0–2 items, order preserved.
    pub examples: Vec<String>,
    pub tags: BTreeSet<String>,
    pub part_of_speech: Option<String>,
    pub difficulty: u8,
}

impl Card {
    /// Create a card with no examples, tags, or part of speech and the
    /// default difficulty. Primarily a convenience for tests.
    #[must_use]
    pub fn bare(
        id: impl Into<CardId>,
        deck_id: impl Into<DeckId>,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            deck_id: deck_id.into(),
            front: front.into(),
            back: back.into(),
            examples: Vec::new(),
            tags: BTreeSet::new(),
            part_of_speech: None,
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_card_uses_default_difficulty() {
        let card = Card::bare("0", "d1", "huis", "house");
        assert_eq!(card.difficulty, DEFAULT_DIFFICULTY);
        assert!(card.examples.is_empty());
        assert!(card.part_of_speech.is_none());
    }
}
