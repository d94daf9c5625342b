//! Decoded payloads for the four session operations.

use study_core::model::{Card, DeckId, SessionId, SessionProgress};

/// Result of the start-session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOpened {
    pub session_id: SessionId,
    /// Echoed by most response variants; absent in some, in which case the
    /// caller falls back to the deck it asked for.
    pub deck_id: Option<DeckId>,
    pub total_cards: u32,
    pub new_cards: u32,
    pub review_cards: u32,
}

/// Result of the next-card operation.
///
/// An absent card signals session exhaustion, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextCard {
    pub card: Option<Card>,
    pub progress: Option<SessionProgress>,
}

/// Counter block the submit-answer response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerCounts {
    pub cards_reviewed: u32,
    pub correct_responses: u32,
    pub incorrect_responses: u32,
}

/// Result of the submit-answer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerAck {
    pub stats: Option<AnswerCounts>,
}
