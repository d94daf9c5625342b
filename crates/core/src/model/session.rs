use chrono::{DateTime, Utc};

use crate::model::ids::{DeckId, SessionId};

//
// ─── SESSION PROGRESS ──────────────────────────────────────────────────────────
//

/// Progress snapshot for an active session.
///
/// `total_cards` and `remaining` are `None` when the server did not report
/// them; the session then keeps whatever it already knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub cards_reviewed: u32,
    pub total_cards: Option<u32>,
    pub remaining: Option<u32>,
}

impl SessionProgress {
    /// Build a progress snapshot, deriving `remaining` when the server did
    /// not report it but the total is known.
    #[must_use]
    pub fn new(cards_reviewed: u32, total_cards: Option<u32>, remaining: Option<u32>) -> Self {
        Self {
            cards_reviewed,
            total_cards,
            remaining: remaining
                .or_else(|| total_cards.map(|total| total.saturating_sub(cards_reviewed))),
        }
    }
}

//
// ─── STUDY SESSION ─────────────────────────────────────────────────────────────
//

/// In-memory state of one bounded study interaction with a deck.
///
/// Owned exclusively by the session controller; exactly one instance is
/// active per controller, and starting a new session discards the previous
/// one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    pub session_id: SessionId,
    pub deck_id: DeckId,
    pub total_cards: u32,
    pub new_cards: u32,
    pub review_cards: u32,
    pub cards_reviewed: u32,
    pub correct_responses: u32,
    pub incorrect_responses: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_complete: bool,
}

impl StudySession {
    /// Fresh session with zeroed counters, as returned by the start call.
    #[must_use]
    pub fn new(
        session_id: SessionId,
        deck_id: DeckId,
        total_cards: u32,
        new_cards: u32,
        review_cards: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            deck_id,
            total_cards,
            new_cards,
            review_cards,
            cards_reviewed: 0,
            correct_responses: 0,
            incorrect_responses: 0,
            started_at,
            ended_at: None,
            is_complete: false,
        }
    }

    /// Current progress, with `remaining` derived from the counters.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::new(self.cards_reviewed, Some(self.total_cards), None)
    }

    /// Update progress counters from a server-reported snapshot. A total the
    /// server did not report is kept, not zeroed.
    pub fn apply_progress(&mut self, progress: SessionProgress) {
        if let Some(total) = progress.total_cards {
            self.total_cards = total;
        }
        self.cards_reviewed = progress.cards_reviewed.min(self.total_cards);
    }

    /// Provisionally count one answered card, before the server has had a
    /// chance to report authoritative counters.
    ///
    /// `cards_reviewed` never exceeds `total_cards`.
    pub fn record_local_answer(&mut self, passing: bool) {
        self.cards_reviewed = (self.cards_reviewed + 1).min(self.total_cards);
        if passing {
            self.correct_responses += 1;
        } else {
            self.incorrect_responses += 1;
        }
    }

    /// Reconcile counters with a server-reported stats block. Server values
    /// take precedence over local increments.
    pub fn reconcile_counts(&mut self, reviewed: u32, correct: u32, incorrect: u32) {
        self.cards_reviewed = reviewed.min(self.total_cards);
        self.correct_responses = correct;
        self.incorrect_responses = incorrect;
    }

    /// Mark the session exhausted.
    pub fn complete(&mut self, ended_at: DateTime<Utc>) {
        self.is_complete = true;
        self.ended_at = Some(ended_at);
    }

    /// Wall-clock duration, available once the session has ended.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        let ended_at = self.ended_at?;
        let millis = ended_at.signed_duration_since(self.started_at).num_milliseconds();
        Some(millis as f64 / 1000.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
