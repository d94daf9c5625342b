//! Final-statistics aggregation for completed sessions.
//!
//! The stats endpoint is best-effort: when it fails, the presentation layer
//! still gets a `SessionStats` synthesized from the locally accumulated
//! session counters.

use study_core::model::{SessionStats, StudySession};

/// Reconcile server-reported statistics with the local session counters.
///
/// Server values win; locally derivable gaps (total cards, duration) are
/// filled in from the session.
#[must_use]
pub fn reconcile(session: &StudySession, server: Option<SessionStats>) -> SessionStats {
    match server {
        Some(mut stats) => {
            if stats.total_cards == 0 {
                stats.total_cards = session.total_cards;
            }
            if stats.duration_seconds.is_none() {
                stats.duration_seconds = session.duration_seconds();
            }
            stats
        }
        None => synthesize(session),
    }
}

/// Build statistics purely from the local counters.
#[must_use]
pub fn synthesize(session: &StudySession) -> SessionStats {
    SessionStats {
        total_cards: session.total_cards,
        cards_reviewed: session.cards_reviewed,
        correct_responses: session.correct_responses,
        incorrect_responses: session.incorrect_responses,
        accuracy: SessionStats::compute_accuracy(
            session.correct_responses,
            session.cards_reviewed,
        ),
        average_response_time_ms: None,
        duration_seconds: session.duration_seconds(),
        quality_breakdown: None,
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
