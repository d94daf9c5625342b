//! The state machine that owns one active study session.
//!
//! Single-writer: at most one remote operation is in flight per controller,
//! and callers are expected to consult [`SessionController::is_busy`] before
//! issuing the next one. State lives behind a mutex that is never held
//! across an await; every in-flight operation carries the epoch it was
//! started under and re-validates it before applying results, so replies
//! belonging to a discarded session are dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use remote::payload::NextCard;
use remote::{ApiError, StudyApi};
use study_core::model::{
    Card, DeckId, GradedResponse, QualityGrade, SessionStats, StudySession,
};
use study_core::Clock;

use crate::error::SessionError;
use crate::stats;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of the controller.
///
/// `Starting → FetchingCard ⇄ SubmittingAnswer → Complete`, with `Failed`
/// and `AuthFailed` reachable from any in-flight operation. `CardReady` is
/// the resolved end of a fetch: a card is presented and the controller is
/// not busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    FetchingCard,
    CardReady,
    SubmittingAnswer,
    Complete,
    Failed,
    AuthFailed,
}

impl Phase {
    /// True while a remote operation is in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Phase::Starting | Phase::FetchingCard | Phase::SubmittingAnswer
        )
    }
}

/// What the caller should present after a successful operation: the next
/// card, or the final statistics of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub enum StudyStep {
    Card(Card),
    Complete(SessionStats),
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct ControllerState {
    phase: Phase,
    /// Bumped on every session start and end; in-flight operations compare
    /// against it before touching state (stale-response guard).
    epoch: u64,
    session: Option<StudySession>,
    current_card: Option<Card>,
    final_stats: Option<SessionStats>,
    last_error: Option<String>,
}

impl ControllerState {
    fn clear_session(&mut self) {
        self.session = None;
        self.current_card = None;
        self.final_stats = None;
        self.last_error = None;
    }
}

/// Drives one study session against the remote service.
///
/// An explicit owned instance; hosts construct one per study surface and
/// share it via `Arc`. Exactly one session is active at a time — starting a
/// new one discards the previous session's in-memory state.
pub struct SessionController {
    api: Arc<dyn StudyApi>,
    clock: Clock,
    state: Mutex<ControllerState>,
}

impl SessionController {
    #[must_use]
    pub fn new(api: Arc<dyn StudyApi>) -> Self {
        Self {
            api,
            clock: Clock::default(),
            state: Mutex::new(ControllerState {
                phase: Phase::Idle,
                epoch: 0,
                session: None,
                current_card: None,
                final_stats: None,
                last_error: None,
            }),
        }
    }

    /// Replace the clock, for deterministic timestamps in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state lock poisoned")
    }

    //
    // ─── OBSERVERS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Busy indicator: callers must not issue a new mutating operation while
    /// this is true.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().phase.is_busy()
    }

    #[must_use]
    pub fn session(&self) -> Option<StudySession> {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn current_card(&self) -> Option<Card> {
        self.lock().current_card.clone()
    }

    #[must_use]
    pub fn final_stats(&self) -> Option<SessionStats> {
        self.lock().final_stats.clone()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    #[must_use]
    pub fn auth_failed(&self) -> bool {
        self.lock().phase == Phase::AuthFailed
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// Open a session for the given deck and fetch its first card.
    ///
    /// Valid from `Idle`, `Failed`, and `Complete`; discards any prior
    /// session state. On success the controller chains into the first card
    /// fetch and returns its outcome. Safely retriable after a failure.
    ///
    /// # Errors
    ///
    /// `Busy` while another operation is in flight, `AuthRequired` from the
    /// `AuthFailed` phase, `InvalidState` mid-session, or the classified
    /// remote error.
    pub async fn start_session(&self, deck_id: DeckId) -> Result<StudyStep, SessionError> {
        let epoch = {
            let mut s = self.lock();
            if s.phase.is_busy() {
                return Err(SessionError::Busy);
            }
            match s.phase {
                Phase::Idle | Phase::Failed | Phase::Complete => {}
                Phase::AuthFailed => return Err(SessionError::AuthRequired),
                _ => return Err(SessionError::InvalidState),
            }
            s.epoch += 1;
            s.clear_session();
            s.phase = Phase::Starting;
            s.epoch
        };

        match self.api.start_session(&deck_id).await {
            Ok(opened) => {
                {
                    let mut s = self.lock();
                    if s.epoch != epoch {
                        log::debug!("dropping stale start-session response");
                        return Err(SessionError::Stale);
                    }
                    let session = StudySession::new(
                        opened.session_id,
                        opened.deck_id.unwrap_or(deck_id),
                        opened.total_cards,
                        opened.new_cards,
                        opened.review_cards,
                        self.clock.now(),
                    );
                    log::debug!(
                        "session {} started: {} cards",
                        session.session_id,
                        session.total_cards
                    );
                    s.session = Some(session);
                    s.phase = Phase::FetchingCard;
                }
                self.fetch_next_card_inner(epoch, false).await
            }
            Err(err) => Err(self.fail(epoch, err)),
        }
    }

    /// Fetch the next card of the active session.
    ///
    /// A returned card becomes current; an absent card completes the session
    /// and triggers the single best-effort stats fetch. The controller stays
    /// busy until those statistics are reconciled.
    ///
    /// # Errors
    ///
    /// `Busy`, `NoActiveSession`, `InvalidState` once complete, or the
    /// classified remote error.
    pub async fn fetch_next_card(&self, force_update: bool) -> Result<StudyStep, SessionError> {
        let epoch = {
            let mut s = self.lock();
            if s.phase.is_busy() {
                return Err(SessionError::Busy);
            }
            if s.session.is_none() {
                return Err(SessionError::NoActiveSession);
            }
            if !matches!(s.phase, Phase::CardReady | Phase::Failed) {
                return Err(SessionError::InvalidState);
            }
            s.phase = Phase::FetchingCard;
            s.epoch
        };
        self.fetch_next_card_inner(epoch, force_update).await
    }

    /// Submit a graded response for the current card.
    ///
    /// On success the local counters are reconciled with any server stats
    /// block (server values win), the card is cleared, and the controller
    /// chains into the next fetch. On failure the card is retained so the
    /// same response can be retried.
    ///
    /// # Errors
    ///
    /// `Busy`, `NoCurrentCard`, or the classified remote error.
    pub async fn record_response(&self, quality: QualityGrade) -> Result<StudyStep, SessionError> {
        let (epoch, session_id, response) = {
            let mut s = self.lock();
            if s.phase.is_busy() {
                return Err(SessionError::Busy);
            }
            let Some(session) = &s.session else {
                return Err(SessionError::NoActiveSession);
            };
            let Some(card) = &s.current_card else {
                return Err(SessionError::NoCurrentCard);
            };
            let response = GradedResponse {
                card: card.id.clone(),
                quality,
                submitted_at: self.clock.now(),
            };
            let session_id = session.session_id.clone();
            s.phase = Phase::SubmittingAnswer;
            (s.epoch, session_id, response)
        };

        match self
            .api
            .submit_answer(&session_id, &response.card, response.quality)
            .await
        {
            Ok(ack) => {
                {
                    let mut s = self.lock();
                    if s.epoch != epoch {
                        log::debug!("dropping stale submit-answer response");
                        return Err(SessionError::Stale);
                    }
                    let Some(session) = s.session.as_mut() else {
                        return Err(SessionError::Stale);
                    };
                    session.record_local_answer(quality.is_passing());
                    if let Some(counts) = ack.stats {
                        session.reconcile_counts(
                            counts.cards_reviewed,
                            counts.correct_responses,
                            counts.incorrect_responses,
                        );
                    }
                    s.current_card = None;
                    s.phase = Phase::FetchingCard;
                }
                self.fetch_next_card_inner(epoch, false).await
            }
            Err(err) => Err(self.fail(epoch, err)),
        }
    }

    /// End the session unconditionally and return to `Idle`.
    ///
    /// Pure local operation: no remote call is made, and an in-flight call
    /// is not aborted — its late response is dropped by the epoch guard.
    pub fn end_session(&self) {
        let mut s = self.lock();
        s.epoch += 1;
        s.clear_session();
        s.phase = Phase::Idle;
    }

    /// Clear the `AuthFailed` flag so a caller can attempt `start_session`
    /// again once the auth collaborator holds a new credential. Does not
    /// resume the previous session.
    pub fn reset_auth_failure(&self) {
        let mut s = self.lock();
        if s.phase == Phase::AuthFailed {
            s.phase = Phase::Idle;
            s.last_error = None;
        }
    }

    //
    // ─── INTERNAL ──────────────────────────────────────────────────────────────
    //

    async fn fetch_next_card_inner(
        &self,
        epoch: u64,
        force_update: bool,
    ) -> Result<StudyStep, SessionError> {
        let (session_id, deck_id) = {
            let s = self.lock();
            if s.epoch != epoch {
                return Err(SessionError::Stale);
            }
            let Some(session) = &s.session else {
                return Err(SessionError::Stale);
            };
            (session.session_id.clone(), session.deck_id.clone())
        };

        let next = match self.api.next_card(&session_id, &deck_id, force_update).await {
            Ok(next) => next,
            Err(err) => return Err(self.fail(epoch, err)),
        };

        {
            let mut s = self.lock();
            if s.epoch != epoch {
                log::debug!("dropping stale next-card response for session {session_id}");
                return Err(SessionError::Stale);
            }
            let Some(session) = s.session.as_mut() else {
                return Err(SessionError::Stale);
            };
            match next {
                NextCard {
                    card: Some(card),
                    progress,
                } => {
                    if let Some(progress) = progress {
                        session.apply_progress(progress);
                    }
                    s.current_card = Some(card.clone());
                    s.phase = Phase::CardReady;
                    return Ok(StudyStep::Card(card));
                }
                NextCard { card: None, .. } => {
                    session.complete(self.clock.now());
                    s.current_card = None;
                    // Phase stays `FetchingCard`: the chained stats fetch
                    // below is still in flight.
                }
            }
        }

        // Session exhausted: exactly one best-effort stats fetch. Its
        // failure never blocks completion.
        let server_stats = match self.api.session_stats(&session_id).await {
            Ok(stats) => Some(stats),
            Err(err) => {
                log::warn!("final stats fetch for session {session_id} failed: {err}");
                None
            }
        };

        let mut s = self.lock();
        if s.epoch != epoch {
            return Err(SessionError::Stale);
        }
        let Some(session) = &s.session else {
            return Err(SessionError::Stale);
        };
        let final_stats = stats::reconcile(session, server_stats);
        s.final_stats = Some(final_stats.clone());
        s.phase = Phase::Complete;
        Ok(StudyStep::Complete(final_stats))
    }

    /// Record a failed operation: `AuthFailed` for the terminal authorization
    /// failure, `Failed` otherwise. Previously-held session state is kept.
    fn fail(&self, epoch: u64, err: ApiError) -> SessionError {
        let mut s = self.lock();
        if s.epoch != epoch {
            log::debug!("dropping stale failure for a discarded session: {err}");
            return SessionError::Stale;
        }
        s.phase = if err.is_authorization() {
            Phase::AuthFailed
        } else {
            Phase::Failed
        };
        s.last_error = Some(err.to_string());
        SessionError::Api(err)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
