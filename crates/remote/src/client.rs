//! The four session operations over HTTP.
//!
//! Every operation runs the same template: attach the bearer credential if
//! one is present, classify the HTTP outcome, retry exactly once after a
//! first 401 (invalidating the credential before the retry, as the service
//! contract requires), and hand the body to the resilient decoder.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use study_core::model::{CardId, DeckId, QualityGrade, SessionId, SessionStats};

use crate::auth::CredentialProvider;
use crate::decode;
use crate::error::{ApiError, DecodeError};
use crate::payload::{AnswerAck, NextCard, SessionOpened};

//
// ─── API SEAM ──────────────────────────────────────────────────────────────────
//

/// The four remote session operations, as a seam so the controller can be
/// driven by a scripted implementation in tests.
#[async_trait]
pub trait StudyApi: Send + Sync {
    /// `POST /decks/{deckId}/start`
    async fn start_session(&self, deck: &DeckId) -> Result<SessionOpened, ApiError>;

    /// `GET /study/session/{sessionId}/next[?forceUpdate=true]`
    ///
    /// `deck` stamps decoded cards that do not carry their own deck id; it
    /// is not part of the wire request.
    async fn next_card(
        &self,
        session: &SessionId,
        deck: &DeckId,
        force_update: bool,
    ) -> Result<NextCard, ApiError>;

    /// `POST /study/session/{sessionId}/answer`
    async fn submit_answer(
        &self,
        session: &SessionId,
        card: &CardId,
        quality: QualityGrade,
    ) -> Result<AnswerAck, ApiError>;

    /// `GET /study/session/{sessionId}/stats`
    async fn session_stats(&self, session: &SessionId) -> Result<SessionStats, ApiError>;
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

/// `reqwest`-backed implementation of [`StudyApi`].
#[derive(Clone)]
pub struct HttpStudyApi {
    http: Client,
    base_url: Url,
    auth: Arc<dyn CredentialProvider>,
}

impl HttpStudyApi {
    /// Build a client against the given base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the base URL does not parse.
    pub fn new(
        base_url: impl AsRef<str>,
        auth: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url.as_ref())
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        // Relative joins drop the last path segment without this.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            auth,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))
    }

    /// Run one operation under the two-attempt reauthentication policy.
    ///
    /// On the first 401 the credential is invalidated (exactly one signal)
    /// and a single further attempt is made with whatever credential the
    /// auth collaborator still holds; a second 401 is terminal. Transport
    /// errors and non-401 statuses are never retried.
    async fn execute(
        &self,
        op: &'static str,
        request: impl Fn() -> RequestBuilder + Send + Sync,
    ) -> Result<(Value, String), ApiError> {
        let mut invalidated = false;
        loop {
            let mut attempt = request().header(ACCEPT, "application/json");
            if let Some(token) = self.auth.credential() {
                attempt = attempt.bearer_auth(token);
            }

            let response = attempt.send().await.map_err(ApiError::Transport)?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if invalidated {
                    log::warn!("{op}: still unauthorized after reauth attempt");
                    return Err(ApiError::AuthenticationFailed);
                }
                // Contract: drop the credential first, then retry with
                // whatever the auth collaborator has left.
                log::debug!("{op}: unauthorized, invalidating credential and retrying");
                self.auth.invalidate();
                invalidated = true;
                continue;
            }

            if !status.is_success() {
                return Err(ApiError::Server {
                    status: status.as_u16(),
                });
            }

            let body = response.text().await.map_err(ApiError::Transport)?;
            let value: Value = serde_json::from_str(&body).map_err(|_| ApiError::Decode {
                source: DecodeError::InvalidJson,
                body: body.clone(),
            })?;
            return Ok((value, body));
        }
    }
}

fn decoded<T>(result: Result<T, DecodeError>, body: String) -> Result<T, ApiError> {
    result.map_err(|source| ApiError::Decode { source, body })
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    #[serde(rename = "cardIndex")]
    card_index: &'a str,
    quality: u8,
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    async fn start_session(&self, deck: &DeckId) -> Result<SessionOpened, ApiError> {
        let url = self.endpoint(&format!("decks/{deck}/start"))?;
        let (value, body) = self
            .execute("start-session", || self.http.post(url.clone()))
            .await?;
        decoded(decode::session_opened(&value), body)
    }

    async fn next_card(
        &self,
        session: &SessionId,
        deck: &DeckId,
        force_update: bool,
    ) -> Result<NextCard, ApiError> {
        let mut url = self.endpoint(&format!("study/session/{session}/next"))?;
        if force_update {
            url.set_query(Some("forceUpdate=true"));
        }
        let (value, body) = self
            .execute("next-card", || self.http.get(url.clone()))
            .await?;
        decoded(decode::next_card(&value, deck), body)
    }

    async fn submit_answer(
        &self,
        session: &SessionId,
        card: &CardId,
        quality: QualityGrade,
    ) -> Result<AnswerAck, ApiError> {
        let url = self.endpoint(&format!("study/session/{session}/answer"))?;
        let payload = AnswerRequest {
            card_index: card.as_str(),
            quality: quality.value(),
        };
        let (value, body) = self
            .execute("submit-answer", || {
                self.http.post(url.clone()).json(&payload)
            })
            .await?;
        decoded(decode::answer_ack(&value), body)
    }

    async fn session_stats(&self, session: &SessionId) -> Result<SessionStats, ApiError> {
        let url = self.endpoint(&format!("study/session/{session}/stats"))?;
        let (value, body) = self
            .execute("session-stats", || self.http.get(url.clone()))
            .await?;
        decoded(decode::session_stats(&value), body)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SharedCredential;

    #[test]
    fn base_url_gains_trailing_slash() {
        let api = HttpStudyApi::new(
            "http://localhost:9/api/v1",
            Arc::new(SharedCredential::empty()),
        )
        .unwrap();
        let url = api.endpoint("decks/d1/start").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9/api/v1/decks/d1/start");
    }

    #[test]
    fn invalid_base_url_is_invalid_request() {
        let err = HttpStudyApi::new("not a url", Arc::new(SharedCredential::empty()))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
