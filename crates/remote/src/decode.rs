//! Resilient decoder for the study service's JSON dialect.
//!
//! The service has drifted across versions: field names vary between camel
//! and snake case, payloads are sometimes nested under a `data` envelope,
//! identifiers arrive as strings or numbers, and whole blocks go missing.
//! The rule here is that identity fields (session id, card id) fail loudly
//! while everything else degrades to a documented default.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use study_core::model::{
    Card, CardId, DeckId, QualityBreakdown, SessionId, SessionProgress, SessionStats,
    DEFAULT_DIFFICULTY,
};

use crate::error::DecodeError;
use crate::payload::{AnswerAck, AnswerCounts, NextCard, SessionOpened};

//
// ─── ALIAS TABLES ──────────────────────────────────────────────────────────────
//
// First present alias wins. Order encodes the preferred spelling.

const SESSION_ID: &[&str] = &["sessionId", "session_id", "id"];
const DECK_ID: &[&str] = &["deckId", "deck_id"];
const CARD_ID: &[&str] = &["id", "_id", "cardId"];
const TOTAL_CARDS: &[&str] = &["totalCards", "total_cards", "total"];
const NEW_CARDS: &[&str] = &["newCards", "new_cards"];
const REVIEW_CARDS: &[&str] = &["reviewCards", "review_cards"];
const REVIEWED: &[&str] = &["cardsReviewed", "reviewed", "cards_reviewed", "current"];
const CORRECT: &[&str] = &["correctResponses", "correct", "correct_responses"];
const INCORRECT: &[&str] = &["incorrectResponses", "incorrect", "incorrect_responses"];
const REMAINING: &[&str] = &["remaining", "cardsRemaining", "cards_remaining"];
const ACCURACY: &[&str] = &["accuracy", "accuracyRate", "accuracy_rate"];
const AVG_RESPONSE_TIME: &[&str] = &[
    "averageResponseTime",
    "avgResponseTime",
    "average_response_time",
];
const DURATION: &[&str] = &["duration", "durationSeconds", "duration_seconds"];
const BREAKDOWN: &[&str] = &["qualityBreakdown", "quality_breakdown"];
const FRONT: &[&str] = &["Word", "word", "front"];
const BACK: &[&str] = &["Definition", "definition", "back"];
const PART_OF_SPEECH: &[&str] = &["Part-of-Speech", "partOfSpeech", "pos"];
/// Example sentences are language-pair specific; present values are taken
/// in this order, giving 0–2 examples per card.
const EXAMPLES: &[&str] = &["Dutch", "English"];

//
// ─── ENVELOPE ──────────────────────────────────────────────────────────────────
//

/// Unwrap the response envelope.
///
/// An absent `success` flag means success (older variants omit it); an
/// explicit `false` is a rejection carrying the envelope message. A `data`
/// object, when present, replaces the top level as the payload.
pub fn payload(value: &Value) -> Result<&Map<String, Value>, DecodeError> {
    let envelope = value.as_object().ok_or(DecodeError::NotAnObject)?;
    if let Some(flag) = envelope.get("success") {
        if flag == &Value::Bool(false) {
            let message = str_field(envelope, &["message", "error"])
                .unwrap_or("request failed")
                .to_string();
            return Err(DecodeError::Rejected { message });
        }
    }
    match envelope.get("data").and_then(Value::as_object) {
        Some(data) => Ok(data),
        None => Ok(envelope),
    }
}

//
// ─── FIELD LOOKUP ──────────────────────────────────────────────────────────────
//

fn field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|name| obj.get(*name))
}

fn str_field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a str> {
    field(obj, aliases).and_then(Value::as_str)
}

/// Counter lookup, tolerating numeric strings.
fn u32_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<u32> {
    match field(obj, aliases)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn f64_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    match field(obj, aliases)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Identifier lookup: a string or a number, normalized to a string.
fn id_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    match field(obj, aliases)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_value(value: &Value, name: &'static str) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(DecodeError::UnexpectedType(name)),
    }
}

/// Required identifier: absent is `MissingField`, present under a usable
/// alias but neither string nor number is `UnexpectedType`.
fn required_id(
    obj: &Map<String, Value>,
    aliases: &[&str],
    name: &'static str,
) -> Result<String, DecodeError> {
    field(obj, aliases)
        .ok_or(DecodeError::MissingField(name))
        .and_then(|value| id_value(value, name))
}

//
// ─── OPERATION DECODERS ────────────────────────────────────────────────────────
//

/// Decode a start-session response.
///
/// # Errors
///
/// Returns `DecodeError::MissingField("sessionId")` when no session id
/// alias is present, `DecodeError::UnexpectedType("sessionId")` when the
/// id is neither a string nor a number; card counts degrade to `0`.
pub fn session_opened(value: &Value) -> Result<SessionOpened, DecodeError> {
    let obj = payload(value)?;
    let session_id = required_id(obj, SESSION_ID, "sessionId")?;
    Ok(SessionOpened {
        session_id: SessionId::from(session_id),
        deck_id: id_field(obj, DECK_ID).map(DeckId::from),
        total_cards: u32_field(obj, TOTAL_CARDS).unwrap_or(0),
        new_cards: u32_field(obj, NEW_CARDS).unwrap_or(0),
        review_cards: u32_field(obj, REVIEW_CARDS).unwrap_or(0),
    })
}

/// Decode a next-card response. An absent `card` object signals session
/// exhaustion and is not an error.
///
/// `deck_id` stamps the decoded card when the response does not carry one.
///
/// # Errors
///
/// Returns `DecodeError::MissingField("cardIndex")` when a card object is
/// present but neither `cardIndex` nor any card id alias is, and
/// `DecodeError::UnexpectedType("cardIndex")` when the id that is present
/// is neither a string nor a number.
pub fn next_card(value: &Value, deck_id: &DeckId) -> Result<NextCard, DecodeError> {
    let obj = payload(value)?;
    let card = match obj.get("card").and_then(Value::as_object) {
        Some(card_obj) => Some(decode_card(obj, card_obj, deck_id)?),
        None => None,
    };
    Ok(NextCard {
        card,
        progress: obj
            .get("progress")
            .and_then(Value::as_object)
            .map(decode_progress),
    })
}

fn decode_progress(obj: &Map<String, Value>) -> SessionProgress {
    // An unreported total stays unknown; the session keeps its own.
    SessionProgress::new(
        u32_field(obj, REVIEWED).unwrap_or(0),
        u32_field(obj, TOTAL_CARDS),
        u32_field(obj, REMAINING),
    )
}

fn decode_card(
    payload: &Map<String, Value>,
    card: &Map<String, Value>,
    deck_id: &DeckId,
) -> Result<Card, DecodeError> {
    // The card's identity usually lives beside it as `cardIndex`; fall back
    // to ids on the card object itself.
    let id = match field(payload, &["cardIndex", "card_index"]) {
        Some(value) => id_value(value, "cardIndex")?,
        None => required_id(card, CARD_ID, "cardIndex")?,
    };

    // Newer variants nest display values under `fields`; older ones are flat.
    let fields = card.get("fields").and_then(Value::as_object).unwrap_or(card);

    let examples = EXAMPLES
        .iter()
        .filter_map(|name| fields.get(*name).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let tags: BTreeSet<String> = card
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let difficulty = u32_field(card, &["difficulty"])
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or(DEFAULT_DIFFICULTY);

    Ok(Card {
        id: CardId::from(id),
        deck_id: id_field(card, DECK_ID)
            .map(DeckId::from)
            .unwrap_or_else(|| deck_id.clone()),
        front: str_field(fields, FRONT).unwrap_or_default().to_string(),
        back: str_field(fields, BACK).unwrap_or_default().to_string(),
        examples,
        tags,
        part_of_speech: str_field(fields, PART_OF_SPEECH).map(str::to_string),
        difficulty,
    })
}

/// Decode a submit-answer acknowledgement. The stats block is optional.
///
/// # Errors
///
/// Only envelope-level failures; a missing or partial stats block degrades.
pub fn answer_ack(value: &Value) -> Result<AnswerAck, DecodeError> {
    let obj = payload(value)?;
    let stats = obj
        .get("stats")
        .and_then(Value::as_object)
        .map(|stats| AnswerCounts {
            cards_reviewed: u32_field(stats, REVIEWED).unwrap_or(0),
            correct_responses: u32_field(stats, CORRECT).unwrap_or(0),
            incorrect_responses: u32_field(stats, INCORRECT).unwrap_or(0),
        });
    Ok(AnswerAck { stats })
}

/// Decode a session-stats response.
///
/// Accuracy is computed locally (`correct / reviewed`, `0.0` at zero
/// reviewed) when the server omits it.
///
/// # Errors
///
/// Only envelope-level failures; every stats field has a default.
pub fn session_stats(value: &Value) -> Result<SessionStats, DecodeError> {
    let obj = payload(value)?;
    let stats = obj.get("stats").and_then(Value::as_object).unwrap_or(obj);

    let cards_reviewed = u32_field(stats, REVIEWED).unwrap_or(0);
    let correct_responses = u32_field(stats, CORRECT).unwrap_or(0);
    let accuracy = f64_field(stats, ACCURACY)
        .unwrap_or_else(|| SessionStats::compute_accuracy(correct_responses, cards_reviewed));

    Ok(SessionStats {
        total_cards: u32_field(stats, TOTAL_CARDS).unwrap_or(0),
        cards_reviewed,
        correct_responses,
        incorrect_responses: u32_field(stats, INCORRECT).unwrap_or(0),
        accuracy,
        average_response_time_ms: f64_field(stats, AVG_RESPONSE_TIME),
        duration_seconds: f64_field(stats, DURATION),
        quality_breakdown: field(stats, BREAKDOWN)
            .and_then(Value::as_object)
            .map(decode_breakdown),
    })
}

fn decode_breakdown(obj: &Map<String, Value>) -> QualityBreakdown {
    // Either a flat grade→count map or the same nested under `counts`.
    let counts_obj = obj.get("counts").and_then(Value::as_object).unwrap_or(obj);
    let counts: BTreeMap<u8, u32> = counts_obj
        .iter()
        .filter_map(|(grade, count)| {
            let grade = grade.trim().parse().ok()?;
            let count = count.as_u64().and_then(|v| u32::try_from(v).ok())?;
            Some((grade, count))
        })
        .collect();
    QualityBreakdown::from_counts(counts)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
