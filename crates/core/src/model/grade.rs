use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::CardId;

//
// ─── QUALITY GRADE ─────────────────────────────────────────────────────────────
//

/// Recall-quality grade for a reviewed card.
///
/// Observed call sites disagree on the scale (4-point and 6-point variants
/// both exist in the wild), so this is an open small integer rather than a
/// closed enum. The server is the authority on interpretation; the engine
/// only conveys the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityGrade(u8);

impl QualityGrade {
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Local heuristic for "answered correctly", used only for provisional
    /// counter increments until a server stats block overrides them.
    #[must_use]
    pub fn is_passing(self) -> bool {
        self.0 >= 3
    }
}

impl From<u8> for QualityGrade {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── GRADED RESPONSE ───────────────────────────────────────────────────────────
//

/// A grade for the current card, en route to the server.
///
/// Transient: dropped once submission succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedResponse {
    pub card: CardId,
    pub quality: QualityGrade,
    pub submitted_at: DateTime<Utc>,
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_threshold_is_three() {
        assert!(!QualityGrade::new(0).is_passing());
        assert!(!QualityGrade::new(2).is_passing());
        assert!(QualityGrade::new(3).is_passing());
        assert!(QualityGrade::new(5).is_passing());
    }

    #[test]
    fn grade_accepts_values_outside_common_scales() {
        // Open range: the server interprets, we never reject.
        assert_eq!(QualityGrade::from(9).value(), 9);
    }
}
