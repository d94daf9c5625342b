use std::collections::BTreeMap;

//
// ─── QUALITY BREAKDOWN ─────────────────────────────────────────────────────────
//

/// Per-grade distribution for a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityBreakdown {
    /// Number of responses per grade.
    pub counts: BTreeMap<u8, u32>,
    /// Share of responses per grade, in percent.
    pub percentages: BTreeMap<u8, f64>,
    /// Mean grade across all responses.
    pub mean: f64,
}

impl QualityBreakdown {
    /// Derive percentages and the mean grade from a counts map.
    ///
    /// An empty map yields an empty breakdown with a mean of `0.0`.
    #[must_use]
    pub fn from_counts(counts: BTreeMap<u8, u32>) -> Self {
        let total: u32 = counts.values().sum();
        let mut percentages = BTreeMap::new();
        let mut weighted = 0.0;
        for (&grade, &count) in &counts {
            let share = if total == 0 {
                0.0
            } else {
                f64::from(count) * 100.0 / f64::from(total)
            };
            percentages.insert(grade, share);
            weighted += f64::from(grade) * f64::from(count);
        }
        let mean = if total == 0 { 0.0 } else { weighted / f64::from(total) };
        Self {
            counts,
            percentages,
            mean,
        }
    }
}

//
// ─── SESSION STATS ─────────────────────────────────────────────────────────────
//

/// Final statistics for a completed session.
///
/// Either decoded from the stats endpoint or synthesized locally when that
/// call fails; the presentation layer always receives one of the two.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub total_cards: u32,
    pub cards_reviewed: u32,
    pub correct_responses: u32,
    pub incorrect_responses: u32,
    pub accuracy: f64,
    pub average_response_time_ms: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub quality_breakdown: Option<QualityBreakdown>,
}

impl SessionStats {
    /// `correct / reviewed`, guarding the zero-reviewed case.
    #[must_use]
    pub fn compute_accuracy(correct: u32, reviewed: u32) -> f64 {
        if reviewed == 0 {
            0.0
        } else {
            f64::from(correct) / f64::from(reviewed)
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
