mod card;
mod grade;
mod ids;
mod session;
mod stats;

pub use card::{Card, DEFAULT_DIFFICULTY};
pub use grade::{GradedResponse, QualityGrade};
pub use ids::{CardId, DeckId, SessionId};
pub use session::{SessionProgress, StudySession};
pub use stats::{QualityBreakdown, SessionStats};
