// MindGarden/backend/src/sentiment.rs
use serde::Serialize;

/// Phrase ("not good") whose presence in a mood note marks it negative.
/// Placeholder policy: a literal substring check, nothing more.
pub const NEGATIVE_MARKER: &str = "안좋아";

pub const SUPPORTIVE_MESSAGE: &str = "힘든 하루였군요. 짧은 명상을 시도해 보세요.";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn of_note(note: &str) -> Sentiment {
        if note.contains(NEGATIVE_MARKER) {
            Sentiment::Negative
        } else {
            Sentiment::Positive
        }
    }

    pub fn supportive_message(&self) -> Option<&'static str> {
        match self {
            Sentiment::Negative => Some(SUPPORTIVE_MESSAGE),
            Sentiment::Positive => None,
        }
    }
}
