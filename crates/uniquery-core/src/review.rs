//! Post-submission review of a completed session.

use serde::Serialize;

use crate::error::SessionError;
use crate::model::Question;
use crate::session::{AssessmentSession, SessionPhase};

/// Coarse performance bucket used when presenting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceBand {
    /// 80% and above.
    Excellent,
    /// 60% up to 80%.
    Good,
    /// Below 60%.
    NeedsPractice,
}

impl PerformanceBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            PerformanceBand::Excellent
        } else if percentage >= 60.0 {
            PerformanceBand::Good
        } else {
            PerformanceBand::NeedsPractice
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "Excellent performance! You've mastered this topic.",
            PerformanceBand::Good => "Good effort! Review the incorrect answers to improve.",
            PerformanceBand::NeedsPractice => "Keep practicing! Focus on the areas you missed.",
        }
    }
}

/// One graded question of a completed session.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry<'a> {
    pub index: usize,
    pub question: &'a Question,
    /// `None` when the question was left unanswered.
    pub given: Option<&'a str>,
    pub is_correct: bool,
}

impl ReviewEntry<'_> {
    pub fn correct_answer(&self) -> &str {
        self.question.correct_answer()
    }

    pub fn explanation(&self) -> &str {
        self.question
            .explanation()
            .unwrap_or("No explanation provided")
    }
}

/// Summary of a completed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReview<'a> {
    pub topic: &'a str,
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub band: PerformanceBand,
    pub elapsed_seconds: f64,
    pub entries: Vec<ReviewEntry<'a>>,
}

impl AssessmentSession {
    /// Build the review for a completed session.
    pub fn review(&self) -> Result<SessionReview<'_>, SessionError> {
        let (Some(score), Some(percentage)) = (self.score(), self.percentage()) else {
            return Err(SessionError::InvalidState {
                operation: "review",
                phase: self.phase(),
                reason: format!("requires a session {}", SessionPhase::Completed),
            });
        };

        let entries = self
            .graded()
            .map(|(index, question, is_correct)| ReviewEntry {
                index,
                question,
                given: self.answer(index),
                is_correct,
            })
            .collect();

        Ok(SessionReview {
            topic: self.topic_label(),
            score,
            total: self.questions().len(),
            percentage,
            band: PerformanceBand::from_percentage(percentage),
            elapsed_seconds: self.elapsed_seconds(),
            entries,
        })
    }
}

/// Format seconds as `"{m}m {s}s"`.
pub fn format_elapsed(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    format!("{}m {}s", whole / 60, whole % 60)
}
