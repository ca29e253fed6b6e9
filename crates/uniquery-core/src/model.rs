//! Core data model types for uniquery.
//!
//! A [`Question`] is only ever constructed through validation: the correct
//! answer must be one of the options under exact string comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of options a generated multiple-choice question carries.
pub const DEFAULT_OPTION_COUNT: usize = 4;

/// A validated multiple-choice question.
///
/// Serialized with the same keys the generation prompt asks for
/// (`question`, `options`, `answer`, `explanation`), so exported sessions can
/// be fed back through the extractor or reloaded directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: Option<String>,
}

/// Reasons a question record cannot become a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    /// The record has no options at all.
    #[error("question has no options")]
    NoOptions,

    /// The correct answer does not exactly match any option.
    #[error("answer {answer:?} is not one of the options")]
    AnswerNotInOptions { answer: String },
}

impl Question {
    /// Validate and build a question.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: Option<String>,
    ) -> Result<Self, InvalidQuestion> {
        let correct_answer = correct_answer.into();
        if options.is_empty() {
            return Err(InvalidQuestion::NoOptions);
        }
        if !options.iter().any(|o| *o == correct_answer) {
            return Err(InvalidQuestion::AnswerNotInOptions {
                answer: correct_answer,
            });
        }
        Ok(Self {
            text: text.into(),
            options,
            correct_answer,
            explanation,
        })
    }

    /// The question prompt.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The answer options, in the order the model produced them.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The option text that counts as correct.
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Optional explanation of the correct answer.
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Whether `option` is one of this question's options (exact match).
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Exact-match grading: both sides trimmed, case preserved.
    pub fn is_correct(&self, given: &str) -> bool {
        given.trim() == self.correct_answer.trim()
    }
}

/// Wire shape of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionRecord {
    question: String,
    options: Vec<String>,
    answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = InvalidQuestion;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(
            record.question,
            record.options,
            record.answer,
            record.explanation,
        )
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            question: q.text,
            options: q.options,
            answer: q.correct_answer,
            explanation: q.explanation,
        }
    }
}

/// How the extractor treats elements that fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Any invalid element rejects the whole batch. Required wherever graded
    /// scoring depends on exact-match comparison.
    Strict,
    /// Invalid elements are dropped and the rest of the batch is kept.
    Lenient,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Strict => write!(f, "strict"),
            ExtractionMode::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ExtractionMode::Strict),
            "lenient" => Ok(ExtractionMode::Lenient),
            other => Err(format!("unknown extraction mode: {other}")),
        }
    }
}
