//! Assessment session state machine.
//!
//! `Setup` (no questions) -> `InProgress` -> `Completed`, with `retake`
//! returning a completed session to `InProgress` and `reset` returning any
//! session to `Setup`. Every operation validates before mutating, so a failed
//! call leaves the session unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::Question;
use crate::time::{seconds_between, Clock};

/// Lifecycle phase of an [`AssessmentSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    Setup,
    InProgress,
    Completed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Setup => write!(f, "in setup"),
            SessionPhase::InProgress => write!(f, "in progress"),
            SessionPhase::Completed => write!(f, "completed"),
        }
    }
}

/// A single quiz attempt over a fixed question set.
#[derive(Debug, Clone, Default)]
pub struct AssessmentSession {
    questions: Vec<Question>,
    answers: BTreeMap<usize, String>,
    current_index: usize,
    score: usize,
    completed: bool,
    started_at: Option<DateTime<Utc>>,
    elapsed_seconds: f64,
    topic_label: String,
    clock: Clock,
}

impl AssessmentSession {
    /// An empty session in `Setup`, timed by the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty session timed by `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn phase(&self) -> SessionPhase {
        if self.questions.is_empty() {
            SessionPhase::Setup
        } else if self.completed {
            SessionPhase::Completed
        } else {
            SessionPhase::InProgress
        }
    }

    fn require(&self, operation: &'static str, phase: SessionPhase) -> Result<(), SessionError> {
        let current = self.phase();
        if current == phase {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                phase: current,
                reason: format!("requires a session {phase}"),
            })
        }
    }

    /// Load `questions` and start the timer.
    ///
    /// Fails while another assessment is in progress; call [`reset`](Self::reset)
    /// first to abandon it.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        topic_label: impl Into<String>,
    ) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase == SessionPhase::InProgress {
            return Err(SessionError::InvalidState {
                operation: "start",
                phase,
                reason: "an assessment is already in progress".into(),
            });
        }
        if questions.is_empty() {
            return Err(SessionError::InvalidState {
                operation: "start",
                phase,
                reason: "no questions to assess".into(),
            });
        }

        self.questions = questions;
        self.answers.clear();
        self.current_index = 0;
        self.score = 0;
        self.completed = false;
        self.started_at = Some(self.clock.now());
        self.elapsed_seconds = 0.0;
        self.topic_label = topic_label.into();
        tracing::info!(
            topic = %self.topic_label,
            questions = self.questions.len(),
            "assessment started"
        );
        Ok(())
    }

    /// Record (or overwrite) the answer for question `index`.
    pub fn select_answer(&mut self, index: usize, option: &str) -> Result<(), SessionError> {
        self.require("select an answer", SessionPhase::InProgress)?;
        let question = self.questions.get(index).ok_or(SessionError::OutOfRange {
            index,
            len: self.questions.len(),
        })?;
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption {
                index,
                option: option.to_string(),
            });
        }
        self.answers.insert(index, option.to_string());
        Ok(())
    }

    /// Jump to question `index`.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.require("navigate", SessionPhase::InProgress)?;
        if index >= self.questions.len() {
            return Err(SessionError::OutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    /// Move forward one question. A no-op at the last question or outside
    /// `InProgress`; returns whether the position changed.
    pub fn next(&mut self) -> bool {
        if self.phase() != SessionPhase::InProgress
            || self.current_index + 1 >= self.questions.len()
        {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Move back one question. A no-op at the first question or outside
    /// `InProgress`; returns whether the position changed.
    pub fn previous(&mut self) -> bool {
        if self.phase() != SessionPhase::InProgress || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Grade the attempt, stop the timer and freeze the session.
    pub fn submit(&mut self) -> Result<usize, SessionError> {
        self.require("submit", SessionPhase::InProgress)?;
        let score = self.graded().filter(|(_, _, correct)| *correct).count();
        let now = self.clock.now();

        self.score = score;
        self.completed = true;
        self.elapsed_seconds = self
            .started_at
            .map(|start| seconds_between(start, now))
            .unwrap_or(0.0);
        tracing::info!(
            topic = %self.topic_label,
            score,
            total = self.questions.len(),
            elapsed_secs = self.elapsed_seconds,
            "assessment submitted"
        );
        Ok(score)
    }

    /// Start another attempt over the same questions.
    pub fn retake(&mut self) -> Result<(), SessionError> {
        self.require("retake", SessionPhase::Completed)?;
        self.answers.clear();
        self.current_index = 0;
        self.completed = false;
        self.started_at = Some(self.clock.now());
        self.elapsed_seconds = 0.0;
        tracing::info!(topic = %self.topic_label, "assessment retake");
        Ok(())
    }

    /// Discard the question set and return to `Setup`.
    pub fn reset(&mut self) {
        let clock = self.clock;
        *self = Self::with_clock(clock);
    }

    /// Questions answered incorrectly or left unanswered, in order.
    pub fn wrong_answers(&self) -> Result<Vec<(usize, &Question)>, SessionError> {
        self.require("list wrong answers", SessionPhase::Completed)?;
        Ok(self
            .graded()
            .filter(|(_, _, correct)| !*correct)
            .map(|(i, q, _)| (i, q))
            .collect())
    }

    /// `(index, question, answered correctly)` for every question.
    pub(crate) fn graded(&self) -> impl Iterator<Item = (usize, &Question, bool)> + '_ {
        self.questions.iter().enumerate().map(|(i, q)| {
            let correct = self.answers.get(&i).is_some_and(|a| q.is_correct(a));
            (i, q, correct)
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    /// The score of the last submission; `None` unless completed.
    pub fn score(&self) -> Option<usize> {
        self.completed.then_some(self.score)
    }

    /// `100 * score / len`, unrounded; `None` unless completed.
    pub fn percentage(&self) -> Option<f64> {
        self.score()
            .map(|score| 100.0 * score as f64 / self.questions.len() as f64)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn topic_label(&self) -> &str {
        &self.topic_label
    }

    /// Capture the exportable state of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            score: self.score,
            completed: self.completed,
            current_index: self.current_index,
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds,
            topic_label: self.topic_label.clone(),
        }
    }

    /// Rebuild a session from an exported snapshot, checking its invariants.
    pub fn from_snapshot(snapshot: SessionSnapshot, clock: Clock) -> Result<Self, SessionError> {
        let len = snapshot.questions.len();
        let invalid = |reason: &str| SessionError::InvalidState {
            operation: "restore",
            phase: SessionPhase::Setup,
            reason: reason.to_string(),
        };

        if len == 0 && (snapshot.completed || !snapshot.answers.is_empty()) {
            return Err(invalid("snapshot has answers but no questions"));
        }
        if len > 0 && snapshot.current_index >= len {
            return Err(SessionError::OutOfRange {
                index: snapshot.current_index,
                len,
            });
        }
        for (&index, option) in &snapshot.answers {
            let question = snapshot
                .questions
                .get(index)
                .ok_or(SessionError::OutOfRange { index, len })?;
            if !question.has_option(option) {
                return Err(SessionError::UnknownOption {
                    index,
                    option: option.clone(),
                });
            }
        }

        let session = Self {
            questions: snapshot.questions,
            answers: snapshot.answers,
            current_index: snapshot.current_index,
            score: snapshot.score,
            completed: snapshot.completed,
            started_at: snapshot.started_at,
            elapsed_seconds: snapshot.elapsed_seconds,
            topic_label: snapshot.topic_label,
            clock,
        };

        if session.completed {
            let regraded = session.graded().filter(|(_, _, c)| *c).count();
            if regraded != session.score {
                return Err(invalid("score does not match the recorded answers"));
            }
        }
        Ok(session)
    }
}

/// Serialized session export.
///
/// Field names and nesting are fixed for compatibility with earlier exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub questions: Vec<Question>,
    pub answers: BTreeMap<usize, String>,
    pub score: usize,
    pub completed: bool,
    pub current_index: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
    pub topic_label: String,
}

impl SessionSnapshot {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize session")
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse session JSON")
    }
}

/// Default download name for an export taken at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("quiz_results_{}.json", at.format("%Y%m%d"))
}
