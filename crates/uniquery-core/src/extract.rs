//! Structured question extraction from free-form model output.
//!
//! Model responses usually wrap the requested JSON array in prose, and
//! sometimes in `//` comments or trailing commas copied from the prompt. The
//! extractor locates one candidate span, parses it (with one relaxation pass
//! on failure), and validates every element into a [`Question`].
//!
//! Handles:
//! - Leading/trailing prose around the array
//! - Line comments and trailing commas inside the array
//! - Scalar options/answers (numbers, booleans) which are stringified
//!
//! The span-finding heuristic sits behind [`SpanLocator`] so it can be swapped
//! without touching callers.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ExtractionError;
use crate::model::{ExtractionMode, InvalidQuestion, Question, DEFAULT_OPTION_COUNT};

/// Finds the candidate JSON span inside raw model text.
pub trait SpanLocator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Return exactly one candidate span, or `None` if nothing looks like an
    /// array of objects.
    fn locate<'a>(&self, text: &'a str) -> Option<&'a str>;
}

static ARRAY_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[\s*\{.*?\}\s*,?\s*\]").expect("array span pattern is valid")
});

/// Non-greedy regex scan: the first `[` + `{` up to the first `}` + `]`
/// (a trailing comma between them is allowed).
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexLocator;

impl SpanLocator for RegexLocator {
    fn name(&self) -> &str {
        "regex"
    }

    fn locate<'a>(&self, text: &'a str) -> Option<&'a str> {
        ARRAY_SPAN.find(text).map(|m| m.as_str())
    }
}

/// Bracket-balancing scan that understands JSON strings.
///
/// Unlike [`RegexLocator`] it survives `}]` sequences inside string values and
/// nested arrays of objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketLocator;

impl SpanLocator for BracketLocator {
    fn name(&self) -> &str {
        "bracket"
    }

    fn locate<'a>(&self, text: &'a str) -> Option<&'a str> {
        let bytes = text.as_bytes();
        let mut search_from = 0;
        while let Some(offset) = text[search_from..].find('[') {
            let start = search_from + offset;
            let opens_object = text[start + 1..]
                .trim_start()
                .starts_with('{');
            if opens_object {
                if let Some(end) = balanced_end(bytes, start) {
                    return Some(&text[start..=end]);
                }
            }
            search_from = start + 1;
        }
        None
    }
}

/// Index of the bracket closing the one at `start`, skipping string contents.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (b == b']').then_some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Configurable question extractor.
pub struct Extractor {
    mode: ExtractionMode,
    required_option_count: usize,
    locator: Box<dyn SpanLocator>,
}

impl Extractor {
    /// Extractor with the default option count and regex span locator.
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            mode,
            required_option_count: DEFAULT_OPTION_COUNT,
            locator: Box::new(RegexLocator),
        }
    }

    pub fn with_option_count(mut self, count: usize) -> Self {
        self.required_option_count = count;
        self
    }

    pub fn with_locator(mut self, locator: impl SpanLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Extract validated questions from `raw`.
    ///
    /// Never returns a partially validated record: in strict mode the first
    /// failing element fails the batch, in lenient mode failing elements are
    /// dropped and an empty result is an error.
    pub fn extract(&self, raw: &str) -> Result<Vec<Question>, ExtractionError> {
        let span = self
            .locator
            .locate(raw)
            .ok_or(ExtractionError::NoStructureFound)?;

        let parsed = parse_span(span).map_err(|e| ExtractionError::MalformedJson {
            detail: e.to_string(),
            raw: raw.to_string(),
        })?;

        let elements = match parsed {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => {
                return Err(ExtractionError::EmptyOrWrongShape("empty array".into()))
            }
            other => {
                return Err(ExtractionError::EmptyOrWrongShape(format!(
                    "expected an array, found {}",
                    json_type_name(&other)
                )))
            }
        };

        let total = elements.len();
        let mut questions = Vec::with_capacity(total);
        for (index, element) in elements.iter().enumerate() {
            match validate_element(index, element, self.required_option_count) {
                Ok(q) => questions.push(q),
                Err(e) if self.mode == ExtractionMode::Strict => {
                    tracing::debug!(locator = self.locator.name(), "strict extraction rejected batch: {e}");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(locator = self.locator.name(), "dropping element: {e}");
                }
            }
        }

        if questions.is_empty() {
            return Err(ExtractionError::NoValidQuestions { dropped: total });
        }

        tracing::debug!(
            mode = %self.mode,
            kept = questions.len(),
            dropped = total - questions.len(),
            "extracted questions"
        );
        Ok(questions)
    }
}

/// Extract with the default configuration for `mode`.
pub fn extract(raw: &str, mode: ExtractionMode) -> Result<Vec<Question>, ExtractionError> {
    Extractor::new(mode).extract(raw)
}

fn parse_span(span: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(span) {
        Ok(v) => Ok(v),
        Err(first) => {
            let relaxed = relax_json(span);
            if relaxed == span {
                return Err(first);
            }
            serde_json::from_str(&relaxed).map_err(|_| first)
        }
    }
}

/// Strip `//` line comments and trailing commas outside string literals.
fn relax_json(span: &str) -> String {
    let mut out = String::with_capacity(span.len());
    let mut chars = span.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ']' | '}' => {
                let trimmed_len = out.trim_end().len();
                if out[..trimmed_len].ends_with(',') {
                    out.truncate(trimmed_len - 1);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn validate_element(
    index: usize,
    element: &Value,
    required_option_count: usize,
) -> Result<Question, ExtractionError> {
    let missing = |detail: String| ExtractionError::MissingFields { index, detail };

    let Value::Object(obj) = element else {
        return Err(missing(format!(
            "expected an object, found {}",
            json_type_name(element)
        )));
    };

    let text = obj
        .get("question")
        .ok_or_else(|| missing("missing `question`".into()))?;
    let text = scalar_text(text).ok_or_else(|| missing("`question` is not text".into()))?;

    let options = obj
        .get("options")
        .ok_or_else(|| missing("missing `options`".into()))?;
    let Value::Array(options) = options else {
        return Err(missing("`options` is not an array".into()));
    };

    let answer = obj
        .get("answer")
        .ok_or_else(|| missing("missing `answer`".into()))?;
    let answer = scalar_text(answer).ok_or_else(|| missing("`answer` is not text".into()))?;

    if options.len() != required_option_count {
        return Err(ExtractionError::WrongOptionCount {
            index,
            expected: required_option_count,
            found: options.len(),
        });
    }

    let options = options
        .iter()
        .map(scalar_text)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| missing("`options` contains a non-text entry".into()))?;

    let explanation = obj.get("explanation").and_then(scalar_text);

    Question::new(text, options, answer, explanation).map_err(|e| match e {
        InvalidQuestion::AnswerNotInOptions { answer } => {
            ExtractionError::AnswerNotInOptions { index, answer }
        }
        InvalidQuestion::NoOptions => ExtractionError::WrongOptionCount {
            index,
            expected: required_option_count,
            found: 0,
        },
    })
}

/// Strings pass through; numbers and booleans are stringified.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
