// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parser for quiz questions in free-form model replies.
//!
//! Models are asked for a bare JSON array but often wrap it in a markdown
//! fence or surround it with prose. Parsing runs in stages, each usable on
//! its own:
//! 1. `strip_code_fence` removes a leading ```` ```json ```` / ```` ``` ````
//!    and a trailing ```` ``` ````
//! 2. `extract_array` keeps the first `[` through the last `]`
//! 3. `parse_array` decodes the JSON and requires an array
//! 4. `filter_valid` drops items missing a required field
//! 5. the survivors are truncated to the quiz length; none left is an error

use crate::models::{QuizQuestion, QUIZ_LENGTH};
use serde_json::Value;

/// Reasons a reply yields no questions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not an array")]
    NotAnArray,

    #[error("no valid questions generated")]
    NoValidQuestions,
}

/// Turns a model reply into at most `QUIZ_LENGTH` questions.
#[derive(Debug, Clone, Copy)]
pub struct QuestionParser {
    /// Used for items that omit `class_level`
    class_level: u32,
}

impl QuestionParser {
    pub fn new(class_level: u32) -> Self {
        Self { class_level }
    }

    /// Run every stage over `raw`.
    pub fn parse(&self, raw: &str) -> Result<Vec<QuizQuestion>, ParseError> {
        let text = extract_array(strip_code_fence(raw));
        let items = parse_array(text)?;

        let mut questions = filter_valid(&items, self.class_level);
        if questions.is_empty() {
            return Err(ParseError::NoValidQuestions);
        }
        questions.truncate(QUIZ_LENGTH);
        Ok(questions)
    }
}

/// Remove markdown code-fence wrapping.
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();

    let opener_len = if text
        .get(..7)
        .is_some_and(|p| p.eq_ignore_ascii_case("```json"))
    {
        7
    } else if text.starts_with("```") {
        3
    } else {
        0
    };
    text = text[opener_len..].trim_start();

    if let Some(inner) = text.strip_suffix("```") {
        text = inner;
    }
    text.trim()
}

/// Slice from the first `[` to the last `]`, or `text` if there is none.
pub fn extract_array(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Decode `text` as a JSON array.
pub fn parse_array(text: &str) -> Result<Vec<Value>, ParseError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(ParseError::NotAnArray),
        Err(e) => Err(ParseError::InvalidJson(e.to_string())),
    }
}

/// Keep the items that carry every required field, converted to questions.
///
/// Required: `id`, `question`, `options` (an array), `correct_answer`,
/// `explanation`, `difficulty` and `topic`, each non-empty.
pub fn filter_valid(items: &[Value], default_class_level: u32) -> Vec<QuizQuestion> {
    items
        .iter()
        .filter_map(|item| to_question(item, default_class_level))
        .collect()
}

fn to_question(item: &Value, default_class_level: u32) -> Option<QuizQuestion> {
    let field = |name: &str| item.get(name).and_then(scalar_text);

    let options = item
        .get("options")?
        .as_array()?
        .iter()
        .map(|o| match o {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let class_level = item
        .get("class_level")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default_class_level);

    Some(QuizQuestion {
        id: field("id")?,
        question: field("question")?,
        options,
        correct_answer: field("correct_answer")?,
        explanation: field("explanation")?,
        difficulty: field("difficulty")?,
        class_level,
        topic: field("topic")?,
    })
}

/// Non-empty string or non-zero number as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}
