// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quiz question and tutor answer models.

use serde::{Deserialize, Serialize};

/// Number of questions requested per generated quiz.
pub const QUIZ_LENGTH: usize = 10;

/// A single multiple-choice question.
///
/// `correct_answer` is expected to be one of `options`; nothing checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    /// "easy", "medium" or "hard" as returned by the model
    pub difficulty: String,
    pub class_level: u32,
    pub topic: String,
}

impl QuizQuestion {
    /// Canned questions served when generation fails.
    ///
    /// Only the chapter name and topic vary; they are not tailored to the
    /// student's results.
    pub fn fallback_set(chapter_name: &str, topic: &str, class_level: u32) -> Vec<Self> {
        let make = |id: &str,
                    question: String,
                    options: [&str; 4],
                    correct: &str,
                    explanation: &str,
                    difficulty: &str| Self {
            id: id.to_string(),
            question,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.to_string(),
            explanation: explanation.to_string(),
            difficulty: difficulty.to_string(),
            class_level,
            topic: topic.to_string(),
        };

        vec![
            make(
                "fallback_1",
                format!("This is a practice question for {}. What is 5 + 3?", chapter_name),
                ["6", "7", "8", "9"],
                "8",
                "5 + 3 = 8. This is a basic addition problem.",
                "easy",
            ),
            make(
                "fallback_2",
                format!("In {}, if x + 4 = 10, what is x?", chapter_name),
                ["4", "5", "6", "7"],
                "6",
                "To find x, subtract 4 from both sides: x = 10 - 4 = 6.",
                "medium",
            ),
            make(
                "fallback_3",
                format!("Practice problem for {}: What is 2 × 4?", chapter_name),
                ["6", "7", "8", "9"],
                "8",
                "2 × 4 = 8. This is basic multiplication.",
                "easy",
            ),
        ]
    }
}

/// Answer from the math tutor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiResponse {
    pub solution: String,
    pub steps: Vec<String>,
    /// 1.0 on success, 0.0 on any failure
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiResponse {
    pub fn solved(solution: String) -> Self {
        Self {
            solution,
            steps: Vec::new(),
            confidence: 1.0,
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            solution: String::new(),
            steps: Vec::new(),
            confidence: 0.0,
            error: Some(error),
        }
    }
}
