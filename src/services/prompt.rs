//! Prompt construction for the tutor and the quiz generator.

use crate::models::{Chapter, UserAnalytics, QUIZ_LENGTH};

/// System prompt for single-question tutoring.
pub const MATH_MENTOR_PROMPT: &str = "You are MathMentor, a super-smart, friendly, and fun math \
assistant inside the Numinix app. Explain solutions step by step in simple language, check the \
final answer, and keep a warm, encouraging tone.";

/// Strength labels for the student.
pub fn strengths(analytics: Option<&UserAnalytics>) -> Vec<&'static str> {
    match analytics {
        Some(a) if a.concepts_mastered > 0 => vec!["Problem Solving"],
        _ => Vec::new(),
    }
}

/// Weakness labels for the student.
pub fn weaknesses(analytics: Option<&UserAnalytics>) -> Vec<&'static str> {
    match analytics {
        Some(a) if a.accuracy < 70.0 => vec!["Basic Concepts"],
        _ => Vec::new(),
    }
}

/// Easy/medium/hard split for a 10-question quiz.
pub fn difficulty_mix(analytics: Option<&UserAnalytics>) -> &'static str {
    let accuracy = analytics.map_or(0.0, |a| a.accuracy);
    if accuracy > 80.0 {
        "3 easy, 4 medium, 3 hard"
    } else if accuracy > 60.0 {
        "4 easy, 4 medium, 2 hard"
    } else {
        "6 easy, 3 medium, 1 hard"
    }
}

/// Inputs for the quiz-generation prompt.
pub struct QuizPrompt<'a> {
    pub class_level: u32,
    pub chapters: &'a [&'a Chapter],
    pub analytics: Option<&'a UserAnalytics>,
}

impl QuizPrompt<'_> {
    fn chapter_names(&self) -> String {
        self.chapters
            .iter()
            .map(|c| c.chapter.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn topics(&self) -> Vec<&str> {
        self.chapters
            .iter()
            .flat_map(|c| c.topics.iter().map(String::as_str))
            .collect()
    }

    /// System prompt restricting the model to the selected topics.
    pub fn system_prompt(&self) -> String {
        let class = self.class_level;
        let chapter_names = self.chapter_names();
        let topics = self.topics().join(", ");
        let first_topic = self.topics().first().copied().unwrap_or("selected topic");
        let accuracy = self.analytics.map_or(0.0, |a| a.accuracy);

        let strengths = strengths(self.analytics).join(", ");
        let weaknesses = weaknesses(self.analytics).join(", ");
        let strengths = if strengths.is_empty() {
            "Building foundation".to_string()
        } else {
            strengths
        };
        let weaknesses = if weaknesses.is_empty() {
            "None identified".to_string()
        } else {
            weaknesses
        };

        format!(
            "You are a math quiz generator for a class {class} student. Create questions ONLY from \
the selected chapters and their specific topics.

IMPORTANT: Only create mathematics questions. Do NOT include any science, physics, chemistry, or \
biology content.

Selected Chapters: {chapter_names}
Chapter Topics to Focus On: {topics}
Student Class Level: {class}
Student Strengths: {strengths}
Student Weaknesses: {weaknesses}
Student Accuracy: {accuracy:.1}%

Return ONLY a valid JSON array with this exact structure:
[
  {{ \"id\": \"q1\", \"question\": \"Question about {first_topic}\", \"options\": [\"option1\", \"option2\", \"option3\", \"option4\"], \"correct_answer\": \"option1\", \"explanation\": \"Clear explanation\", \"difficulty\": \"easy\", \"class_level\": {class}, \"topic\": \"{first_topic}\" }}
]

Requirements:
- Exactly {count} questions
- Questions ONLY from these topics: {topics}
- Questions appropriate for class {class}
- Mix of difficulties: {mix}
- Personalize based on the student's {accuracy:.1}% accuracy
- Each question must have exactly 4 options
- Clear explanations
- Questions must be from selected chapters: {chapter_names}
- Valid JSON format only, no extra text",
            count = QUIZ_LENGTH,
            mix = difficulty_mix(self.analytics),
        )
    }

    /// User turn that triggers generation.
    pub fn user_prompt(&self) -> String {
        format!(
            "Generate {} personalized math quiz questions for class {}.",
            QUIZ_LENGTH, self.class_level
        )
    }
}
