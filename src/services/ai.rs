// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tutor and quiz generation on top of the chat proxy.
//!
//! Neither operation fails towards the caller: the tutor reports errors in
//! its response, the quiz generator falls back to canned questions.

use crate::error::AppError;
use crate::models::{AiResponse, QuizQuestion, UserProfile};
use crate::services::analytics::AnalyticsSource;
use crate::services::catalog::ChapterCatalog;
use crate::services::chat::{ChatClient, ChatMessage};
use crate::services::parser::QuestionParser;
use crate::services::prompt::{QuizPrompt, MATH_MENTOR_PROMPT};
use std::sync::Arc;

const FALLBACK_CHAPTER_NAME: &str = "Mathematics";
const FALLBACK_TOPIC: &str = "Basic Concepts";

/// Quiz generation client.
#[derive(Clone)]
pub struct AiService {
    chat: Arc<dyn ChatClient>,
    catalog: ChapterCatalog,
    analytics: Arc<dyn AnalyticsSource>,
}

impl AiService {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        catalog: ChapterCatalog,
        analytics: Arc<dyn AnalyticsSource>,
    ) -> Self {
        Self {
            chat,
            catalog,
            analytics,
        }
    }

    /// Ask the tutor a single question.
    ///
    /// Confidence is 1 with the reply text, or 0 with an error message.
    pub async fn solve_math_problem(&self, question: &str) -> AiResponse {
        let messages = [
            ChatMessage::system(MATH_MENTOR_PROMPT),
            ChatMessage::user(question),
        ];

        match self.chat.complete(&messages).await {
            Ok(solution) => AiResponse::solved(solution),
            Err(e) => {
                tracing::warn!(error = %e, "Tutor request failed");
                AiResponse::failed(e.to_string())
            }
        }
    }

    /// Generate a personalized quiz for the selected chapters.
    ///
    /// Any failure yields the three fallback questions for the first
    /// selected chapter.
    pub async fn generate_questions(
        &self,
        profile: &UserProfile,
        chapter_ids: &[String],
    ) -> Vec<QuizQuestion> {
        match self.try_generate(profile, chapter_ids).await {
            Ok(questions) => {
                tracing::info!(
                    user_id = %profile.id,
                    count = questions.len(),
                    "Generated quiz questions"
                );
                questions
            }
            Err(e) => {
                tracing::error!(user_id = %profile.id, error = %e, "Question generation failed, using fallback");
                self.fallback_questions(profile, chapter_ids)
            }
        }
    }

    async fn try_generate(
        &self,
        profile: &UserProfile,
        chapter_ids: &[String],
    ) -> Result<Vec<QuizQuestion>, AppError> {
        let chapters = self.catalog.resolve(chapter_ids);
        if chapters.is_empty() {
            return Err(AppError::Catalog(format!(
                "no catalog entry for chapters {:?}",
                chapter_ids
            )));
        }

        let analytics = self.analytics.get_user_analytics(&profile.id).await?;

        let prompt = QuizPrompt {
            class_level: profile.class_level,
            chapters: &chapters,
            analytics: analytics.as_ref(),
        };
        let messages = [
            ChatMessage::system(prompt.system_prompt()),
            ChatMessage::user(prompt.user_prompt()),
        ];

        let raw = self.chat.complete(&messages).await?;
        tracing::debug!(raw = %raw, "Raw quiz reply");

        Ok(QuestionParser::new(profile.class_level).parse(&raw)?)
    }

    /// Canned questions naming the first selected chapter.
    pub fn fallback_questions(
        &self,
        profile: &UserProfile,
        chapter_ids: &[String],
    ) -> Vec<QuizQuestion> {
        let first = self.catalog.resolve(chapter_ids).into_iter().next();
        let chapter_name = first.map_or(FALLBACK_CHAPTER_NAME, |c| c.chapter.as_str());
        let topic = first
            .and_then(|c| c.topics.first())
            .map_or(FALLBACK_TOPIC, String::as_str);

        QuizQuestion::fallback_set(chapter_name, topic, profile.class_level)
    }
}
