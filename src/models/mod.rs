// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod auth;
pub mod chapter;
pub mod question;
pub mod user;

pub use auth::{AuthChange, AuthEvent, AuthSession, Identity, SignUpOutcome};
pub use chapter::{Chapter, UserAnalytics};
pub use question::{AiResponse, QuizQuestion, QUIZ_LENGTH};
pub use user::{NewProfile, ProfileDefaults, ProfileRow, ProfileUpdate, UserProfile};
