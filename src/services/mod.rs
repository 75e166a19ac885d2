// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod parser;
pub mod prompt;
pub mod session;

pub use ai::AiService;
pub use analytics::{AnalyticsSource, ProfileAnalytics};
pub use auth::{AuthProvider, SessionSlot, SupabaseAuth};
pub use catalog::ChapterCatalog;
pub use chat::{ChatClient, ChatMessage, GroqProxyClient};
pub use parser::{ParseError, QuestionParser};
pub use session::{SessionManager, SessionState};
