// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Numinix: student sessions and AI-generated math quizzes
//!
//! This crate provides the client side of the Numinix app: account and
//! profile management on Supabase, and quiz generation through an LLM
//! chat proxy.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use config::Config;
use db::PostgrestDb;
use services::{
    AiService, ChapterCatalog, GroqProxyClient, ProfileAnalytics, SessionManager, SupabaseAuth,
};
use std::sync::Arc;

/// Wired-up application services.
pub struct AppState {
    pub config: Config,
    pub session: SessionManager,
    pub ai: AiService,
}

impl AppState {
    /// Build the production services from `config`.
    ///
    /// Call `session.start()` before use and `session.shutdown()` when done.
    pub fn from_config(config: Config) -> Result<Self, services::catalog::CatalogError> {
        let catalog = ChapterCatalog::load_from_file(&config.chapters_path)?;

        let auth = SupabaseAuth::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.session_file.clone(),
        );
        let db = Arc::new(PostgrestDb::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            auth.session_slot(),
        ));

        let session = SessionManager::new(
            Arc::new(auth),
            db.clone(),
            catalog.clone(),
            config.reconcile_delay,
        );

        let chat = Arc::new(GroqProxyClient::new(
            config.groq_proxy_url.clone(),
            config.groq_model.clone(),
        ));
        let ai = AiService::new(chat, catalog, Arc::new(ProfileAnalytics::new(db)));

        Ok(Self {
            config,
            session,
            ai,
        })
    }
}
