// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgREST client for the `user_profiles` table.
//!
//! Requests run as the signed-in user (bearer = session access token) so the
//! table's row-level security applies; before sign-in the anon key is used.

use crate::db::{tables, ProfileStore};
use crate::error::AppError;
use crate::models::{NewProfile, ProfileRow, ProfileUpdate};
use crate::services::auth::SessionSlot;
use async_trait::async_trait;
use serde::Deserialize;

/// Media type that makes PostgREST return a single object (or PGRST116).
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Supabase table API client.
#[derive(Clone)]
pub struct PostgrestDb {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
    session: SessionSlot,
}

impl PostgrestDb {
    /// Create a client for `<supabase_url>/rest/v1`.
    ///
    /// `session` is shared with the auth client so requests pick up the
    /// current access token.
    pub fn new(supabase_url: &str, anon_key: &str, session: SessionSlot) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            session,
        }
    }

    fn profile_url(&self, user_id: &str) -> String {
        format!(
            "{}/{}?id=eq.{}",
            self.rest_url,
            tables::USER_PROFILES,
            urlencoding::encode(user_id)
        )
    }

    /// Bearer token for the next request.
    async fn bearer(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    async fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
    }

    /// Check response status and map PostgREST error bodies.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<PostgrestError>(&body) {
            Ok(err) => Err(AppError::Database {
                code: err.code.unwrap_or_else(|| status.as_u16().to_string()),
                message: err
                    .details
                    .filter(|d| !d.is_empty())
                    .map(|d| format!("{} ({})", err.message, d))
                    .unwrap_or(err.message),
            }),
            Err(_) => Err(AppError::Database {
                code: status.as_u16().to_string(),
                message: body,
            }),
        }
    }
}

#[async_trait]
impl ProfileStore for PostgrestDb {
    async fn get_profile(&self, user_id: &str) -> Result<ProfileRow, AppError> {
        let url = format!("{}&select=*", self.profile_url(user_id));

        let response = self
            .request(reqwest::Method::GET, &url)
            .await
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(|e| AppError::Database {
                code: "network".to_string(),
                message: e.to_string(),
            })?;

        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Profile row decode failed: {}", e)))
    }

    async fn profile_exists(&self, user_id: &str) -> Result<bool, AppError> {
        let url = format!("{}&select=id", self.profile_url(user_id));

        let response = self
            .request(reqwest::Method::GET, &url)
            .await
            .send()
            .await
            .map_err(|e| AppError::Database {
                code: "network".to_string(),
                message: e.to_string(),
            })?;

        let rows: Vec<serde_json::Value> = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Profile id list decode failed: {}", e)))?;
        Ok(!rows.is_empty())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), AppError> {
        let url = format!("{}/{}", self.rest_url, tables::USER_PROFILES);

        let response = self
            .request(reqwest::Method::POST, &url)
            .await
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()
            .await
            .map_err(|e| AppError::Database {
                code: "network".to_string(),
                message: e.to_string(),
            })?;

        Self::check_response(response).await?;
        tracing::debug!(user_id = %profile.id, "Profile row inserted");
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::PATCH, &self.profile_url(user_id))
            .await
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await
            .map_err(|e| AppError::Database {
                code: "network".to_string(),
                message: e.to_string(),
            })?;

        Self::check_response(response).await?;
        Ok(())
    }
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<String>,
}
