// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase Auth (GoTrue) client.
//!
//! Handles:
//! - Password sign-up and sign-in
//! - Session persistence and refresh when expiring
//! - Remote sign-out
//! - Auth-state change notifications (broadcast channel)

use crate::error::AppError;
use crate::models::{AuthChange, AuthEvent, AuthSession, Identity, SignUpOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Refresh the access token when it expires within this margin.
const SESSION_REFRESH_MARGIN_SECS: i64 = 60;

/// Buffered auth events per subscriber.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Current session, shared between the auth client and the table client.
pub type SessionSlot = Arc<RwLock<Option<AuthSession>>>;

/// Auth provider operations used by the session manager.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Existing session, refreshed if it is about to expire.
    ///
    /// A rejected refresh token surfaces as `AppError::Auth` with the
    /// backend's message (see `AppError::is_invalid_refresh_token`).
    async fn get_session(&self) -> Result<Option<AuthSession>, AppError>;

    /// Register a new account with `metadata` stored on the identity.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, AppError>;

    /// Sign in with e-mail and password.
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<AuthSession, AppError>;

    /// End the session remotely. The local session is dropped either way.
    async fn sign_out(&self) -> Result<(), AppError>;

    /// Identity behind the current session, as the backend sees it now.
    async fn get_user(&self) -> Result<Option<Identity>, AppError>;

    /// Subscribe to auth-state changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// GoTrue HTTP client with optional on-disk session persistence.
#[derive(Clone)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    auth_url: String,
    anon_key: String,
    session: SessionSlot,
    session_file: Option<PathBuf>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuth {
    /// Create a client for `<supabase_url>/auth/v1`.
    pub fn new(supabase_url: &str, anon_key: &str, session_file: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            auth_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            session: Arc::new(RwLock::new(None)),
            session_file,
            events,
        }
    }

    /// Shared session slot, for clients that need the access token.
    pub fn session_slot(&self) -> SessionSlot {
        self.session.clone()
    }

    fn emit(&self, kind: AuthChange, session: Option<AuthSession>) {
        // No receivers is fine.
        let _ = self.events.send(AuthEvent { kind, session });
    }

    /// Store a new session in memory and on disk, then notify.
    async fn set_session(&self, session: AuthSession, kind: AuthChange) {
        *self.session.write().await = Some(session.clone());
        self.persist(Some(&session)).await;
        self.emit(kind, Some(session));
    }

    /// Drop the local session.
    async fn clear_session(&self) {
        *self.session.write().await = None;
        self.persist(None).await;
        self.emit(AuthChange::SignedOut, None);
    }

    async fn persist(&self, session: Option<&AuthSession>) {
        let Some(path) = &self.session_file else {
            return;
        };

        let result = match session {
            Some(session) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        tracing::warn!(error = %e, path = %parent.display(), "Failed to create session directory");
                    }
                }
                match serde_json::to_vec_pretty(session) {
                    Ok(bytes) => write_private(path, &bytes).await,
                    Err(e) => Err(std::io::Error::other(e)),
                }
            }
            None => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, path = %path.display(), "Failed to persist session");
        }
    }

    async fn load_persisted(&self) -> Option<AuthSession> {
        let path = self.session_file.as_ref()?;
        let data = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&data) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Ignoring unreadable session file");
                None
            }
        }
    }

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        let response = self
            .http
            .post(format!("{}/token?grant_type=refresh_token", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token refresh request failed: {}", e)))?;

        let session: AuthSession = Self::check_response_json(response).await?;
        Ok(session.with_expiry_from(chrono::Utc::now().timestamp()))
    }

    /// Check response and parse JSON body, mapping GoTrue error bodies.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err: GoTrueError = serde_json::from_str(&body).unwrap_or_default();

            let message = err
                .msg
                .or(err.error_description)
                .or(err.message)
                .or_else(|| err.error.clone())
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            let code = err.error_code.or(err.error);

            tracing::debug!(status = %status, code = ?code, "Auth request rejected");
            return Err(AppError::from_auth_message(code.as_deref(), &message));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse auth response: {}", e)))
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn get_session(&self) -> Result<Option<AuthSession>, AppError> {
        let current = self.session.read().await.clone();
        let session = match current {
            Some(session) => session,
            None => match self.load_persisted().await {
                Some(session) => {
                    *self.session.write().await = Some(session.clone());
                    session
                }
                None => return Ok(None),
            },
        };

        let now = chrono::Utc::now().timestamp();
        if !session.expires_within(now, SESSION_REFRESH_MARGIN_SECS) {
            return Ok(Some(session));
        }

        tracing::info!(user_id = %session.user.id, "Session expiring, refreshing");
        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                self.set_session(fresh.clone(), AuthChange::TokenRefreshed)
                    .await;
                Ok(Some(fresh))
            }
            Err(e) => {
                *self.session.write().await = None;
                Err(e)
            }
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, AppError> {
        let response = self
            .http
            .post(format!("{}/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Sign-up request failed: {}", e)))?;

        let body: serde_json::Value = Self::check_response_json(response).await?;

        // Auto-confirmed projects answer with a session, otherwise with the
        // bare user awaiting e-mail confirmation.
        if body.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(body)
                .map_err(|e| AppError::Auth(format!("Failed to parse session: {}", e)))?;
            let session = session.with_expiry_from(chrono::Utc::now().timestamp());
            self.set_session(session.clone(), AuthChange::SignedIn)
                .await;
            return Ok(SignUpOutcome {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user = serde_json::from_value::<Identity>(user_value).ok();
        tracing::info!(email, "Account created, awaiting confirmation");
        Ok(SignUpOutcome {
            user,
            session: None,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let response = self
            .http
            .post(format!("{}/token?grant_type=password", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Sign-in request failed: {}", e)))?;

        let session: AuthSession = Self::check_response_json(response).await?;
        let session = session.with_expiry_from(chrono::Utc::now().timestamp());
        self.set_session(session.clone(), AuthChange::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            self.clear_session().await;
            return Ok(());
        };

        let result = self
            .http
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        self.clear_session().await;

        let response = result.map_err(|e| AppError::Auth(format!("Sign-out request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::Auth(format!(
                "Sign-out failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<Identity>, AppError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("User request failed: {}", e)))?;

        let user: Identity = Self::check_response_json(response).await?;

        // Metadata may have changed since sign-in.
        if user != session.user {
            let updated = AuthSession {
                user: user.clone(),
                ..session
            };
            self.set_session(updated, AuthChange::UserUpdated).await;
        }
        Ok(Some(user))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Write `bytes` to `path`, readable by the owner only (holds a refresh token).
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

/// GoTrue error body; field names differ between API versions.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}
