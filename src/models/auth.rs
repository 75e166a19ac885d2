// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity and session types issued by the auth provider.

use serde::{Deserialize, Serialize};

/// Authenticated principal as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-form metadata attached at sign-up (`name`, `class_level`)
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Display name stored at sign-up, if any.
    pub fn metadata_name(&self) -> Option<&str> {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Class level stored at sign-up, if any.
    pub fn metadata_class_level(&self) -> Option<u32> {
        let value = self.user_metadata.get("class_level")?;
        value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }
}

/// Active session (tokens plus the identity they belong to).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as a Unix timestamp
    #[serde(default)]
    pub expires_at: i64,
    /// Lifetime in seconds (only present on fresh token responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub user: Identity,
}

impl AuthSession {
    /// Fill in `expires_at` from `expires_in` when the backend omitted it.
    pub fn with_expiry_from(mut self, now: i64) -> Self {
        if self.expires_at == 0 {
            self.expires_at = now + self.expires_in.unwrap_or(3600);
        }
        self
    }

    /// Whether the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs >= self.expires_at
    }
}

/// Result of a sign-up call.
///
/// `session` is `None` when the account still needs e-mail confirmation.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: Option<Identity>,
    pub session: Option<AuthSession>,
}

/// Kind of auth-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Auth-state change notification.
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub kind: AuthChange,
    pub session: Option<AuthSession>,
}
