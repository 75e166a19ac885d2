// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the session and quiz services.

use crate::services::parser::ParseError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", AppError::DUPLICATE_ACCOUNT_MESSAGE)]
    DuplicateAccount,

    /// Auth provider rejection, message passed through verbatim.
    #[error("{0}")]
    Auth(String),

    #[error("No active session")]
    NotAuthenticated,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error ({code}): {message}")]
    Database { code: String, message: String },

    #[error("AI proxy error: {0}")]
    AiProxy(String),

    #[error("Failed to parse AI response: {0}")]
    Parse(#[from] ParseError),

    #[error("Chapter catalog error: {0}")]
    Catalog(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown when sign-up hits an e-mail that already has an account.
    pub const DUPLICATE_ACCOUNT_MESSAGE: &'static str =
        "This email is already registered. Please sign in or use a different email.";

    /// PostgREST code for a single-object select that matched zero rows.
    pub const NO_ROWS_CODE: &'static str = "PGRST116";

    /// Whether this is the "no rows" result of a single-row select.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, AppError::Database { code, .. } if code == Self::NO_ROWS_CODE)
    }

    /// Whether the auth provider rejected a stored refresh token.
    pub fn is_invalid_refresh_token(&self) -> bool {
        match self {
            AppError::Auth(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("refresh token not found") || msg.contains("invalid refresh token")
            }
            _ => false,
        }
    }

    /// Map an auth backend error body onto the error taxonomy.
    ///
    /// Duplicate e-mail sign-ups get the friendly message; everything else
    /// keeps the backend's wording.
    pub fn from_auth_message(code: Option<&str>, message: &str) -> Self {
        if code == Some("user_already_exists")
            || message.contains("already registered")
            || message.contains("user_already_exists")
        {
            return AppError::DuplicateAccount;
        }
        AppError::Auth(message.to_string())
    }
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, AppError>;
