//! Database layer (Supabase PostgREST).

pub mod postgrest;

pub use postgrest::PostgrestDb;

use crate::error::AppError;
use crate::models::{NewProfile, ProfileRow, ProfileUpdate};
use async_trait::async_trait;

/// Table names as constants.
pub mod tables {
    pub const USER_PROFILES: &str = "user_profiles";
}

/// Row-level access to the `user_profiles` table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch one profile row.
    ///
    /// A missing row is reported as `AppError::Database` with the
    /// `PGRST116` code (see `AppError::is_no_rows`).
    async fn get_profile(&self, user_id: &str) -> Result<ProfileRow, AppError>;

    /// Whether a row exists for `user_id`.
    async fn profile_exists(&self, user_id: &str) -> Result<bool, AppError>;

    /// Insert a new profile row.
    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), AppError>;

    /// Merge `update` into the row for `user_id`.
    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), AppError>;
}
