//! Progress analytics used to personalize quiz prompts.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{ProfileRow, UserAnalytics};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only source of per-student progress aggregates.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn get_user_analytics(&self, user_id: &str) -> Result<Option<UserAnalytics>, AppError>;
}

/// Analytics derived from the counters stored on the profile row.
#[derive(Clone)]
pub struct ProfileAnalytics {
    store: Arc<dyn ProfileStore>,
}

impl ProfileAnalytics {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Accuracy over all answers; each unlock past the first counts as a
    /// mastered chapter.
    pub fn from_row(row: &ProfileRow) -> UserAnalytics {
        let correct = row.total_correct.unwrap_or(0).max(0);
        let wrong = row.total_wrong.unwrap_or(0).max(0);
        let answered = correct + wrong;

        let accuracy = if answered == 0 {
            0.0
        } else {
            correct as f64 * 100.0 / answered as f64
        };

        let unlocked = row.unlocked_chapters.as_ref().map_or(0, Vec::len);
        let concepts_mastered = u32::try_from(unlocked.saturating_sub(1)).unwrap_or(u32::MAX);

        UserAnalytics {
            accuracy,
            concepts_mastered,
        }
    }
}

#[async_trait]
impl AnalyticsSource for ProfileAnalytics {
    async fn get_user_analytics(&self, user_id: &str) -> Result<Option<UserAnalytics>, AppError> {
        match self.store.get_profile(user_id).await {
            Ok(row) => Ok(Some(Self::from_row(&row))),
            Err(e) if e.is_no_rows() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
