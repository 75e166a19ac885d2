//! Chapter catalog entry and student analytics.

use serde::{Deserialize, Serialize};

/// One chapter of the static catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Catalog id, e.g. `class9_ch1`
    pub id: String,
    pub class_level: u32,
    /// Position within the class (1-based)
    pub order: u32,
    /// Chapter title
    pub chapter: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Coarse progress aggregate used to personalize quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UserAnalytics {
    /// Percentage of correct answers (0-100)
    pub accuracy: f64,
    pub concepts_mastered: u32,
}
