// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static chapter catalog loading and lookup.

use crate::models::Chapter;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Unlocked when the catalog has nothing for the student's class.
pub const DEFAULT_CHAPTER_ID: &str = "class9_ch1";

/// Read-only chapter catalog.
#[derive(Default, Clone)]
pub struct ChapterCatalog {
    chapters: Arc<Vec<Chapter>>,
}

impl ChapterCatalog {
    /// Load the catalog from a JSON file (array of chapters).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load the catalog from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let chapters: Vec<Chapter> = serde_json::from_str(json_data)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        tracing::info!(count = chapters.len(), "Loaded chapter catalog");
        Ok(Self::from_chapters(chapters))
    }

    pub fn from_chapters(chapters: Vec<Chapter>) -> Self {
        Self {
            chapters: Arc::new(chapters),
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn find(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Look up several ids, keeping their order and dropping unknown ones.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Chapter> {
        ids.iter().filter_map(|id| self.find(id.as_ref())).collect()
    }

    /// First chapter (order 1) of a class.
    pub fn first_chapter(&self, class_level: u32) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.class_level == class_level && c.order == 1)
    }

    /// Chapter a new or repaired profile of this class starts with.
    pub fn default_unlock(&self, class_level: u32) -> String {
        self.first_chapter(class_level)
            .map(|c| c.id.clone())
            .unwrap_or_else(|| DEFAULT_CHAPTER_ID.to_string())
    }
}

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse catalog: {0}")]
    ParseError(String),
}
