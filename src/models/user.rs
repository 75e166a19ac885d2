// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student profile model for storage and the session layer.
//!
//! `ProfileRow` is what the `user_profiles` table hands back (any nullable
//! column may be missing); `UserProfile` is the normalized record the rest
//! of the crate works with.

use serde::{Deserialize, Serialize};

/// Coins awarded per correct answer. Wrong answers earn nothing.
pub const COINS_PER_CORRECT: i64 = 2;

/// Display name used when neither `name` nor `full_name` is set.
pub const DEFAULT_STUDENT_NAME: &str = "Student";

/// Normalized student profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth identity id (also the row key)
    pub id: String,
    pub email: String,
    pub name: String,
    pub class_level: u32,
    pub total_correct: i64,
    pub total_wrong: i64,
    /// Coin balance, never null once read
    pub total_coins: i64,
    /// Mirror of `total_coins` kept for older clients
    pub money: i64,
    pub avatar_id: u32,
    /// Catalog ids the student may open; never empty once read
    pub unlocked_chapters: Vec<String>,
    pub diagnostic_completed: bool,
    pub phone: Option<String>,
    /// Row creation time (ISO 8601)
    pub created_at: Option<String>,
}

/// Raw `user_profiles` row as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub class_level: Option<u32>,
    #[serde(default)]
    pub total_correct: Option<i64>,
    #[serde(default)]
    pub total_wrong: Option<i64>,
    #[serde(default)]
    pub total_coins: Option<i64>,
    #[serde(default)]
    pub money: Option<i64>,
    #[serde(default)]
    pub avatar_id: Option<u32>,
    #[serde(default)]
    pub unlocked_chapters: Option<Vec<String>>,
    #[serde(default)]
    pub diagnostic_completed: Option<bool>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ProfileRow {
    /// Fill in defaults for missing columns.
    ///
    /// Returns the normalized profile plus the update that persists the
    /// defaults, if the coin total or the unlocked chapters were missing.
    /// `default_unlock` maps the profile's class level to the chapter that
    /// should be unlocked when none are.
    pub fn normalize(
        self,
        default_unlock: impl FnOnce(u32) -> String,
    ) -> (UserProfile, Option<ProfileUpdate>) {
        let class_level = self.class_level.unwrap_or(1);
        let mut repair = ProfileUpdate::default();

        let total_coins = match self.total_coins {
            Some(coins) => coins,
            None => {
                repair.total_coins = Some(0);
                0
            }
        };

        let unlocked_chapters = match self.unlocked_chapters {
            Some(chapters) if !chapters.is_empty() => chapters,
            _ => {
                let chapters = vec![default_unlock(class_level)];
                repair.unlocked_chapters = Some(chapters.clone());
                chapters
            }
        };

        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or(self.full_name.filter(|n| !n.is_empty()))
            .unwrap_or_else(|| DEFAULT_STUDENT_NAME.to_string());

        let profile = UserProfile {
            id: self.id,
            email: self.email.unwrap_or_default(),
            name,
            class_level,
            total_correct: self.total_correct.unwrap_or(0),
            total_wrong: self.total_wrong.unwrap_or(0),
            total_coins,
            money: self.money.unwrap_or(total_coins),
            avatar_id: self.avatar_id.unwrap_or(1),
            unlocked_chapters,
            diagnostic_completed: self.diagnostic_completed.unwrap_or(false),
            phone: self.phone,
            created_at: self.created_at,
        };

        let repair = (!repair.is_empty()).then_some(repair);
        (profile, repair)
    }
}

/// Insert shape for a brand-new profile row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub class_level: u32,
    pub total_coins: i64,
    pub total_correct: i64,
    pub total_wrong: i64,
    pub avatar_id: u32,
    pub unlocked_chapters: Vec<String>,
    pub diagnostic_completed: bool,
    pub phone: Option<String>,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub money: i64,
    pub total_correct_answers: i64,
}

impl NewProfile {
    /// Zeroed profile with a single unlocked chapter.
    pub fn seeded(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        class_level: u32,
        phone: Option<String>,
        first_chapter: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            email: email.into(),
            full_name: name.clone(),
            name,
            class_level,
            total_coins: 0,
            total_correct: 0,
            total_wrong: 0,
            avatar_id: 1,
            unlocked_chapters: vec![first_chapter.into()],
            diagnostic_completed: false,
            phone,
            avatar_url: None,
            money: 0,
            total_correct_answers: 0,
        }
    }

    /// Local stand-in used when the insert could not be stored.
    pub fn to_local_profile(&self, created_at: String) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            class_level: self.class_level,
            total_correct: self.total_correct,
            total_wrong: self.total_wrong,
            total_coins: self.total_coins,
            money: self.money,
            avatar_id: self.avatar_id,
            unlocked_chapters: self.unlocked_chapters.clone(),
            diagnostic_completed: self.diagnostic_completed,
            phone: self.phone.clone(),
            created_at: Some(created_at),
        }
    }
}

/// Partial profile update; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_chapters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_correct: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_wrong: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_coins: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_correct_answers: Option<i64>,
}

impl ProfileUpdate {
    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Cumulative stats after a quiz round.
    ///
    /// Prior totals come from `current` (zero when no profile is loaded).
    pub fn for_quiz_result(current: Option<&UserProfile>, correct: i64, wrong: i64) -> Self {
        let total_correct = current.map_or(0, |p| p.total_correct).saturating_add(correct);
        let total_wrong = current.map_or(0, |p| p.total_wrong).saturating_add(wrong);
        let total_coins = current
            .map_or(0, |p| p.total_coins)
            .saturating_add(correct.saturating_mul(COINS_PER_CORRECT));

        Self {
            total_correct: Some(total_correct),
            total_wrong: Some(total_wrong),
            total_coins: Some(total_coins),
            money: Some(total_coins),
            total_correct_answers: Some(total_correct),
            ..Self::default()
        }
    }

    /// Merge into a local profile (speculative write).
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(class_level) = self.class_level {
            profile.class_level = class_level;
        }
        if let Some(avatar_id) = self.avatar_id {
            profile.avatar_id = avatar_id;
        }
        if let Some(chapters) = &self.unlocked_chapters {
            profile.unlocked_chapters = chapters.clone();
        }
        if let Some(done) = self.diagnostic_completed {
            profile.diagnostic_completed = done;
        }
        if let Some(phone) = &self.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(v) = self.total_correct {
            profile.total_correct = v;
        }
        if let Some(v) = self.total_wrong {
            profile.total_wrong = v;
        }
        if let Some(v) = self.total_coins {
            profile.total_coins = v;
        }
        if let Some(v) = self.money {
            profile.money = v;
        }
    }
}

/// Profile fields supplied at sign-up.
#[derive(Debug, Clone, Default)]
pub struct ProfileDefaults {
    pub name: Option<String>,
    pub class_level: Option<u32>,
    pub phone: Option<String>,
}
