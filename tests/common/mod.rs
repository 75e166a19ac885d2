// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use numinix::db::ProfileStore;
use numinix::error::AppError;
use numinix::models::{
    AuthChange, AuthEvent, AuthSession, Chapter, Identity, NewProfile, ProfileRow, ProfileUpdate,
    SignUpOutcome, UserAnalytics,
};
use numinix::services::{AnalyticsSource, AuthProvider, ChapterCatalog, ChatClient, ChatMessage, SessionManager};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

#[allow(dead_code)]
pub const RECONCILE_DELAY: Duration = Duration::from_millis(10);

/// Small catalog covering classes 8 and 9.
#[allow(dead_code)]
pub fn test_catalog() -> ChapterCatalog {
    ChapterCatalog::from_chapters(vec![
        Chapter {
            id: "class8_ch1".to_string(),
            class_level: 8,
            order: 1,
            chapter: "Rational Numbers".to_string(),
            topics: vec!["Properties".to_string(), "Number line".to_string()],
        },
        Chapter {
            id: "class8_ch2".to_string(),
            class_level: 8,
            order: 2,
            chapter: "Linear Equations".to_string(),
            topics: vec!["One variable".to_string()],
        },
        Chapter {
            id: "class9_ch1".to_string(),
            class_level: 9,
            order: 1,
            chapter: "Number Systems".to_string(),
            topics: vec!["Irrational numbers".to_string()],
        },
    ])
}

/// Identity with sign-up metadata.
#[allow(dead_code)]
pub fn identity(id: &str, email: &str, name: &str, class_level: u32) -> Identity {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "email": email,
        "user_metadata": { "name": name, "class_level": class_level }
    }))
    .unwrap()
}

#[allow(dead_code)]
pub fn session_for(user: Identity) -> AuthSession {
    AuthSession {
        access_token: format!("access-{}", user.id),
        refresh_token: format!("refresh-{}", user.id),
        expires_at: chrono::Utc::now().timestamp() + 3600,
        expires_in: None,
        user,
    }
}

// ─── Profile store ───────────────────────────────────────────────────────────

/// In-memory `user_profiles` table that records every write.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<HashMap<String, ProfileRow>>,
    pub inserts: Mutex<Vec<NewProfile>>,
    pub updates: Mutex<Vec<(String, ProfileUpdate)>>,
    pub fail_inserts: Mutex<bool>,
    pub fail_updates: Mutex<bool>,
    /// Next `get_profile` reports no rows even if the row exists
    pub miss_next_get: Mutex<bool>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn put(&self, row: ProfileRow) {
        self.rows.lock().unwrap().insert(row.id.clone(), row);
    }

    pub fn row(&self, id: &str) -> Option<ProfileRow> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    /// Write coins behind the manager's back, as another device would.
    pub fn set_coins(&self, id: &str, coins: i64) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
            row.total_coins = Some(coins);
            row.money = Some(coins);
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.lock().unwrap().len()
    }
}

#[allow(dead_code)]
fn merge<T: serde::Serialize>(row: &ProfileRow, patch: &T) -> ProfileRow {
    let mut value = serde_json::to_value(row).unwrap();
    let patch = serde_json::to_value(patch).unwrap();
    if let (Some(target), Some(source)) = (value.as_object_mut(), patch.as_object()) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).unwrap()
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<ProfileRow, AppError> {
        let miss = std::mem::take(&mut *self.miss_next_get.lock().unwrap());
        self.row(user_id).filter(|_| !miss).ok_or_else(|| AppError::Database {
            code: "PGRST116".to_string(),
            message: "The result contains 0 rows".to_string(),
        })
    }

    async fn profile_exists(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.row(user_id).is_some())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), AppError> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(AppError::Database {
                code: "42501".to_string(),
                message: "new row violates row-level security policy".to_string(),
            });
        }
        self.inserts.lock().unwrap().push(profile.clone());
        let row = merge(
            &ProfileRow {
                id: profile.id.clone(),
                ..Default::default()
            },
            profile,
        );
        self.put(row);
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), AppError> {
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), update.clone()));
        if *self.fail_updates.lock().unwrap() {
            return Err(AppError::Database {
                code: "57014".to_string(),
                message: "canceling statement due to statement timeout".to_string(),
            });
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get(user_id) {
            let merged = merge(row, update);
            rows.insert(user_id.to_string(), merged);
        }
        Ok(())
    }
}

// ─── Auth provider ───────────────────────────────────────────────────────────

/// In-memory auth provider with switchable failures.
#[allow(dead_code)]
pub struct FakeAuth {
    /// email -> (password, identity)
    pub accounts: Mutex<HashMap<String, (String, Identity)>>,
    pub session: Mutex<Option<AuthSession>>,
    /// Sign-ups open a session immediately when true
    pub auto_confirm: Mutex<bool>,
    pub fail_sign_out: Mutex<bool>,
    /// Error returned by the next `get_session`
    pub session_error: Mutex<Option<String>>,
    pub sign_out_calls: Mutex<usize>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for FakeAuth {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            auto_confirm: Mutex::new(true),
            fail_sign_out: Mutex::new(false),
            session_error: Mutex::new(None),
            sign_out_calls: Mutex::new(0),
            events,
        }
    }
}

#[allow(dead_code)]
impl FakeAuth {
    pub fn add_account(&self, email: &str, password: &str, user: Identity) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user));
    }

    /// Simulate a change made outside the manager (e.g. another tab).
    pub fn emit(&self, kind: AuthChange, session: Option<AuthSession>) {
        *self.session.lock().unwrap() = session.clone();
        let _ = self.events.send(AuthEvent { kind, session });
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn get_session(&self) -> Result<Option<AuthSession>, AppError> {
        if let Some(msg) = self.session_error.lock().unwrap().take() {
            *self.session.lock().unwrap() = None;
            return Err(AppError::Auth(msg));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, AppError> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(AppError::from_auth_message(
                Some("user_already_exists"),
                "User already registered",
            ));
        }

        let user: Identity = serde_json::from_value(serde_json::json!({
            "id": format!("user-{}", email),
            "email": email,
            "user_metadata": metadata,
        }))
        .unwrap();
        self.add_account(email, password, user.clone());

        if !*self.auto_confirm.lock().unwrap() {
            return Ok(SignUpOutcome {
                user: Some(user),
                session: None,
            });
        }

        let session = session_for(user.clone());
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(SignUpOutcome {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some((expected, user)) if expected == password => {
                let session = session_for(user);
                *self.session.lock().unwrap() = Some(session.clone());
                Ok(session)
            }
            _ => Err(AppError::Auth("Invalid login credentials".to_string())),
        }
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        *self.sign_out_calls.lock().unwrap() += 1;
        *self.session.lock().unwrap() = None;
        if *self.fail_sign_out.lock().unwrap() {
            return Err(AppError::Auth("Sign-out request failed: connection reset".to_string()));
        }
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<Identity>, AppError> {
        Ok(self.session.lock().unwrap().as_ref().map(|s| s.user.clone()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// ─── Chat + analytics ────────────────────────────────────────────────────────

/// Chat client that returns a canned reply and records the conversation.
#[allow(dead_code)]
pub struct ScriptedChat {
    pub reply: Mutex<Result<String, String>>,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
}

#[allow(dead_code)]
impl ScriptedChat {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(text.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Mutex::new(Err(error.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.reply.lock().unwrap().clone().map_err(AppError::AiProxy)
    }
}

/// Fixed analytics for every user.
#[allow(dead_code)]
pub struct StaticAnalytics(pub Option<UserAnalytics>);

#[async_trait]
impl AnalyticsSource for StaticAnalytics {
    async fn get_user_analytics(&self, _user_id: &str) -> Result<Option<UserAnalytics>, AppError> {
        Ok(self.0)
    }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Session manager over fresh fakes.
#[allow(dead_code)]
pub fn test_session() -> (SessionManager, Arc<FakeAuth>, Arc<MemoryStore>) {
    let auth = Arc::new(FakeAuth::default());
    let store = Arc::new(MemoryStore::default());
    let manager = SessionManager::new(auth.clone(), store.clone(), test_catalog(), RECONCILE_DELAY);
    (manager, auth, store)
}
