// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and profile manager.
//!
//! Owns the current identity and the student's profile, and keeps them in
//! step with the auth provider and the `user_profiles` table.
//!
//! Lifecycle: `start()` restores any stored session and subscribes to
//! auth-state changes; `shutdown()` drops the subscription.
//!
//! Stats writes use a two-phase protocol: the written values are applied to
//! local state straight away, then a reconcile read is queued after a short
//! delay and whatever the server returns replaces the local copy.

use crate::db::ProfileStore;
use crate::error::{AppError, Result};
use crate::models::user::DEFAULT_STUDENT_NAME;
use crate::models::{AuthEvent, Identity, NewProfile, ProfileDefaults, ProfileRow, ProfileUpdate, UserProfile};
use crate::services::auth::AuthProvider;
use crate::services::catalog::ChapterCatalog;
use chrono::{SecondsFormat, Utc};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Snapshot of what the manager currently knows.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
    /// True until the stored session has been restored
    pub loading: bool,
}

/// Explicitly owned session service. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn ProfileStore>,
    catalog: ChapterCatalog,
    reconcile_delay: Duration,
    state: RwLock<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn ProfileStore>,
        catalog: ChapterCatalog,
        reconcile_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                auth,
                store,
                catalog,
                reconcile_delay,
                state: RwLock::new(SessionState {
                    loading: true,
                    ..SessionState::default()
                }),
                listener: Mutex::new(None),
            }),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Restore the stored session and start listening for auth changes.
    ///
    /// An invalid or expired refresh token forces a local sign-out.
    pub async fn start(&self) {
        let events = self.inner.auth.subscribe();

        match self.inner.auth.get_session().await {
            Ok(Some(session)) => {
                let user_id = session.user.id.clone();
                self.adopt_identity(session.user).await;
                self.fetch_user_profile(&user_id).await;
            }
            Ok(None) => tracing::debug!("No stored session"),
            Err(e) => {
                tracing::error!(error = %e, "Session initialization error");
                if e.is_invalid_refresh_token() {
                    self.sign_out().await;
                }
            }
        }

        self.inner.state.write().await.loading = false;

        let handle = spawn_listener(Arc::downgrade(&self.inner), events);
        if let Some(previous) = self.inner.listener.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Stop listening for auth changes.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.listener.lock().await.take() {
            handle.abort();
            tracing::debug!("Auth listener stopped");
        }
    }

    // ─── State ───────────────────────────────────────────────────────────────

    pub async fn state(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.inner.state.read().await.identity.clone()
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.inner.state.read().await.profile.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.loading
    }

    async fn user_id(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .await
            .identity
            .as_ref()
            .map(|i| i.id.clone())
    }

    async fn clear_local(&self) {
        let mut state = self.inner.state.write().await;
        state.identity = None;
        state.profile = None;
    }

    /// Make `user` the active identity, dropping a profile that belongs to
    /// someone else. Returns whether `user` was already active.
    async fn adopt_identity(&self, user: Identity) -> bool {
        let mut state = self.inner.state.write().await;
        let same = state.identity.as_ref().is_some_and(|i| i.id == user.id);
        if state.profile.as_ref().is_some_and(|p| p.id != user.id) {
            state.profile = None;
        }
        state.identity = Some(user);
        same
    }

    /// Store `profile` unless the identity changed in the meantime.
    async fn set_profile(&self, profile: UserProfile) {
        let mut state = self.inner.state.write().await;
        if state.identity.as_ref().is_some_and(|i| i.id == profile.id) {
            state.profile = Some(profile);
        } else {
            tracing::debug!(user_id = %profile.id, "Dropping profile for inactive identity");
        }
    }

    // ─── Auth Operations ─────────────────────────────────────────────────────

    /// Create an account.
    ///
    /// When the backend opens a session right away, a profile row seeded
    /// with the class's first chapter is inserted. A failed insert is only
    /// logged: the account exists and the profile is created lazily later.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        defaults: ProfileDefaults,
    ) -> Result<()> {
        let metadata = serde_json::json!({
            "name": defaults.name,
            "class_level": defaults.class_level,
        });

        let outcome = match self.inner.auth.sign_up(email, password, metadata).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Signup error");
                return Err(e);
            }
        };

        let Some(session) = outcome.session else {
            let user_id = outcome.user.as_ref().map(|u| u.id.as_str());
            tracing::info!(email, user_id, "Signup pending confirmation, no profile created yet");
            return Ok(());
        };

        let user_id = session.user.id.clone();
        self.adopt_identity(session.user).await;

        let class_level = defaults.class_level.unwrap_or(1);
        let new_profile = NewProfile::seeded(
            user_id.clone(),
            email,
            defaults
                .name
                .unwrap_or_else(|| DEFAULT_STUDENT_NAME.to_string()),
            class_level,
            defaults.phone,
            self.inner.catalog.default_unlock(class_level),
        );

        match self.inner.store.insert_profile(&new_profile).await {
            Ok(()) => {
                self.fetch_user_profile(&user_id).await;
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Error creating user profile");
            }
        }
        Ok(())
    }

    /// Sign in with e-mail and password. Backend errors propagate unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let session = self
            .inner
            .auth
            .sign_in_with_password(email, password)
            .await?;

        let user_id = session.user.id.clone();
        self.adopt_identity(session.user).await;
        tracing::info!(user_id = %user_id, "Signed in");

        self.fetch_user_profile(&user_id).await;
        Ok(())
    }

    /// Sign out. Local state is cleared even if the remote call fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.inner.auth.sign_out().await {
            tracing::error!(error = %e, "Sign out error");
        }
        self.clear_local().await;
    }

    // ─── Profile Operations ──────────────────────────────────────────────────

    /// Record a quiz round: 2 coins per correct answer, none for wrong ones.
    ///
    /// `_money` is accepted for API compatibility and ignored; the balance is
    /// derived from `correct`. Without an active identity this does nothing.
    pub async fn update_user_stats(
        &self,
        correct: i64,
        wrong: i64,
        _money: i64,
    ) -> Result<()> {
        let Some(user_id) = self.user_id().await else {
            return Ok(());
        };

        let current = self.profile().await.filter(|p| p.id == user_id);
        let update = ProfileUpdate::for_quiz_result(current.as_ref(), correct, wrong);

        tracing::info!(
            user_id = %user_id,
            total_coins = ?update.total_coins,
            total_correct = ?update.total_correct,
            total_wrong = ?update.total_wrong,
            "Updating user stats"
        );

        if let Err(e) = self.inner.store.update_profile(&user_id, &update).await {
            tracing::error!(user_id = %user_id, error = %e, "Stats update failed");
            return Err(e);
        }

        // Phase 1: speculative local write.
        {
            let mut state = self.inner.state.write().await;
            if let Some(profile) = state.profile.as_mut().filter(|p| p.id == user_id) {
                update.apply_to(profile);
            }
        }

        // Phase 2: authoritative read replaces it.
        self.schedule_reconcile(user_id);
        Ok(())
    }

    /// Merge `update` into the stored profile, then re-read it.
    ///
    /// Without an active identity this does nothing.
    pub async fn update_user_profile(&self, update: ProfileUpdate) -> Result<()> {
        let Some(user_id) = self.user_id().await else {
            return Ok(());
        };

        self.inner.store.update_profile(&user_id, &update).await?;
        self.fetch_user_profile(&user_id).await;
        Ok(())
    }

    /// Load the profile for `user_id` into local state.
    ///
    /// Creates a missing profile from the identity's sign-up metadata and
    /// persists defaults for missing columns. Failures are logged and
    /// yield `None`.
    pub async fn fetch_user_profile(&self, user_id: &str) -> Option<UserProfile> {
        match self.load_profile(user_id).await {
            Ok(profile) => {
                self.set_profile(profile.clone()).await;
                Some(profile)
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Error fetching user profile");
                None
            }
        }
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        match self.inner.store.get_profile(user_id).await {
            Ok(row) => Ok(self.normalize_row(user_id, row).await),
            Err(e) if e.is_no_rows() => self.create_missing_profile(user_id).await,
            Err(e) => Err(e),
        }
    }

    /// Apply read-time defaults and write them back if any were missing.
    async fn normalize_row(&self, user_id: &str, row: ProfileRow) -> UserProfile {
        let catalog = &self.inner.catalog;
        let (profile, repair) = row.normalize(|class_level| catalog.default_unlock(class_level));

        if let Some(repair) = repair {
            tracing::info!(user_id, "Persisting defaults for missing profile fields");
            if let Err(e) = self.inner.store.update_profile(user_id, &repair).await {
                tracing::warn!(user_id, error = %e, "Failed to persist profile defaults");
            }
        }
        profile
    }

    async fn create_missing_profile(&self, user_id: &str) -> Result<UserProfile> {
        tracing::info!(user_id, "User profile not found, creating default profile");

        // Another client may have created it since the first read.
        if self.inner.store.profile_exists(user_id).await? {
            let row = self.inner.store.get_profile(user_id).await?;
            return Ok(self.normalize_row(user_id, row).await);
        }

        let user = self
            .inner
            .auth
            .get_user()
            .await?
            .ok_or(AppError::NotAuthenticated)?;

        let class_level = user.metadata_class_level().unwrap_or(1);
        let new_profile = NewProfile::seeded(
            user.id.clone(),
            user.email.clone().unwrap_or_default(),
            user.metadata_name().unwrap_or(DEFAULT_STUDENT_NAME),
            class_level,
            user.phone.clone(),
            self.inner.catalog.default_unlock(class_level),
        );

        if let Err(e) = self.inner.store.insert_profile(&new_profile).await {
            tracing::error!(user_id = %user.id, error = %e, "Error creating user profile, using local copy");
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            return Ok(new_profile.to_local_profile(now));
        }

        let row = self.inner.store.get_profile(&user.id).await?;
        Ok(self.normalize_row(&user.id, row).await)
    }

    /// Queue the reconcile read that follows a speculative write.
    ///
    /// Fire-and-forget: skipped if the manager is gone or the identity
    /// changed before the delay elapsed.
    fn schedule_reconcile(&self, user_id: String) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.reconcile_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let manager = SessionManager { inner };
            if manager.user_id().await.as_deref() != Some(user_id.as_str()) {
                tracing::debug!(user_id = %user_id, "Identity changed, skipping reconcile");
                return;
            }
            manager.fetch_user_profile(&user_id).await;
        });
    }

    /// React to an auth-state change from the provider.
    ///
    /// Changes caused by this manager's own calls arrive here too; they
    /// carry the identity already held, so no second fetch is made.
    async fn handle_auth_event(&self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "Auth state changed");

        let Some(session) = event.session else {
            self.clear_local().await;
            return;
        };

        let user_id = session.user.id.clone();
        if !self.adopt_identity(session.user).await {
            self.fetch_user_profile(&user_id).await;
        }
    }
}

/// Forward auth events to the manager until it is dropped or shut down.
fn spawn_listener(
    weak: Weak<Inner>,
    mut events: tokio::sync::broadcast::Receiver<AuthEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Some(inner) = weak.upgrade() else {
                        break;
                    };
                    SessionManager { inner }.handle_auth_event(event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth listener lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
