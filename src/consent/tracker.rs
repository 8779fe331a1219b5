use std::{collections::BTreeSet, sync::Arc};

use crate::{
    config::{Config, Method},
    consent::{
        error::{TrackerError, invalid_transition},
        status::ConsentStatus,
        types::{BannerMode, ConsentDecision, TransitionOutcome},
    },
    hooks::{ConsentEvent, ConsentSnapshot, HookRegistry},
    recorder::ConsentRecorder,
    store::{ConsentStore, CookieJar},
};

/// The consent coordinator: one per session. Owns the cached status and
/// category view, routes every persisted read/write through the hook
/// registry, and triggers remote recording on qualifying transitions.
pub struct ConsentTracker {
    config: Arc<Config>,
    store: ConsentStore,
    hooks: Arc<HookRegistry>,
    recorder: Arc<dyn ConsentRecorder>,
    status: ConsentStatus,
    categories: BTreeSet<String>,
    version_changed: bool,
}

impl ConsentTracker {
    pub fn initialize(
        config: Arc<Config>,
        jar: Arc<dyn CookieJar>,
        hooks: Arc<HookRegistry>,
        recorder: Arc<dyn ConsentRecorder>,
    ) -> Self {
        let store = ConsentStore::new(
            jar,
            config.cookie_names(),
            config.cookie_scope(),
            config.lifetime(),
            config.required_categories(),
        );

        if let Some(language) = &config.popup_language {
            store.migrate_legacy(language);
        }

        // First sight of this client: pin the current policy version so a
        // later version bump re-prompts only clients that consented before
        // the bump.
        if store.read_version().is_none() {
            store.write_version(&config.cookie_policy_version);
        }
        let version_changed = store
            .read_version()
            .is_some_and(|stored| stored != config.cookie_policy_version);

        let mut tracker = Self {
            config,
            store,
            hooks,
            recorder,
            status: ConsentStatus::Unset,
            categories: BTreeSet::new(),
            version_changed,
        };
        tracker.load_status();
        tracker.load_categories();
        tracker
    }

    pub fn status(&self) -> ConsentStatus {
        self.status
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn version_changed(&self) -> bool {
        self.version_changed
    }

    /// Whether the jar accepts writes at all. Hosts skip prompting when it
    /// does not: nothing could be remembered.
    pub fn storage_available(&self) -> bool {
        self.store.probe()
    }

    fn snapshot(&self) -> ConsentSnapshot {
        ConsentSnapshot {
            status: self.status,
            categories: self.categories.clone(),
        }
    }

    fn load_status(&mut self) {
        self.hooks
            .notify(ConsentEvent::PreStatusLoad, &self.snapshot());
        self.status = self.store.read_status();
        self.hooks
            .notify(ConsentEvent::PostStatusLoad, &self.snapshot());
    }

    fn load_categories(&mut self) {
        self.hooks
            .notify(ConsentEvent::PrePreferencesLoad, &self.snapshot());
        self.categories = self.store.read_categories();
        self.hooks
            .notify(ConsentEvent::PostPreferencesLoad, &self.snapshot());
    }

    fn persist_status(&mut self, next: ConsentStatus) {
        self.hooks
            .notify(ConsentEvent::PreStatusSave, &self.snapshot());
        self.store.write_status(next);
        self.status = next;
        // Every persisted transition refreshes the policy-version marker.
        self.store.write_version(&self.config.cookie_policy_version);
        self.version_changed = false;
        self.record_consent(next);
        self.hooks
            .notify(ConsentEvent::PostStatusSave, &self.snapshot());
        tracing::info!(target: "consent", status = ?next, "consent_status_persisted");
    }

    fn persist_categories(&mut self, selected: BTreeSet<String>) {
        self.hooks
            .notify(ConsentEvent::PrePreferencesSave, &self.snapshot());
        self.store.write_categories(&selected);
        // The cached view mirrors the read path: required categories are
        // always present.
        let mut cached = selected;
        cached.extend(self.config.required_categories());
        self.categories = cached;
        self.hooks
            .notify(ConsentEvent::PostPreferencesSave, &self.snapshot());
    }

    fn record_consent(&self, status: ConsentStatus) {
        if !self.config.store_consent {
            return;
        }
        let qualifies = match status {
            ConsentStatus::AgreedPendingAck => self.config.popup_agreed_enabled,
            ConsentStatus::Agreed => !self.config.popup_agreed_enabled,
            ConsentStatus::Unset | ConsentStatus::Declined => false,
        };
        if !qualifies {
            return;
        }
        let Some(code) = status.as_code() else {
            return;
        };

        let decision = ConsentDecision {
            status: code,
            categories: self.categories.clone(),
            policy_version: self.config.cookie_policy_version.clone(),
            source: "banner".to_string(),
        };
        let recorder = Arc::clone(&self.recorder);
        // Fire-and-forget; without an async runtime there is nothing to
        // drive the request, so the recording is skipped.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = recorder.record(&decision).await {
                        tracing::warn!(target: "consent", error = %err, "consent_recording_failed");
                    }
                });
            }
            Err(_) => {
                tracing::debug!(target: "consent", "consent_recording_skipped_without_runtime");
            }
        }
    }

    fn apply_status(&mut self, next: ConsentStatus) -> TransitionOutcome {
        // Re-confirming the same status is a no-op, except after a policy
        // bump: that write must land to refresh the version marker.
        if self.status == next && !self.version_changed {
            return TransitionOutcome {
                status: next,
                reload_required: false,
            };
        }
        self.persist_status(next);
        TransitionOutcome {
            status: next,
            reload_required: self.config.reload_page,
        }
    }

    fn agreed_status(&self) -> ConsentStatus {
        if self.config.popup_agreed_enabled {
            ConsentStatus::AgreedPendingAck
        } else {
            ConsentStatus::Agreed
        }
    }

    /// Accept with the user's category selection (empty outside the
    /// categories method). Agreeing to an empty selection is a decline.
    pub fn accept(
        &mut self,
        selected: &BTreeSet<String>,
    ) -> Result<TransitionOutcome, TrackerError> {
        let allowed = self.status == ConsentStatus::Unset
            || (self.status == ConsentStatus::Declined && self.config.method == Method::Default)
            || self.version_changed;
        if !allowed {
            return Err(invalid_transition(format!(
                "accept is not valid from {:?}",
                self.status
            )));
        }

        if self.config.method == Method::Categories {
            self.persist_categories(selected.clone());
            if selected.is_empty() {
                return Ok(self.apply_status(ConsentStatus::Declined));
            }
        }
        Ok(self.apply_status(self.agreed_status()))
    }

    /// Accept with every configured category selected.
    pub fn accept_all(&mut self) -> Result<TransitionOutcome, TrackerError> {
        let all = self.config.all_categories();
        self.accept(&all)
    }

    /// Explicit confirmation of a pending agreement.
    pub fn acknowledge(&mut self) -> Result<TransitionOutcome, TrackerError> {
        if self.status != ConsentStatus::AgreedPendingAck {
            return Err(invalid_transition(format!(
                "acknowledge is not valid from {:?}",
                self.status
            )));
        }
        Ok(self.apply_status(ConsentStatus::Agreed))
    }

    pub fn decline(&mut self) -> TransitionOutcome {
        self.apply_status(ConsentStatus::Declined)
    }

    /// Re-save the category selection from the preferences surface; status
    /// is re-derived with the same rules as accept.
    pub fn save_preferences(&mut self, selected: &BTreeSet<String>) -> TransitionOutcome {
        self.persist_categories(selected.clone());
        if self.config.method == Method::Categories && selected.is_empty() {
            return self.apply_status(ConsentStatus::Declined);
        }
        self.apply_status(self.agreed_status())
    }

    /// Revoke consent entirely. The stored status is cleared, the stored
    /// category selection is emptied, and the host must reload.
    pub fn withdraw(&mut self) -> TransitionOutcome {
        self.persist_categories(BTreeSet::new());
        self.persist_status(ConsentStatus::Unset);
        TransitionOutcome {
            status: ConsentStatus::Unset,
            reload_required: true,
        }
    }

    /// Direct grant used when the session is outside the jurisdictions that
    /// require a prompt.
    pub fn auto_agree(&mut self) -> TransitionOutcome {
        self.apply_status(ConsentStatus::Agreed)
    }

    pub fn should_show_banner(&self) -> bool {
        if self.version_changed {
            return true;
        }
        match self.status {
            ConsentStatus::Unset => true,
            ConsentStatus::Declined => {
                self.config.method == Method::Default && !self.config.disagree_do_not_show_popup
            }
            ConsentStatus::Agreed => self.config.popup_agreed_enabled,
            ConsentStatus::AgreedPendingAck => false,
        }
    }

    pub fn banner_mode(&self) -> BannerMode {
        if self.version_changed {
            return BannerMode::Prompt;
        }
        match self.status {
            ConsentStatus::Unset => BannerMode::Prompt,
            ConsentStatus::Declined
                if self.config.method == Method::Default
                    && !self.config.disagree_do_not_show_popup =>
            {
                BannerMode::Prompt
            }
            ConsentStatus::Agreed if self.config.popup_agreed_enabled => BannerMode::ThankYou,
            ConsentStatus::Agreed if self.config.withdraw_enabled => BannerMode::Withdraw,
            _ => BannerMode::Hidden,
        }
    }

    /// Whether consent covers `category` (or any consent at all when no
    /// category is given).
    pub fn has_consented(&self, category: Option<&str>) -> bool {
        if !self.status.is_agreed() {
            return false;
        }
        match category {
            Some(name) => self.categories.contains(name),
            None => true,
        }
    }

    /// Whether the sweeper must keep running under the configured method.
    pub fn enforcement_required(&self) -> bool {
        if !self.config.automatic_cookies_removal {
            return false;
        }
        match self.config.method {
            Method::Default => false,
            Method::OptIn => !self.has_consented(None),
            Method::OptOut => {
                !self.has_consented(None) && self.status != ConsentStatus::Unset
            }
            Method::Categories => true,
        }
    }
}
