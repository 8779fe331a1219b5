use std::{collections::BTreeSet, sync::Arc};

use time::OffsetDateTime;

use crate::{
    consent::status::ConsentStatus,
    store::{
        cookie::{Cookie, CookieLifetime, CookieScope},
        jar::CookieJar,
    },
};

const PROBE_COOKIE: &str = "consentry-probe";

/// Names of the three persisted consent cookies, derived from the configured
/// base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieNames {
    base: String,
}

impl CookieNames {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: if base.is_empty() {
                "cookie-agreed".to_string()
            } else {
                base
            },
        }
    }

    pub fn status(&self) -> &str {
        &self.base
    }

    pub fn categories(&self) -> String {
        format!("{}-categories", self.base)
    }

    pub fn version(&self) -> String {
        format!("{}-version", self.base)
    }

    /// Per-language key used by installations that predate the single
    /// status cookie.
    pub fn legacy_status(&self, language: &str) -> String {
        format!("{}-{}", self.base, language)
    }
}

/// Persistence for consent state. Every read degrades to a default and every
/// failed write is skipped: a broken jar must never take the host down.
pub struct ConsentStore {
    jar: Arc<dyn CookieJar>,
    names: CookieNames,
    scope: CookieScope,
    lifetime: CookieLifetime,
    required: BTreeSet<String>,
}

impl ConsentStore {
    pub fn new(
        jar: Arc<dyn CookieJar>,
        names: CookieNames,
        scope: CookieScope,
        lifetime: CookieLifetime,
        required: BTreeSet<String>,
    ) -> Self {
        Self {
            jar,
            names,
            scope,
            lifetime,
            required,
        }
    }

    pub fn names(&self) -> &CookieNames {
        &self.names
    }

    fn scoped_cookie(&self, name: impl Into<String>, value: impl Into<String>) -> Cookie {
        Cookie {
            name: name.into(),
            value: value.into(),
            domain: self.scope.domain.clone(),
            path: self.scope.path.clone(),
            expires: self.lifetime.expires_at(OffsetDateTime::now_utc()),
        }
    }

    fn read_value(&self, name: &str) -> Option<String> {
        match self.jar.get(name) {
            Ok(found) => found.map(|cookie| cookie.value),
            Err(err) => {
                tracing::debug!(target: "store", cookie = name, error = %err, "consent_read_skipped");
                None
            }
        }
    }

    fn write_value(&self, name: &str, value: &str) {
        if let Err(err) = self.jar.set(self.scoped_cookie(name, value)) {
            tracing::debug!(target: "store", cookie = name, error = %err, "consent_write_skipped");
        }
    }

    fn remove_value(&self, name: &str) {
        if let Err(err) = self
            .jar
            .remove(name, self.scope.domain.as_deref(), &self.scope.path)
        {
            tracing::debug!(target: "store", cookie = name, error = %err, "consent_remove_skipped");
        }
    }

    pub fn read_status(&self) -> ConsentStatus {
        ConsentStatus::from_stored(self.read_value(self.names.status()).as_deref())
    }

    pub fn write_status(&self, status: ConsentStatus) {
        match status.as_stored() {
            Some(value) => self.write_value(self.names.status(), value),
            None => self.remove_value(self.names.status()),
        }
    }

    /// Stored category list unioned with the categories configuration marks
    /// as required. Malformed stored values read as empty.
    pub fn read_categories(&self) -> BTreeSet<String> {
        let mut categories: BTreeSet<String> = self
            .read_value(&self.names.categories())
            .and_then(|raw| match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    tracing::debug!(target: "store", error = %err, "category_list_malformed");
                    None
                }
            })
            .unwrap_or_default()
            .into_iter()
            .collect();
        categories.extend(self.required.iter().cloned());
        categories
    }

    pub fn write_categories(&self, categories: &BTreeSet<String>) {
        let ordered: Vec<&String> = categories.iter().collect();
        match serde_json::to_string(&ordered) {
            Ok(serialized) => self.write_value(&self.names.categories(), &serialized),
            Err(err) => {
                tracing::debug!(target: "store", error = %err, "category_write_skipped");
            }
        }
    }

    pub fn read_version(&self) -> Option<String> {
        self.read_value(&self.names.version())
    }

    pub fn write_version(&self, version: &str) {
        self.write_value(&self.names.version(), version);
    }

    /// Round-trips a probe cookie to detect a disabled or broken jar.
    pub fn probe(&self) -> bool {
        let probe = Cookie::session(PROBE_COOKIE, "1");
        if self.jar.set(probe).is_err() {
            return false;
        }
        let seen = matches!(self.jar.get(PROBE_COOKIE), Ok(Some(_)));
        let _ = self.jar.remove(PROBE_COOKIE, None, "/");
        seen
    }

    /// Upgrade path for the old per-language status cookie: copy its value
    /// to the current key and delete the legacy entry.
    pub fn migrate_legacy(&self, language: &str) {
        let legacy_name = self.names.legacy_status(language);
        let Some(value) = self.read_value(&legacy_name) else {
            return;
        };
        if value == "null" {
            // A broken older writer could persist the literal string "null".
            self.remove_value(&legacy_name);
            return;
        }
        tracing::info!(target: "store", from = %legacy_name, "legacy_consent_migrated");
        self.write_value(self.names.status(), &value);
        self.remove_value(&legacy_name);
    }
}
