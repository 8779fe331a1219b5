use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use time::OffsetDateTime;

use crate::store::{
    cookie::Cookie,
    jar::{CookieJar, JarError},
};

type SlotKey = (String, Option<String>, String);

/// In-memory jar for embedding hosts and tests. Keyed by
/// `(name, domain, path)` like a browser cookie store.
#[derive(Debug, Default)]
pub struct MemoryJar {
    slots: Mutex<BTreeMap<SlotKey, Cookie>>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(cookie: &Cookie) -> SlotKey {
        (
            cookie.name.clone(),
            cookie.domain.clone(),
            cookie.path.clone(),
        )
    }
}

impl CookieJar for MemoryJar {
    fn list(&self) -> Result<Vec<Cookie>, JarError> {
        let now = OffsetDateTime::now_utc();
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots
            .values()
            .filter(|cookie| !cookie.is_expired_at(now))
            .cloned()
            .collect())
    }

    fn get(&self, name: &str) -> Result<Option<Cookie>, JarError> {
        let now = OffsetDateTime::now_utc();
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots
            .values()
            .find(|cookie| cookie.name == name && !cookie.is_expired_at(now))
            .cloned())
    }

    fn set(&self, cookie: Cookie) -> Result<(), JarError> {
        let now = OffsetDateTime::now_utc();
        let key = Self::key(&cookie);
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if cookie.is_expired_at(now) {
            slots.remove(&key);
        } else {
            slots.insert(key, cookie);
        }
        Ok(())
    }

    fn remove(&self, name: &str, domain: Option<&str>, path: &str) -> Result<bool, JarError> {
        let key = (
            name.to_string(),
            domain.map(ToString::to_string),
            path.to_string(),
        );
        let now = OffsetDateTime::now_utc();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.remove(&key) {
            Some(cookie) => Ok(!cookie.is_expired_at(now)),
            None => Ok(false),
        }
    }
}
