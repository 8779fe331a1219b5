use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, PoisonError},
};

use crate::consent::status::ConsentStatus;

/// Extension points fired around every persisted read and write of consent
/// state. Handlers observe; they cannot veto the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConsentEvent {
    PreStatusLoad,
    PostStatusLoad,
    PreStatusSave,
    PostStatusSave,
    PrePreferencesLoad,
    PostPreferencesLoad,
    PrePreferencesSave,
    PostPreferencesSave,
}

/// What handlers see: the coordinator's current view of consent at the
/// moment the event fires.
#[derive(Debug, Clone)]
pub struct ConsentSnapshot {
    pub status: ConsentStatus,
    pub categories: BTreeSet<String>,
}

type HookHandler = Box<dyn Fn(&ConsentSnapshot) + Send + Sync>;

/// Ordered publish/subscribe registry: handlers run in registration order,
/// per event.
#[derive(Default)]
pub struct HookRegistry {
    handlers: Mutex<BTreeMap<ConsentEvent, Vec<HookHandler>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        event: ConsentEvent,
        handler: impl Fn(&ConsentSnapshot) + Send + Sync + 'static,
    ) {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.entry(event).or_default().push(Box::new(handler));
    }

    pub fn notify(&self, event: ConsentEvent, snapshot: &ConsentSnapshot) {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribed) = handlers.get(&event) {
            for handler in subscribed {
                handler(snapshot);
            }
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let counts: BTreeMap<&ConsentEvent, usize> = handlers
            .iter()
            .map(|(event, subscribed)| (event, subscribed.len()))
            .collect();
        f.debug_struct("HookRegistry").field("handlers", &counts).finish()
    }
}
