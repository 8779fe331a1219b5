use std::collections::BTreeSet;

use serde::Serialize;

use crate::consent::status::ConsentStatus;

/// What the host should render, derived from stored status plus
/// configuration. The tracker never draws anything itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerMode {
    Hidden,
    Prompt,
    ThankYou,
    Withdraw,
}

/// Result of a transition. `reload_required` is an instruction to the host;
/// the tracker does not reload anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub status: ConsentStatus,
    pub reload_required: bool,
}

/// Payload sent to the remote consent-recording endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentDecision {
    pub status: u8,
    pub categories: BTreeSet<String>,
    pub policy_version: String,
    pub source: String,
}
