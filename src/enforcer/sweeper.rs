use std::{collections::BTreeSet, sync::Arc};

use crate::{
    enforcer::allowlist::Allowlist,
    store::{Cookie, CookieJar},
};

/// Outcome of one sweep. `removed` were deleted through the domain chain;
/// `expired` needed the unconditional tombstone fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<String>,
    pub expired: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.expired.is_empty()
    }
}

/// Parent-domain chain for cookie deletion: the hostname itself, then each
/// suffix up to the registrable root.
pub fn domain_suffixes(hostname: &str) -> Vec<String> {
    let mut suffixes = Vec::new();
    let mut rest = hostname.trim().trim_start_matches('.');
    while !rest.is_empty() {
        suffixes.push(rest.to_string());
        match rest.split_once('.') {
            Some((_, parent)) => rest = parent,
            None => break,
        }
    }
    suffixes
}

/// Deletes disallowed cookies from the jar. Stateless between runs: every
/// sweep re-reads the full cookie set, so concurrent writers are picked up
/// on the next pass and re-running after a clean sweep is a no-op.
pub struct Sweeper {
    jar: Arc<dyn CookieJar>,
    allowlist: Allowlist,
    suffixes: Vec<String>,
}

impl Sweeper {
    pub fn new(jar: Arc<dyn CookieJar>, allowlist: Allowlist, hostname: &str) -> Self {
        Self {
            jar,
            allowlist,
            suffixes: domain_suffixes(hostname),
        }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    pub fn sweep(&self, accepted: &BTreeSet<String>) -> SweepReport {
        let cookies = match self.jar.list() {
            Ok(cookies) => cookies,
            Err(err) => {
                tracing::debug!(target: "enforcer", error = %err, "sweep_skipped");
                return SweepReport::default();
            }
        };

        let mut report = SweepReport::default();
        for cookie in cookies {
            if self.allowlist.is_allowed(&cookie.name, accepted) {
                continue;
            }
            if self.delete_across_domains(&cookie.name) {
                report.removed.push(cookie.name);
            } else {
                // Not confirmed at any suffix; overwrite with an expired
                // cookie and let the next sweep pick up any survivor.
                if let Err(err) = self.jar.set(Cookie::tombstone(cookie.name.as_str())) {
                    tracing::debug!(
                        target: "enforcer",
                        cookie = %cookie.name,
                        error = %err,
                        "tombstone_write_failed"
                    );
                }
                report.expired.push(cookie.name);
            }
        }

        if !report.is_empty() {
            tracing::info!(
                target: "enforcer",
                removed = report.removed.len(),
                expired = report.expired.len(),
                "cookies_swept"
            );
        }
        report
    }

    /// One delete-if-present attempt per precomputed suffix, dotted and
    /// bare, stopping at the first confirmed removal.
    fn delete_across_domains(&self, name: &str) -> bool {
        for suffix in &self.suffixes {
            let dotted = format!(".{suffix}");
            match self.jar.remove(name, Some(&dotted), "/") {
                Ok(true) => return true,
                Ok(false) => {}
                Err(err) => {
                    tracing::debug!(target: "enforcer", cookie = name, error = %err, "remove_failed");
                }
            }
            match self.jar.remove(name, Some(suffix), "/") {
                Ok(true) => return true,
                Ok(false) => {}
                Err(err) => {
                    tracing::debug!(target: "enforcer", cookie = name, error = %err, "remove_failed");
                }
            }
        }
        // Host-scoped cookies carry no domain attribute at all.
        matches!(self.jar.remove(name, None, "/"), Ok(true))
    }
}
