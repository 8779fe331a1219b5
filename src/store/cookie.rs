use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

fn default_path() -> String {
    "/".to_string()
}

/// A single client-side cookie as seen by the jar adapters. A cookie with
/// `expires == None` lives for the session only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
}

impl Cookie {
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: default_path(),
            expires: None,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// An unconditional tombstone for `name`: a host-scoped cookie that is
    /// already expired when written.
    pub fn tombstone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            domain: None,
            path: default_path(),
            expires: Some(OffsetDateTime::UNIX_EPOCH),
        }
    }
}

/// Domain/path scoping applied to every consent cookie write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieScope {
    pub domain: Option<String>,
    pub path: String,
}

impl CookieScope {
    pub fn new(domain: Option<String>, path: impl Into<String>) -> Self {
        Self {
            domain,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieLifetime {
    Session,
    Days(u32),
}

impl CookieLifetime {
    pub fn expires_at(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        match self {
            Self::Session => None,
            Self::Days(days) => Some(now + Duration::days(i64::from(days))),
        }
    }
}
