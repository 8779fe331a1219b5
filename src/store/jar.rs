use std::fmt;

use crate::store::cookie::Cookie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JarErrorKind {
    Unavailable,
    Io,
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarError {
    pub kind: JarErrorKind,
    pub message: String,
}

impl JarError {
    pub fn new(kind: JarErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for JarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JarError {}

pub fn unavailable(message: impl Into<String>) -> JarError {
    JarError::new(JarErrorKind::Unavailable, message)
}

pub fn io_error(message: impl Into<String>) -> JarError {
    JarError::new(JarErrorKind::Io, message)
}

pub fn serialization_error(message: impl Into<String>) -> JarError {
    JarError::new(JarErrorKind::Serialization, message)
}

/// Storage port for client-side cookies. Adapters must key cookies by
/// `(name, domain, path)` and must not return cookies that are already
/// expired.
pub trait CookieJar: Send + Sync {
    /// All live cookies, in a stable order.
    fn list(&self) -> Result<Vec<Cookie>, JarError>;

    /// First live cookie with the given name, regardless of scope.
    fn get(&self, name: &str) -> Result<Option<Cookie>, JarError>;

    /// Insert or replace the cookie at its `(name, domain, path)` slot.
    /// Writing an already-expired cookie clears that slot.
    fn set(&self, cookie: Cookie) -> Result<(), JarError>;

    /// Delete the cookie at exactly `(name, domain, path)`. Returns whether
    /// a live cookie was present. Deleting an absent cookie is a no-op.
    fn remove(&self, name: &str, domain: Option<&str>, path: &str) -> Result<bool, JarError>;
}
