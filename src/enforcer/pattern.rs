use std::fmt;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

impl PatternError {
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cookie pattern '{}': {}", self.pattern, self.message)
    }
}

impl std::error::Error for PatternError {}

/// A cookie-name pattern, compiled once at startup. Plain names match
/// exactly; names containing `*` compile to an anchored regex where every
/// literal segment is escaped and each `*` is a greedy match.
#[derive(Debug, Clone)]
pub struct CookiePattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Glob(Regex),
}

impl CookiePattern {
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PatternError::new(raw, "pattern is empty"));
        }

        if !trimmed.contains('*') {
            return Ok(Self {
                raw: trimmed.to_string(),
                matcher: Matcher::Exact(trimmed.to_string()),
            });
        }

        let escaped: Vec<String> = trimmed.split('*').map(regex::escape).collect();
        let source = format!("^{}$", escaped.join(".+"));
        let compiled = Regex::new(&source)
            .map_err(|err| PatternError::new(trimmed, err.to_string()))?;
        Ok(Self {
            raw: trimmed.to_string(),
            matcher: Matcher::Glob(compiled),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, cookie_name: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(exact) => cookie_name == exact,
            Matcher::Glob(glob) => glob.is_match(cookie_name),
        }
    }
}
