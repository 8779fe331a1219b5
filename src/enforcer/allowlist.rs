use std::collections::BTreeSet;

use crate::{
    config::{Config, Method},
    enforcer::pattern::{CookiePattern, PatternError},
    store::CookieNames,
};

#[derive(Debug, Clone)]
enum AllowEntry {
    Plain(CookiePattern),
    Categorized {
        category: String,
        pattern: CookiePattern,
    },
}

/// Compiled allow-list deciding which cookies may persist. Built once from
/// configuration; the three consent cookies are always on it.
#[derive(Debug, Clone)]
pub struct Allowlist {
    entries: Vec<AllowEntry>,
    session_exemptions: Vec<CookiePattern>,
    categories_method: bool,
}

impl Allowlist {
    pub fn from_config(config: &Config) -> Result<Self, PatternError> {
        let names = CookieNames::new(config.cookie_name.clone());
        let mut entries = Vec::new();

        for line in config.allowed_cookies.lines() {
            let entry = line.trim();
            if entry.is_empty() {
                continue;
            }
            match entry.split_once(':') {
                Some((category, pattern)) if !category.is_empty() && !pattern.is_empty() => {
                    entries.push(AllowEntry::Categorized {
                        category: category.trim().to_string(),
                        pattern: CookiePattern::compile(pattern)?,
                    });
                }
                _ => entries.push(AllowEntry::Plain(CookiePattern::compile(entry)?)),
            }
        }

        for own in [
            names.status().to_string(),
            names.categories(),
            names.version(),
        ] {
            entries.push(AllowEntry::Plain(CookiePattern::compile(&own)?));
        }

        let session_exemptions = config
            .session_cookie_patterns
            .iter()
            .map(|raw| CookiePattern::compile(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            entries,
            session_exemptions,
            categories_method: config.method == Method::Categories,
        })
    }

    /// Whether `cookie_name` may persist given the currently accepted
    /// categories.
    pub fn is_allowed(&self, cookie_name: &str, accepted: &BTreeSet<String>) -> bool {
        if self
            .session_exemptions
            .iter()
            .any(|pattern| pattern.matches(cookie_name))
        {
            return true;
        }

        self.entries.iter().any(|entry| match entry {
            AllowEntry::Plain(pattern) => pattern.matches(cookie_name),
            AllowEntry::Categorized { category, pattern } => {
                self.categories_method
                    && accepted.contains(category)
                    && pattern.matches(cookie_name)
            }
        })
    }
}
