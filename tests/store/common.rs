use std::{collections::BTreeSet, sync::Arc};

use consentry::store::{
    ConsentStore, Cookie, CookieJar, CookieLifetime, CookieNames, CookieScope, JarError,
};

pub fn store_on(jar: Arc<dyn CookieJar>, required: &[&str]) -> ConsentStore {
    ConsentStore::new(
        jar,
        CookieNames::new("cookie-agreed"),
        CookieScope::new(None, "/"),
        CookieLifetime::Days(100),
        required.iter().map(ToString::to_string).collect(),
    )
}

pub fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Jar double for a client with storage disabled: every operation fails.
pub struct DisabledJar;

impl CookieJar for DisabledJar {
    fn list(&self) -> Result<Vec<Cookie>, JarError> {
        Err(consentry::store::jar::unavailable("cookies are disabled"))
    }

    fn get(&self, _name: &str) -> Result<Option<Cookie>, JarError> {
        Err(consentry::store::jar::unavailable("cookies are disabled"))
    }

    fn set(&self, _cookie: Cookie) -> Result<(), JarError> {
        Err(consentry::store::jar::unavailable("cookies are disabled"))
    }

    fn remove(&self, _name: &str, _domain: Option<&str>, _path: &str) -> Result<bool, JarError> {
        Err(consentry::store::jar::unavailable("cookies are disabled"))
    }
}
