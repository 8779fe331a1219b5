use std::{collections::BTreeSet, sync::Arc};

use consentry::{
    config::{CategorySpec, CheckboxState, Config, Method},
    enforcer::{Allowlist, Sweeper},
    store::{Cookie, CookieJar, JarError, MemoryJar},
};

fn categories_config(allowed: &str) -> Config {
    let mut config = Config {
        method: Method::Categories,
        allowed_cookies: allowed.to_string(),
        ..Config::default()
    };
    config.cookie_categories.insert(
        "analytics".to_string(),
        CategorySpec {
            machine_name: "analytics".to_string(),
            checkbox_default_state: CheckboxState::Unchecked,
        },
    );
    config
}

fn sweeper_for(config: &Config, jar: Arc<dyn CookieJar>) -> Sweeper {
    let allowlist = Allowlist::from_config(config).expect("allowlist must compile");
    Sweeper::new(jar, allowlist, &config.hostname)
}

fn accepted(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(ToString::to_string).collect()
}

fn live_names(jar: &MemoryJar) -> Vec<String> {
    jar.list()
        .expect("list must succeed")
        .into_iter()
        .map(|cookie| cookie.name)
        .collect()
}

#[test]
fn sweep_removes_disallowed_cookies_and_keeps_exempt_ones() {
    let jar = Arc::new(MemoryJar::new());
    for (name, value) in [
        ("cookie-agreed", "0"),
        ("SESSabc123", "sid"),
        ("has_js", "1"),
        ("ga_id", "tracker"),
    ] {
        jar.set(Cookie::session(name, value)).expect("seed must succeed");
    }

    let config = Config {
        allowed_cookies: "has_js".to_string(),
        ..Config::default()
    };
    let sweeper = sweeper_for(&config, Arc::clone(&jar) as Arc<dyn CookieJar>);

    let report = sweeper.sweep(&BTreeSet::new());
    assert_eq!(report.removed, vec!["ga_id".to_string()]);
    assert!(report.expired.is_empty());
    assert_eq!(live_names(&jar), vec!["SESSabc123", "cookie-agreed", "has_js"]);
}

#[test]
fn sweep_is_idempotent_without_intervening_writes() {
    let jar = Arc::new(MemoryJar::new());
    jar.set(Cookie::session("ga_id", "tracker"))
        .expect("seed must succeed");

    let sweeper = sweeper_for(&Config::default(), Arc::clone(&jar) as Arc<dyn CookieJar>);

    let first = sweeper.sweep(&BTreeSet::new());
    assert_eq!(first.removed, vec!["ga_id".to_string()]);

    let second = sweeper.sweep(&BTreeSet::new());
    assert!(second.is_empty());
}

#[test]
fn category_scoped_cookie_survives_only_once_its_category_is_accepted() {
    let jar = Arc::new(MemoryJar::new());
    let config = categories_config("analytics:ga_*");
    let sweeper = sweeper_for(&config, Arc::clone(&jar) as Arc<dyn CookieJar>);

    jar.set(Cookie::session("ga_id", "tracker"))
        .expect("seed must succeed");
    let report = sweeper.sweep(&BTreeSet::new());
    assert_eq!(report.removed, vec!["ga_id".to_string()]);

    jar.set(Cookie::session("ga_id", "tracker"))
        .expect("re-seed must succeed");
    let report = sweeper.sweep(&accepted(&["analytics"]));
    assert!(report.is_empty());
    assert_eq!(live_names(&jar), vec!["ga_id"]);
}

#[test]
fn domain_scoped_cookie_is_deleted_through_the_suffix_chain() {
    let jar = Arc::new(MemoryJar::new());
    jar.set(Cookie {
        domain: Some(".example.com".to_string()),
        ..Cookie::session("tracker", "1")
    })
    .expect("seed must succeed");

    let config = Config {
        hostname: "www.example.com".to_string(),
        ..Config::default()
    };
    let sweeper = sweeper_for(&config, Arc::clone(&jar) as Arc<dyn CookieJar>);

    let report = sweeper.sweep(&BTreeSet::new());
    assert_eq!(report.removed, vec!["tracker".to_string()]);
    assert!(live_names(&jar).is_empty());
}

#[test]
fn undeletable_cookie_falls_back_to_a_tombstone_write() {
    let jar = Arc::new(MemoryJar::new());
    // Scoped to a domain outside the suffix chain and a non-root path, so
    // every targeted delete misses.
    jar.set(Cookie {
        domain: Some("elsewhere.org".to_string()),
        path: "/app".to_string(),
        ..Cookie::session("stubborn", "1")
    })
    .expect("seed must succeed");

    let config = Config {
        hostname: "www.example.com".to_string(),
        ..Config::default()
    };
    let sweeper = sweeper_for(&config, Arc::clone(&jar) as Arc<dyn CookieJar>);

    let report = sweeper.sweep(&BTreeSet::new());
    assert!(report.removed.is_empty());
    assert_eq!(report.expired, vec!["stubborn".to_string()]);
    // The survivor is retried on the next sweep rather than forgotten.
    let report = sweeper.sweep(&BTreeSet::new());
    assert_eq!(report.expired, vec!["stubborn".to_string()]);
}

#[test]
fn unreadable_jar_yields_an_empty_report() {
    struct BrokenJar;

    impl CookieJar for BrokenJar {
        fn list(&self) -> Result<Vec<Cookie>, JarError> {
            Err(consentry::store::jar::unavailable("cookies are disabled"))
        }

        fn get(&self, _name: &str) -> Result<Option<Cookie>, JarError> {
            Err(consentry::store::jar::unavailable("cookies are disabled"))
        }

        fn set(&self, _cookie: Cookie) -> Result<(), JarError> {
            Err(consentry::store::jar::unavailable("cookies are disabled"))
        }

        fn remove(
            &self,
            _name: &str,
            _domain: Option<&str>,
            _path: &str,
        ) -> Result<bool, JarError> {
            Err(consentry::store::jar::unavailable("cookies are disabled"))
        }
    }

    let sweeper = sweeper_for(&Config::default(), Arc::new(BrokenJar));
    assert!(sweeper.sweep(&BTreeSet::new()).is_empty());
}
