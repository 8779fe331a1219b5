use std::collections::BTreeSet;
use std::sync::Arc;

use consentry::{
    config::{CheckboxState, Config, Method},
    consent::{ConsentStatus, TrackerErrorKind},
    store::CookieJar,
};

use crate::common::{
    config_with_method, fresh_tracker, seeded_jar, selection, tracker_on_jar, with_categories,
};

#[test]
fn given_unset_when_accepting_then_status_is_agreed() {
    let mut tracker = fresh_tracker(Config::default());
    let outcome = tracker
        .accept(&BTreeSet::new())
        .expect("accept from unset must succeed");
    assert_eq!(outcome.status, ConsentStatus::Agreed);
    assert!(!outcome.reload_required);
    assert!(tracker.has_consented(None));
}

#[test]
fn given_acknowledgment_step_when_accepting_then_agreement_is_pending_until_acknowledged() {
    let config = Config {
        popup_agreed_enabled: true,
        ..Config::default()
    };
    let mut tracker = fresh_tracker(config);

    let outcome = tracker
        .accept(&BTreeSet::new())
        .expect("accept from unset must succeed");
    assert_eq!(outcome.status, ConsentStatus::AgreedPendingAck);
    // Pending acknowledgment already counts as consent.
    assert!(tracker.has_consented(None));

    let outcome = tracker
        .acknowledge()
        .expect("acknowledge from pending must succeed");
    assert_eq!(outcome.status, ConsentStatus::Agreed);
}

#[test]
fn given_settled_agreement_when_accepting_again_then_transition_is_rejected() {
    let mut tracker = fresh_tracker(config_with_method(Method::OptIn));
    tracker
        .accept(&BTreeSet::new())
        .expect("accept from unset must succeed");

    let err = tracker
        .accept(&BTreeSet::new())
        .expect_err("accept from agreed must be rejected");
    assert_eq!(err.kind, TrackerErrorKind::InvalidTransition);
}

#[test]
fn given_declined_default_method_when_accepting_then_transition_is_allowed() {
    let mut tracker = fresh_tracker(config_with_method(Method::Default));
    tracker.decline();
    let outcome = tracker
        .accept(&BTreeSet::new())
        .expect("accept after decline must succeed under the default method");
    assert_eq!(outcome.status, ConsentStatus::Agreed);
}

#[test]
fn given_declined_opt_in_method_when_accepting_then_transition_is_rejected() {
    let mut tracker = fresh_tracker(config_with_method(Method::OptIn));
    tracker.decline();
    assert!(tracker.accept(&BTreeSet::new()).is_err());
}

#[test]
fn given_acknowledge_without_pending_agreement_then_transition_is_rejected() {
    let mut tracker = fresh_tracker(Config::default());
    let err = tracker
        .acknowledge()
        .expect_err("acknowledge from unset must be rejected");
    assert_eq!(err.kind, TrackerErrorKind::InvalidTransition);
}

#[test]
fn given_categories_method_when_accepting_nothing_then_it_counts_as_decline() {
    let config = with_categories(
        config_with_method(Method::Categories),
        &[
            ("functional", CheckboxState::Required),
            ("analytics", CheckboxState::Unchecked),
        ],
    );
    let mut tracker = fresh_tracker(config);

    // The user ticked nothing; "functional" would be force-included on any
    // read, but the empty selection still declines.
    let outcome = tracker
        .accept(&BTreeSet::new())
        .expect("accept from unset must succeed");
    assert_eq!(outcome.status, ConsentStatus::Declined);
    assert!(!tracker.has_consented(None));
}

#[test]
fn given_categories_method_when_accepting_a_selection_then_required_categories_ride_along() {
    let config = with_categories(
        config_with_method(Method::Categories),
        &[
            ("functional", CheckboxState::Required),
            ("analytics", CheckboxState::Unchecked),
        ],
    );
    let mut tracker = fresh_tracker(config);

    let outcome = tracker
        .accept(&selection(&["analytics"]))
        .expect("accept with a selection must succeed");
    assert_eq!(outcome.status, ConsentStatus::Agreed);
    assert!(tracker.has_consented(Some("analytics")));
    assert!(tracker.has_consented(Some("functional")));
    assert!(!tracker.has_consented(Some("marketing")));
}

#[test]
fn given_accept_all_then_every_configured_category_is_selected() {
    let config = with_categories(
        config_with_method(Method::Categories),
        &[
            ("functional", CheckboxState::Required),
            ("analytics", CheckboxState::Unchecked),
            ("marketing", CheckboxState::Unchecked),
        ],
    );
    let mut tracker = fresh_tracker(config);

    let outcome = tracker.accept_all().expect("accept_all must succeed");
    assert_eq!(outcome.status, ConsentStatus::Agreed);
    for category in ["functional", "analytics", "marketing"] {
        assert!(tracker.has_consented(Some(category)), "{category}");
    }
}

#[test]
fn given_save_preferences_with_empty_selection_then_it_counts_as_decline() {
    let config = with_categories(
        config_with_method(Method::Categories),
        &[("analytics", CheckboxState::Unchecked)],
    );
    let mut tracker = fresh_tracker(config);
    tracker
        .accept(&selection(&["analytics"]))
        .expect("accept must succeed");

    let outcome = tracker.save_preferences(&BTreeSet::new());
    assert_eq!(outcome.status, ConsentStatus::Declined);
}

#[test]
fn given_save_preferences_with_a_selection_then_agreement_is_rederived() {
    let config = with_categories(
        config_with_method(Method::Categories),
        &[
            ("analytics", CheckboxState::Unchecked),
            ("marketing", CheckboxState::Unchecked),
        ],
    );
    let mut tracker = fresh_tracker(config);
    tracker
        .accept(&selection(&["analytics"]))
        .expect("accept must succeed");

    let outcome = tracker.save_preferences(&selection(&["marketing"]));
    assert_eq!(outcome.status, ConsentStatus::Agreed);
    assert!(tracker.has_consented(Some("marketing")));
    assert!(!tracker.has_consented(Some("analytics")));
}

#[test]
fn withdraw_always_resets_to_unset_and_clears_categories() {
    // Seed every reachable prior state and withdraw from each.
    for seeded_status in ["0", "1", "2"] {
        let jar = seeded_jar(&[
            ("cookie-agreed", seeded_status),
            ("cookie-agreed-version", "1"),
            ("cookie-agreed-categories", r#"["analytics"]"#),
        ]);
        let mut tracker = tracker_on_jar(Config::default(), Arc::clone(&jar) as Arc<dyn CookieJar>);

        let outcome = tracker.withdraw();
        assert_eq!(outcome.status, ConsentStatus::Unset, "from {seeded_status}");
        assert!(outcome.reload_required);
        assert!(tracker.categories().is_empty());
        assert!(jar
            .get("cookie-agreed")
            .expect("jar read must succeed")
            .is_none());
    }
}

#[test]
fn given_withdraw_from_unset_then_state_stays_unset() {
    let mut tracker = fresh_tracker(Config::default());
    let outcome = tracker.withdraw();
    assert_eq!(outcome.status, ConsentStatus::Unset);
    assert!(tracker.categories().is_empty());
}

#[test]
fn given_policy_version_change_then_accept_is_valid_from_settled_states() {
    let jar = seeded_jar(&[("cookie-agreed", "2"), ("cookie-agreed-version", "1")]);
    let config = Config {
        cookie_policy_version: "2".to_string(),
        ..config_with_method(Method::OptIn)
    };
    let mut tracker = tracker_on_jar(config, Arc::clone(&jar) as Arc<dyn CookieJar>);
    assert!(tracker.version_changed());

    // Settled "agreed" would normally reject accept under opt-in, but the
    // version bump reopens the decision.
    tracker
        .accept(&BTreeSet::new())
        .expect("accept after a version bump must succeed");
    assert!(!tracker.version_changed());
    let version = jar
        .get("cookie-agreed-version")
        .expect("jar read must succeed")
        .expect("version cookie must exist");
    assert_eq!(version.value, "2");
}

#[test]
fn given_reload_page_configured_then_transitions_request_a_reload() {
    let config = Config {
        reload_page: true,
        ..Config::default()
    };
    let mut tracker = fresh_tracker(config);
    let outcome = tracker
        .accept(&BTreeSet::new())
        .expect("accept must succeed");
    assert!(outcome.reload_required);
}

#[test]
fn given_repeated_decline_then_second_transition_is_a_no_op() {
    let mut tracker = fresh_tracker(Config {
        reload_page: true,
        ..Config::default()
    });
    let first = tracker.decline();
    assert!(first.reload_required);
    let second = tracker.decline();
    assert!(!second.reload_required);
    assert_eq!(second.status, ConsentStatus::Declined);
}

#[test]
fn enforcement_requirement_follows_the_configured_method() {
    // default: never enforced.
    let tracker = fresh_tracker(config_with_method(Method::Default));
    assert!(!tracker.enforcement_required());

    // opt_in: enforced until consent.
    let mut tracker = fresh_tracker(config_with_method(Method::OptIn));
    assert!(tracker.enforcement_required());
    tracker.accept(&BTreeSet::new()).expect("accept must succeed");
    assert!(!tracker.enforcement_required());

    // opt_out: not enforced while undecided, enforced after a decline.
    let mut tracker = fresh_tracker(config_with_method(Method::OptOut));
    assert!(!tracker.enforcement_required());
    tracker.decline();
    assert!(tracker.enforcement_required());

    // categories: always enforced.
    let config = with_categories(
        config_with_method(Method::Categories),
        &[("analytics", CheckboxState::Unchecked)],
    );
    let mut tracker = fresh_tracker(config);
    tracker
        .accept(&selection(&["analytics"]))
        .expect("accept must succeed");
    assert!(tracker.enforcement_required());
}

#[test]
fn given_automatic_removal_disabled_then_enforcement_is_never_required() {
    let config = Config {
        automatic_cookies_removal: false,
        ..config_with_method(Method::OptIn)
    };
    let tracker = fresh_tracker(config);
    assert!(!tracker.enforcement_required());
}

#[test]
fn given_jar_seeded_outside_the_tracker_then_state_is_read_at_initialization() {
    let jar = seeded_jar(&[
        ("cookie-agreed", "2"),
        ("cookie-agreed-version", "1"),
        ("cookie-agreed-categories", r#"["analytics"]"#),
    ]);
    let tracker = tracker_on_jar(Config::default(), jar);
    assert_eq!(tracker.status(), ConsentStatus::Agreed);
    assert!(tracker.has_consented(Some("analytics")));
}
