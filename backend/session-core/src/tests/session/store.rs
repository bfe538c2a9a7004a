use crate::session::store::{Session, SessionCommand, SessionPhase, SessionStore};

use models::Identity;

use serde_json::json;

fn identity(id: u64) -> Identity {
    Identity::from_value(json!({ "id": id })).unwrap()
}

/// **VALUE**: Verifies that bootstrapping can start only once per session.
///
/// **WHY THIS MATTERS**: The UI shows a splash screen while bootstrapping. A second
/// bootstrap after login would flash the splash again and could overwrite the fresh
/// identity with a stale recovery result.
///
/// **BUG THIS CATCHES**: Would catch if the `bootstrapped` flag is not consulted by
/// `BeginBootstrap`.
#[test]
fn given_resolved_bootstrap_when_begin_again_then_rejected() {
    // GIVEN: A session that already bootstrapped
    let mut session = Session::default();
    assert!(session.apply(SessionCommand::BeginBootstrap));
    assert!(session.apply(SessionCommand::BootstrapResolved(None)));

    // WHEN: Trying to bootstrap again
    let accepted = session.apply(SessionCommand::BeginBootstrap);

    // THEN: Rejected and not bootstrapping
    assert!(!accepted);
    assert!(!session.is_bootstrapping());
    assert_eq!(session.phase(), SessionPhase::Unauthenticated);
}

/// **VALUE**: Verifies that a resolution without a preceding begin is ignored.
///
/// **WHY THIS MATTERS**: A late resolution must never overwrite a session that was
/// established by login.
///
/// **BUG THIS CATCHES**: Would catch if `BootstrapResolved` stops checking `bootstrapping`.
#[test]
fn given_signed_in_session_when_stray_bootstrap_resolution_then_identity_kept() {
    // GIVEN: Bootstrapped, then signed in
    let mut session = Session::default();
    session.apply(SessionCommand::BeginBootstrap);
    session.apply(SessionCommand::BootstrapResolved(None));
    session.apply(SessionCommand::SignedIn(identity(1)));

    // WHEN: A stray resolution arrives
    let changed = session.apply(SessionCommand::BootstrapResolved(None));

    // THEN: Still signed in
    assert!(!changed);
    assert_eq!(session.identity(), Some(&identity(1)));
}

/// **VALUE**: Verifies `authenticated == identity.is_some()` through a mixed sequence.
///
/// **WHY THIS MATTERS**: The UI gates routes on `is_authenticated()`; any divergence
/// from the identity would render a protected page with no user.
///
/// **BUG THIS CATCHES**: Would catch a stored flag being reintroduced and forgotten in
/// one transition.
#[test]
fn given_any_command_sequence_when_applied_then_authenticated_tracks_identity() {
    // GIVEN: A long sequence of transitions
    let commands = vec![
        SessionCommand::BeginBootstrap,
        SessionCommand::BootstrapResolved(Some(identity(1))),
        SessionCommand::SignedOut,
        SessionCommand::LoginFailed("nope".to_string()),
        SessionCommand::SignedIn(identity(2)),
        SessionCommand::IdentityRefreshed(identity(3)),
        SessionCommand::LoginFailed("again".to_string()),
        SessionCommand::SignedOut,
        SessionCommand::SignedOut,
    ];

    // WHEN / THEN: Invariant holds after every step
    let mut session = Session::default();
    for command in commands {
        session.apply(command);
        assert_eq!(session.is_authenticated(), session.identity().is_some());
        assert_eq!(
            session.phase() == SessionPhase::Authenticated,
            session.identity().is_some()
        );
    }
}

/// **VALUE**: Verifies that a failed login records the error without touching identity,
/// and a later sign-in clears it.
///
/// **WHY THIS MATTERS**: A wrong password while already signed in must not log the
/// user out, and a stale error must not linger after success.
///
/// **BUG THIS CATCHES**: Would catch `LoginFailed` clearing identity or `SignedIn` keeping
/// the old message.
#[test]
fn given_login_failure_then_success_when_applied_then_error_recorded_then_cleared() {
    // GIVEN: Unauthenticated session
    let mut session = Session::default();

    // WHEN: A failure
    session.apply(SessionCommand::LoginFailed("Invalid credentials".to_string()));

    // THEN: Error recorded, still not authenticated
    assert_eq!(session.last_error(), Some("Invalid credentials"));
    assert!(!session.is_authenticated());

    // WHEN: A success
    session.apply(SessionCommand::SignedIn(identity(1)));

    // THEN: Error gone
    assert_eq!(session.last_error(), None);
    assert!(session.is_authenticated());
}

/// **VALUE**: Verifies that subscribers see a change as soon as `apply` returns.
///
/// **WHY THIS MATTERS**: UI observers must never read a stale session after a transition.
///
/// **BUG THIS CATCHES**: Would catch an asynchronous (actor-style) store that lags behind
/// the transition.
#[test]
fn given_subscriber_when_command_applied_then_sees_new_state_immediately() {
    // GIVEN: A store with a subscriber
    let store = SessionStore::new();
    let mut receiver = store.subscribe();
    assert_eq!(store.phase(), SessionPhase::Uninitialized);

    // WHEN: Applying a command
    store.apply(SessionCommand::BeginBootstrap);

    // THEN: Receiver is marked changed and reads the new state
    assert!(receiver.has_changed().unwrap());
    assert!(receiver.borrow_and_update().is_bootstrapping());
    assert!(store.is_bootstrapping());
}

/// **VALUE**: Verifies that no-op commands do not wake subscribers.
///
/// **WHY THIS MATTERS**: Signing out twice should not make every view re-render.
///
/// **BUG THIS CATCHES**: Would catch `send_modify` being used instead of
/// `send_if_modified`.
#[test]
fn given_signed_out_store_when_signed_out_again_then_subscribers_not_notified() {
    // GIVEN: A store that is already signed out
    let store = SessionStore::new();
    let mut receiver = store.subscribe();
    receiver.borrow_and_update();

    // WHEN: Signing out again
    let changed = store.apply(SessionCommand::SignedOut);

    // THEN: Nothing changed
    assert!(!changed);
    assert!(!receiver.has_changed().unwrap());
}
