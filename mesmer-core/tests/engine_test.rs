//! Integration tests for the session engine.
//!
//! Drives the full gate pipeline with a manual clock and checks the
//! lifecycle guarantees end to end.

use std::sync::Arc;
use std::time::Duration;

use mesmer_core::{
    Clock, EngineConfig, IdentityKey, InboundMessage, ManualClock, SessionEngine, TriggerOutcome,
};

fn message(user: &str, text: &str) -> InboundMessage {
    InboundMessage {
        chat_scope_id: "guild-1".into(),
        user_id: user.into(),
        text: text.into(),
        is_bot_mentioned: true,
        caller_is_admin: false,
    }
}

fn identity(user: &str) -> IdentityKey {
    IdentityKey::new("guild-1", user)
}

fn engine(config: EngineConfig) -> (SessionEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let engine = SessionEngine::new(config).with_clock(clock.clone());
    (engine, clock)
}

fn base_config() -> EngineConfig {
    EngineConfig {
        trigger_keywords: vec!["activate".into()],
        duration_seconds: 180,
        cooldown_seconds: 30,
        ..Default::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session lifetime
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn session_visible_for_exactly_its_duration() {
    let (engine, clock) = engine(base_config());

    assert!(matches!(
        engine.on_message(&message("alice", "activate")),
        TriggerOutcome::Started(_)
    ));

    // Active through the whole window...
    for step in [0u64, 1, 90, 88] {
        clock.advance(Duration::from_secs(step));
        assert!(engine.is_active(&identity("alice")), "at {step}");
        assert!(engine.directive_for(&identity("alice")).is_some());
    }

    // ...and gone exactly at expiry (t=180)
    clock.advance(Duration::from_secs(1));
    assert!(!engine.is_active(&identity("alice")));
    assert!(engine.directive_for(&identity("alice")).is_none());
}

#[test]
fn continue_does_not_reset_expiry() {
    let (engine, clock) = engine(base_config());

    engine.on_message(&message("alice", "activate"));
    clock.advance(Duration::from_secs(10));

    match engine.on_message(&message("alice", "activate")) {
        TriggerOutcome::Continued(session) => {
            // Still expires 180s after the original start, not 190
            assert_eq!(session.remaining(clock.now()), Duration::from_secs(170));
        }
        other => panic!("expected Continued, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cooldown
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cooldown_allows_exactly_one_start_per_window() {
    let (engine, clock) = engine(EngineConfig {
        duration_seconds: 5,
        ..base_config()
    });

    // First attempt starts; the session itself lapses at t=5
    assert!(matches!(
        engine.on_message(&message("alice", "activate")),
        TriggerOutcome::Started(_)
    ));

    // Second attempt inside the 30s window is denied
    clock.advance(Duration::from_secs(10));
    match engine.on_message(&message("alice", "activate")) {
        TriggerOutcome::CooldownActive { remaining } => {
            assert_eq!(remaining, Duration::from_secs(20));
        }
        other => panic!("expected CooldownActive, got {other:?}"),
    }

    // Third attempt after the window succeeds
    clock.advance(Duration::from_secs(21));
    assert!(matches!(
        engine.on_message(&message("alice", "activate")),
        TriggerOutcome::Started(_)
    ));
}

#[test]
fn denied_attempt_does_not_extend_cooldown() {
    let (engine, clock) = engine(EngineConfig {
        duration_seconds: 5,
        ..base_config()
    });

    engine.on_message(&message("alice", "activate"));

    // Denied at t=20; the window still ends at t=30, not t=50
    clock.advance(Duration::from_secs(20));
    assert!(matches!(
        engine.on_message(&message("alice", "activate")),
        TriggerOutcome::CooldownActive { .. }
    ));

    clock.advance(Duration::from_secs(10));
    assert!(matches!(
        engine.on_message(&message("alice", "activate")),
        TriggerOutcome::Started(_)
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Worked examples
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn single_identity_full_cycle() {
    // duration=180s, cooldown=30s, max_concurrent=1
    let (engine, clock) = engine(EngineConfig {
        max_concurrent: 1,
        ..base_config()
    });

    // t=0: A triggers → Started
    assert!(matches!(
        engine.on_message(&message("a", "activate")),
        TriggerOutcome::Started(_)
    ));

    // t=10: A triggers again → continue, expiry still t=180
    clock.advance(Duration::from_secs(10));
    match engine.on_message(&message("a", "activate")) {
        TriggerOutcome::Continued(session) => {
            assert_eq!(session.remaining(clock.now()), Duration::from_secs(170));
        }
        other => panic!("expected Continued, got {other:?}"),
    }

    // t=200: the session lapsed at t=180 and the cooldown long since passed
    clock.advance(Duration::from_secs(190));
    match engine.on_message(&message("a", "activate")) {
        TriggerOutcome::Started(session) => {
            // New expiry at t=380
            assert_eq!(session.remaining(clock.now()), Duration::from_secs(180));
        }
        other => panic!("expected Started, got {other:?}"),
    }
}

#[test]
fn capacity_frees_up_on_natural_expiry() {
    // max_concurrent=1
    let (engine, clock) = engine(EngineConfig {
        max_concurrent: 1,
        ..base_config()
    });

    // t=0: A starts
    assert!(matches!(
        engine.on_message(&message("a", "activate")),
        TriggerOutcome::Started(_)
    ));

    // t=5: B is refused, the slot is taken
    clock.advance(Duration::from_secs(5));
    assert!(matches!(
        engine.on_message(&message("b", "activate")),
        TriggerOutcome::CapacityExceeded
    ));

    // t=181: A expired at t=180, B gets the slot
    clock.advance(Duration::from_secs(176));
    assert!(matches!(
        engine.on_message(&message("b", "activate")),
        TriggerOutcome::Started(_)
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn concurrent_distinct_identities_respect_capacity() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    let (engine, _clock) = engine(EngineConfig {
        max_concurrent: 3,
        ..base_config()
    });
    let barrier = Barrier::new(10);
    let started = AtomicUsize::new(0);
    let refused = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for i in 0..10 {
            let engine = &engine;
            let barrier = &barrier;
            let started = &started;
            let refused = &refused;
            scope.spawn(move || {
                barrier.wait();
                match engine.on_message(&message(&format!("user-{i}"), "activate")) {
                    TriggerOutcome::Started(_) => {
                        started.fetch_add(1, Ordering::SeqCst);
                    }
                    TriggerOutcome::CapacityExceeded => {
                        refused.fetch_add(1, Ordering::SeqCst);
                    }
                    other => panic!("unexpected outcome {other:?}"),
                }
            });
        }
    });

    assert_eq!(started.load(Ordering::SeqCst), 3);
    assert_eq!(refused.load(Ordering::SeqCst), 7);
    assert_eq!(engine.status().active_sessions, 3);
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin operations
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn clear_all_empties_the_store() {
    let (engine, _clock) = engine(base_config());

    engine.on_message(&message("a", "activate"));
    engine.on_message(&message("b", "activate"));
    assert_eq!(engine.status().active_sessions, 2);

    let report = engine.clear();
    assert_eq!(report.cleared, 2);
    assert!(!engine.is_active(&identity("a")));
    assert!(!engine.is_active(&identity("b")));
    assert!(engine.directive_for(&identity("a")).is_none());
}

#[test]
fn invalid_reload_touches_nothing() {
    let (engine, _clock) = engine(base_config());
    engine.on_message(&message("a", "activate"));

    let err = engine
        .reload(EngineConfig {
            duration_seconds: 0,
            max_concurrent: 0,
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.is_config_invalid());

    // Previous snapshot and the in-flight session both survive
    assert_eq!(engine.config().duration_seconds, 180);
    assert!(engine.is_active(&identity("a")));
}

#[test]
fn status_lists_sessions_oldest_first() {
    let (engine, clock) = engine(base_config());

    engine.on_message(&message("first", "activate"));
    clock.advance(Duration::from_secs(10));
    engine.on_message(&message("second", "activate"));

    let status = engine.status();
    assert_eq!(status.sessions.len(), 2);
    assert_eq!(status.sessions[0].identity, identity("first").masked());
    assert_eq!(status.sessions[1].identity, identity("second").masked());
    assert!(status.sessions[0].remaining_secs < status.sessions[1].remaining_secs);
}

#[tokio::test]
async fn disable_ends_every_session_and_blocks_triggers() {
    let (engine, _clock) = engine(base_config());

    engine.on_message(&message("a", "activate"));
    let report = engine.set_enabled(false).await.unwrap();
    assert_eq!(report.cleared, 1);

    assert!(matches!(
        engine.on_message(&message("a", "activate")),
        TriggerOutcome::Disabled
    ));

    engine.set_enabled(true).await.unwrap();
    assert!(matches!(
        engine.on_message(&message("a", "activate")),
        TriggerOutcome::Started(_)
    ));
}
