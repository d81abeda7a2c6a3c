use std::sync::Once;
use std::time::Duration;

use chrono::Utc;
use uplink_core::{update, Effect, Msg, PollerConfig, PollerState, StatusKind, UploadStatus};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(uplink_logging::initialize_for_tests);
}

fn started(config: PollerConfig) -> (PollerState, Vec<Effect>) {
    update(PollerState::new(config), Msg::Started)
}

fn fresh_loading() -> UploadStatus {
    let now = Utc::now();
    UploadStatus {
        raw_timestamp: now.to_rfc3339(),
        timestamp: now,
        kind: StatusKind::Loading,
    }
}

#[test]
fn start_arms_timer_and_polls_immediately() {
    init_logging();
    let config = PollerConfig::default();
    let (state, effects) = started(config.clone());

    assert!(state.is_active());
    assert_eq!(state.consecutive_failures(), 0);
    assert_eq!(state.current_interval(), config.initial_interval);
    assert_eq!(
        effects,
        vec![
            Effect::ArmSessionTimer {
                timeout: config.session_timeout,
            },
            Effect::Poll {
                delay: Duration::ZERO,
                preferred_port: None,
            },
        ]
    );
}

#[test]
fn start_is_idempotent_while_active() {
    init_logging();
    let (state, _) = started(PollerConfig::default());
    let (state, effects) = update(state, Msg::Started);

    assert!(state.is_active());
    assert!(effects.is_empty());
}

#[test]
fn stop_when_inactive_is_noop() {
    init_logging();
    let state = PollerState::new(PollerConfig::default());
    let (state, effects) = update(state, Msg::StopRequested);

    assert!(!state.is_active());
    assert!(effects.is_empty());

    // And again: repeated stop stays silent.
    let (state, effects) = update(state, Msg::StopRequested);
    assert!(!state.is_active());
    assert!(effects.is_empty());
}

#[test]
fn stop_halts_active_session() {
    init_logging();
    let (state, _) = started(PollerConfig::default());
    let (state, effects) = update(state, Msg::StopRequested);

    assert!(!state.is_active());
    assert_eq!(effects, vec![Effect::Halt]);
}

#[test]
fn session_timeout_halts_regardless_of_progress() {
    init_logging();
    let (state, _) = started(PollerConfig::default());
    let (state, _) = update(
        state,
        Msg::PollSucceeded {
            port: 8888,
            status: Some(fresh_loading()),
            now: Utc::now(),
        },
    );

    let (state, effects) = update(state, Msg::SessionTimedOut);
    assert!(!state.is_active());
    assert_eq!(effects, vec![Effect::Halt]);
}

#[test]
fn poll_results_after_halt_are_ignored() {
    init_logging();
    let (state, _) = started(PollerConfig::default());
    let (state, _) = update(state, Msg::StopRequested);

    let (state, effects) = update(
        state,
        Msg::PollSucceeded {
            port: 8888,
            status: Some(fresh_loading()),
            now: Utc::now(),
        },
    );
    assert!(!state.is_active());
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::PollFailed {
        responding_port: None,
    });
    assert!(!state.is_active());
    assert!(effects.is_empty());
}

#[test]
fn restart_fully_reinitializes_state() {
    init_logging();
    let config = PollerConfig::default();
    let (state, _) = started(config.clone());

    // Accumulate a failure, a sticky port and a seen event.
    let (state, _) = update(state, Msg::PollFailed {
        responding_port: None,
    });
    let status = fresh_loading();
    let (state, effects) = update(
        state,
        Msg::PollSucceeded {
            port: 8890,
            status: Some(status.clone()),
            now: Utc::now(),
        },
    );
    assert!(effects.contains(&Effect::NotifyLoading));

    let (state, _) = update(state, Msg::StopRequested);
    let (state, _) = update(state, Msg::Started);

    assert_eq!(state.consecutive_failures(), 0);
    assert_eq!(state.current_interval(), config.initial_interval);
    assert_eq!(state.discovered_port(), None);

    // The seen-set was cleared: the same event reports again.
    let (_state, effects) = update(
        state,
        Msg::PollSucceeded {
            port: 8890,
            status: Some(status),
            now: Utc::now(),
        },
    );
    assert!(effects.contains(&Effect::NotifyLoading));
}
