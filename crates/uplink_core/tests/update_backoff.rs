use std::sync::Once;

use chrono::Utc;
use uplink_core::{update, Effect, Msg, PollerConfig, PollerState, StatusKind, UploadStatus};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(uplink_logging::initialize_for_tests);
}

fn started(config: PollerConfig) -> PollerState {
    let (state, _) = update(PollerState::new(config), Msg::Started);
    state
}

fn status(kind: StatusKind) -> UploadStatus {
    let now = Utc::now();
    UploadStatus {
        raw_timestamp: now.to_rfc3339(),
        timestamp: now,
        kind,
    }
}

fn succeed(state: PollerState, port: u16, status: Option<UploadStatus>) -> (PollerState, Vec<Effect>) {
    update(
        state,
        Msg::PollSucceeded {
            port,
            status,
            now: Utc::now(),
        },
    )
}

#[test]
fn backoff_is_monotone_and_capped() {
    init_logging();
    let config = PollerConfig {
        max_consecutive_failures: 100,
        ..PollerConfig::default()
    };
    let max_interval = config.max_interval;
    let mut state = started(config);

    let mut previous = state.current_interval();
    for _ in 0..20 {
        let (next, _) = update(state, Msg::PollFailed {
            responding_port: None,
        });
        state = next;
        assert!(state.current_interval() >= previous);
        assert!(state.current_interval() <= max_interval);
        previous = state.current_interval();
    }
    assert_eq!(state.current_interval(), max_interval);
}

#[test]
fn third_consecutive_failure_halts_silently() {
    init_logging();
    // Default max_consecutive_failures is 3.
    let mut state = started(PollerConfig::default());

    for expected_failures in 1..=2u32 {
        let (next, effects) = update(state, Msg::PollFailed {
            responding_port: None,
        });
        state = next;
        assert_eq!(state.consecutive_failures(), expected_failures);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Poll { .. }));
    }

    let (state, effects) = update(state, Msg::PollFailed {
        responding_port: None,
    });
    assert!(!state.is_active());
    assert_eq!(effects, vec![Effect::Halt]);
}

#[test]
fn success_resets_failure_count() {
    init_logging();
    let state = started(PollerConfig::default());
    let (state, _) = update(state, Msg::PollFailed {
        responding_port: None,
    });
    let (state, _) = update(state, Msg::PollFailed {
        responding_port: None,
    });
    assert_eq!(state.consecutive_failures(), 2);

    let (state, _) = succeed(state, 8888, None);
    assert_eq!(state.consecutive_failures(), 0);
}

#[test]
fn success_speeds_up_but_never_below_floor() {
    init_logging();
    let config = PollerConfig {
        max_consecutive_failures: 100,
        ..PollerConfig::default()
    };
    let floor = config.initial_interval;
    let mut state = started(config);

    for _ in 0..4 {
        let (next, _) = update(state, Msg::PollFailed {
            responding_port: None,
        });
        state = next;
    }
    let backed_off = state.current_interval();
    assert!(backed_off > floor);

    // Each empty success shortens the interval, never past the floor and
    // never above its pre-success value.
    for _ in 0..10 {
        let before = state.current_interval();
        let (next, _) = succeed(state, 8888, None);
        state = next;
        assert!(state.current_interval() <= before);
        assert!(state.current_interval() >= floor);
    }
    assert_eq!(state.current_interval(), floor);
}

#[test]
fn loading_event_snaps_interval_back_to_floor() {
    init_logging();
    let config = PollerConfig {
        max_consecutive_failures: 100,
        ..PollerConfig::default()
    };
    let floor = config.initial_interval;
    let mut state = started(config);

    for _ in 0..5 {
        let (next, _) = update(state, Msg::PollFailed {
            responding_port: None,
        });
        state = next;
    }
    assert!(state.current_interval() > floor);

    let (state, effects) = succeed(state, 8888, Some(status(StatusKind::Loading)));
    assert!(effects.contains(&Effect::NotifyLoading));
    assert_eq!(state.current_interval(), floor);
    assert_eq!(
        effects.last(),
        Some(&Effect::Poll {
            delay: floor,
            preferred_port: Some(8888),
        })
    );
}

#[test]
fn server_error_backs_off_without_counting_as_connection_failure() {
    init_logging();
    let state = started(PollerConfig::default());
    let floor = state.current_interval();

    let (state, effects) = succeed(
        state,
        8888,
        Some(status(StatusKind::Failed {
            message: "upload failed".to_string(),
        })),
    );

    assert!(effects.contains(&Effect::NotifyError {
        message: "upload failed".to_string(),
    }));
    assert!(state.is_active());
    assert_eq!(state.consecutive_failures(), 0);
    assert!(state.current_interval() > floor);
}

#[test]
fn discovered_port_sticks_until_it_fails() {
    init_logging();
    let state = started(PollerConfig::default());

    let (state, effects) = succeed(state, 8890, None);
    assert_eq!(state.discovered_port(), Some(8890));
    assert_eq!(
        effects.last().map(|effect| match effect {
            Effect::Poll { preferred_port, .. } => *preferred_port,
            _ => None,
        }),
        Some(Some(8890))
    );

    // A body that decodes but carries garbage keeps the port sticky.
    let (state, _) = update(state, Msg::PollFailed {
        responding_port: Some(8890),
    });
    assert_eq!(state.discovered_port(), Some(8890));

    // A dead port clears the stickiness; the next cycle scans from scratch.
    let (state, effects) = update(state, Msg::PollFailed {
        responding_port: None,
    });
    assert_eq!(state.discovered_port(), None);
    assert!(matches!(
        effects[0],
        Effect::Poll {
            preferred_port: None,
            ..
        }
    ));
}
