use crate::{Effect, Msg, PollerState, StatusKind};
use std::time::Duration;

/// Pure update function: applies a message to state and returns any effects.
///
/// No IO happens here; the driver executes the returned effects and feeds the
/// results back as further messages. Cycles are strictly sequential, so a
/// dedup insertion always lands before the next poll result can arrive.
pub fn update(mut state: PollerState, msg: Msg) -> (PollerState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            // Idempotent: a second start while active changes nothing.
            if state.is_active() {
                Vec::new()
            } else {
                state.begin_session();
                vec![
                    Effect::ArmSessionTimer {
                        timeout: state.config().session_timeout,
                    },
                    Effect::Poll {
                        delay: Duration::ZERO,
                        preferred_port: None,
                    },
                ]
            }
        }
        Msg::StopRequested | Msg::SessionTimedOut => {
            if state.is_active() {
                state.end_session();
                vec![Effect::Halt]
            } else {
                Vec::new()
            }
        }
        Msg::PollFailed { responding_port } => {
            if !state.is_active() {
                return (state, Vec::new());
            }
            let failures = state.record_failure(responding_port);
            if failures >= state.config().max_consecutive_failures {
                state.end_session();
                vec![Effect::Halt]
            } else {
                state.back_off();
                vec![Effect::Poll {
                    delay: state.current_interval(),
                    preferred_port: state.discovered_port(),
                }]
            }
        }
        Msg::PollSucceeded { port, status, now } => {
            if !state.is_active() {
                return (state, Vec::new());
            }
            state.record_success(port);
            state.speed_up();

            let mut effects = Vec::new();
            if let Some(status) = status {
                if state.should_report(&status, now) {
                    state.mark_seen(status.event_key());
                    match status.kind {
                        StatusKind::Loading => {
                            // Something is actively happening; poll at full speed.
                            state.reset_interval();
                            effects.push(Effect::NotifyLoading);
                        }
                        StatusKind::Complete { link } => {
                            // Success is terminal.
                            state.end_session();
                            effects.push(Effect::NotifyComplete { link });
                            effects.push(Effect::Halt);
                            return (state, effects);
                        }
                        StatusKind::Failed { message } => {
                            effects.push(Effect::NotifyError { message });
                            if state.config().stop_on_error {
                                state.end_session();
                                effects.push(Effect::Halt);
                                return (state, effects);
                            }
                            // The transport worked, so the failure counter is
                            // untouched, but pacing backs off: the server may
                            // retry the upload and there is no hurry.
                            state.back_off();
                        }
                    }
                }
            }
            effects.push(Effect::Poll {
                delay: state.current_interval(),
                preferred_port: state.discovered_port(),
            });
            effects
        }
    };

    (state, effects)
}
