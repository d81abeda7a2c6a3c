use std::sync::Arc;
use std::thread;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use uplink_core::{update, Effect, Msg, PollerConfig, PollerState};
use uplink_logging::{uplink_error, uplink_info, uplink_warn};

use crate::{PollOutcome, ProbeError, ProbeSettings, Prober, ReqwestProber, StatusSink};

enum Command {
    Start,
    Stop,
}

/// Handle to the poller's dedicated driver thread.
///
/// The driver runs a single-threaded runtime, so poll cycles never overlap:
/// each cycle's network call completes before the next is scheduled. One
/// handle drives at most one session at a time; `start()` and `stop()` are
/// idempotent and never fail. Dropping the handle stops everything.
#[derive(Clone)]
pub struct PollerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl PollerHandle {
    pub fn new(
        config: PollerConfig,
        settings: ProbeSettings,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self, ProbeError> {
        let prober = ReqwestProber::new(settings)?;
        Ok(Self::with_prober(config, Arc::new(prober), sink))
    }

    /// Driver with an injected prober; `new` wires in the reqwest one.
    pub fn with_prober(
        config: PollerConfig,
        prober: Arc<dyn Prober>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    uplink_error!("poller runtime failed to start: {}", err);
                    return;
                }
            };
            runtime.block_on(run(cmd_rx, config, prober, sink));
        });
        Self { cmd_tx }
    }

    /// Begin a polling session. No-op while a session is already running.
    pub fn start(&self) {
        let _ = self.cmd_tx.send(Command::Start);
    }

    /// End the current session, cancelling all timers. Safe when idle and
    /// safe to call repeatedly.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }
}

async fn run(
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    config: PollerConfig,
    prober: Arc<dyn Prober>,
    sink: Arc<dyn StatusSink>,
) {
    while let Some(command) = cmd_rx.recv().await {
        match command {
            Command::Start => {
                uplink_info!("polling session started");
                run_session(&mut cmd_rx, &config, prober.as_ref(), sink.as_ref()).await;
                uplink_info!("polling session ended");
                sink.on_session_end();
            }
            // Stop while idle is a no-op.
            Command::Stop => {}
        }
    }
}

/// Pending timers for the running session. Dropping these on return is what
/// "cancelling" means; nothing dangles past the session.
struct Timers {
    deadline: Instant,
    next_poll: Option<(Instant, Option<u16>)>,
}

#[derive(PartialEq)]
enum Flow {
    Continue,
    Halted,
}

async fn run_session(
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    config: &PollerConfig,
    prober: &dyn Prober,
    sink: &dyn StatusSink,
) {
    let (mut state, effects) = update(PollerState::new(config.clone()), Msg::Started);
    let mut timers = Timers {
        deadline: Instant::now() + config.session_timeout,
        next_poll: None,
    };
    if apply_effects(effects, sink, &mut timers) == Flow::Halted {
        return;
    }

    loop {
        // Every non-halting update schedules a poll, so this is always set.
        let Some((poll_at, preferred_port)) = timers.next_poll else {
            return;
        };

        // Biased: queued commands are drained before any timer fires, so a
        // redundant `start()` is absorbed as a no-op instead of leaking into
        // the idle loop after this session ends.
        tokio::select! {
            biased;

            command = cmd_rx.recv() => match command {
                Some(Command::Start) => {
                    // Already active; idempotent.
                    continue;
                }
                Some(Command::Stop) | None => {
                    let (_state, effects) = update(state, Msg::StopRequested);
                    apply_effects(effects, sink, &mut timers);
                    return;
                }
            },
            _ = time::sleep_until(timers.deadline) => {
                uplink_info!("session timeout reached, stopping poller");
                let (_state, effects) = update(state, Msg::SessionTimedOut);
                apply_effects(effects, sink, &mut timers);
                return;
            }
            _ = time::sleep_until(poll_at) => {
                let outcome = prober.poll(preferred_port, &config.candidate_ports).await;
                let msg = match outcome {
                    PollOutcome::Success { port, status } => Msg::PollSucceeded {
                        port,
                        status,
                        now: Utc::now(),
                    },
                    PollOutcome::Malformed { port } => Msg::PollFailed {
                        responding_port: Some(port),
                    },
                    PollOutcome::Unreachable => Msg::PollFailed {
                        responding_port: None,
                    },
                };
                timers.next_poll = None;
                let (next_state, effects) = update(state, msg);
                state = next_state;
                if apply_effects(effects, sink, &mut timers) == Flow::Halted {
                    return;
                }
            }
        }
    }
}

fn apply_effects(effects: Vec<Effect>, sink: &dyn StatusSink, timers: &mut Timers) -> Flow {
    for effect in effects {
        match effect {
            Effect::ArmSessionTimer { timeout } => {
                timers.deadline = Instant::now() + timeout;
            }
            Effect::Poll {
                delay,
                preferred_port,
            } => {
                timers.next_poll = Some((Instant::now() + delay, preferred_port));
            }
            Effect::NotifyLoading => {
                uplink_info!("upload in progress");
                sink.on_loading();
            }
            Effect::NotifyComplete { link } => {
                uplink_info!("upload complete: {}", link);
                sink.on_complete(&link);
            }
            Effect::NotifyError { message } => {
                uplink_warn!("server reported upload error: {}", message);
                sink.on_error(&message);
            }
            Effect::Halt => return Flow::Halted,
        }
    }
    Flow::Continue
}
