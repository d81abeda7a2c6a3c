//! `uplink-watch`: run one polling session against the local upload-status
//! server and print the share link once the upload completes.
//!
//! Exit status: 0 when a link was obtained, 1 when the session ended without
//! one (server unreachable, upload error, or timeout).

use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use uplink_core::PollerConfig;
use uplink_engine::{ChannelStatusSink, PollerHandle, ProbeSettings, StatusEvent};
use uplink_logging::{uplink_info, uplink_warn, LogDestination};

#[derive(Debug, Parser)]
#[command(name = "uplink-watch", about = "Watch the local upload-status server for a share link")]
struct Args {
    /// Candidate ports to scan for the status server, in order.
    #[arg(long, value_delimiter = ',', default_values_t = vec![8888u16, 8889, 8890, 8891, 8892])]
    ports: Vec<u16>,

    /// Host the status server binds to.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Give up if no terminal event arrives within this many seconds.
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Ignore status events older than this many seconds.
    #[arg(long, default_value_t = 60)]
    freshness_secs: u64,

    /// End the session on a server-reported upload error instead of waiting
    /// for a possible retry.
    #[arg(long)]
    stop_on_error: bool,

    /// Also write logs to ./uplink.log.
    #[arg(long)]
    log_file: bool,

    /// Verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let destination = if args.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    uplink_logging::initialize(destination, level);

    let config = PollerConfig {
        session_timeout: Duration::from_secs(args.timeout_secs),
        freshness_window: Duration::from_secs(args.freshness_secs),
        candidate_ports: args.ports,
        stop_on_error: args.stop_on_error,
        ..PollerConfig::default()
    };
    let settings = ProbeSettings {
        host: args.host,
        ..ProbeSettings::default()
    };

    let (tx, rx) = mpsc::channel();
    let poller = PollerHandle::new(config, settings, Arc::new(ChannelStatusSink::new(tx)))?;
    poller.start();

    let mut saw_error = false;
    // The poller guarantees termination, so this loop always ends: the sink
    // channel delivers SessionEnded (or closes) no matter how the session
    // finishes.
    loop {
        match rx.recv() {
            Ok(StatusEvent::Loading) => {
                uplink_info!("upload in progress...");
            }
            Ok(StatusEvent::Complete { link }) => {
                println!("{link}");
                return Ok(ExitCode::SUCCESS);
            }
            Ok(StatusEvent::Error { message }) => {
                uplink_warn!("upload error: {}", message);
                saw_error = true;
            }
            Ok(StatusEvent::SessionEnded) | Err(_) => {
                if !saw_error {
                    uplink_warn!("session ended without a link (server down or timed out)");
                }
                return Ok(ExitCode::FAILURE);
            }
        }
    }
}
