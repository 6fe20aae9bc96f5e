//! `safeguard` – robot safety supervisor command line.
//!
//! Runs one [`SafetySupervisor`] against a line-oriented sensor feed:
//!
//! 1. Loads `~/.safeguard/config.toml` (defaults when absent).
//! 2. Reads `battery`, `scan`, `activate` and `quit` lines from **stdin**
//!    and hands the samples to the [`SensorIntake`].
//! 3. Writes every velocity command as one JSON object per line on
//!    **stdout**.  Banner and status text go to stderr so stdout stays
//!    machine-readable.
//! 4. With `diagnostics = true` (or `SAFEGUARD_DIAGNOSTICS=true`) echoes
//!    the supervisor's transition log to stderr as JSON lines.
//! 5. On **Ctrl-C** (or `quit`) stops the loop and emits a final stop.

mod config;
mod feed;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use safeguard_hal::ChannelSink;
use safeguard_middleware::{EventBus, SampleSlots, SourceSubscriber};
use safeguard_runtime::{init_tracing, SafetySupervisor, SensorIntake};
use safeguard_types::Command;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};

use crate::config::ConfigSource;
use crate::feed::FeedLine;

/// How long runtime shutdown waits for the blocking stdin reader.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() {
    // Hold the guard until exit so pending spans are flushed.
    let _tracing = init_tracing("safeguard");

    print_banner();

    let cfg = match config::load() {
        Ok((cfg, ConfigSource::File(path))) => {
            eprintln!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok((cfg, ConfigSource::Defaults)) => {
            eprintln!("  No config file found; using defaults.");
            cfg
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            config::from_env()
        }
    };
    eprintln!(
        "  battery < {}%  |  obstacle < {}  |  rotate {} rad/s  |  tick {} ms\n",
        cfg.safety.battery_threshold,
        cfg.safety.collision_threshold,
        cfg.safety.rotation_angular_velocity,
        cfg.tick_interval_ms
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start Tokio runtime");
            std::process::exit(1);
        }
    };

    runtime.block_on(run(cfg));
    // Tokio's stdin reader sits on a blocking thread that may still be
    // parked in `read`; don't wait on it forever.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

async fn run(cfg: config::Config) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let ctrlc_tx = Arc::clone(&shutdown_tx);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!(
            "{}",
            "⚠  Ctrl-C received – stopping the base …".yellow().bold()
        );
        let _ = ctrlc_tx.send(true);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; use `quit` to stop");
    }

    // ── Wiring ────────────────────────────────────────────────────────────
    let bus = EventBus::default();
    let slots = SampleSlots::new();
    let (sink, commands) = ChannelSink::new("cmd_vel", cfg.command_queue);
    let mut supervisor = SafetySupervisor::new(
        cfg.supervisor_config(),
        &slots,
        Box::new(sink),
        bus.clone(),
    );
    let intake = SensorIntake::new(slots, bus.clone());

    // Subscribe before the loop starts so the first transitions are seen.
    let diagnostics = cfg.diagnostics.then(|| {
        let events = bus.subscribe_source("safeguard-runtime");
        tokio::spawn(async move {
            if let Err(e) = echo_diagnostics(events, tokio::io::stderr()).await {
                warn!(error = %e, "diagnostic echo stopped");
            }
        })
    });
    drop(bus);

    let (activate_tx, activate_rx) = oneshot::channel::<()>();
    let (activation, activate_tx) = if cfg.auto_activate {
        supervisor.activate();
        (None, None)
    } else {
        eprintln!(
            "  Waiting for {} on stdin.",
            "activate".bold().cyan()
        );
        (Some(activate_rx), Some(activate_tx))
    };

    let writer_shutdown = Arc::clone(&shutdown_tx);
    let writer = tokio::spawn(async move {
        if let Err(e) = write_commands(commands, tokio::io::stdout()).await {
            error!(error = %e, "command stream closed; stopping supervisor");
            let _ = writer_shutdown.send(true);
        }
    });
    let supervisor_task = tokio::spawn(supervisor.run(activation, shutdown_rx));
    let feed = tokio::spawn(read_feed(intake, activate_tx, Arc::clone(&shutdown_tx)));

    // ── Shutdown ──────────────────────────────────────────────────────────
    match supervisor_task.await {
        Ok(supervisor) => {
            info!(state = %supervisor.state(), "supervisor loop finished");
            // Dropping the supervisor drops its sink, which ends the writer.
            drop(supervisor);
        }
        Err(e) => error!(error = %e, "supervisor task failed"),
    }
    feed.abort();
    // Wait for the abort so the intake (and its bus handle) is dropped.
    let _ = feed.await;
    if let Err(e) = writer.await {
        error!(error = %e, "command writer task failed");
    }
    if let Some(task) = diagnostics
        && tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err()
    {
        warn!("diagnostic echo did not drain before exit");
    }
    eprintln!("{}", "  ✓ Base stopped. Exiting SafeGuard.".green());
}

/// Forward stdin directives to the intake until `quit` or end of input.
///
/// End of input only closes the feed; the supervisor keeps ticking on its
/// timer until Ctrl-C.
async fn read_feed(
    intake: SensorIntake,
    mut activate: Option<oneshot::Sender<()>>,
    shutdown: Arc<watch::Sender<bool>>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("sensor feed closed");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read sensor feed");
                return;
            }
        };

        match feed::parse_line(&line) {
            Ok(FeedLine::Sample(sample)) => {
                // Rejections are already logged and published by the intake.
                let _ = intake.submit(sample);
            }
            Ok(FeedLine::Activate) => match activate.take() {
                Some(tx) => {
                    let _ = tx.send(());
                }
                None => warn!("supervisor already activated"),
            },
            Ok(FeedLine::Quit) => {
                let _ = shutdown.send(true);
                return;
            }
            Ok(FeedLine::Empty) => {}
            Err(e) => warn!(line = %line.trim(), error = %e, "ignoring feed line"),
        }
    }
}

/// Write each command as a JSON line until the supervisor's sink is dropped.
///
/// Stops at the first write error (e.g. the reader of stdout went away).
async fn write_commands<W>(mut commands: mpsc::Receiver<Command>, mut out: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        write_json_line(&mut out, &command).await?;
    }
    Ok(())
}

/// Write every transition-log event as a JSON line until the bus closes.
async fn echo_diagnostics<W>(mut events: SourceSubscriber, mut out: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        write_json_line(&mut out, &event).await?;
    }
    Ok(())
}

async fn write_json_line<W, T>(out: &mut W, value: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    eprintln!();
    eprintln!("{}", r#"   ____       ___      _____                     __"#.bold().cyan());
    eprintln!("{}", r#"  / __/__ _  / _/__   / ___/_ _____ ________ ___/ /"#.bold().cyan());
    eprintln!("{}", r#" _\ \/ _ `/ / _/ -_) / (_ / // / _ `/ __/ _ `/ _  / "#.bold().cyan());
    eprintln!("{}", r#"/___/\_,_/ /_/ \__/  \___/\_,_/\_,_/_/  \_,_/\_,_/  "#.bold().cyan());
    eprintln!();
    eprintln!(
        "  {} {}",
        "SafeGuard".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    eprintln!("  Robot Safety Supervisor");
    eprintln!();
}
