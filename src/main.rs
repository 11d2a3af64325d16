//! Binary entrypoint for the gallery frame.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use gallery_frame::config::Configuration;
use gallery_frame::events::{FetchOutcome, FetchRequest, FrameUpdate, OverlayEvent};
use gallery_frame::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "gallery-frame",
    version,
    about = "random Met collection slideshow"
)]
struct Args {
    /// Path to YAML config; built-in defaults apply when absent.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the refresh interval, in seconds.
    #[arg(long, value_name = "SECONDS")]
    refresh_secs: Option<u64>,
    /// Prefer the full-resolution primary image over the small variant.
    #[arg(long)]
    primary_image_preferred: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(secs) = args.refresh_secs {
        cfg.refresh_interval = Duration::from_secs(secs);
    }
    if args.primary_image_preferred {
        cfg.primary_image_preferred = true;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::info!(
        refresh_secs = cfg.refresh_secs(),
        threshold = cfg.refresh_threshold,
        primary_image_preferred = cfg.primary_image_preferred,
        "configuration loaded"
    );

    // Channels (small/bounded)
    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchRequest>(2); // Gallery -> Fetcher
    let (outcome_tx, outcome_rx) = mpsc::channel::<FetchOutcome>(2); // Fetcher -> Gallery
    let (frame_tx, frame_rx) = mpsc::channel::<FrameUpdate>(16); // Gallery -> Viewer
    let (overlay_tx, overlay_rx) = mpsc::channel::<OverlayEvent>(8); // Host -> Gallery

    let cancel = CancellationToken::new();

    // Ctrl-C tears the whole pipeline down
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    // SIGUSR1 toggles the detail overlay, pausing and resuming the countdown
    #[cfg(unix)]
    {
        let cancel = cancel.clone();
        let overlay = overlay_tx.clone();
        tokio::spawn(async move {
            match signal(SignalKind::user_defined1()) {
                Ok(mut sigusr1) => {
                    let mut open = false;
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            received = sigusr1.recv() => {
                                if received.is_none() {
                                    break;
                                }
                                open = !open;
                                tracing::info!(open, "SIGUSR1 received; toggling detail overlay");
                                let event = if open {
                                    OverlayEvent::Opened
                                } else {
                                    OverlayEvent::Closed
                                };
                                if overlay.send(event).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(err) => tracing::warn!("failed to register SIGUSR1 handler: {err}"),
            }
        });
    }
    drop(overlay_tx);

    let mut set = JoinSet::new();

    // Fetcher
    set.spawn({
        let cfg = cfg.clone();
        let outcome_tx = outcome_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::fetcher::run(cfg, fetch_rx, outcome_tx, cancel)
                .await
                .context("fetcher task failed")
        }
    });

    // Gallery scheduler
    set.spawn({
        let cfg = cfg.clone();
        let fetch_tx = fetch_tx.clone();
        let frame_tx = frame_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::gallery::run(cfg, fetch_tx, outcome_rx, frame_tx, overlay_rx, cancel)
                .await
                .context("gallery task failed")
        }
    });

    // Viewer
    set.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::viewer::run(frame_rx, cancel)
                .await
                .context("viewer task failed")
        }
    });

    // Drop the senders main holds so channel closure propagates task exits
    drop(fetch_tx);
    drop(outcome_tx);
    drop(frame_tx);

    // Drain the JoinSet; the first task to finish, cleanly or not, takes the
    // rest of the pipeline down with it.
    while let Some(res) = set.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
        cancel.cancel();
    }

    Ok(())
}
