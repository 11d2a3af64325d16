use std::collections::VecDeque;

use anyhow::{Result, anyhow, bail};
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::Configuration;
use crate::events::{ArtworkRecord, FetchOutcome, FetchRequest, FrameUpdate, OverlayEvent};

const TICK: Duration = Duration::from_secs(1);

/// What an active tick does at a given counter value.
#[derive(Debug, PartialEq, Eq)]
enum TickAction {
    /// Kick off the prefetch for the next cycle.
    Prefetch,
    /// Display the queue head and restart the countdown.
    Swap,
    None,
}

fn tick_action(counter: u64, threshold: u64) -> TickAction {
    if counter == threshold {
        TickAction::Prefetch
    } else if counter == 0 {
        TickAction::Swap
    } else {
        TickAction::None
    }
}

/// Countdown/prefetch/display scheduler.
///
/// Rules:
/// - Exactly one prefetch is requested per cycle, at the threshold tick,
///   and its result is never awaited from inside the tick loop.
/// - The swap tick pops whatever the earlier prefetch deposited. An empty
///   queue is the underrun path: notify the viewer once, then reseed.
/// - Ticks are skipped entirely while the detail overlay is open; the
///   interval keeps firing but the counter does not move.
/// - All mutable state lives in this task, so fetch completions hand off
///   through the outcome channel rather than shared memory.
pub async fn run(
    cfg: Configuration,
    fetch_tx: Sender<FetchRequest>,
    mut outcome_rx: Receiver<FetchOutcome>,
    to_viewer: Sender<FrameUpdate>,
    mut overlay_rx: Receiver<OverlayEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let refresh = cfg.refresh_secs();
    let threshold = cfg.refresh_threshold;
    let mut queue: VecDeque<ArtworkRecord> = VecDeque::new();
    let mut counter = refresh;
    let mut overlay_open = false;
    let mut overlay_attached = true;

    // Awaited seed fetch so the first artwork is up before ticking starts.
    if !seed(&fetch_tx, &mut outcome_rx, &to_viewer, &mut queue, &cancel).await? {
        return Ok(());
    }
    show_front(&mut queue, &to_viewer).await?;

    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval fires immediately; consume the zeroth tick so a full
    // second elapses before the first countdown update.
    ticker.tick().await;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe_overlay = overlay_rx.recv(), if overlay_attached => {
                match maybe_overlay {
                    Some(OverlayEvent::Opened) => {
                        debug!("overlay opened; countdown frozen");
                        overlay_open = true;
                    }
                    Some(OverlayEvent::Closed) => {
                        debug!("overlay closed; countdown resumes");
                        overlay_open = false;
                    }
                    None => {
                        // Host dropped its overlay handle; nothing can pause
                        // us anymore, keep ticking.
                        overlay_attached = false;
                    }
                }
            }

            maybe_outcome = outcome_rx.recv() => {
                let Some(outcome) = maybe_outcome else {
                    warn!("fetcher channel closed");
                    break;
                };
                enqueue_outcome(&mut queue, outcome);
            }

            _ = ticker.tick() => {
                if overlay_open {
                    continue;
                }
                // Drain completed prefetches first so a record that landed in
                // this tick window is visible to the swap below.
                while let Ok(outcome) = outcome_rx.try_recv() {
                    enqueue_outcome(&mut queue, outcome);
                }

                send(&to_viewer, FrameUpdate::Countdown(counter)).await?;
                match tick_action(counter, threshold) {
                    TickAction::Prefetch => {
                        debug!(counter, "prefetching next artwork");
                        if fetch_tx.send(FetchRequest).await.is_err() {
                            warn!("fetcher channel closed");
                            break;
                        }
                    }
                    TickAction::Swap => {
                        if queue.is_empty() {
                            error!("no prefetched artwork at swap time; reseeding");
                            send(&to_viewer, FrameUpdate::Underrun).await?;
                            if !seed(&fetch_tx, &mut outcome_rx, &to_viewer, &mut queue, &cancel)
                                .await?
                            {
                                break;
                            }
                        }
                        show_front(&mut queue, &to_viewer).await?;
                        counter = refresh;
                    }
                    TickAction::None => {}
                }
                counter -= 1;
            }
        }
    }
    Ok(())
}

fn enqueue_outcome(queue: &mut VecDeque<ArtworkRecord>, outcome: FetchOutcome) {
    match outcome {
        FetchOutcome::Fetched(record) => {
            queue.push_back(record);
            debug!(queued = queue.len(), "prefetched artwork queued");
        }
        FetchOutcome::Exhausted { attempts } => {
            warn!(attempts, "prefetch exhausted its retry budget; queue left empty");
        }
    }
}

/// One awaited fetch-and-enqueue pass with the loading indicator up while it
/// runs. Used at startup and again after an underrun to restart the show
/// from a known state. Returns `false` when cancelled mid-seed.
async fn seed(
    fetch_tx: &Sender<FetchRequest>,
    outcome_rx: &mut Receiver<FetchOutcome>,
    to_viewer: &Sender<FrameUpdate>,
    queue: &mut VecDeque<ArtworkRecord>,
    cancel: &CancellationToken,
) -> Result<bool> {
    send(to_viewer, FrameUpdate::Loading(true)).await?;
    if fetch_tx.send(FetchRequest).await.is_err() {
        bail!("fetcher channel closed during seed");
    }
    loop {
        select! {
            _ = cancel.cancelled() => return Ok(false),
            maybe_outcome = outcome_rx.recv() => match maybe_outcome {
                Some(FetchOutcome::Fetched(record)) => {
                    queue.push_back(record);
                    break;
                }
                Some(FetchOutcome::Exhausted { attempts }) => {
                    warn!(attempts, "seed fetch exhausted its retry budget; requesting again");
                    if fetch_tx.send(FetchRequest).await.is_err() {
                        bail!("fetcher channel closed during seed");
                    }
                }
                None => bail!("fetcher channel closed during seed"),
            },
        }
    }
    send(to_viewer, FrameUpdate::Loading(false)).await?;
    Ok(true)
}

async fn show_front(
    queue: &mut VecDeque<ArtworkRecord>,
    to_viewer: &Sender<FrameUpdate>,
) -> Result<()> {
    if let Some(record) = queue.pop_front() {
        send(to_viewer, FrameUpdate::Show(record)).await?;
    }
    Ok(())
}

async fn send(to_viewer: &Sender<FrameUpdate>, update: FrameUpdate) -> Result<()> {
    to_viewer
        .send(update)
        .await
        .map_err(|_| anyhow!("viewer channel closed"))
}
