//! Cosmetic smoothing of the displayed price.
//!
//! [`DisplayAnimator`] follows a controller's snapshot stream and republishes
//! it as [`DisplayFrame`]s. When the quoted value changes, the previous value
//! stays on screen, flagged as transitioning, for a short hold before the new
//! value is shown. The animator only reads snapshots; it never delays or gates
//! resolution.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::controller::PriceSnapshot;

/// What the price label should show right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DisplayFrame {
    pub shown: Option<f64>,
    pub transitioning: bool,
}

/// Background task turning price snapshots into display frames.
///
/// The task ends once every sender of the snapshot channel is gone, or when
/// the animator is dropped.
pub struct DisplayAnimator {
    frames: watch::Receiver<DisplayFrame>,
    task: JoinHandle<()>,
}

impl DisplayAnimator {
    /// Starts animating `snapshots`, holding each outgoing value for `hold`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(snapshots: watch::Receiver<PriceSnapshot>, hold: Duration) -> Self {
        let (tx, frames) = watch::channel(DisplayFrame::default());
        let task = tokio::spawn(run(snapshots, hold, tx));
        Self { frames, task }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DisplayFrame> {
        self.frames.clone()
    }

    #[must_use]
    pub fn frame(&self) -> DisplayFrame {
        *self.frames.borrow()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DisplayAnimator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Event {
    Snapshot { closed: bool },
    HoldElapsed,
}

async fn run(
    mut snapshots: watch::Receiver<PriceSnapshot>,
    hold: Duration,
    tx: watch::Sender<DisplayFrame>,
) {
    let mut target = quoted_value(&snapshots.borrow_and_update());
    let mut deadline: Option<Instant> = None;
    tx.send_replace(DisplayFrame {
        shown: target,
        transitioning: false,
    });

    loop {
        let event = match deadline {
            Some(at) => tokio::select! {
                res = snapshots.changed() => Event::Snapshot { closed: res.is_err() },
                () = tokio::time::sleep_until(at) => Event::HoldElapsed,
            },
            None => Event::Snapshot {
                closed: snapshots.changed().await.is_err(),
            },
        };

        match event {
            Event::HoldElapsed => {
                deadline = None;
                tx.send_replace(DisplayFrame {
                    shown: target,
                    transitioning: false,
                });
            }
            Event::Snapshot { closed: true } => {
                if deadline.is_some() {
                    tx.send_replace(DisplayFrame {
                        shown: target,
                        transitioning: false,
                    });
                }
                tracing::debug!("snapshot channel closed, display animator stopping");
                return;
            }
            Event::Snapshot { closed: false } => {
                let value = quoted_value(&snapshots.borrow_and_update());
                if same_value(value, target) {
                    continue;
                }
                target = value;

                let shown = tx.borrow().shown;
                if value.is_none() || shown.is_none() {
                    // Nothing to transition from, or nothing to transition to.
                    deadline = None;
                    tx.send_replace(DisplayFrame {
                        shown: value,
                        transitioning: false,
                    });
                } else {
                    deadline = Some(Instant::now() + hold);
                    tx.send_replace(DisplayFrame {
                        shown,
                        transitioning: true,
                    });
                }
            }
        }
    }
}

fn quoted_value(snapshot: &PriceSnapshot) -> Option<f64> {
    snapshot.quote.as_ref().map(|quote| quote.value)
}

fn same_value(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b).is_eq(),
        (None, None) => true,
        _ => false,
    }
}
