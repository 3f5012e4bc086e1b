//! [`Ticker`] — a cancellable fixed-rate timer feeding the viewer.
//!
//! The ticker only produces tick messages. Whoever owns the
//! [`crate::viewer::StoryViewer`] applies them on its own task, so viewer
//! state is never touched from the timer task.

use std::time::Duration;

use tokio::{
  sync::mpsc::{self, error::TrySendError},
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use tracing::debug;

/// Ticks buffered before further ticks are dropped. Dropped ticks are lost
/// time, not banked time.
const TICK_BACKLOG: usize = 8;

/// A running periodic timer. Stopped on [`Ticker::stop`] or when dropped.
pub struct Ticker {
  rx:   mpsc::Receiver<Instant>,
  task: JoinHandle<()>,
}

impl Ticker {
  /// Spawn the timer task on the current tokio runtime.
  pub fn start(period: Duration) -> Self {
    let (tx, rx) = mpsc::channel(TICK_BACKLOG);
    let task = tokio::spawn(async move {
      let mut interval = tokio::time::interval(period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        let at = interval.tick().await;
        match tx.try_send(at) {
          Ok(()) | Err(TrySendError::Full(_)) => {}
          Err(TrySendError::Closed(_)) => break,
        }
      }
    });
    debug!(?period, "ticker started");
    Self { rx, task }
  }

  /// Wait for the next tick; `None` once the ticker is stopped and drained.
  pub async fn next(&mut self) -> Option<Instant> { self.rx.recv().await }

  /// Take every tick that is already waiting and return how many there were.
  pub fn drain(&mut self) -> usize {
    let mut count = 0;
    while self.rx.try_recv().is_ok() {
      count += 1;
    }
    count
  }

  /// Stop the timer. Ticks already buffered can still be drained.
  pub fn stop(&mut self) {
    self.task.abort();
    self.rx.close();
    debug!("ticker stopped");
  }
}

impl Drop for Ticker {
  fn drop(&mut self) { self.task.abort(); }
}
