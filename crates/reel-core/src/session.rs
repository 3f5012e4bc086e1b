//! [`ViewerSession`] — a [`StoryViewer`] wired to its timer and preloader.
//!
//! The session is the scoped resource for one opening of the viewer: the
//! ticker and any in-flight prefetches live exactly as long as it does.

use std::sync::Arc;

use tracing::info;

use crate::{
  preload::{ImageFetcher, Preloader},
  story::UserStory,
  ticker::Ticker,
  viewer::{StoryViewer, ViewerConfig, ViewerEvent},
};

/// Notifications the owner of a session has to act on. Preload requests are
/// handled inside the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
  UserChanged(UserStory),
  Dismiss,
}

pub struct ViewerSession<F> {
  viewer:    StoryViewer,
  ticker:    Ticker,
  preloader: Preloader<F>,
}

impl<F: ImageFetcher> ViewerSession<F> {
  /// Open the viewer on `start` and start its ticker. Must be called from
  /// within a tokio runtime.
  pub fn open(
    user_stories: Vec<UserStory>,
    start: &UserStory,
    config: ViewerConfig,
    fetcher: Arc<F>,
  ) -> Self {
    let ticker = Ticker::start(config.tick_interval());
    let viewer = StoryViewer::open(user_stories, start, config);
    info!(user_id = start.id, "viewer session opened");
    Self { viewer, ticker, preloader: Preloader::new(fetcher) }
  }

  pub fn viewer(&self) -> &StoryViewer { &self.viewer }

  /// Direct access for input handling (taps, holds, refreshes).
  pub fn viewer_mut(&mut self) -> &mut StoryViewer { &mut self.viewer }

  /// Apply every tick that has elapsed since the last call, then route the
  /// viewer's queued events. Returns the events the owner must handle.
  pub fn pump(&mut self) -> Vec<SessionEvent> {
    for _ in 0..self.ticker.drain() {
      self.viewer.tick();
    }
    self.route_events()
  }

  /// Wait for the next tick and apply it. Returns `None` once the ticker has
  /// stopped.
  pub async fn tick(&mut self) -> Option<Vec<SessionEvent>> {
    self.ticker.next().await?;
    self.viewer.tick();
    Some(self.route_events())
  }

  /// Route queued viewer events without advancing the clock. Call after
  /// feeding input to the viewer.
  pub fn route_events(&mut self) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Some(event) = self.viewer.poll_event() {
      match event {
        ViewerEvent::Preload { urls } => self.preloader.preload(urls),
        ViewerEvent::UserChanged(us) => out.push(SessionEvent::UserChanged(us)),
        ViewerEvent::Dismiss => {
          self.ticker.stop();
          out.push(SessionEvent::Dismiss);
        }
      }
    }
    out
  }

  pub fn preloads_in_flight(&mut self) -> usize { self.preloader.in_flight() }
}

impl<F> Drop for ViewerSession<F> {
  fn drop(&mut self) {
    // Ticker and preload tasks abort in their own drops; this only records
    // the teardown.
    info!("viewer session closed");
  }
}
