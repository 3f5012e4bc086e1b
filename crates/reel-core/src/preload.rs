//! Fire-and-forget image prefetching.
//!
//! Fetches run as detached tasks owned by a [`Preloader`]. Their results are
//! discarded; dropping the preloader aborts whatever is still in flight.

use std::{future::Future, sync::Arc};

use tokio::task::JoinSet;
use tracing::debug;

/// Fetches image bytes by URL. Implemented by the front-end (e.g. over HTTP).
pub trait ImageFetcher: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;
}

pub struct Preloader<F> {
  fetcher: Arc<F>,
  tasks:   JoinSet<()>,
}

impl<F: ImageFetcher> Preloader<F> {
  pub fn new(fetcher: Arc<F>) -> Self { Self { fetcher, tasks: JoinSet::new() } }

  /// Start fetching every URL in `urls`. Never fails and never waits.
  pub fn preload(&mut self, urls: impl IntoIterator<Item = String>) {
    self.reap();
    for url in urls {
      let fetcher = Arc::clone(&self.fetcher);
      self.tasks.spawn(async move {
        match fetcher.fetch(&url).await {
          Ok(bytes) => debug!(%url, bytes = bytes.len(), "preloaded image"),
          Err(e) => debug!(%url, error = %e, "preload failed"),
        }
      });
    }
  }

  /// Fetches started and not yet reaped.
  pub fn in_flight(&mut self) -> usize {
    self.reap();
    self.tasks.len()
  }

  /// Abort every fetch still running.
  pub fn cancel(&mut self) { self.tasks.abort_all(); }

  fn reap(&mut self) { while self.tasks.try_join_next().is_some() {} }
}
