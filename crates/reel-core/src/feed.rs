//! [`Feed`] — the paginated, append-only list of user stories.
//!
//! The feed owns the list the grid renders from. Every mutation is published
//! through a [`tokio::sync::watch`] channel; front-ends call
//! [`Feed::subscribe`] and redraw when the value changes.

use std::{collections::HashSet, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
  mock::ContentSource,
  store::EngagementStore,
  story::{Story, StoryId, UserStory},
  user::{User, UserId},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// What to do when roster wraparound brings back a user already in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapPolicy {
  /// Skip users whose id is already present, keeping ids unique.
  #[default]
  Deduplicate,
  /// Append a second entry with the same id.
  Append,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
  /// Users per page.
  pub page_size:   usize,
  /// Simulated round-trip time of one page fetch.
  pub latency_ms:  u64,
  pub wrap_policy: WrapPolicy,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      page_size:   10,
      latency_ms:  300,
      wrap_policy: WrapPolicy::default(),
    }
  }
}

impl FeedConfig {
  pub fn latency(&self) -> Duration { Duration::from_millis(self.latency_ms) }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The observable state of the feed.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
  pub user_stories: Vec<UserStory>,
  /// A page fetch is in flight.
  pub loading:      bool,
  /// Zero-based index of the next page to fetch.
  pub page:         usize,
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Roster indices making up `page`, wrapping circularly.
///
/// `[(page * page_size + i) mod roster_len for i in 0..page_size]`
pub fn page_indices(
  page: usize,
  page_size: usize,
  roster_len: usize,
) -> impl Iterator<Item = usize> {
  let start = if roster_len == 0 {
    0
  } else {
    (page % roster_len) * (page_size % roster_len) % roster_len
  };
  (0..page_size)
    .filter(move |_| roster_len > 0)
    .map(move |i| (start + i) % roster_len)
}

// ─── Feed ────────────────────────────────────────────────────────────────────

/// Handle to the feed. Cloning is cheap; clones share the same list.
pub struct Feed<S, C> {
  store:  Arc<S>,
  source: Arc<C>,
  config: FeedConfig,
  state:  Arc<watch::Sender<FeedSnapshot>>,
}

impl<S, C> Clone for Feed<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      source: Arc::clone(&self.source),
      config: self.config.clone(),
      state:  Arc::clone(&self.state),
    }
  }
}

/// Clears `loading` if a fetch is abandoned before it appends, so a dropped
/// future cannot wedge the feed.
struct LoadingGuard<'a> {
  state: &'a watch::Sender<FeedSnapshot>,
  armed: bool,
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    if self.armed {
      self.state.send_modify(|s| s.loading = false);
    }
  }
}

impl<S, C> Feed<S, C>
where
  S: EngagementStore,
  C: ContentSource,
{
  pub fn new(store: S, source: C, config: FeedConfig) -> Self {
    Self::from_shared(Arc::new(store), Arc::new(source), config)
  }

  pub fn from_shared(store: Arc<S>, source: Arc<C>, config: FeedConfig) -> Self {
    let (state, _) = watch::channel(FeedSnapshot::default());
    Self { store, source, config, state: Arc::new(state) }
  }

  // ── Observation ─────────────────────────────────────────────────────────

  /// A receiver that is notified after every change to the feed.
  pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> { self.state.subscribe() }

  pub fn snapshot(&self) -> FeedSnapshot { self.state.borrow().clone() }

  pub fn user_stories(&self) -> Vec<UserStory> { self.state.borrow().user_stories.clone() }

  pub fn is_loading(&self) -> bool { self.state.borrow().loading }

  pub fn page(&self) -> usize { self.state.borrow().page }

  pub fn store(&self) -> &S { &self.store }

  // ── Loading ─────────────────────────────────────────────────────────────

  /// Load the first page unless the list already has entries.
  pub async fn load_initial_data(&self) {
    if !self.state.borrow().user_stories.is_empty() {
      return;
    }
    self.load_more_stories().await;
  }

  /// Fetch and append the next page. Returns immediately if a fetch is
  /// already in flight, or if deduplication leaves nothing new to add.
  pub async fn load_more_stories(&self) {
    if self.roster_exhausted() {
      debug!("every roster user is listed; skipping page fetch");
      return;
    }
    let claimed = self.state.send_if_modified(|s| {
      if s.loading {
        return false;
      }
      s.loading = true;
      true
    });
    if !claimed {
      debug!("page fetch already in flight");
      return;
    }
    let mut guard = LoadingGuard { state: &self.state, armed: true };

    tokio::time::sleep(self.config.latency()).await;

    let page = self.state.borrow().page;
    let users = self.page_users(page);
    let batch = self.build_user_stories(&users).await;
    let policy = self.config.wrap_policy;

    let mut appended = 0;
    self.state.send_modify(|s| {
      for entry in batch {
        let duplicate = s.user_stories.iter().any(|e| e.id == entry.id);
        if duplicate && policy == WrapPolicy::Deduplicate {
          continue;
        }
        s.user_stories.push(entry);
        appended += 1;
      }
      s.page += 1;
      s.loading = false;
    });
    guard.armed = false;

    info!(page, appended, "loaded feed page");
  }

  /// Under [`WrapPolicy::Deduplicate`], whether every roster user is already
  /// in the list, so any further page would append nothing.
  fn roster_exhausted(&self) -> bool {
    if self.config.wrap_policy != WrapPolicy::Deduplicate {
      return false;
    }
    let state = self.state.borrow();
    let listed: HashSet<UserId> = state.user_stories.iter().map(|us| us.id).collect();
    self.source.roster().iter().all(|u| listed.contains(&u.id))
  }

  /// The users on `page`, taken circularly from the roster.
  pub fn page_users(&self, page: usize) -> Vec<User> {
    let roster = self.source.roster();
    page_indices(page, self.config.page_size, roster.len())
      .map(|i| roster[i].clone())
      .collect()
  }

  async fn build_user_stories(&self, users: &[User]) -> Vec<UserStory> {
    let viewed = self.viewed_or_empty().await;
    let liked = self.liked_or_empty().await;
    users
      .iter()
      .map(|user| {
        UserStory::new(user.clone(), self.source.stories_for(user))
          .with_engagement(&viewed, &liked)
      })
      .collect()
  }

  async fn viewed_or_empty(&self) -> HashSet<UserId> {
    self.store.viewed_user_ids().await.unwrap_or_else(|e| {
      warn!(error = %e, "reading viewed users failed; treating as empty");
      HashSet::new()
    })
  }

  async fn liked_or_empty(&self) -> HashSet<StoryId> {
    self.store.liked_story_ids().await.unwrap_or_else(|e| {
      warn!(error = %e, "reading liked stories failed; treating as empty");
      HashSet::new()
    })
  }

  // ── Engagement ──────────────────────────────────────────────────────────

  /// Persist that `user_story` was opened, then replace its entries with
  /// viewed copies. Store failures are logged and the list is still updated.
  pub async fn mark_viewed(&self, user_story: &UserStory) {
    if let Err(e) = self.store.mark_viewed(user_story.id).await {
      warn!(user_id = user_story.id, error = %e, "persisting view failed");
    }

    let changed = self.state.send_if_modified(|s| {
      let mut changed = false;
      for entry in s.user_stories.iter_mut().filter(|e| e.id == user_story.id) {
        if !entry.is_viewed {
          *entry = entry.with_viewed();
          changed = true;
        }
      }
      changed
    });
    debug!(user_id = user_story.id, changed, "marked viewed");
  }

  /// Persist a like toggle of `story`, then replace the entries of
  /// `user_story` so their liked set mirrors the persisted state.
  pub async fn toggle_like(&self, story: &Story, user_story: &UserStory) {
    let persisted = match self.store.toggle_liked(story.id).await {
      Ok(liked) => Some(liked),
      Err(e) => {
        warn!(story_id = %story.id, error = %e, "persisting like failed");
        None
      }
    };

    let mut liked_now = None;
    self.state.send_if_modified(|s| {
      let mut changed = false;
      for entry in s.user_stories.iter_mut().filter(|e| e.id == user_story.id) {
        if !entry.owns(story.id) {
          continue;
        }
        let liked = persisted.unwrap_or_else(|| !entry.is_liked(story.id));
        *entry = entry.with_like(story.id, liked);
        liked_now = Some(liked);
        changed = true;
      }
      changed
    });
    debug!(story_id = %story.id, liked = ?liked_now, "toggled like");
  }
}
