//! [`MemoryStore`] — a process-local [`EngagementStore`].
//!
//! Nothing survives a restart. Used by tests and by `reel --ephemeral`.

use std::{
  collections::HashSet,
  convert::Infallible,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{store::EngagementStore, story::StoryId, user::UserId};

#[derive(Debug, Default)]
struct Sets {
  viewed: HashSet<UserId>,
  liked:  HashSet<StoryId>,
}

/// Cloning is cheap — clones share the same sets.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  sets: Arc<Mutex<Sets>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Seed a store with existing engagement.
  pub fn with_sets(
    viewed: impl IntoIterator<Item = UserId>,
    liked: impl IntoIterator<Item = StoryId>,
  ) -> Self {
    let sets = Sets {
      viewed: viewed.into_iter().collect(),
      liked:  liked.into_iter().collect(),
    };
    Self { sets: Arc::new(Mutex::new(sets)) }
  }

  fn lock(&self) -> MutexGuard<'_, Sets> {
    // The sets hold no invariant a panicking writer could break.
    self.sets.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl EngagementStore for MemoryStore {
  type Error = Infallible;

  async fn mark_viewed(&self, user_id: UserId) -> Result<(), Infallible> {
    self.lock().viewed.insert(user_id);
    Ok(())
  }

  async fn viewed_user_ids(&self) -> Result<HashSet<UserId>, Infallible> {
    Ok(self.lock().viewed.clone())
  }

  async fn toggle_liked(&self, story_id: StoryId) -> Result<bool, Infallible> {
    let mut sets = self.lock();
    if sets.liked.remove(&story_id) {
      Ok(false)
    } else {
      sets.liked.insert(story_id);
      Ok(true)
    }
  }

  async fn is_liked(&self, story_id: StoryId) -> Result<bool, Infallible> {
    Ok(self.lock().liked.contains(&story_id))
  }

  async fn liked_story_ids(&self) -> Result<HashSet<StoryId>, Infallible> {
    Ok(self.lock().liked.clone())
  }
}
