//! The `EngagementStore` trait — durable record of views and likes.
//!
//! The trait is implemented by storage backends (e.g. `reel-store-sqlite`,
//! or [`crate::memory::MemoryStore`]). The feed depends on this abstraction,
//! not on any concrete backend.

use std::{collections::HashSet, future::Future};

use crate::{story::StoryId, user::UserId};

/// Key under which the viewed user ids are persisted.
pub const VIEWED_KEY: &str = "viewedStories";

/// Key under which the liked story ids are persisted.
pub const LIKED_KEY: &str = "likedStories";

/// Two persisted sets: users whose stories were opened, and liked stories.
///
/// Every write is durable before the returned future resolves. Each
/// read-modify-write is atomic with respect to other calls on the same
/// store, so implementations may be shared across threads.
pub trait EngagementStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Viewed ────────────────────────────────────────────────────────────

  /// Add `user_id` to the viewed set. Idempotent; the set never shrinks.
  fn mark_viewed(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The current viewed set; empty if nothing was ever written.
  fn viewed_user_ids(
    &self,
  ) -> impl Future<Output = Result<HashSet<UserId>, Self::Error>> + Send + '_;

  // ── Liked ─────────────────────────────────────────────────────────────

  /// Flip membership of `story_id` in the liked set and return the new
  /// state (`true` = now liked).
  fn toggle_liked(
    &self,
    story_id: StoryId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_liked(
    &self,
    story_id: StoryId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The current liked set; empty if nothing was ever written.
  fn liked_story_ids(
    &self,
  ) -> impl Future<Output = Result<HashSet<StoryId>, Self::Error>> + Send + '_;
}
