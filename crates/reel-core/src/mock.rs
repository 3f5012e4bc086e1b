//! Mock content — a fixed roster of users and randomly sized story sets.
//!
//! Story *counts* are random per call; story *image URLs* are a pure function
//! of `(user_id, image_index)`, so regenerating a user's stories always yields
//! the same URL for the same index.

use rand_core::{OsRng, RngCore};

use crate::{
  story::{Story, StoryId},
  user::{User, UserId},
};

/// Image CDN used when no other base URL is configured.
pub const DEFAULT_IMAGE_BASE: &str = "https://picsum.photos";

/// Upper bound of stories generated per user; the lower bound is one.
pub const MAX_STORIES_PER_USER: u32 = 4;

/// Display names of the roster, in id order starting at 1.
pub const ROSTER_NAMES: [&str; 30] = [
  "Neo",
  "Trinity",
  "Morpheus",
  "Smith",
  "Oracle",
  "Cypher",
  "Niobe",
  "Dozer",
  "Switch",
  "Tank",
  "Seraph",
  "Sati",
  "Merovingian",
  "Persephone",
  "Ghost",
  "Lock",
  "Rama",
  "Bane",
  "The Keymaker",
  "Commander Thadeus",
  "Kid",
  "Zee",
  "Mifune",
  "Roland",
  "Cas",
  "Colt",
  "Vector",
  "Sequoia",
  "Sentinel",
  "Turing",
];

// ─── URLs ────────────────────────────────────────────────────────────────────

/// `{base}/seed/{user_id}/300`
pub fn avatar_url(base: &str, user_id: UserId) -> String {
  format!("{}/seed/{user_id}/300", base.trim_end_matches('/'))
}

/// `{base}/seed/{user_id * 1000 + image_index}/400/700`
pub fn story_image_url(base: &str, id: StoryId) -> String {
  format!("{}/seed/{}/400/700", base.trim_end_matches('/'), id.image_seed())
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Where the feed gets its users and stories from.
pub trait ContentSource: Send + Sync {
  /// The full, order-stable roster.
  fn roster(&self) -> &[User];

  /// Generate the current stories of `user`, in creation order.
  fn stories_for(&self, user: &User) -> Vec<Story>;
}

// ─── Mock source ─────────────────────────────────────────────────────────────

/// The built-in content source: thirty users, one to four stories each.
#[derive(Debug, Clone)]
pub struct MockContentSource {
  roster:      Vec<User>,
  image_base:  String,
  /// Pinned story count; `None` draws one uniformly per call.
  story_count: Option<u32>,
}

impl Default for MockContentSource {
  fn default() -> Self { Self::new() }
}

impl MockContentSource {
  pub fn new() -> Self { Self::with_image_base(DEFAULT_IMAGE_BASE) }

  /// Build the roster with avatar and story URLs rooted at `base`.
  pub fn with_image_base(base: impl Into<String>) -> Self {
    let image_base = base.into();
    let roster = ROSTER_NAMES
      .iter()
      .zip(1..)
      .map(|(name, id)| User::new(id, *name, avatar_url(&image_base, id)))
      .collect();
    Self { roster, image_base, story_count: None }
  }

  /// Always generate `count` stories per user, clamped to `1..=4`.
  pub fn with_story_count(mut self, count: u32) -> Self {
    self.story_count = Some(count.clamp(1, MAX_STORIES_PER_USER));
    self
  }

  fn draw_story_count(&self) -> u32 {
    // 4 divides 2^32, so the modulo keeps the draw uniform.
    self
      .story_count
      .unwrap_or_else(|| OsRng.next_u32() % MAX_STORIES_PER_USER + 1)
  }
}

impl ContentSource for MockContentSource {
  fn roster(&self) -> &[User] { &self.roster }

  fn stories_for(&self, user: &User) -> Vec<Story> {
    (0..self.draw_story_count())
      .map(|index| {
        let url = story_image_url(&self.image_base, StoryId::new(user.id, index));
        Story::new(user.id, index, url)
      })
      .collect()
  }
}
