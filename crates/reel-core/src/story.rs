//! Story types — a single image and the per-user aggregate shown in the feed.
//!
//! A [`UserStory`] is never edited in place by the feed. Viewing or liking
//! produces a replacement value that is swapped into the owning list.

use std::{
  collections::{BTreeSet, HashSet},
  fmt,
  str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  user::{User, UserId},
};

// ─── StoryId ─────────────────────────────────────────────────────────────────

/// Identifies one story image of one user. Rendered as `"{user_id}_{index}"`,
/// which is also the form persisted in the liked set.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct StoryId {
  pub user_id:     UserId,
  pub image_index: u32,
}

impl StoryId {
  pub fn new(user_id: UserId, image_index: u32) -> Self {
    Self { user_id, image_index }
  }

  /// Numeric seed the story image URL is derived from.
  pub fn image_seed(&self) -> u64 {
    u64::from(self.user_id) * 1000 + u64::from(self.image_index)
  }
}

impl fmt::Display for StoryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.user_id, self.image_index)
  }
}

impl FromStr for StoryId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidStoryId(s.to_owned());
    let (user, index) = s.split_once('_').ok_or_else(invalid)?;
    Ok(Self {
      user_id:     user.parse().map_err(|_| invalid())?,
      image_index: index.parse().map_err(|_| invalid())?,
    })
  }
}

impl From<StoryId> for String {
  fn from(id: StoryId) -> Self { id.to_string() }
}

impl TryFrom<String> for StoryId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

// ─── Story ───────────────────────────────────────────────────────────────────

/// One full-screen story image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
  pub id:        StoryId,
  pub user_id:   UserId,
  pub image_url: String,
  /// When the story was generated; never changes.
  pub timestamp: DateTime<Utc>,
}

impl Story {
  pub fn new(user_id: UserId, image_index: u32, image_url: impl Into<String>) -> Self {
    Self {
      id: StoryId::new(user_id, image_index),
      user_id,
      image_url: image_url.into(),
      timestamp: Utc::now(),
    }
  }
}

// ─── UserStory ───────────────────────────────────────────────────────────────

/// Everything the feed knows about one user: their stories in creation order
/// plus whether they have been viewed and which of their stories are liked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
  /// Always equal to `user.id`; the feed keys entries by user.
  pub id:              UserId,
  pub user:            User,
  pub stories:         Vec<Story>,
  pub is_viewed:       bool,
  /// Always a subset of the ids in `stories`.
  pub liked_story_ids: BTreeSet<StoryId>,
}

impl UserStory {
  pub fn new(user: User, stories: Vec<Story>) -> Self {
    Self {
      id: user.id,
      user,
      stories,
      is_viewed: false,
      liked_story_ids: BTreeSet::new(),
    }
  }

  /// Stamp persisted engagement onto a freshly generated aggregate. Liked ids
  /// belonging to other users are ignored.
  pub fn with_engagement(
    self,
    viewed: &HashSet<UserId>,
    liked: &HashSet<StoryId>,
  ) -> Self {
    let liked_story_ids = self
      .stories
      .iter()
      .map(|s| s.id)
      .filter(|id| liked.contains(id))
      .collect();
    Self {
      is_viewed: viewed.contains(&self.id),
      liked_story_ids,
      ..self
    }
  }

  /// A copy marked as viewed; every other field is unchanged.
  pub fn with_viewed(&self) -> Self {
    Self { is_viewed: true, ..self.clone() }
  }

  /// A copy with `story_id` set to `liked`. Ids this user does not own are
  /// ignored, so the liked set never escapes the owned stories.
  pub fn with_like(&self, story_id: StoryId, liked: bool) -> Self {
    let mut liked_story_ids = self.liked_story_ids.clone();
    if liked && self.owns(story_id) {
      liked_story_ids.insert(story_id);
    } else {
      liked_story_ids.remove(&story_id);
    }
    Self { liked_story_ids, ..self.clone() }
  }

  /// A copy with the like state of `story_id` flipped.
  pub fn with_like_toggled(&self, story_id: StoryId) -> Self {
    self.with_like(story_id, !self.is_liked(story_id))
  }

  /// A copy carrying `other`'s engagement, restricted to the stories owned
  /// here. Used when two aggregates for the same user hold different story
  /// sets.
  pub fn with_engagement_of(&self, other: &UserStory) -> Self {
    let liked_story_ids = other
      .liked_story_ids
      .iter()
      .copied()
      .filter(|id| self.owns(*id))
      .collect();
    Self {
      is_viewed: other.is_viewed,
      liked_story_ids,
      ..self.clone()
    }
  }

  pub fn is_liked(&self, story_id: StoryId) -> bool {
    self.liked_story_ids.contains(&story_id)
  }

  pub fn owns(&self, story_id: StoryId) -> bool {
    self.stories.iter().any(|s| s.id == story_id)
  }
}
