//! Unit tests for `reel-core`.

mod feed;
mod viewer;

use crate::{
  mock::{ContentSource, MockContentSource},
  story::UserStory,
};

/// A feed-shaped list: the first `users` roster entries with `stories` each.
fn user_stories(users: usize, stories: u32) -> Vec<UserStory> {
  let source = MockContentSource::new().with_story_count(stories);
  source
    .roster()
    .iter()
    .take(users)
    .map(|u| UserStory::new(u.clone(), source.stories_for(u)))
    .collect()
}
