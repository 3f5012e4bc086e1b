use std::{collections::HashSet, io, time::Duration};

use crate::{
  feed::{Feed, FeedConfig, WrapPolicy, page_indices},
  memory::MemoryStore,
  mock::MockContentSource,
  store::EngagementStore,
  story::StoryId,
  user::UserId,
};

fn feed_with(store: MemoryStore, policy: WrapPolicy) -> Feed<MemoryStore, MockContentSource> {
  let config = FeedConfig { wrap_policy: policy, ..FeedConfig::default() };
  Feed::new(store, MockContentSource::new().with_story_count(3), config)
}

fn feed() -> Feed<MemoryStore, MockContentSource> {
  feed_with(MemoryStore::new(), WrapPolicy::Deduplicate)
}

fn ids(feed: &Feed<MemoryStore, MockContentSource>) -> Vec<UserId> {
  feed.user_stories().iter().map(|us| us.id).collect()
}

// ─── Pagination ──────────────────────────────────────────────────────────────

#[test]
fn every_page_has_page_size_users_in_roster_order() {
  let feed = feed();
  for page in 0..12 {
    let users: Vec<UserId> = feed.page_users(page).iter().map(|u| u.id).collect();
    let expected: Vec<UserId> = (0..10).map(|i| ((page * 10 + i) % 30) as UserId + 1).collect();
    assert_eq!(users, expected, "page {page}");
  }
}

#[test]
fn page_indices_wrap_mid_page() {
  let got: Vec<_> = page_indices(1, 4, 6).collect();
  assert_eq!(got, vec![4, 5, 0, 1]);
  assert_eq!(page_indices(3, 10, 0).count(), 0);
  assert_eq!(page_indices(usize::MAX, 10, 30).count(), 10);
}

#[tokio::test(start_paused = true)]
async fn three_loads_cover_the_roster_once() {
  let feed = feed();
  for _ in 0..3 {
    feed.load_more_stories().await;
  }
  assert_eq!(ids(&feed), (1..=30).collect::<Vec<_>>());
  assert_eq!(feed.page(), 3);
  assert!(!feed.is_loading());
}

#[tokio::test(start_paused = true)]
async fn fourth_load_repeats_page_zero_when_appending() {
  let feed = feed_with(MemoryStore::new(), WrapPolicy::Append);
  for _ in 0..4 {
    feed.load_more_stories().await;
  }
  let ids = ids(&feed);
  assert_eq!(ids.len(), 40);
  assert_eq!(ids[30..], ids[..10]);
}

#[tokio::test(start_paused = true)]
async fn fourth_load_adds_nothing_when_deduplicating() {
  let feed = feed();
  for _ in 0..3 {
    feed.load_more_stories().await;
  }
  let mut changes = feed.subscribe();

  // Every user is listed: no latency, no loading flag, no page advance.
  let started = tokio::time::Instant::now();
  feed.load_more_stories().await;
  assert_eq!(tokio::time::Instant::now(), started);
  assert!(!changes.has_changed().unwrap());

  let ids = ids(&feed);
  assert_eq!(ids.len(), 30);
  assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 30);
  assert_eq!(feed.page(), 3);
}

#[tokio::test(start_paused = true)]
async fn initial_load_is_skipped_once_populated() {
  let feed = feed();
  feed.load_initial_data().await;
  feed.load_initial_data().await;
  assert_eq!(feed.user_stories().len(), 10);
  assert_eq!(feed.page(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_loads_fetch_one_page() {
  let feed = feed();
  tokio::join!(feed.load_more_stories(), feed.load_more_stories());
  assert_eq!(feed.user_stories().len(), 10);
  assert_eq!(feed.page(), 1);
}

#[tokio::test(start_paused = true)]
async fn loading_flag_is_published_during_the_fetch() {
  let feed = feed();
  let mut rx = feed.subscribe();

  let task = tokio::spawn({
    let feed = feed.clone();
    async move { feed.load_more_stories().await }
  });

  rx.changed().await.unwrap();
  assert!(rx.borrow_and_update().loading);
  assert!(rx.borrow().user_stories.is_empty());

  rx.changed().await.unwrap();
  let snap = rx.borrow_and_update().clone();
  assert!(!snap.loading);
  assert_eq!(snap.user_stories.len(), 10);
  task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn abandoned_fetch_releases_the_loading_flag() {
  let feed = feed();
  let short = tokio::time::timeout(Duration::from_millis(10), feed.load_more_stories()).await;
  assert!(short.is_err());
  assert!(!feed.is_loading());

  feed.load_more_stories().await;
  assert_eq!(feed.user_stories().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn persisted_engagement_is_stamped_on_load() {
  let store = MemoryStore::with_sets([2, 5], [StoryId::new(2, 1), StoryId::new(9, 0)]);
  let feed = feed_with(store, WrapPolicy::Deduplicate);
  feed.load_more_stories().await;

  for us in feed.user_stories() {
    assert_eq!(us.is_viewed, us.id == 2 || us.id == 5, "user {}", us.id);
    let liked: Vec<_> = us.liked_story_ids.iter().copied().collect();
    match us.id {
      2 => assert_eq!(liked, vec![StoryId::new(2, 1)]),
      9 => assert_eq!(liked, vec![StoryId::new(9, 0)]),
      _ => assert!(liked.is_empty()),
    }
  }
}

// ─── Engagement ──────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn mark_viewed_is_idempotent_and_keeps_other_fields() {
  let store = MemoryStore::new();
  let feed = feed_with(store.clone(), WrapPolicy::Deduplicate);
  feed.load_more_stories().await;

  let before = feed.user_stories()[3].clone();
  assert!(!before.is_viewed);

  feed.mark_viewed(&before).await;
  let once = feed.user_stories();
  feed.mark_viewed(&before).await;
  let twice = feed.user_stories();

  assert_eq!(once, twice);
  let after = &once[3];
  assert!(after.is_viewed);
  assert_eq!(after.user, before.user);
  assert_eq!(after.stories, before.stories);
  assert_eq!(after.liked_story_ids, before.liked_story_ids);
  assert_eq!(store.viewed_user_ids().await.unwrap(), HashSet::from([before.id]));
}

#[tokio::test(start_paused = true)]
async fn mark_viewed_for_unknown_user_still_persists() {
  let store = MemoryStore::new();
  let feed = feed_with(store.clone(), WrapPolicy::Deduplicate);
  feed.load_more_stories().await;
  let stranger = {
    let mut us = feed.user_stories()[0].clone();
    us.id = 99;
    us
  };
  let before = feed.user_stories();
  feed.mark_viewed(&stranger).await;
  assert_eq!(feed.user_stories(), before);
  assert!(store.viewed_user_ids().await.unwrap().contains(&99));
}

#[tokio::test(start_paused = true)]
async fn toggle_like_twice_restores_everything() {
  let store = MemoryStore::new();
  let feed = feed_with(store.clone(), WrapPolicy::Deduplicate);
  feed.load_more_stories().await;

  let us = feed.user_stories()[0].clone();
  let story = us.stories[2].clone();

  feed.toggle_like(&story, &us).await;
  assert!(feed.user_stories()[0].is_liked(story.id));
  assert!(store.is_liked(story.id).await.unwrap());

  feed.toggle_like(&story, &us).await;
  assert_eq!(feed.user_stories()[0], us);
  assert!(store.liked_story_ids().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn toggle_like_updates_every_duplicate_entry() {
  let feed = feed_with(MemoryStore::new(), WrapPolicy::Append);
  for _ in 0..4 {
    feed.load_more_stories().await;
  }
  let us = feed.user_stories()[0].clone();
  let story = us.stories[0].clone();
  feed.toggle_like(&story, &us).await;

  let list = feed.user_stories();
  assert!(list[0].is_liked(story.id));
  assert!(list[30].is_liked(story.id));
}

// ─── Degraded persistence ────────────────────────────────────────────────────

/// A store whose every operation fails.
struct BrokenStore;

fn broken() -> io::Error { io::Error::other("disk on fire") }

impl EngagementStore for BrokenStore {
  type Error = io::Error;

  async fn mark_viewed(&self, _: UserId) -> io::Result<()> { Err(broken()) }

  async fn viewed_user_ids(&self) -> io::Result<HashSet<UserId>> { Err(broken()) }

  async fn toggle_liked(&self, _: StoryId) -> io::Result<bool> { Err(broken()) }

  async fn is_liked(&self, _: StoryId) -> io::Result<bool> { Err(broken()) }

  async fn liked_story_ids(&self) -> io::Result<HashSet<StoryId>> { Err(broken()) }
}

#[tokio::test(start_paused = true)]
async fn store_failures_degrade_to_session_only_state() {
  let feed = Feed::new(
    BrokenStore,
    MockContentSource::new().with_story_count(2),
    FeedConfig::default(),
  );
  feed.load_more_stories().await;
  let list = feed.user_stories();
  assert_eq!(list.len(), 10);
  assert!(list.iter().all(|us| !us.is_viewed && us.liked_story_ids.is_empty()));

  let us = list[1].clone();
  feed.mark_viewed(&us).await;
  feed.toggle_like(&us.stories[0], &us).await;

  let after = &feed.user_stories()[1];
  assert!(after.is_viewed);
  assert!(after.is_liked(us.stories[0].id));
}
