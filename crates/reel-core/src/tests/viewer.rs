use crate::viewer::{StoryViewer, TapZone, ViewerConfig, ViewerEvent};

use super::user_stories;

const EPSILON: f64 = 1e-9;

/// Ticks in one story and in the transition lockout at default settings.
const STORY_TICKS: usize = 240;
const LOCKOUT_TICKS: usize = 18;

fn open_at(users: usize, stories: u32, start: usize) -> StoryViewer {
  let list = user_stories(users, stories);
  let start = list[start].clone();
  let mut viewer = StoryViewer::open(list, &start, ViewerConfig::default());
  drain(&mut viewer);
  viewer
}

fn drain(viewer: &mut StoryViewer) -> Vec<ViewerEvent> {
  std::iter::from_fn(|| viewer.poll_event()).collect()
}

fn ticks(viewer: &mut StoryViewer, n: usize) {
  for _ in 0..n {
    viewer.tick();
  }
}

fn dismissals(events: &[ViewerEvent]) -> usize {
  events.iter().filter(|e| **e == ViewerEvent::Dismiss).count()
}

// ─── Opening ─────────────────────────────────────────────────────────────────

#[test]
fn opens_on_the_starting_user() {
  let viewer = open_at(5, 2, 3);
  let state = viewer.state();
  assert_eq!(state.current_user, 3);
  assert_eq!(state.current_story, 0);
  assert_eq!(state.progress, 0.0);
  assert!(!state.paused);
  assert!(!state.transitioning);
}

#[test]
fn unknown_starting_user_falls_back_to_first() {
  let list = user_stories(3, 1);
  let outsider = user_stories(10, 1).remove(9);
  let viewer = StoryViewer::open(list, &outsider, ViewerConfig::default());
  assert_eq!(viewer.current_user_index(), 0);
}

#[test]
fn empty_snapshot_shows_the_starting_user() {
  let start = user_stories(1, 2).remove(0);
  let viewer = StoryViewer::open(Vec::new(), &start, ViewerConfig::default());
  assert_eq!(viewer.current_user_story(), &start);
}

#[test]
fn opening_preloads_the_next_story() {
  let list = user_stories(2, 3);
  let start = list[0].clone();
  let mut viewer = StoryViewer::open(list.clone(), &start, ViewerConfig::default());
  assert_eq!(
    drain(&mut viewer),
    vec![ViewerEvent::Preload { urls: vec![list[0].stories[1].image_url.clone()] }]
  );
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[test]
fn progress_grows_linearly_before_completion() {
  let mut viewer = open_at(2, 2, 0);
  let dt = 1.0 / 60.0;
  for n in 1..STORY_TICKS {
    viewer.tick();
    let expected = n as f64 * dt / 4.0;
    assert!((viewer.progress() - expected).abs() < EPSILON, "tick {n}");
    assert_eq!(viewer.current_story_index(), 0);
  }
}

#[test]
fn completion_advances_exactly_once() {
  let mut viewer = open_at(2, 2, 0);
  ticks(&mut viewer, STORY_TICKS);
  assert_eq!(viewer.current_story_index(), 1);
  assert_eq!(viewer.progress(), 0.0);
  assert!(viewer.is_transitioning());

  // Lockout holds progress at zero, then the story plays again from zero.
  ticks(&mut viewer, LOCKOUT_TICKS);
  assert!(!viewer.is_transitioning());
  assert_eq!(viewer.current_story_index(), 1);
  assert!(viewer.progress() > 0.0);
  assert!(viewer.progress() < 0.01);
}

#[test]
fn completion_of_last_story_moves_to_next_user() {
  let mut viewer = open_at(3, 1, 1);
  ticks(&mut viewer, STORY_TICKS);
  assert_eq!(viewer.current_user_index(), 2);
  let events = drain(&mut viewer);
  assert!(matches!(&events[0], ViewerEvent::UserChanged(us) if us.id == 3));
}

#[test]
fn completion_at_the_very_end_dismisses_once() {
  let mut viewer = open_at(2, 1, 1);
  ticks(&mut viewer, STORY_TICKS * 3);
  assert!(viewer.is_dismissed());
  assert_eq!(dismissals(&drain(&mut viewer)), 1);
}

#[test]
fn pause_freezes_progress_without_banking_time() {
  let mut viewer = open_at(2, 2, 0);
  ticks(&mut viewer, 60);
  let held = viewer.progress();

  viewer.begin_hold();
  ticks(&mut viewer, 1000);
  assert!(viewer.is_paused());
  assert_eq!(viewer.progress(), held);
  assert_eq!(viewer.current_story_index(), 0);

  viewer.end_hold();
  viewer.tick();
  assert!((viewer.progress() - (held + 1.0 / 240.0)).abs() < EPSILON);
}

#[test]
fn progress_bar_segments_fill_in_order() {
  let mut viewer = open_at(1, 3, 0);
  viewer.next_story();
  // The tick that ends the lockout already counts towards progress.
  ticks(&mut viewer, LOCKOUT_TICKS - 1 + 120);
  assert_eq!(viewer.progress_fill(0), 1.0);
  assert!((viewer.progress_fill(1) - 0.5).abs() < EPSILON);
  assert_eq!(viewer.progress_fill(2), 0.0);
}

// ─── Taps ────────────────────────────────────────────────────────────────────

#[test]
fn tap_zones_split_the_viewport_in_thirds() {
  assert_eq!(TapZone::classify(0.0, 300.0), TapZone::Previous);
  assert_eq!(TapZone::classify(99.9, 300.0), TapZone::Previous);
  assert_eq!(TapZone::classify(100.0, 300.0), TapZone::Middle);
  assert_eq!(TapZone::classify(200.0, 300.0), TapZone::Middle);
  assert_eq!(TapZone::classify(200.1, 300.0), TapZone::Next);
  assert_eq!(TapZone::classify(300.0, 300.0), TapZone::Next);
}

#[test]
fn taps_navigate_by_zone() {
  let mut viewer = open_at(2, 3, 0);

  assert_eq!(viewer.tap(250.0, 300.0), TapZone::Next);
  assert_eq!(viewer.current_story_index(), 1);
  ticks(&mut viewer, LOCKOUT_TICKS);

  assert_eq!(viewer.tap(150.0, 300.0), TapZone::Middle);
  assert_eq!(viewer.current_story_index(), 1);
  assert!(!viewer.is_transitioning());

  assert_eq!(viewer.tap(10.0, 300.0), TapZone::Previous);
  assert_eq!(viewer.current_story_index(), 0);
}

#[test]
fn navigation_is_locked_out_while_transitioning() {
  let mut viewer = open_at(1, 4, 0);
  viewer.next_story();
  viewer.next_story();
  viewer.previous_story();
  assert_eq!(viewer.current_story_index(), 1);

  ticks(&mut viewer, LOCKOUT_TICKS - 1);
  viewer.next_story();
  assert_eq!(viewer.current_story_index(), 1);

  viewer.tick();
  viewer.next_story();
  assert_eq!(viewer.current_story_index(), 2);
}

#[test]
fn lockout_expires_while_paused() {
  let mut viewer = open_at(1, 3, 0);
  viewer.begin_hold();
  viewer.next_story();
  ticks(&mut viewer, LOCKOUT_TICKS);
  assert!(!viewer.is_transitioning());
  viewer.next_story();
  assert_eq!(viewer.current_story_index(), 2);
}

// ─── Users and dismissal ─────────────────────────────────────────────────────

#[test]
fn previous_at_first_story_of_first_user_dismisses() {
  let mut viewer = open_at(3, 2, 0);
  viewer.previous_story();
  assert!(viewer.is_dismissed());
  assert_eq!(drain(&mut viewer), vec![ViewerEvent::Dismiss]);
}

#[test]
fn next_at_last_story_of_last_user_dismisses() {
  let mut viewer = open_at(3, 2, 2);
  viewer.next_story();
  ticks(&mut viewer, LOCKOUT_TICKS);
  drain(&mut viewer);
  viewer.next_story();
  assert!(viewer.is_dismissed());
  assert_eq!(drain(&mut viewer), vec![ViewerEvent::Dismiss]);

  viewer.next_story();
  viewer.close();
  ticks(&mut viewer, 10);
  assert!(drain(&mut viewer).is_empty());
}

#[test]
fn next_user_reports_the_entered_user() {
  let mut viewer = open_at(3, 1, 0);
  viewer.next_story();
  let events = drain(&mut viewer);
  let expected = viewer.user_stories()[1].clone();
  assert_eq!(events[0], ViewerEvent::UserChanged(expected));
  assert_eq!(viewer.current_story_index(), 0);
}

#[test]
fn previous_user_lands_on_their_last_story() {
  let mut viewer = open_at(3, 3, 2);
  viewer.previous_story();
  assert_eq!(viewer.current_user_index(), 1);
  assert_eq!(viewer.current_story_index(), 2);
  assert_eq!(viewer.progress(), 0.0);
  let events = drain(&mut viewer);
  let expected = viewer.user_stories()[1].clone();
  assert_eq!(events[0], ViewerEvent::UserChanged(expected));
}

#[test]
fn close_emits_dismiss_once() {
  let mut viewer = open_at(2, 2, 0);
  viewer.close();
  viewer.close();
  assert_eq!(dismissals(&drain(&mut viewer)), 1);
}

// ─── Preload ─────────────────────────────────────────────────────────────────

#[test]
fn last_story_preloads_the_next_users_first_story() {
  let mut viewer = open_at(2, 2, 0);
  viewer.next_story();
  let next_user_first = viewer.user_stories()[1].stories[0].image_url.clone();
  assert_eq!(
    drain(&mut viewer),
    vec![ViewerEvent::Preload { urls: vec![next_user_first] }]
  );
}

#[test]
fn nothing_to_preload_at_the_end() {
  let mut viewer = open_at(2, 1, 0);
  viewer.next_story();
  let events = drain(&mut viewer);
  assert_eq!(events.len(), 1);
  assert!(matches!(events[0], ViewerEvent::UserChanged(_)));
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[test]
fn refresh_picks_up_new_likes() {
  let list = user_stories(2, 2);
  let mut viewer = StoryViewer::open(list.clone(), &list[0], ViewerConfig::default());
  assert!(!viewer.is_current_story_liked());

  let mut latest = list.clone();
  latest[0] = latest[0].with_like_toggled(latest[0].stories[0].id);
  viewer.refresh(&latest);

  assert!(viewer.is_current_story_liked());
  assert_eq!(viewer.current_story_index(), 0);
}
