//! [`StoryViewer`] — the full-screen, auto-advancing story state machine.
//!
//! The viewer runs on a simulated clock: every [`StoryViewer::tick`] advances
//! it by one tick interval, whether or not playback is paused. Progress is
//! counted in whole ticks, so a story completes after exactly
//! `story_seconds * ticks_per_second` unpaused ticks.
//!
//! Side effects are never performed here. They are queued as
//! [`ViewerEvent`]s and drained with [`StoryViewer::poll_event`].

use std::{collections::VecDeque, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::story::{Story, UserStory};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
  /// Time one story stays on screen.
  pub story_seconds:      f64,
  /// Rate of the progress driver.
  pub ticks_per_second:   u32,
  /// Lockout after a story or user switch during which navigation and
  /// progress are suspended.
  pub transition_seconds: f64,
}

impl Default for ViewerConfig {
  fn default() -> Self {
    Self {
      story_seconds:      4.0,
      ticks_per_second:   60,
      transition_seconds: 0.3,
    }
  }
}

impl ViewerConfig {
  pub fn tick_interval(&self) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(self.ticks_per_second.max(1)))
  }

  fn ticks_per_story(&self) -> u64 {
    self.seconds_to_ticks(self.story_seconds).max(1)
  }

  fn transition_ticks(&self) -> u64 { self.seconds_to_ticks(self.transition_seconds) }

  fn seconds_to_ticks(&self, seconds: f64) -> u64 {
    (seconds.max(0.0) * f64::from(self.ticks_per_second.max(1))).round() as u64
  }
}

// ─── Input / output ──────────────────────────────────────────────────────────

/// Horizontal thirds of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
  Previous,
  Middle,
  Next,
}

impl TapZone {
  /// `x < width/3` is previous, `x > 2*width/3` is next.
  pub fn classify(x: f64, width: f64) -> Self {
    let third = width / 3.0;
    if x < third {
      Self::Previous
    } else if x > width - third {
      Self::Next
    } else {
      Self::Middle
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
  /// Navigation entered another user; carries the newly current entry.
  UserChanged(UserStory),
  /// Best-effort prefetch of upcoming images.
  Preload { urls: Vec<String> },
  /// The viewer should be closed. Emitted at most once.
  Dismiss,
}

/// The observable navigation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
  pub current_user:  usize,
  pub current_story: usize,
  pub progress:      f64,
  pub paused:        bool,
  pub transitioning: bool,
}

// ─── Viewer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoryViewer {
  config:           ViewerConfig,
  user_stories:     Vec<UserStory>,
  current_user:     usize,
  current_story:    usize,
  /// Unpaused ticks spent on the current story.
  story_ticks:      u64,
  paused:           bool,
  /// Ticks since the viewer opened.
  clock:            u64,
  transition_until: Option<u64>,
  dismissed:        bool,
  events:           VecDeque<ViewerEvent>,
}

impl StoryViewer {
  /// Open on `start` within a fixed snapshot of the feed. Falls back to the
  /// first entry when `start` is not in the snapshot.
  pub fn open(user_stories: Vec<UserStory>, start: &UserStory, config: ViewerConfig) -> Self {
    let user_stories = if user_stories.is_empty() {
      vec![start.clone()]
    } else {
      user_stories
    };
    let current_user = user_stories
      .iter()
      .position(|us| us.id == start.id)
      .unwrap_or(0);

    let mut viewer = Self {
      config,
      user_stories,
      current_user,
      current_story: 0,
      story_ticks: 0,
      paused: false,
      clock: 0,
      transition_until: None,
      dismissed: false,
      events: VecDeque::new(),
    };
    debug!(user_id = start.id, index = current_user, "viewer opened");
    viewer.queue_preload();
    viewer
  }

  // ── Accessors ───────────────────────────────────────────────────────────

  pub fn state(&self) -> ViewerState {
    ViewerState {
      current_user:  self.current_user,
      current_story: self.current_story,
      progress:      self.progress(),
      paused:        self.paused,
      transitioning: self.is_transitioning(),
    }
  }

  pub fn user_stories(&self) -> &[UserStory] { &self.user_stories }

  pub fn current_user_index(&self) -> usize { self.current_user }

  pub fn current_story_index(&self) -> usize { self.current_story }

  pub fn current_user_story(&self) -> &UserStory { &self.user_stories[self.current_user] }

  pub fn current_story(&self) -> Option<&Story> {
    self.current_user_story().stories.get(self.current_story)
  }

  pub fn is_current_story_liked(&self) -> bool {
    self
      .current_story()
      .is_some_and(|s| self.current_user_story().is_liked(s.id))
  }

  /// Fraction of the current story already shown, in `[0, 1]`.
  pub fn progress(&self) -> f64 {
    (self.story_ticks as f64 / self.config.ticks_per_story() as f64).min(1.0)
  }

  /// Fill of the progress segment for story `index` of the current user.
  pub fn progress_fill(&self, index: usize) -> f64 {
    match index.cmp(&self.current_story) {
      std::cmp::Ordering::Less => 1.0,
      std::cmp::Ordering::Equal => self.progress(),
      std::cmp::Ordering::Greater => 0.0,
    }
  }

  pub fn is_paused(&self) -> bool { self.paused }

  pub fn is_transitioning(&self) -> bool { self.transition_until.is_some() }

  pub fn is_dismissed(&self) -> bool { self.dismissed }

  /// Next queued side effect, oldest first.
  pub fn poll_event(&mut self) -> Option<ViewerEvent> { self.events.pop_front() }

  // ── Driver ──────────────────────────────────────────────────────────────

  /// Advance the clock by one tick interval.
  pub fn tick(&mut self) {
    if self.dismissed {
      return;
    }
    self.clock += 1;
    if self.transition_until.is_some_and(|until| self.clock >= until) {
      self.transition_until = None;
    }
    if self.paused || self.is_transitioning() {
      return;
    }
    self.story_ticks += 1;
    if self.story_ticks >= self.config.ticks_per_story() {
      self.next_story();
    }
  }

  // ── Input ───────────────────────────────────────────────────────────────

  /// Long-press started: freeze progress.
  pub fn begin_hold(&mut self) { self.paused = true; }

  /// Long-press released: continue from the same progress.
  pub fn end_hold(&mut self) { self.paused = false; }

  /// Tap at horizontal position `x` of a viewport `width` wide.
  pub fn tap(&mut self, x: f64, width: f64) -> TapZone {
    let zone = TapZone::classify(x, width);
    match zone {
      TapZone::Previous => self.previous_story(),
      TapZone::Next => self.next_story(),
      TapZone::Middle => {}
    }
    zone
  }

  /// Explicit close control.
  pub fn close(&mut self) { self.dismiss(); }

  /// Pick up engagement changes from a newer copy of the feed. Entries are
  /// matched by user id; story sets and positions are left untouched.
  pub fn refresh(&mut self, latest: &[UserStory]) {
    for entry in &mut self.user_stories {
      if let Some(fresh) = latest.iter().find(|us| us.id == entry.id) {
        *entry = entry.with_engagement_of(fresh);
      }
    }
  }

  // ── Navigation ──────────────────────────────────────────────────────────

  pub fn next_story(&mut self) {
    if self.dismissed || self.is_transitioning() {
      return;
    }
    self.begin_transition();
    if self.current_story + 1 < self.current_user_story().stories.len() {
      self.current_story += 1;
      self.story_ticks = 0;
      self.queue_preload();
    } else {
      self.next_user();
    }
  }

  pub fn previous_story(&mut self) {
    if self.dismissed || self.is_transitioning() {
      return;
    }
    self.begin_transition();
    if self.current_story > 0 {
      self.current_story -= 1;
      self.story_ticks = 0;
      self.queue_preload();
    } else {
      self.previous_user();
    }
  }

  fn next_user(&mut self) {
    if self.current_user + 1 < self.user_stories.len() {
      self.current_user += 1;
      self.current_story = 0;
      self.story_ticks = 0;
      self.enter_user();
    } else {
      self.dismiss();
    }
  }

  fn previous_user(&mut self) {
    if self.current_user > 0 {
      self.current_user -= 1;
      self.current_story = self.current_user_story().stories.len().saturating_sub(1);
      self.story_ticks = 0;
      self.enter_user();
    } else {
      self.dismiss();
    }
  }

  fn enter_user(&mut self) {
    let entered = self.current_user_story().clone();
    debug!(user_id = entered.id, index = self.current_user, "viewer changed user");
    self.events.push_back(ViewerEvent::UserChanged(entered));
    self.queue_preload();
  }

  fn begin_transition(&mut self) {
    let ticks = self.config.transition_ticks();
    if ticks > 0 {
      self.transition_until = Some(self.clock + ticks);
    }
  }

  fn dismiss(&mut self) {
    if self.dismissed {
      return;
    }
    self.dismissed = true;
    self.transition_until = None;
    debug!(index = self.current_user, "viewer dismissed");
    self.events.push_back(ViewerEvent::Dismiss);
  }

  /// Queue the next story of this user, or the first story of the next user
  /// when this is the user's last story.
  fn queue_preload(&mut self) {
    let current = self.current_user_story();
    let next = current
      .stories
      .get(self.current_story + 1)
      .or_else(|| {
        self
          .user_stories
          .get(self.current_user + 1)
          .and_then(|us| us.stories.first())
      })
      .map(|s| s.image_url.clone());
    if let Some(url) = next {
      self.events.push_back(ViewerEvent::Preload { urls: vec![url] });
    }
  }
}
