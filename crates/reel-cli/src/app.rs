//! Application state machine and event dispatcher.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use ratatui::layout::Rect;
use reel_core::{
  feed::{Feed, FeedSnapshot},
  mock::MockContentSource,
  preload::ImageFetcher,
  session::{SessionEvent, ViewerSession},
  store::EngagementStore,
  story::UserStory,
  viewer::ViewerConfig,
};
use tokio::sync::watch;
use tracing::debug;

use crate::ui::{
  self,
  story_grid,
  story_viewer::{self, ViewerHit},
};

/// Cards per grid row.
pub const GRID_COLUMNS: usize = 3;

/// A mouse press held at least this long pauses the story instead of tapping.
const HOLD_AFTER: Duration = Duration::from_millis(250);

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// The avatar grid.
  Grid,
  /// The full-screen story viewer.
  Viewer,
}

/// A left-button press that has not been released yet.
#[derive(Debug, Clone, Copy)]
struct Press {
  at:      Instant,
  /// What the press landed on.
  hit:     ViewerHit,
  /// The press has turned into a hold and paused playback.
  holding: bool,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S, F> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// The paginated feed; loads run as background tasks.
  pub feed: Feed<S, MockContentSource>,

  /// Latest feed state seen by the UI.
  pub snapshot: FeedSnapshot,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* grid.
  pub grid_cursor: usize,

  /// The open viewer, if any. Dropping it stops its timer and prefetches.
  pub session: Option<ViewerSession<F>>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  changes:       watch::Receiver<FeedSnapshot>,
  press:         Option<Press>,
  viewer_config: ViewerConfig,
  fetcher:       Arc<F>,
}

impl<S, F> App<S, F>
where
  S: EngagementStore + 'static,
  F: ImageFetcher,
{
  pub fn new(
    feed: Feed<S, MockContentSource>,
    viewer_config: ViewerConfig,
    fetcher: Arc<F>,
  ) -> Self {
    let changes = feed.subscribe();
    let snapshot = changes.borrow().clone();
    Self {
      screen: Screen::Grid,
      feed,
      snapshot,
      filter: String::new(),
      filter_active: false,
      grid_cursor: 0,
      session: None,
      status_msg: String::new(),
      changes,
      press: None,
      viewer_config,
      fetcher,
    }
  }

  // ── Feed ──────────────────────────────────────────────────────────────────

  /// Kick off the first page load in the background.
  pub fn start_loading(&self) {
    let feed = self.feed.clone();
    tokio::spawn(async move { feed.load_initial_data().await });
  }

  /// Fetch the next page in the background unless one is in flight or a
  /// filter hides the end of the list.
  fn request_more(&self) {
    if self.snapshot.loading || !self.filter.is_empty() {
      return;
    }
    let feed = self.feed.clone();
    tokio::spawn(async move { feed.load_more_stories().await });
  }

  /// Pull the newest feed snapshot. Returns `true` if anything changed.
  pub fn sync_feed(&mut self) -> bool {
    if !self.changes.has_changed().unwrap_or(false) {
      return false;
    }
    self.snapshot = self.changes.borrow_and_update().clone();
    self.status_msg = if self.snapshot.loading {
      "Loading stories…".into()
    } else {
      String::new()
    };
    let len = self.filtered().len();
    self.grid_cursor = self.grid_cursor.min(len.saturating_sub(1));
    true
  }

  /// Entries that match the current filter query, in feed order.
  pub fn filtered(&self) -> Vec<&UserStory> {
    if self.filter.is_empty() {
      return self.snapshot.user_stories.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .snapshot
      .user_stories
      .iter()
      .filter(|us| matcher.fuzzy_match(&us.user.name, &self.filter).is_some())
      .collect()
  }

  /// Whether the grid reserves its bottom line for the filter or the
  /// loading indicator.
  pub fn shows_grid_footer(&self) -> bool {
    self.filter_active || !self.filter.is_empty() || self.snapshot.loading
  }

  /// The entry under the grid cursor, if any.
  pub fn cursor_entry(&self) -> Option<&UserStory> {
    self.filtered().get(self.grid_cursor).copied()
  }

  // ── Viewer ────────────────────────────────────────────────────────────────

  /// Apply elapsed ticks to the open viewer and act on what it reports.
  pub async fn pump_viewer(&mut self) {
    let Some(session) = self.session.as_mut() else {
      return;
    };
    if let Some(press) = self.press.as_mut()
      && matches!(press.hit, ViewerHit::Tap { .. })
      && !press.holding
      && press.at.elapsed() >= HOLD_AFTER
    {
      press.holding = true;
      session.viewer_mut().begin_hold();
    }
    let events = session.pump();
    self.handle_session_events(events).await;
  }

  async fn handle_session_events(&mut self, events: Vec<SessionEvent>) {
    for event in events {
      match event {
        SessionEvent::UserChanged(us) => self.feed.mark_viewed(&us).await,
        SessionEvent::Dismiss => self.close_viewer(),
      }
    }
  }

  /// Route events queued by direct viewer input.
  async fn route_viewer_events(&mut self) {
    let events = match self.session.as_mut() {
      Some(session) => session.route_events(),
      None => return,
    };
    self.handle_session_events(events).await;
  }

  /// Open the viewer on the entry under the cursor, over the visible list.
  async fn open_viewer(&mut self) {
    let Some(start) = self.cursor_entry().cloned() else {
      return;
    };
    self.feed.mark_viewed(&start).await;

    let list: Vec<UserStory> = self.filtered().into_iter().cloned().collect();
    self.session = Some(ViewerSession::open(
      list,
      &start,
      self.viewer_config.clone(),
      Arc::clone(&self.fetcher),
    ));
    self.screen = Screen::Viewer;
  }

  fn close_viewer(&mut self) {
    self.session = None;
    self.press = None;
    self.screen = Screen::Grid;
  }

  /// Toggle the like on the story currently shown and refresh the viewer's
  /// copy of the feed.
  async fn toggle_like(&mut self) {
    let Some(session) = self.session.as_ref() else {
      return;
    };
    let viewer = session.viewer();
    let Some(story) = viewer.current_story().cloned() else {
      return;
    };
    let user_story = viewer.current_user_story().clone();

    self.feed.toggle_like(&story, &user_story).await;
    let latest = self.feed.user_stories();
    if let Some(session) = self.session.as_mut() {
      session.viewer_mut().refresh(&latest);
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }

    match self.screen {
      Screen::Grid => self.handle_grid_key(key).await,
      Screen::Viewer => {
        self.handle_viewer_key(key).await;
        Ok(true)
      }
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.grid_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.grid_cursor = 0;
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.grid_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.grid_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_grid_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1),
      KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1),
      KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-(GRID_COLUMNS as isize)),
      KeyCode::Down | KeyCode::Char('j') => self.move_cursor(GRID_COLUMNS as isize),

      // Open viewer
      KeyCode::Enter | KeyCode::Char(' ') => self.open_viewer().await,

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.grid_cursor = 0;
      }

      _ => {}
    }
    Ok(true)
  }

  /// Move the grid cursor, clamped to the list. Reaching the last row asks
  /// for the next page.
  fn move_cursor(&mut self, delta: isize) {
    let len = self.filtered().len();
    if len == 0 {
      return;
    }
    let target = self.grid_cursor.saturating_add_signed(delta).min(len - 1);
    self.grid_cursor = target;
    if target / GRID_COLUMNS == (len - 1) / GRID_COLUMNS {
      debug!(cursor = target, len, "reached last grid row");
      self.request_more();
    }
  }

  async fn handle_viewer_key(&mut self, key: KeyEvent) {
    let Some(session) = self.session.as_mut() else {
      return;
    };
    let viewer = session.viewer_mut();
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') => viewer.close(),
      KeyCode::Left | KeyCode::Char('h') => viewer.previous_story(),
      KeyCode::Right => viewer.next_story(),
      KeyCode::Char(' ') => {
        if viewer.is_paused() {
          viewer.end_hold();
        } else {
          viewer.begin_hold();
        }
      }
      KeyCode::Char('l') => {
        self.toggle_like().await;
        return;
      }
      _ => return,
    }
    self.route_viewer_events().await;
  }

  // ── Mouse handling ────────────────────────────────────────────────────────

  /// Process a mouse event on a terminal of size `screen`.
  pub async fn handle_mouse(&mut self, mouse: MouseEvent, screen: Rect) {
    let body = ui::body_area(screen);
    match self.screen {
      Screen::Grid => self.handle_grid_mouse(mouse, body).await,
      Screen::Viewer => self.handle_viewer_mouse(mouse, body).await,
    }
  }

  /// A click on a card opens it; the wheel moves a row at a time.
  async fn handle_grid_mouse(&mut self, mouse: MouseEvent, body: Rect) {
    match mouse.kind {
      MouseEventKind::Down(MouseButton::Left) => {
        let Some(index) = story_grid::card_at(body, self, mouse.column, mouse.row) else {
          return;
        };
        self.filter_active = false;
        self.grid_cursor = index;
        self.open_viewer().await;
      }
      MouseEventKind::ScrollDown => self.move_cursor(GRID_COLUMNS as isize),
      MouseEventKind::ScrollUp => self.move_cursor(-(GRID_COLUMNS as isize)),
      _ => {}
    }
  }

  /// The close and like controls act on release. Elsewhere a short click is
  /// a tap and a long press holds.
  async fn handle_viewer_mouse(&mut self, mouse: MouseEvent, body: Rect) {
    match mouse.kind {
      MouseEventKind::Down(MouseButton::Left) => {
        self.press = Some(Press {
          at:      Instant::now(),
          hit:     story_viewer::hit_test(body, mouse.column, mouse.row),
          holding: false,
        });
      }
      MouseEventKind::Up(MouseButton::Left) => {
        let Some(press) = self.press.take() else {
          return;
        };
        if press.hit == ViewerHit::Like {
          self.toggle_like().await;
          return;
        }
        let Some(session) = self.session.as_mut() else {
          return;
        };
        let viewer = session.viewer_mut();
        match press.hit {
          ViewerHit::Close => viewer.close(),
          ViewerHit::Tap { .. } if press.holding => viewer.end_hold(),
          ViewerHit::Tap { x, width } => {
            viewer.tap(f64::from(x), f64::from(width));
          }
          ViewerHit::Like | ViewerHit::Outside => return,
        }
        self.route_viewer_events().await;
      }
      _ => {}
    }
  }
}
