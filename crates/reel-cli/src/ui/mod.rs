//! TUI rendering — orchestrates all panes.

pub mod story_grid;
pub mod story_viewer;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use reel_core::{preload::ImageFetcher, store::EngagementStore};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S, F>(f: &mut Frame, app: &App<S, F>)
where
  S: EngagementStore + 'static,
  F: ImageFetcher,
{
  let rows = root_rows(f.area());

  draw_header(f, rows[0]);
  match (&app.screen, &app.session) {
    (Screen::Viewer, Some(session)) => story_viewer::draw(f, rows[1], session.viewer()),
    _ => story_grid::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

/// Vertical stack: header, body, status bar.
fn root_rows(area: Rect) -> [Rect; 3] {
  Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .areas(area)
}

/// The area the grid or viewer is drawn into on a terminal of size `area`.
pub fn body_area(area: Rect) -> Rect { root_rows(area)[1] }

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " reel  stories",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{date} "),
    Style::default().fg(Color::DarkGray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S, F>(f: &mut Frame, area: Rect, app: &App<S, F>)
where
  S: EngagementStore + 'static,
  F: ImageFetcher,
{
  let (mode_label, hints) = match &app.screen {
    Screen::Grid if app.filter_active => (
      "SEARCH",
      "Type to filter  Esc cancel  Enter done",
    ),
    Screen::Grid => (
      "GRID",
      "←↑↓→/hjkl move  Enter/click open  / search  q quit",
    ),
    Screen::Viewer => (
      "STORY",
      "click/←→ prev·next  hold/space pause  l/♡ like  Esc/✕ close",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Magenta)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
