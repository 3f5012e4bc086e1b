//! Full-screen story viewer pane.

use chrono::Utc;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Borders, Paragraph},
};
use reel_core::viewer::StoryViewer;

/// Split `width` columns into `count` progress segments separated by one
/// blank column. The remainder goes to the leading segments.
fn segment_widths(width: u16, count: usize) -> Vec<u16> {
  if count == 0 {
    return Vec::new();
  }
  let gaps = u16::try_from(count - 1).unwrap_or(u16::MAX);
  let usable = width.saturating_sub(gaps);
  let count16 = u16::try_from(count).unwrap_or(u16::MAX);
  let (base, extra) = (usable / count16, usable % count16);
  (0..count16).map(|i| base + u16::from(i < extra)).collect()
}

/// Where each part of the viewer lands inside its area.
struct Regions {
  progress: Rect,
  header:   Rect,
  close:    Rect,
  image:    Rect,
  footer:   Rect,
  heart:    Rect,
}

impl Regions {
  fn of(area: Rect) -> Self {
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // progress segments
        Constraint::Length(1), // header
        Constraint::Min(3),    // image
        Constraint::Length(1), // footer
      ])
      .split(area);
    let (header, close) = split_right_control(rows[1]);
    let (footer, heart) = split_right_control(rows[3]);
    Self { progress: rows[0], header, close, image: rows[2], footer, heart }
  }
}

/// Split a one-line row into its text and a three-column control on the right.
fn split_right_control(row: Rect) -> (Rect, Rect) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(0), Constraint::Length(3)])
    .split(row);
  (cols[0], cols[1])
}

/// What a click at a screen cell lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerHit {
  /// The ✕ in the header.
  Close,
  /// The heart in the footer.
  Like,
  /// Anywhere else in the viewer; `x` is relative to the viewer's left edge.
  Tap { x: u16, width: u16 },
  /// Outside the viewer.
  Outside,
}

/// Resolve a click at (`column`, `row`) against a viewer drawn into `area`.
/// The controls sit above the tap layer.
pub fn hit_test(area: Rect, column: u16, row: u16) -> ViewerHit {
  let at = Position { x: column, y: row };
  let regions = Regions::of(area);
  if regions.close.contains(at) {
    ViewerHit::Close
  } else if regions.heart.contains(at) {
    ViewerHit::Like
  } else if area.contains(at) {
    ViewerHit::Tap { x: column - area.x, width: area.width }
  } else {
    ViewerHit::Outside
  }
}

/// Render the viewer into `area`.
pub fn draw(f: &mut Frame, area: Rect, viewer: &StoryViewer) {
  let regions = Regions::of(area);
  draw_progress(f, regions.progress, viewer);
  draw_header(f, &regions, viewer);
  draw_image(f, regions.image, viewer);
  draw_footer(f, &regions, viewer);
}

fn draw_progress(f: &mut Frame, area: Rect, viewer: &StoryViewer) {
  let count = viewer.current_user_story().stories.len();
  let mut spans = Vec::with_capacity(count * 3);
  for (i, width) in segment_widths(area.width, count).into_iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw(" "));
    }
    let filled = (viewer.progress_fill(i) * f64::from(width)).round() as u16;
    let filled = filled.min(width);
    spans.push(Span::styled(
      "━".repeat(usize::from(filled)),
      Style::default().fg(Color::White),
    ));
    spans.push(Span::styled(
      "━".repeat(usize::from(width - filled)),
      Style::default().fg(Color::DarkGray),
    ));
  }
  f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_header(f: &mut Frame, regions: &Regions, viewer: &StoryViewer) {
  let us = viewer.current_user_story();
  let age = viewer
    .current_story()
    .map(|s| (Utc::now() - s.timestamp).num_minutes())
    .map(|m| if m < 1 { "now".to_owned() } else { format!("{m}m") })
    .unwrap_or_default();

  let line = Line::from(vec![
    Span::styled("◉ ", Style::default().fg(Color::LightMagenta)),
    Span::styled(
      us.user.name.clone(),
      Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {age}"), Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(Paragraph::new(line), regions.header);
  f.render_widget(
    Paragraph::new("✕").alignment(Alignment::Right),
    regions.close,
  );
}

/// Terminals cannot show the photo itself; draw a frame with its address.
fn draw_image(f: &mut Frame, area: Rect, viewer: &StoryViewer) {
  let block = Block::default()
    .borders(Borders::ALL)
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(story) = viewer.current_story() else {
    f.render_widget(
      Paragraph::new("No stories.")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let pad = inner.height.saturating_sub(2) / 2;
  let mut lines = vec![Line::raw(""); usize::from(pad)];
  lines.push(Line::styled(
    format!("story {}", story.id),
    Style::default().fg(Color::Gray),
  ));
  lines.push(Line::styled(
    story.image_url.clone(),
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::UNDERLINED),
  ));
  f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_footer(f: &mut Frame, regions: &Regions, viewer: &StoryViewer) {
  let paused = if viewer.is_paused() {
    Span::styled("❚❚ paused", Style::default().fg(Color::Yellow))
  } else {
    Span::raw("")
  };
  let heart = if viewer.is_current_story_liked() {
    Span::styled("♥ ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
  } else {
    Span::styled("♡ ", Style::default().fg(Color::White))
  };

  f.render_widget(Paragraph::new(Line::from(paused)), regions.footer);
  f.render_widget(
    Paragraph::new(Line::from(heart)).alignment(Alignment::Right),
    regions.heart,
  );
}
