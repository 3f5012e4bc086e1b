//! Story grid — one card per feed entry, three to a row.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Position, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Borders, Paragraph},
};
use reel_core::{preload::ImageFetcher, store::EngagementStore, story::UserStory};

use crate::app::{App, GRID_COLUMNS};

/// Rows taken by one card, borders included.
const CARD_HEIGHT: u16 = 5;

/// First grid row to draw so that `cursor_row` stays on screen.
fn first_visible_row(cursor_row: usize, visible_rows: usize) -> usize {
  cursor_row.saturating_sub(visible_rows.saturating_sub(1))
}

/// Split the grid's area into the card region and, when `footer` is set and
/// there is room, a one-line footer below it.
fn regions(area: Rect, footer: bool) -> (Rect, Option<Rect>) {
  let mut cards = Block::default().borders(Borders::ALL).inner(area);
  if !footer || cards.height <= 1 {
    return (cards, None);
  }
  let line = Rect { y: cards.y + cards.height - 1, height: 1, ..cards };
  cards.height -= 1;
  (cards, Some(line))
}

/// The visible cards as `(index, area)` pairs, scrolled so the cursor's row
/// is on screen.
fn card_slots(cards: Rect, len: usize, cursor: usize) -> Vec<(usize, Rect)> {
  let visible_rows = usize::from((cards.height / CARD_HEIGHT).max(1));
  let first = first_visible_row(cursor / GRID_COLUMNS, visible_rows);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
    .split(cards);

  let mut slots = Vec::new();
  for (slot, row_area) in rows.iter().enumerate() {
    let cols = Layout::default()
      .direction(Direction::Horizontal)
      .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
      .split(*row_area);
    for (col, card_area) in cols.iter().enumerate() {
      let index = (first + slot) * GRID_COLUMNS + col;
      if index < len && card_area.height > 0 {
        slots.push((index, *card_area));
      }
    }
  }
  slots
}

/// Index into the filtered list of the card drawn at (`column`, `row`).
pub fn card_at<S, F>(area: Rect, app: &App<S, F>, column: u16, row: u16) -> Option<usize>
where
  S: EngagementStore + 'static,
  F: ImageFetcher,
{
  let (cards, _) = regions(area, app.shows_grid_footer());
  let at = Position { x: column, y: row };
  card_slots(cards, app.filtered().len(), app.grid_cursor)
    .into_iter()
    .find(|(_, rect)| rect.contains(at))
    .map(|(index, _)| index)
}

/// Render the grid into `area`.
pub fn draw<S, F>(f: &mut Frame, area: Rect, app: &App<S, F>)
where
  S: EngagementStore + 'static,
  F: ImageFetcher,
{
  let filtered = app.filtered();
  let total = app.snapshot.user_stories.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Stories ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Stories ({total}) ")
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  f.render_widget(block, area);
  let (inner, footer) = regions(area, app.shows_grid_footer());

  // Footer line: filter query or loading indicator.
  if let Some(footer) = footer {
    let line = if app.filter_active {
      Line::styled(format!("/{}_", app.filter), Style::default().fg(Color::Yellow))
    } else if !app.filter.is_empty() {
      Line::styled(format!("/{}", app.filter), Style::default().fg(Color::Yellow))
    } else {
      Line::styled("⟳ loading…", Style::default().fg(Color::Magenta))
    };
    f.render_widget(Paragraph::new(line), footer);
  }

  if filtered.is_empty() {
    let hint = if app.snapshot.loading || total == 0 {
      "No stories yet."
    } else {
      "No matches."
    };
    f.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  for (index, card_area) in card_slots(inner, filtered.len(), app.grid_cursor) {
    draw_card(f, card_area, filtered[index], index == app.grid_cursor);
  }
}

/// A preview card: ring-coloured border, avatar glyph and name.
fn draw_card(f: &mut Frame, area: Rect, us: &UserStory, selected: bool) {
  // Unviewed entries get the bright ring; viewed ones fade to grey.
  let ring = if us.is_viewed {
    Style::default().fg(Color::DarkGray)
  } else {
    Style::default().fg(Color::LightMagenta)
  };
  let block = Block::default()
    .borders(Borders::ALL)
    .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
    .border_style(ring);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let name_style = if selected {
    Style::default()
      .fg(Color::White)
      .bg(Color::Blue)
      .add_modifier(Modifier::BOLD)
  } else if us.is_viewed {
    Style::default().fg(Color::Gray)
  } else {
    Style::default().fg(Color::White)
  };

  let mut meta = vec![Span::styled(
    format!("{} ", us.stories.len()),
    Style::default().fg(Color::DarkGray),
  )];
  if !us.liked_story_ids.is_empty() {
    meta.push(Span::styled(
      format!("♥{}", us.liked_story_ids.len()),
      Style::default().fg(Color::Red),
    ));
  }

  let lines = vec![
    Line::from(vec![
      Span::styled("◉ ", ring),
      Span::styled(us.user.name.clone(), name_style),
    ]),
    Line::from(meta),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
  use ratatui::layout::Rect;

  use super::{card_slots, first_visible_row, regions};

  #[test]
  fn cursor_row_stays_on_screen() {
    assert_eq!(first_visible_row(0, 4), 0);
    assert_eq!(first_visible_row(3, 4), 0);
    assert_eq!(first_visible_row(4, 4), 1);
    assert_eq!(first_visible_row(9, 4), 6);
    assert_eq!(first_visible_row(2, 1), 2);
    assert_eq!(first_visible_row(2, 0), 2);
  }

  #[test]
  fn cards_are_laid_out_three_to_a_row() {
    // 90x20 grid body: 18 inner rows hold three card rows.
    let (cards, footer) = regions(Rect::new(0, 1, 90, 20), false);
    assert!(footer.is_none());
    let slots = card_slots(cards, 10, 0);

    let indices: Vec<_> = slots.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..9).collect::<Vec<_>>());
    assert_eq!((slots[0].1.x, slots[0].1.y, slots[0].1.height), (1, 2, 5));
    assert_eq!(slots[4].1.y, 7);
    assert!(slots[2].1.x > slots[1].1.x);
  }

  #[test]
  fn slots_scroll_with_the_cursor_and_stop_at_the_list_end() {
    let (cards, footer) = regions(Rect::new(0, 1, 90, 20), true);
    assert_eq!(footer, Some(Rect::new(1, 19, 88, 1)));

    // Cursor on row 3 scrolls one row down; only ten entries exist.
    let indices: Vec<_> = card_slots(cards, 10, 9).into_iter().map(|(i, _)| i).collect();
    assert_eq!(indices, vec![3, 4, 5, 6, 7, 8, 9]);
  }
}
