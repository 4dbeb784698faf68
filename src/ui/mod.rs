mod help;
mod widget;

use crate::app::{App, Mode, ViewState};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Widgets per dashboard row
const COLUMNS: usize = 3;

/// Height of one widget card in rows
const CARD_HEIGHT: u16 = 7;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  // Draw current view
  match app.current_view() {
    Some(ViewState::Help { content, scroll }) => {
      help::draw_help(frame, chunks[0], content, *scroll);
    }
    _ => draw_dashboard(frame, chunks[0], app),
  }

  // Draw status bar
  draw_status_bar(frame, chunks[1], app);
}

fn draw_dashboard(frame: &mut Frame, area: Rect, app: &App) {
  let widgets = app.widgets();
  let rows = widgets.chunks(COLUMNS).count();

  let mut constraints = vec![Constraint::Length(CARD_HEIGHT); rows];
  constraints.push(Constraint::Min(0));
  let row_areas = Layout::default()
    .direction(Direction::Vertical)
    .constraints(constraints)
    .split(area);

  for (row_index, row) in widgets.chunks(COLUMNS).enumerate() {
    let cells = Layout::default()
      .direction(Direction::Horizontal)
      .constraints(vec![Constraint::Ratio(1, row.len() as u32); row.len()])
      .split(row_areas[row_index]);

    for (col_index, w) in row.iter().enumerate() {
      let index = row_index * COLUMNS + col_index;
      widget::draw_widget(frame, cells[col_index], w, index == app.selected());
    }
  }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.mode() {
    Mode::Normal => {
      if let Some(message) = app.status() {
        (
          format!(" {}", message),
          Style::default().fg(Color::Magenta),
        )
      } else {
        let assets = match app.cache_phase() {
          Some(phase) => phase.label(),
          None => "off",
        };
        let hint = format!(
          " s:start  x:stop  r:reset  n:rename  e:snapshot  ?:help  ::command  q:quit   assets:{}",
          assets
        );
        (hint, Style::default().fg(Color::DarkGray))
      }
    }
    Mode::Command => {
      let suggestions = app.autocomplete_suggestions();
      let mut line = format!(":{}", app.command_input());
      if !suggestions.is_empty() {
        let names: Vec<String> = suggestions
          .iter()
          .enumerate()
          .map(|(i, c)| {
            if i == app.selected_suggestion() {
              format!("[{}]", c.name)
            } else {
              c.name.to_string()
            }
          })
          .collect();
        line.push_str("  ");
        line.push_str(&names.join(" "));
      }
      (line, Style::default().fg(Color::Yellow))
    }
    Mode::Rename => {
      let rename = format!("name: {}", app.rename_input());
      (rename, Style::default().fg(Color::Cyan))
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}
