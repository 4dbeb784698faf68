use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Draw the help view: the companion root document, served through the
/// asset gateway (cached copy when offline)
pub fn draw_help(frame: &mut Frame, area: Rect, content: &str, scroll: u16) {
  let block = Block::default()
    .title(" Help (j/k scroll, q close) ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let paragraph = Paragraph::new(content.to_string())
    .block(block)
    .wrap(Wrap { trim: false })
    .scroll((scroll, 0));

  frame.render_widget(paragraph, area);
}
