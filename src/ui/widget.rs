use crate::app::StopwatchWidget;
use crate::stopwatch::format_elapsed;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Draw one stopwatch card
pub fn draw_widget(frame: &mut Frame, area: Rect, widget: &StopwatchWidget, selected: bool) {
  let running = widget.stopwatch.is_running();

  let border_style = if selected {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::DarkGray)
  };

  let block = Block::default()
    .title(format!(" {} ", widget.name))
    .borders(Borders::ALL)
    .border_style(border_style);

  let time_style = if running {
    Style::default().fg(Color::Green).bold()
  } else {
    Style::default().fg(Color::White).bold()
  };

  let indicator = if running {
    Line::from(Span::styled("● running", Style::default().fg(Color::Green)))
  } else {
    Line::from(Span::styled("stopped", Style::default().fg(Color::DarkGray)))
  };

  // Control hints double as the enabled/disabled display: the action that
  // would be a no-op in the current state is dimmed.
  let active = Style::default().fg(Color::White);
  let dimmed = Style::default().fg(Color::DarkGray);
  let hints = Line::from(vec![
    Span::styled("s start", if running { dimmed } else { active }),
    Span::raw("  "),
    Span::styled("x stop", if running { active } else { dimmed }),
    Span::raw("  "),
    Span::styled("r reset", active),
  ]);

  let lines = vec![
    Line::from(""),
    Line::from(Span::styled(
      format_elapsed(widget.stopwatch.elapsed()),
      time_style,
    )),
    indicator,
    Line::from(""),
    hints,
  ];

  let paragraph = Paragraph::new(lines)
    .block(block)
    .alignment(Alignment::Center);

  frame.render_widget(paragraph, area);
}
