//! Dashboard snapshot export.
//!
//! Renders the live UI into an off-screen buffer and writes it out as a
//! timestamped text file. Saving tries the preferred directory first and
//! falls back to the current directory, so an export still lands somewhere
//! when the configured location is unusable.

use chrono::Local;
use color_eyre::{eyre::eyre, Result};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app::App;
use crate::ui;

/// Render the dashboard at the given size and return the buffer as plain
/// text, one trimmed line per row.
pub fn render_text(app: &App, width: u16, height: u16) -> Result<String> {
  let backend = TestBackend::new(width, height);
  let mut terminal =
    Terminal::new(backend).map_err(|e| eyre!("Failed to create snapshot buffer: {}", e))?;

  terminal
    .draw(|frame| ui::draw(frame, app))
    .map_err(|e| eyre!("Failed to render snapshot: {}", e))?;

  let buffer = terminal.backend().buffer();
  let mut lines = Vec::with_capacity(height as usize);
  for y in 0..buffer.area.height {
    let mut line = String::new();
    for x in 0..buffer.area.width {
      match buffer.cell((x, y)) {
        Some(cell) => line.push_str(cell.symbol()),
        None => line.push(' '),
      }
    }
    lines.push(line.trim_end().to_string());
  }

  Ok(lines.join("\n"))
}

/// Write snapshot text to the preferred directory (default: home), falling
/// back to the current directory. Returns the path written.
pub fn save(text: &str, preferred_dir: Option<&Path>) -> Result<PathBuf> {
  let file_name = format!("watchdeck-{}.txt", timestamp_string());
  let primary = preferred_dir
    .map(Path::to_path_buf)
    .or_else(dirs::home_dir)
    .unwrap_or_else(|| PathBuf::from("."));

  save_with_fallback(text, &file_name, &primary, Path::new("."))
}

fn save_with_fallback(
  text: &str,
  file_name: &str,
  primary: &Path,
  fallback: &Path,
) -> Result<PathBuf> {
  match write_into(primary, file_name, text) {
    Ok(path) => Ok(path),
    Err(primary_err) => {
      if primary == fallback {
        return Err(primary_err);
      }
      warn!(
        dir = %primary.display(),
        error = %primary_err,
        "snapshot directory unusable, falling back"
      );
      write_into(fallback, file_name, text)
    }
  }
}

fn write_into(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create snapshot directory {}: {}", dir.display(), e))?;
  let path = dir.join(file_name);
  std::fs::write(&path, text)
    .map_err(|e| eyre!("Failed to write snapshot {}: {}", path.display(), e))?;
  Ok(path)
}

/// Local wall-clock timestamp for snapshot file names, `YYYYMMDD-HHMMSS`.
fn timestamp_string() -> String {
  Local::now().format("%Y%m%d-%H%M%S").to_string()
}
