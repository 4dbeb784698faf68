use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::cache::LifecyclePhase;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Display refresh frame, carrying the timestamp taken at emission
  Frame(Instant),
  /// Cache lifecycle progress from the background worker
  Cache(CacheEvent),
  /// Help document arrived (from cache or network)
  HelpLoaded(String),
  /// A snapshot file was written
  SnapshotSaved(PathBuf),
  /// Background task error, surfaced on the status line
  Error(String),
}

/// Progress reports from the cache lifecycle task
#[derive(Debug)]
pub enum CacheEvent {
  Phase(LifecyclePhase),
  Failed(String),
}

/// Event handler that produces events from terminal input and a frame timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
  tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
  /// Create a new event handler emitting one frame per tick interval
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn terminal event reader
    let input_tx = tx.clone();
    tokio::spawn(async move {
      loop {
        if event::poll(tick_rate).unwrap_or(false) {
          if let Ok(evt) = event::read() {
            match evt {
              CrosstermEvent::Key(key) => {
                if input_tx.send(Event::Key(key)).is_err() {
                  break;
                }
              }
              _ => {}
            }
          }
        } else {
          // Frame tick; the timestamp travels with the event the way an
          // animation-frame callback receives its own.
          if input_tx.send(Event::Frame(Instant::now())).is_err() {
            break;
          }
        }
      }
    });

    Self { rx, tx }
  }

  /// Sender handle for background tasks to push events with
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
