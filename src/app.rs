use crate::cache::{
  AssetManifest, AssetRequest, CacheManager, HttpFetcher, LifecyclePhase, SqliteStore,
};
use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{CacheEvent, Event, EventHandler};
use crate::snapshot;
use crate::stopwatch::{sanitized_or_default, FrameClock, Stopwatch};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::warn;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  Rename,
}

/// View state - the dashboard is always at the root of the stack
#[derive(Debug)]
pub enum ViewState {
  Dashboard,
  Help { content: String, scroll: u16 },
}

/// One dashboard card: a named stopwatch instance
#[derive(Debug)]
pub struct StopwatchWidget {
  pub name: String,
  pub stopwatch: Stopwatch,
}

/// The production asset gateway
type AssetGateway = CacheManager<HttpFetcher, SqliteStore>;

/// Main application state
pub struct App {
  /// Dashboard widgets; every instance is independent
  widgets: Vec<StopwatchWidget>,

  /// Index of the selected widget
  selected: usize,

  /// Frame scheduler driving the running widgets' refresh loops
  frames: FrameClock,

  /// Navigation stack - root is always the dashboard
  view_stack: Vec<ViewState>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Rename input buffer (after pressing n)
  rename_input: String,

  /// Transient status-line message
  status: Option<String>,

  /// Last reported cache lifecycle phase, for the status line
  cache_phase: Option<LifecyclePhase>,

  /// Offline asset gateway; absent when disabled or unavailable
  gateway: Option<AssetGateway>,

  /// Application configuration
  config: Config,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let count = config.stopwatches.max(1);
    let widgets = (0..count)
      .map(|i| StopwatchWidget {
        name: sanitized_or_default(config.names.get(i).map(String::as_str).unwrap_or(""), i + 1),
        stopwatch: Stopwatch::new(),
      })
      .collect();

    let gateway = if config.assets.enabled {
      let base = config.asset_base()?;
      let manifest = AssetManifest::for_base(&base)?;
      let fetcher = HttpFetcher::new(&base)?;
      match SqliteStore::open() {
        Ok(store) => Some(CacheManager::new(fetcher, store, manifest)),
        Err(e) => {
          // A dashboard without offline assets still keeps time.
          warn!(error = %e, "asset store unavailable, running without offline cache");
          None
        }
      }
    } else {
      None
    };

    let (tx, _rx) = mpsc::unbounded_channel();

    Ok(Self {
      widgets,
      selected: 0,
      frames: FrameClock::new(),
      view_stack: vec![ViewState::Dashboard],
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      rename_input: String::new(),
      status: None,
      cache_phase: None,
      gateway,
      config,
      event_tx: tx,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(self.config.tick_rate());
    self.event_tx = events.sender();

    // Bring the asset cache up in the background
    self.start_cache_service();

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event)?;
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  /// Run install then activate on a background task, reporting phases back
  /// over the event channel. A failed install leaves any previous cache
  /// generation serving and the dashboard running.
  fn start_cache_service(&self) {
    let Some(gateway) = self.gateway.clone() else {
      return;
    };
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let _ = tx.send(Event::Cache(CacheEvent::Phase(LifecyclePhase::Installing)));
      if let Err(e) = gateway.install().await {
        warn!(error = %e, "asset install failed");
        let _ = tx.send(Event::Cache(CacheEvent::Failed(e.to_string())));
        return;
      }
      let _ = tx.send(Event::Cache(CacheEvent::Phase(LifecyclePhase::Installed)));

      match gateway.activate().await {
        Ok(()) => {
          let _ = tx.send(Event::Cache(CacheEvent::Phase(LifecyclePhase::Active)));
        }
        Err(e) => {
          warn!(error = %e, "asset activation failed");
          let _ = tx.send(Event::Cache(CacheEvent::Failed(e.to_string())));
        }
      }
    });
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Frame(now) => self.on_frame(now),
      Event::Cache(cache_event) => self.handle_cache_event(cache_event),
      Event::HelpLoaded(content) => {
        self.view_stack.push(ViewState::Help { content, scroll: 0 });
      }
      Event::SnapshotSaved(path) => {
        self.status = Some(format!("Snapshot saved to {}", path.display()));
      }
      Event::Error(msg) => {
        self.status = Some(msg);
      }
    }
    Ok(())
  }

  /// One display frame: dispatch the due tokens to every widget.
  fn on_frame(&mut self, now: Instant) {
    let due = self.frames.begin_frame();
    for widget in &mut self.widgets {
      widget.stopwatch.on_frame(&mut self.frames, &due, now);
    }
  }

  fn handle_cache_event(&mut self, event: CacheEvent) {
    match event {
      CacheEvent::Phase(phase) => {
        self.cache_phase = Some(phase);
      }
      CacheEvent::Failed(msg) => {
        self.cache_phase = self.gateway.as_ref().map(|g| g.phase());
        self.status = Some(format!("Offline assets unavailable: {}", msg));
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    // Any key press clears a stale status message
    self.status = None;

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Rename => self.handle_rename_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The help view handles its own scrolling and dismissal
    if let Some(ViewState::Help { scroll, .. }) = self.view_stack.last_mut() {
      match key.code {
        KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
        KeyCode::Char('q') | KeyCode::Esc => {
          self.view_stack.pop();
        }
        _ => {}
      }
      return;
    }

    let now = Instant::now();
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        self.should_quit = true;
      }

      // Selection
      KeyCode::Up | KeyCode::Char('k') | KeyCode::Left | KeyCode::Char('h') => {
        self.move_selection(-1);
      }
      KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Char('l') => {
        self.move_selection(1);
      }

      // Timer controls
      KeyCode::Char('s') => self.start_selected(now),
      KeyCode::Char('x') => self.stop_selected(now),
      KeyCode::Char(' ') => self.toggle_selected(now),
      KeyCode::Char('r') => self.reset_selected(now),
      KeyCode::Char('R') => self.reset_all(now),

      // Features
      KeyCode::Char('n') => {
        self.mode = Mode::Rename;
        self.rename_input = self.widgets[self.selected].name.clone();
      }
      KeyCode::Char('e') => self.export_snapshot(),
      KeyCode::Char('?') => self.open_help(),

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
      }

      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn handle_rename_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.rename_input.clear();
      }
      KeyCode::Enter => {
        // Commit sanitized; an emptied name falls back to the default
        let name = sanitized_or_default(&self.rename_input, self.selected + 1);
        self.widgets[self.selected].name = name;
        self.mode = Mode::Normal;
        self.rename_input.clear();
      }
      KeyCode::Backspace => {
        self.rename_input.pop();
      }
      KeyCode::Char(c) => {
        self.rename_input.push(c);
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Either the selected suggestion or the raw input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    let now = Instant::now();
    match cmd.as_str() {
      "start" => self.start_selected(now),
      "stop" => self.stop_selected(now),
      "reset" => self.reset_selected(now),
      "reset-all" => self.reset_all(now),
      "rename" => {
        self.mode = Mode::Rename;
        self.rename_input = self.widgets[self.selected].name.clone();
      }
      "export" => self.export_snapshot(),
      "help" => self.open_help(),
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        self.status = Some(format!("Unknown command: {}", cmd));
      }
    }
    self.command_input.clear();
  }

  fn start_selected(&mut self, now: Instant) {
    self.widgets[self.selected]
      .stopwatch
      .start(&mut self.frames, now);
  }

  fn stop_selected(&mut self, now: Instant) {
    self.widgets[self.selected]
      .stopwatch
      .stop(&mut self.frames, now);
  }

  fn toggle_selected(&mut self, now: Instant) {
    if self.widgets[self.selected].stopwatch.is_running() {
      self.stop_selected(now);
    } else {
      self.start_selected(now);
    }
  }

  fn reset_selected(&mut self, now: Instant) {
    self.widgets[self.selected].stopwatch.reset(now);
  }

  fn reset_all(&mut self, now: Instant) {
    for widget in &mut self.widgets {
      widget.stopwatch.reset(now);
    }
  }

  fn export_snapshot(&mut self) {
    let text = match snapshot::render_text(self, 100, 3 + 7 * self.widgets.len().div_ceil(3) as u16)
    {
      Ok(text) => text,
      Err(e) => {
        self.status = Some(format!("Snapshot failed: {}", e));
        return;
      }
    };

    match snapshot::save(&text, self.config.snapshot_dir.as_deref()) {
      Ok(path) => {
        self.status = Some(format!("Snapshot saved to {}", path.display()));
      }
      Err(e) => {
        self.status = Some(format!("Snapshot failed: {}", e));
      }
    }
  }

  /// Navigate to the companion root document through the asset gateway.
  /// Offline, this degrades to the cached copy.
  fn open_help(&mut self) {
    let Some(gateway) = self.gateway.clone() else {
      self.status = Some("Help is unavailable without the asset cache".to_string());
      return;
    };
    let tx = self.event_tx.clone();
    let request = AssetRequest::navigation(gateway.manifest().root_document.clone());

    tokio::spawn(async move {
      match gateway.handle_request(&request).await {
        Ok(response) => {
          let _ = tx.send(Event::HelpLoaded(response.text()));
        }
        Err(e) => {
          let _ = tx.send(Event::Error(format!("Help unavailable: {}", e)));
        }
      }
    });
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.widgets.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  // Accessors for UI rendering
  pub fn widgets(&self) -> &[StopwatchWidget] {
    &self.widgets
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn current_view(&self) -> Option<&ViewState> {
    self.view_stack.last()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn rename_input(&self) -> &str {
    &self.rename_input
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  /// Cache status for the status line; `None` when the cache is disabled.
  pub fn cache_phase(&self) -> Option<LifecyclePhase> {
    self.cache_phase
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}
