//! Stopwatch state machine.
//!
//! Two states, three transitions: `Stopped -> Running` via [`Stopwatch::start`],
//! `Running -> Stopped` via [`Stopwatch::stop`], and [`Stopwatch::reset`] which
//! zeroes the accumulated time without changing the run state. While running,
//! a frame token keeps the displayed value fresh once per frame.
//!
//! Every transition takes `now` explicitly so the host captures the clock
//! once per event and tests can drive synthetic time.

use std::time::{Duration, Instant};

use super::frame::{FrameClock, FrameId, FrameSet};

/// A single stopwatch instance.
///
/// Invariant: while stopped, `elapsed()` is exact; while running, `elapsed()`
/// is the value recomputed on the most recent frame (`now - epoch`), where
/// `epoch` was rewound at start so resuming preserves accumulated time.
#[derive(Debug, Default)]
pub struct Stopwatch {
  elapsed: Duration,
  running: bool,
  epoch: Option<Instant>,
  frame: Option<FrameId>,
}

impl Stopwatch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Accumulated elapsed time as of the last transition or frame.
  pub fn elapsed(&self) -> Duration {
    self.elapsed
  }

  pub fn is_running(&self) -> bool {
    self.running
  }

  /// `Stopped -> Running`. No-op when already running.
  ///
  /// The epoch is set to `now - elapsed` so a resumed stopwatch continues
  /// from its accumulated time instead of restarting.
  pub fn start(&mut self, frames: &mut FrameClock, now: Instant) {
    if self.running {
      return;
    }
    self.running = true;
    self.epoch = Some(now - self.elapsed);
    self.frame = Some(frames.request_frame());
  }

  /// `Running -> Stopped`. No-op when already stopped.
  ///
  /// Fixes `elapsed` to the final value and cancels the pending frame token
  /// so the refresh loop terminates immediately.
  pub fn stop(&mut self, frames: &mut FrameClock, now: Instant) {
    if !self.running {
      return;
    }
    self.running = false;
    if let Some(epoch) = self.epoch.take() {
      self.elapsed = now.saturating_duration_since(epoch);
    }
    if let Some(id) = self.frame.take() {
      frames.cancel_frame(id);
    }
  }

  /// Zero the accumulated time regardless of run state.
  ///
  /// A running stopwatch keeps running: its epoch is rewound to `now` so the
  /// display restarts from zero without interrupting the run.
  pub fn reset(&mut self, now: Instant) {
    self.elapsed = Duration::ZERO;
    if self.running {
      self.epoch = Some(now);
    }
  }

  /// Frame tick: recompute the displayed value and reschedule.
  ///
  /// Exits silently when this stopwatch's token is not in the due set
  /// (cancelled or stale) or when the stopwatch stopped since scheduling.
  pub fn on_frame(&mut self, frames: &mut FrameClock, due: &FrameSet, now: Instant) {
    let Some(id) = self.frame else {
      return;
    };
    if !due.contains(id) {
      return;
    }
    self.frame = None;

    if !self.running {
      return;
    }
    if let Some(epoch) = self.epoch {
      self.elapsed = now.saturating_duration_since(epoch);
    }
    self.frame = Some(frames.request_frame());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
  }

  #[test]
  fn test_elapsed_accumulates_across_run_segments() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    sw.stop(&mut frames, t0 + ms(1_500));
    assert_eq!(sw.elapsed(), ms(1_500));

    sw.start(&mut frames, t0 + ms(5_000));
    sw.stop(&mut frames, t0 + ms(7_000));
    assert_eq!(sw.elapsed(), ms(3_500));
  }

  #[test]
  fn test_double_start_does_not_move_epoch() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    // Redundant start five seconds in must not restart the clock.
    sw.start(&mut frames, t0 + ms(5_000));
    sw.stop(&mut frames, t0 + ms(10_000));

    assert_eq!(sw.elapsed(), ms(10_000));
  }

  #[test]
  fn test_stop_when_stopped_is_noop() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    sw.stop(&mut frames, t0 + ms(2_000));
    sw.stop(&mut frames, t0 + ms(9_000));

    assert_eq!(sw.elapsed(), ms(2_000));
    assert!(!sw.is_running());
  }

  #[test]
  fn test_reset_while_stopped_zeroes_display() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    sw.stop(&mut frames, t0 + ms(3_300));
    sw.reset(t0 + ms(4_000));

    assert_eq!(sw.elapsed(), Duration::ZERO);
    assert!(!sw.is_running());
  }

  #[test]
  fn test_reset_while_running_restarts_from_zero_without_stopping() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    let due = frames.begin_frame();
    sw.on_frame(&mut frames, &due, t0 + ms(2_000));
    assert_eq!(sw.elapsed(), ms(2_000));

    sw.reset(t0 + ms(2_000));
    assert_eq!(sw.elapsed(), Duration::ZERO);
    assert!(sw.is_running());

    // Still advancing, now measured from the reset point.
    let due = frames.begin_frame();
    sw.on_frame(&mut frames, &due, t0 + ms(2_700));
    assert_eq!(sw.elapsed(), ms(700));
  }

  #[test]
  fn test_frame_updates_elapsed_while_running() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    let mut last = Duration::ZERO;
    for i in 1..=5 {
      let due = frames.begin_frame();
      sw.on_frame(&mut frames, &due, t0 + ms(i * 100));
      assert!(sw.elapsed() >= last, "elapsed must never decrease");
      last = sw.elapsed();
    }
    assert_eq!(last, ms(500));
  }

  #[test]
  fn test_stop_cancels_pending_frame() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    assert_eq!(frames.pending(), 1);

    sw.stop(&mut frames, t0 + ms(1_000));
    assert_eq!(frames.pending(), 0);

    // A frame after stop leaves the final value untouched and schedules
    // nothing.
    let due = frames.begin_frame();
    sw.on_frame(&mut frames, &due, t0 + ms(60_000));
    assert_eq!(sw.elapsed(), ms(1_000));
    assert_eq!(frames.pending(), 0);
  }

  #[test]
  fn test_stale_token_tick_is_silent() {
    let mut frames = FrameClock::new();
    let mut sw = Stopwatch::new();
    let t0 = Instant::now();

    sw.start(&mut frames, t0);
    let due = frames.begin_frame();

    // Stop lands between the frame being cut and this widget's dispatch.
    sw.stop(&mut frames, t0 + ms(400));
    sw.on_frame(&mut frames, &due, t0 + ms(500));

    assert_eq!(sw.elapsed(), ms(400));
    assert_eq!(frames.pending(), 0);
  }
}
