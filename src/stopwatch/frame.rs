//! Cooperative frame scheduling with cancellable tick tokens.
//!
//! The event loop emits one frame per display refresh. Anything that wants
//! to run on the next frame requests a [`FrameId`] token; cancelling the
//! token before the frame fires makes the tick a no-op and unschedules it.
//! Requests made while a frame is being processed land in the following
//! frame, never the current one.

use std::collections::BTreeSet;

/// Token for a single scheduled frame callback.
///
/// Holding a `FrameId` does not keep anything alive; it only identifies the
/// grant so it can be cancelled or matched against the due set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameId(u64);

/// The set of frame tokens due in the current frame.
#[derive(Debug, Default)]
pub struct FrameSet(BTreeSet<u64>);

impl FrameSet {
  /// Whether the given token is due this frame.
  pub fn contains(&self, id: FrameId) -> bool {
    self.0.contains(&id.0)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Single-threaded frame scheduler.
///
/// `request_frame` grants a token for the next frame, `cancel_frame`
/// invalidates it, and `begin_frame` drains everything currently scheduled
/// into a [`FrameSet`] for the caller to dispatch.
#[derive(Debug, Default)]
pub struct FrameClock {
  next: u64,
  scheduled: BTreeSet<u64>,
}

impl FrameClock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Schedule a tick for the next frame and return its token.
  pub fn request_frame(&mut self) -> FrameId {
    let id = self.next;
    self.next += 1;
    self.scheduled.insert(id);
    FrameId(id)
  }

  /// Invalidate a previously granted token.
  ///
  /// Cancelling a token that already fired (or was never granted) is a
  /// no-op.
  pub fn cancel_frame(&mut self, id: FrameId) {
    self.scheduled.remove(&id.0);
  }

  /// Start a frame: take every token scheduled so far.
  ///
  /// Tokens requested during dispatch go into the scheduler again and are
  /// only due on the following frame.
  pub fn begin_frame(&mut self) -> FrameSet {
    FrameSet(std::mem::take(&mut self.scheduled))
  }

  /// Number of tokens waiting for the next frame.
  pub fn pending(&self) -> usize {
    self.scheduled.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_granted_token_is_due_next_frame() {
    let mut clock = FrameClock::new();
    let id = clock.request_frame();

    let due = clock.begin_frame();
    assert!(due.contains(id));
    assert_eq!(clock.pending(), 0);
  }

  #[test]
  fn test_cancelled_token_is_not_due() {
    let mut clock = FrameClock::new();
    let id = clock.request_frame();
    clock.cancel_frame(id);

    let due = clock.begin_frame();
    assert!(!due.contains(id));
    assert!(due.is_empty());
  }

  #[test]
  fn test_request_during_frame_lands_in_next_frame() {
    let mut clock = FrameClock::new();
    let first = clock.request_frame();

    let due = clock.begin_frame();
    assert!(due.contains(first));

    // Rescheduled mid-frame: not due until the next begin_frame.
    let second = clock.request_frame();
    assert!(!due.contains(second));

    let next = clock.begin_frame();
    assert!(next.contains(second));
  }

  #[test]
  fn test_tokens_are_unique() {
    let mut clock = FrameClock::new();
    let a = clock.request_frame();
    let b = clock.request_frame();
    assert_ne!(a, b);
  }

  #[test]
  fn test_cancel_after_fire_is_noop() {
    let mut clock = FrameClock::new();
    let id = clock.request_frame();
    let _ = clock.begin_frame();

    clock.cancel_frame(id);
    assert_eq!(clock.pending(), 0);
  }
}
