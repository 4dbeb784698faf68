//! Elapsed-time display formatting.

use std::time::Duration;

/// Format an elapsed duration as `MM:SS.T`.
///
/// Whole milliseconds are truncated (never rounded) into minutes, seconds
/// and tenths. Minutes grow without bound; there is no hour rollover.
pub fn format_elapsed(elapsed: Duration) -> String {
  let total_ms = elapsed.as_millis();
  let minutes = total_ms / 60_000;
  let seconds = (total_ms % 60_000) / 1_000;
  let tenths = (total_ms % 1_000) / 100;
  format!("{:02}:{:02}.{}", minutes, seconds, tenths)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fmt(ms: u64) -> String {
    format_elapsed(Duration::from_millis(ms))
  }

  #[test]
  fn test_zero() {
    assert_eq!(fmt(0), "00:00.0");
  }

  #[test]
  fn test_minutes_seconds_tenths() {
    assert_eq!(fmt(125_300), "02:05.3");
  }

  #[test]
  fn test_no_hour_rollover() {
    assert_eq!(fmt(3_600_000), "60:00.0");
  }

  #[test]
  fn test_truncates_instead_of_rounding() {
    assert_eq!(fmt(999), "00:00.9");
    assert_eq!(fmt(99), "00:00.0");
    assert_eq!(fmt(59_999), "00:59.9");
  }

  #[test]
  fn test_minutes_field_grows_unbounded() {
    assert_eq!(fmt(6_000_000), "100:00.0");
  }
}
