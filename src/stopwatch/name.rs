//! Widget display-name handling.

/// Prefix for auto-assigned widget names.
pub const DEFAULT_NAME_PREFIX: &str = "Stopwatch";

/// Default name for the widget at the given 1-based position.
pub fn default_name(index: usize) -> String {
  format!("{} {}", DEFAULT_NAME_PREFIX, index)
}

/// Sanitize a user-entered widget name.
///
/// Keeps ASCII alphanumerics, `-`, `_`, `'`, `&` and whitespace; collapses
/// whitespace runs to a single space and trims the ends.
pub fn sanitize_name(raw: &str) -> String {
  let filtered: String = raw
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '\'' | '&'))
    .collect();
  filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitized name, or the positional default when nothing survives.
pub fn sanitized_or_default(raw: &str, index: usize) -> String {
  let name = sanitize_name(raw);
  if name.is_empty() {
    default_name(index)
  } else {
    name
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_strips_disallowed_characters() {
    assert_eq!(sanitize_name("Lap #1 <fast!>"), "Lap 1 fast");
  }

  #[test]
  fn test_collapses_and_trims_whitespace() {
    assert_eq!(sanitize_name("  Warm   up \t run "), "Warm up run");
  }

  #[test]
  fn test_keeps_allowed_punctuation() {
    assert_eq!(sanitize_name("Q&A - day_2 'final'"), "Q&A - day_2 'final'");
  }

  #[test]
  fn test_empty_input_falls_back_to_default() {
    assert_eq!(sanitized_or_default("@@@", 3), "Stopwatch 3");
    assert_eq!(sanitized_or_default("", 1), "Stopwatch 1");
  }
}
