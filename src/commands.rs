/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "start",
    aliases: &["go"],
    description: "Start the selected stopwatch",
  },
  Command {
    name: "stop",
    aliases: &["halt"],
    description: "Stop the selected stopwatch",
  },
  Command {
    name: "reset",
    aliases: &["zero"],
    description: "Reset the selected stopwatch",
  },
  Command {
    name: "reset-all",
    aliases: &["zero-all"],
    description: "Reset every stopwatch",
  },
  Command {
    name: "rename",
    aliases: &["name"],
    description: "Rename the selected stopwatch",
  },
  Command {
    name: "export",
    aliases: &["snapshot", "save"],
    description: "Save a snapshot of the dashboard",
  },
  Command {
    name: "help",
    aliases: &["manual"],
    description: "Open the help page",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit watchdeck",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
