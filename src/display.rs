use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CliDisplayMode {
  #[default]
  Auto,
  Direct,
  Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ascii",
      DisplayMode::Direct => "half-block",
    }
  }
}

/// Pick half-block rendering when the terminal advertises true color, ASCII otherwise.
pub fn detect_display_mode() -> DisplayMode {
  mode_for_colorterm(&std::env::var("COLORTERM").unwrap_or_default())
}

fn mode_for_colorterm(colorterm: &str) -> DisplayMode {
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn colorterm_detection() {
    assert_eq!(mode_for_colorterm("truecolor"), DisplayMode::Direct);
    assert_eq!(mode_for_colorterm("24BIT"), DisplayMode::Direct);
    assert_eq!(mode_for_colorterm(""), DisplayMode::Ascii);
  }

  #[test]
  fn explicit_modes_skip_detection() {
    assert_eq!(resolve_display_mode(CliDisplayMode::Ascii), DisplayMode::Ascii);
    assert_eq!(resolve_display_mode(CliDisplayMode::Direct), DisplayMode::Direct);
  }
}
