use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

/// How posters are drawn in the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  /// No poster; the detail view uses the full width for text.
  Off,
  Ascii,
  /// True-colour half blocks, two pixels per cell.
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Off => "off",
      DisplayMode::Ascii => "ascii",
      DisplayMode::Direct => "half-block",
    }
  }

  pub fn shows_posters(self) -> bool {
    self != DisplayMode::Off
  }
}

/// Pick half blocks when the terminal advertises true colour, ASCII otherwise.
fn detect_from(colorterm: &str, no_color: bool) -> DisplayMode {
  if no_color {
    return DisplayMode::Ascii;
  }
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn detect_display_mode() -> DisplayMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default();
  let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
  detect_from(&colorterm, no_color)
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
    CliDisplayMode::Off => DisplayMode::Off,
  }
}
