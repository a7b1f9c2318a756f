use ratatui::style::Color;

/// A named colour palette. Cycled with Ctrl+T and persisted by name.
#[derive(Debug)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub rating: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Marquee",
    bg: Color::Rgb(22, 20, 30),
    fg: Color::Rgb(230, 226, 240),
    accent: Color::Rgb(129, 140, 248),
    muted: Color::Rgb(128, 124, 148),
    border: Color::Rgb(62, 58, 82),
    highlight_fg: Color::Rgb(22, 20, 30),
    highlight_bg: Color::Rgb(129, 140, 248),
    stripe_bg: Color::Rgb(28, 26, 38),
    status: Color::Rgb(125, 211, 252),
    error: Color::Rgb(248, 113, 113),
    rating: Color::Rgb(250, 204, 21),
    key_fg: Color::Rgb(22, 20, 30),
    key_bg: Color::Rgb(128, 124, 148),
  },
  Theme {
    name: "Noir",
    bg: Color::Rgb(12, 12, 12),
    fg: Color::Rgb(220, 220, 220),
    accent: Color::Rgb(255, 255, 255),
    muted: Color::Rgb(120, 120, 120),
    border: Color::Rgb(60, 60, 60),
    highlight_fg: Color::Rgb(12, 12, 12),
    highlight_bg: Color::Rgb(200, 200, 200),
    stripe_bg: Color::Rgb(20, 20, 20),
    status: Color::Rgb(180, 180, 180),
    error: Color::Rgb(230, 90, 90),
    rating: Color::Rgb(240, 240, 240),
    key_fg: Color::Rgb(12, 12, 12),
    key_bg: Color::Rgb(120, 120, 120),
  },
  Theme {
    name: "Technicolor",
    bg: Color::Rgb(255, 248, 235),
    fg: Color::Rgb(60, 40, 30),
    accent: Color::Rgb(200, 40, 60),
    muted: Color::Rgb(150, 120, 100),
    border: Color::Rgb(220, 190, 160),
    highlight_fg: Color::Rgb(255, 248, 235),
    highlight_bg: Color::Rgb(200, 40, 60),
    stripe_bg: Color::Rgb(250, 238, 218),
    status: Color::Rgb(30, 110, 160),
    error: Color::Rgb(180, 30, 30),
    rating: Color::Rgb(210, 140, 0),
    key_fg: Color::Rgb(255, 248, 235),
    key_bg: Color::Rgb(150, 120, 100),
  },
];

/// Index of the theme called `name`, falling back to the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_index_by_name() {
    assert_eq!(theme_index(Some("Noir")), 1);
    assert_eq!(theme_index(Some("technicolor")), 2);
    assert_eq!(theme_index(Some("missing")), 0);
    assert_eq!(theme_index(None), 0);
  }
}
