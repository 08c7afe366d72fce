use ratatui::style::Color;

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
  pub info: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Studio",
    bg: Color::Rgb(18, 18, 22),
    fg: Color::Rgb(226, 226, 232),
    accent: Color::Rgb(245, 166, 35),
    muted: Color::Rgb(128, 128, 140),
    border: Color::Rgb(58, 58, 70),
    highlight_fg: Color::Rgb(18, 18, 22),
    highlight_bg: Color::Rgb(245, 166, 35),
    stripe_bg: Color::Rgb(24, 24, 30),
    status: Color::Rgb(120, 190, 255),
    error: Color::Rgb(255, 107, 107),
    info: Color::Rgb(130, 210, 150),
    key_fg: Color::Rgb(18, 18, 22),
    key_bg: Color::Rgb(128, 128, 140),
  },
  Theme {
    name: "Daylight",
    bg: Color::Rgb(250, 248, 244),
    fg: Color::Rgb(40, 40, 48),
    accent: Color::Rgb(200, 72, 40),
    muted: Color::Rgb(130, 126, 120),
    border: Color::Rgb(210, 204, 196),
    highlight_fg: Color::Rgb(250, 248, 244),
    highlight_bg: Color::Rgb(200, 72, 40),
    stripe_bg: Color::Rgb(242, 238, 232),
    status: Color::Rgb(40, 110, 190),
    error: Color::Rgb(190, 30, 45),
    info: Color::Rgb(40, 130, 70),
    key_fg: Color::Rgb(250, 248, 244),
    key_bg: Color::Rgb(130, 126, 120),
  },
  Theme {
    name: "Dusk",
    bg: Color::Rgb(30, 27, 46),
    fg: Color::Rgb(224, 222, 244),
    accent: Color::Rgb(196, 167, 231),
    muted: Color::Rgb(110, 106, 134),
    border: Color::Rgb(64, 60, 88),
    highlight_fg: Color::Rgb(30, 27, 46),
    highlight_bg: Color::Rgb(196, 167, 231),
    stripe_bg: Color::Rgb(36, 33, 54),
    status: Color::Rgb(156, 207, 216),
    error: Color::Rgb(235, 111, 146),
    info: Color::Rgb(246, 193, 119),
    key_fg: Color::Rgb(30, 27, 46),
    key_bg: Color::Rgb(110, 106, 134),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Yellow,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Yellow,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    error: Color::Red,
    info: Color::Green,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|name| THEMES.iter().position(|t| t.name == name)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_lookup_by_name() {
    assert_eq!(theme_index(Some("Dusk")), 2);
    assert_eq!(theme_index(Some("missing")), 0);
    assert_eq!(theme_index(None), 0);
  }

  #[test]
  fn theme_names_are_unique() {
    let mut names: Vec<&str> = THEMES.iter().map(|t| t.name).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), THEMES.len());
  }
}
