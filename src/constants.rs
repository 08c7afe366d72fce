//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, parsed once on first access.

use serde::Deserialize;
use std::sync::LazyLock;

#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,
  pub prefs_file: String,
  pub session_file: String,
  pub log_file: String,

  // URL templates, `{id}` is replaced with the reference id
  pub youtube_thumbnail_url: String,
  pub youtube_embed_url: String,
  pub youtube_watch_url: String,
  pub drive_preview_url: String,

  pub error_dismiss_secs: u64,

  // Hosted backend
  pub http_timeout_secs: u64,
  pub rest_path: String,
  pub auth_path: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time and covered by the test below.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Fill the `{id}` placeholder of a URL template.
pub fn fill_template(template: &str, id: &str) -> String {
  template.replace("{id}", id)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.app_name, "reel");
    assert!(c.youtube_thumbnail_url.contains("{id}"));
    assert!(c.drive_preview_url.contains("{id}"));
    assert!(c.error_dismiss_secs > 0);
  }

  #[test]
  fn fill_template_replaces_placeholder() {
    assert_eq!(fill_template("https://x/{id}/y", "abc"), "https://x/abc/y");
    assert_eq!(fill_template("no placeholder", "abc"), "no placeholder");
  }
}
