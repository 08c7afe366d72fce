use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::constants::{constants, fill_template};

/// YouTube video ids are always this long.
pub const YOUTUBE_ID_LEN: usize = 11;

// Safety (all three patterns): literals, covered by the tests below.

/// youtu.be/, embed/, shorts/, v/, live/ and ?v= / &v= query forms (watch?v= included).
/// The token run is captured whole so that a wrong-length token is never truncated into a valid-looking id.
static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?:youtube(?:-nocookie)?\.com/(?:embed/|shorts/|v/|live/)|youtu\.be/|[?&]v=)([A-Za-z0-9_-]+)",
  )
  .expect("youtube pattern is a valid regex")
});

static DRIVE_PATH_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("drive path pattern is a valid regex"));

static DRIVE_QUERY_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("drive query pattern is a valid regex"));

/// Where a reference id points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  YouTube,
  Drive,
}

impl ReferenceKind {
  pub fn label(self) -> &'static str {
    match self {
      ReferenceKind::YouTube => "youtube",
      ReferenceKind::Drive => "drive",
    }
  }
}

/// Canonical token identifying a video on its source platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The kind is a function of the length alone: 11 characters is a YouTube token.
  pub fn kind(&self) -> ReferenceKind {
    if self.0.chars().count() == YOUTUBE_ID_LEN { ReferenceKind::YouTube } else { ReferenceKind::Drive }
  }

  pub fn is_youtube(&self) -> bool {
    self.kind() == ReferenceKind::YouTube
  }
}

impl fmt::Display for ReferenceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// How a video can be played back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
  /// YouTube player with autoplay and restricted related-content/branding chrome.
  YouTube { url: String },
  /// Live cloud-drive preview frame, no static thumbnail exists.
  DrivePreview { url: String },
}

impl Embed {
  pub fn url(&self) -> &str {
    match self {
      Embed::YouTube { url } | Embed::DrivePreview { url } => url,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Embed::YouTube { .. } => "YouTube player",
      Embed::DrivePreview { .. } => "Drive preview",
    }
  }
}

/// Extract a canonical reference id from a pasted YouTube or cloud-drive link.
///
/// First match wins: YouTube shapes (only 11-character tokens count), then a drive
/// `file/d/{token}` segment, then a drive `id={token}` query parameter. A YouTube-shaped
/// capture of the wrong length falls through to the drive patterns instead of failing outright.
pub fn extract_reference_id(url: &str) -> Option<ReferenceId> {
  let url = url.trim();
  if url.is_empty() {
    return None;
  }

  if let Some(token) = YOUTUBE_RE
    .captures_iter(url)
    .filter_map(|caps| caps.get(1))
    .map(|m| m.as_str())
    .find(|token| token.len() == YOUTUBE_ID_LEN)
  {
    return Some(ReferenceId::new(token));
  }

  [&*DRIVE_PATH_RE, &*DRIVE_QUERY_RE]
    .into_iter()
    .find_map(|re| re.captures(url).and_then(|caps| caps.get(1)))
    .map(|m| ReferenceId::new(m.as_str()))
}

/// Static thumbnail URL for YouTube ids; `None` means the caller must fall back to [`preview_url`].
pub fn resolve_thumbnail(id: &ReferenceId) -> Option<String> {
  id.is_youtube().then(|| fill_template(&constants().youtube_thumbnail_url, id.as_str()))
}

/// Live preview frame for cloud-drive files.
pub fn preview_url(id: &ReferenceId) -> String {
  fill_template(&constants().drive_preview_url, id.as_str())
}

pub fn embed_for(id: &ReferenceId) -> Embed {
  match id.kind() {
    ReferenceKind::YouTube => Embed::YouTube { url: fill_template(&constants().youtube_embed_url, id.as_str()) },
    ReferenceKind::Drive => Embed::DrivePreview { url: preview_url(id) },
  }
}

/// Link to open in a browser.
pub fn watch_url(id: &ReferenceId) -> String {
  match id.kind() {
    ReferenceKind::YouTube => fill_template(&constants().youtube_watch_url, id.as_str()),
    ReferenceKind::Drive => preview_url(id),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extract(url: &str) -> Option<String> {
    extract_reference_id(url).map(|id| id.as_str().to_string())
  }

  // --- extract_reference_id: YouTube ---

  #[test]
  fn youtube_watch_url() {
    assert_eq!(extract("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
  }

  #[test]
  fn youtube_all_shapes() {
    let urls = [
      "https://youtu.be/dQw4w9WgXcQ",
      "https://youtu.be/dQw4w9WgXcQ?t=42",
      "https://www.youtube.com/embed/dQw4w9WgXcQ",
      "https://www.youtube.com/shorts/dQw4w9WgXcQ",
      "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
      "https://m.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123",
      "youtube.com/v/dQw4w9WgXcQ",
      "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
    ];
    for url in urls {
      assert_eq!(extract(url).as_deref(), Some("dQw4w9WgXcQ"), "url: {}", url);
    }
  }

  #[test]
  fn youtube_tokens_with_dash_and_underscore() {
    assert_eq!(extract("https://youtu.be/a-b_c-d_e-f").as_deref(), Some("a-b_c-d_e-f"));
  }

  #[test]
  fn youtube_wrong_length_is_never_returned() {
    assert_eq!(extract("https://www.youtube.com/watch?v=dQw4w9WgXc"), None); // 10
    assert_eq!(extract("https://www.youtube.com/watch?v=dQw4w9WgXcQX"), None); // 12
    assert_eq!(extract("https://youtu.be/short"), None);
  }

  #[test]
  fn youtube_later_capture_with_valid_length_wins() {
    assert_eq!(extract("https://www.youtube.com/watch?v=bad&v=dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
  }

  #[test]
  fn youtube_first_valid_param_wins_over_later_ones() {
    let urls = [
      "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL1&v=x",
      "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1&v=abcdefghijkl",
    ];
    for url in urls {
      assert_eq!(extract(url).as_deref(), Some("dQw4w9WgXcQ"), "url: {}", url);
    }
  }

  #[test]
  fn youtube_wrong_length_falls_through_to_drive() {
    let id = extract_reference_id("https://youtu.be/abc?id=1aBcDeFgHiJkLmNoPqRs").unwrap();
    assert_eq!(id.as_str(), "1aBcDeFgHiJkLmNoPqRs");
    assert_eq!(id.kind(), ReferenceKind::Drive);
  }

  #[test]
  fn youtube_checked_before_drive() {
    let url = "https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRs/view?v=dQw4w9WgXcQ";
    assert_eq!(extract(url).as_deref(), Some("dQw4w9WgXcQ"));
  }

  // --- extract_reference_id: drive ---

  #[test]
  fn drive_file_path() {
    assert_eq!(
      extract("https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRs/view").as_deref(),
      Some("1aBcDeFgHiJkLmNoPqRs")
    );
    assert_eq!(
      extract("https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRs/view?usp=sharing").as_deref(),
      Some("1aBcDeFgHiJkLmNoPqRs")
    );
  }

  #[test]
  fn drive_token_charset_is_preserved() {
    let token = "0B_xY-z9_AbC-dEf_123";
    assert_eq!(extract(&format!("https://drive.google.com/file/d/{}/preview", token)).as_deref(), Some(token));
  }

  #[test]
  fn drive_open_id_query() {
    assert_eq!(extract("https://drive.google.com/open?id=1aBcDeFgHiJkLmNoPqRs").as_deref(), Some("1aBcDeFgHiJkLmNoPqRs"));
    assert_eq!(
      extract("https://drive.google.com/uc?export=view&id=1aBcDeFgHiJkLmNoPqRs").as_deref(),
      Some("1aBcDeFgHiJkLmNoPqRs")
    );
  }

  // --- extract_reference_id: invalid input ---

  #[test]
  fn invalid_input_yields_none() {
    assert_eq!(extract("not a url"), None);
    assert_eq!(extract("https://vimeo.com/123456"), None);
    assert_eq!(extract(""), None);
    assert_eq!(extract("   \t\n"), None);
  }

  #[test]
  fn surrounding_whitespace_is_ignored() {
    assert_eq!(extract("  https://youtu.be/dQw4w9WgXcQ \n").as_deref(), Some("dQw4w9WgXcQ"));
  }

  #[test]
  fn extraction_is_deterministic() {
    let inputs = ["https://youtu.be/dQw4w9WgXcQ", "https://drive.google.com/file/d/abc_DEF-123/view", "not a url"];
    for input in inputs {
      assert_eq!(extract_reference_id(input), extract_reference_id(input));
    }
  }

  // --- resolve_thumbnail ---

  #[test]
  fn thumbnail_for_youtube_id() {
    let id = extract_reference_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
    assert_eq!(resolve_thumbnail(&id).as_deref(), Some("https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg"));
  }

  #[test]
  fn no_thumbnail_for_drive_id() {
    let id = extract_reference_id("https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRs/view").unwrap();
    assert_eq!(resolve_thumbnail(&id), None);
  }

  #[test]
  fn thumbnail_depends_only_on_length() {
    for len in 1..=30 {
      let id = ReferenceId::new("x".repeat(len));
      match resolve_thumbnail(&id) {
        Some(url) => {
          assert_eq!(len, YOUTUBE_ID_LEN);
          assert!(url.contains(id.as_str()));
        }
        None => assert_ne!(len, YOUTUBE_ID_LEN),
      }
    }
  }

  // --- embeds ---

  #[test]
  fn youtube_embed_autoplays_with_restricted_chrome() {
    let embed = embed_for(&ReferenceId::new("dQw4w9WgXcQ"));
    let Embed::YouTube { url } = embed else { panic!("expected YouTube embed") };
    assert!(url.starts_with("https://www.youtube.com/embed/dQw4w9WgXcQ"));
    assert!(url.contains("autoplay=1"));
    assert!(url.contains("rel=0"));
    assert!(url.contains("modestbranding=1"));
  }

  #[test]
  fn drive_embed_uses_preview_frame() {
    let embed = embed_for(&ReferenceId::new("1aBcDeFgHiJkLmNoPqRs"));
    assert_eq!(embed, Embed::DrivePreview { url: "https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRs/preview".into() });
  }

  #[test]
  fn watch_url_per_kind() {
    assert_eq!(watch_url(&ReferenceId::new("dQw4w9WgXcQ")), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert!(watch_url(&ReferenceId::new("driveToken")).ends_with("/driveToken/preview"));
  }
}
