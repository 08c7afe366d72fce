//! Rows of the hosted backend tables.
//!
//! Columns differ between migration states, so every column that may be absent or null
//! carries an explicit fallback instead of being probed at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::resolver::{ReferenceId, extract_reference_id};

// --- Field fallbacks ---

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn default_true() -> bool {
  true
}

/// Backend-assigned row identifier. Tables use either uuids or integer keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RowId(String);

#[cfg(test)]
impl RowId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl<'de> Deserialize<'de> for RowId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Text(String),
      Number(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
      Raw::Text(s) => RowId(s),
      Raw::Number(n) => RowId(n.to_string()),
    })
  }
}

impl fmt::Display for RowId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Rows with a `sort_order` column.
pub trait Positioned {
  fn position(&self) -> i64;
}

/// Stable sort by position, ties keep their insertion order.
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
  items.sort_by_key(|item| item.position());
}

// --- video_categories ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
  pub id: RowId,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order: i64,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl Positioned for Category {
  fn position(&self) -> i64 {
    self.sort_order
  }
}

// --- demo_videos ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoRecord {
  pub id: RowId,
  pub title: String,
  /// Name of the owning category (denormalized, matched by name).
  #[serde(default, deserialize_with = "null_as_default")]
  pub category: String,
  /// Source URL as entered by the operator.
  #[serde(default, deserialize_with = "null_as_default")]
  pub video_url: String,
  #[serde(default)]
  pub video_id: Option<ReferenceId>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order: i64,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl VideoRecord {
  /// The stored reference id, or the one resolved from the source URL for rows saved before the column existed.
  pub fn reference_id(&self) -> Option<ReferenceId> {
    self.video_id.clone().filter(|id| !id.as_str().is_empty()).or_else(|| extract_reference_id(&self.video_url))
  }
}

impl Positioned for VideoRecord {
  fn position(&self) -> i64 {
    self.sort_order
  }
}

/// Videos filed under the category named `name`, in position order.
pub fn videos_in<'a>(videos: &'a [VideoRecord], name: &str) -> Vec<&'a VideoRecord> {
  let mut found: Vec<&VideoRecord> = videos.iter().filter(|v| v.category == name).collect();
  found.sort_by_key(|v| v.sort_order);
  found
}

// --- contacts ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
  Read,
  #[default]
  #[serde(other)]
  New,
}

impl ContactStatus {
  pub fn toggled(self) -> Self {
    match self {
      ContactStatus::New => ContactStatus::Read,
      ContactStatus::Read => ContactStatus::New,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ContactStatus::New => "new",
      ContactStatus::Read => "read",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
  pub id: RowId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub message: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub status: ContactStatus,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

// --- testimonials ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Testimonial {
  pub id: RowId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub client_name: String,
  #[serde(default)]
  pub company: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub content: String,
  #[serde(default)]
  pub rating: Option<u8>,
  #[serde(default = "default_true", deserialize_with = "null_as_true")]
  pub is_active: bool,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order: i64,
}

impl Testimonial {
  /// Star rating, rows without one count as five stars.
  pub fn stars(&self) -> u8 {
    self.rating.unwrap_or(5).min(5)
  }
}

impl Positioned for Testimonial {
  fn position(&self) -> i64 {
    self.sort_order
  }
}

// --- services ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Service {
  pub id: RowId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default)]
  pub price: Option<String>,
  #[serde(default = "default_true", deserialize_with = "null_as_true")]
  pub is_active: bool,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order: i64,
}

impl Positioned for Service {
  fn position(&self) -> i64 {
    self.sort_order
  }
}

// --- company_info ---

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompanyInfo {
  #[serde(default, deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tagline: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub email: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub phone: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn video(id: &str, category: &str, sort_order: i64) -> VideoRecord {
    VideoRecord {
      id: RowId::new(id),
      title: id.to_string(),
      category: category.to_string(),
      video_url: String::new(),
      video_id: None,
      sort_order,
      created_at: None,
    }
  }

  #[test]
  fn row_id_accepts_text_and_integers() {
    let text: RowId = serde_json::from_value(json!("7f3c")).unwrap();
    let number: RowId = serde_json::from_value(json!(42)).unwrap();
    assert_eq!(text.as_str(), "7f3c");
    assert_eq!(number.as_str(), "42");
  }

  #[test]
  fn video_missing_columns_fall_back() {
    let v: VideoRecord = serde_json::from_value(json!({
      "id": 1,
      "title": "Showreel",
      "category": null,
      "video_url": "https://youtu.be/dQw4w9WgXcQ"
    }))
    .unwrap();
    assert_eq!(v.category, "");
    assert_eq!(v.sort_order, 0);
    assert_eq!(v.video_id, None);
    assert_eq!(v.reference_id().map(|id| id.to_string()).as_deref(), Some("dQw4w9WgXcQ"));
  }

  #[test]
  fn stored_reference_id_takes_precedence() {
    let mut v = video("a", "Weddings", 0);
    v.video_url = "https://youtu.be/dQw4w9WgXcQ".into();
    v.video_id = Some(ReferenceId::new("1aBcDeFgHiJkLmNoPqRs"));
    assert_eq!(v.reference_id(), Some(ReferenceId::new("1aBcDeFgHiJkLmNoPqRs")));
    v.video_id = Some(ReferenceId::new(""));
    assert_eq!(v.reference_id(), Some(ReferenceId::new("dQw4w9WgXcQ")));
  }

  #[test]
  fn contact_status_fallbacks() {
    let unknown: Contact = serde_json::from_value(json!({"id": "c1", "status": "archived"})).unwrap();
    let null: Contact = serde_json::from_value(json!({"id": "c2", "status": null})).unwrap();
    let read: Contact = serde_json::from_value(json!({"id": "c3", "status": "read"})).unwrap();
    assert_eq!(unknown.status, ContactStatus::New);
    assert_eq!(null.status, ContactStatus::New);
    assert_eq!(read.status, ContactStatus::Read);
    assert_eq!(read.status.toggled(), ContactStatus::New);
    assert_eq!(ContactStatus::default(), ContactStatus::New);
    assert_eq!(serde_json::to_value(ContactStatus::New).unwrap(), json!("new"));
    assert_eq!(serde_json::to_value(ContactStatus::Read).unwrap(), json!("read"));
  }

  #[test]
  fn visibility_defaults_to_active() {
    let missing: Testimonial = serde_json::from_value(json!({"id": 1, "client_name": "Ana"})).unwrap();
    let null: Service = serde_json::from_value(json!({"id": 2, "title": "Editing", "is_active": null})).unwrap();
    let hidden: Service = serde_json::from_value(json!({"id": 3, "is_active": false})).unwrap();
    assert!(missing.is_active);
    assert_eq!(missing.stars(), 5);
    assert!(null.is_active);
    assert!(!hidden.is_active);
  }

  #[test]
  fn sort_by_position_keeps_insertion_order_on_ties() {
    let mut videos = vec![video("c", "x", 2), video("a", "x", 1), video("b", "x", 1), video("d", "x", 0)];
    sort_by_position(&mut videos);
    let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["d", "a", "b", "c"]);
  }

  #[test]
  fn videos_in_matches_category_name_exactly() {
    let videos = vec![video("1", "Weddings", 3), video("2", "Corporate", 1), video("3", "Weddings", 1), video("4", "weddings", 0)];
    let ids: Vec<&str> = videos_in(&videos, "Weddings").iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["3", "1"]);
  }
}
