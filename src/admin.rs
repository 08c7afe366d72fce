use ratatui::widgets::ListState;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::backend::{Backend, Table};
use crate::model::{
  Category, Contact, ContactStatus, RowId, Service, Testimonial, VideoRecord, sort_by_position, videos_in,
};
use crate::resolver::{ReferenceId, extract_reference_id};
use crate::session::Session;

/// Operator-facing failures. None of them is fatal; all are shown as dismissible notifications.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
  #[error("{0} is required")]
  MissingField(&'static str),
  #[error("Invalid video URL: paste a YouTube or Google Drive link")]
  InvalidUrl,
  #[error("Unknown category '{0}'")]
  UnknownCategory(String),
  #[error("Category '{0}' already exists")]
  DuplicateCategory(String),
  #[error("Invalid email address '{0}'")]
  InvalidEmail(String),
  #[error("Category '{name}' still has {count} video(s); move or delete them first")]
  CategoryInUse { name: String, count: usize },
  #[error("{kind} '{id}' no longer exists; press r to refresh")]
  NotFound { kind: &'static str, id: RowId },
  #[error("Sign in to make changes")]
  NotSignedIn,
  #[error("{0:#}")]
  Backend(anyhow::Error),
}

fn required(value: &str, field: &'static str) -> Result<String, AdminError> {
  let value = value.trim();
  if value.is_empty() { Err(AdminError::MissingField(field)) } else { Ok(value.to_string()) }
}

fn require_session(session: &Session) -> Result<(), AdminError> {
  if session.is_signed_in() { Ok(()) } else { Err(AdminError::NotSignedIn) }
}

// --- Payloads ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVideo {
  pub title: String,
  pub category: String,
  pub video_url: String,
  pub video_id: ReferenceId,
  pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCategory {
  pub name: String,
  pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewContact {
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub message: String,
  pub status: ContactStatus,
}

// --- Drafts (form input before validation) ---

#[derive(Debug, Clone, Default)]
pub struct VideoDraft {
  pub title: String,
  pub category: String,
  pub source_url: String,
}

impl VideoDraft {
  /// Check the draft locally. The source URL must resolve to a reference id before anything is sent.
  pub fn validate(&self, categories: &[Category], videos: &[VideoRecord]) -> Result<NewVideo, AdminError> {
    let title = required(&self.title, "Title")?;
    let category_name = required(&self.category, "Category")?;
    let category = categories
      .iter()
      .find(|c| c.name.eq_ignore_ascii_case(&category_name))
      .ok_or(AdminError::UnknownCategory(category_name))?;
    let video_url = required(&self.source_url, "Video URL")?;
    let video_id = extract_reference_id(&video_url).ok_or(AdminError::InvalidUrl)?;
    let sort_order = videos_in(videos, &category.name).last().map_or(0, |v| v.sort_order + 1);
    Ok(NewVideo { title, category: category.name.clone(), video_url, video_id, sort_order })
  }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryDraft {
  pub name: String,
}

impl CategoryDraft {
  pub fn validate(&self, categories: &[Category]) -> Result<NewCategory, AdminError> {
    let name = required(&self.name, "Name")?;
    if categories.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
      return Err(AdminError::DuplicateCategory(name));
    }
    let sort_order = categories.iter().map(|c| c.sort_order).max().map_or(0, |max| max + 1);
    Ok(NewCategory { name, sort_order })
  }
}

#[derive(Debug, Clone, Default)]
pub struct ContactDraft {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub message: String,
}

fn plausible_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else { return false };
  !local.is_empty()
    && !domain.contains('@')
    && !email.chars().any(char::is_whitespace)
    && domain.split('.').count() >= 2
    && domain.split('.').all(|part| !part.is_empty())
}

impl ContactDraft {
  pub fn validate(&self) -> Result<NewContact, AdminError> {
    let name = required(&self.name, "Name")?;
    let email = required(&self.email, "Email")?;
    if !plausible_email(&email) {
      return Err(AdminError::InvalidEmail(email));
    }
    let message = required(&self.message, "Message")?;
    let phone = Some(self.phone.trim().to_string()).filter(|p| !p.is_empty());
    Ok(NewContact { name, email, phone, message, status: ContactStatus::New })
  }
}

/// A category may only be deleted once no video is filed under it.
pub fn guard_category_delete(category: &Category, videos: &[VideoRecord]) -> Result<(), AdminError> {
  let count = videos_in(videos, &category.name).len();
  if count > 0 { Err(AdminError::CategoryInUse { name: category.name.clone(), count }) } else { Ok(()) }
}

// --- Optimistic updates ---

/// Outcome of an optimistic change: shown immediately, then confirmed or undone.
#[derive(Debug, Clone, PartialEq)]
pub enum Optimistic<T> {
  Pending { prior: T, proposed: T },
  Committed(T),
  RolledBack { restored: T, reason: String },
}

impl<T> Optimistic<T> {
  pub fn begin(prior: T, proposed: T) -> Self {
    Optimistic::Pending { prior, proposed }
  }

  pub fn commit(self) -> Self {
    match self {
      Optimistic::Pending { proposed, .. } => Optimistic::Committed(proposed),
      settled => settled,
    }
  }

  pub fn roll_back(self, reason: impl Into<String>) -> Self {
    match self {
      Optimistic::Pending { prior, .. } => Optimistic::RolledBack { restored: prior, reason: reason.into() },
      settled => settled,
    }
  }

  /// The value to display right now.
  pub fn value(&self) -> &T {
    match self {
      Optimistic::Pending { proposed, .. } => proposed,
      Optimistic::Committed(value) => value,
      Optimistic::RolledBack { restored, .. } => restored,
    }
  }
}

/// Rows with a status-style field that can be flipped in place.
pub trait Toggle {
  type Value: Clone + Serialize;
  const TABLE: Table;
  const FIELD: &'static str;

  fn id(&self) -> &RowId;
  fn current(&self) -> Self::Value;
  fn flipped(&self) -> Self::Value;
  fn set(&mut self, value: Self::Value);
}

impl Toggle for Contact {
  type Value = ContactStatus;
  const TABLE: Table = Table::Contacts;
  const FIELD: &'static str = "status";

  fn id(&self) -> &RowId {
    &self.id
  }
  fn current(&self) -> ContactStatus {
    self.status
  }
  fn flipped(&self) -> ContactStatus {
    self.status.toggled()
  }
  fn set(&mut self, value: ContactStatus) {
    self.status = value;
  }
}

impl Toggle for Testimonial {
  type Value = bool;
  const TABLE: Table = Table::Testimonials;
  const FIELD: &'static str = "is_active";

  fn id(&self) -> &RowId {
    &self.id
  }
  fn current(&self) -> bool {
    self.is_active
  }
  fn flipped(&self) -> bool {
    !self.is_active
  }
  fn set(&mut self, value: bool) {
    self.is_active = value;
  }
}

impl Toggle for Service {
  type Value = bool;
  const TABLE: Table = Table::Services;
  const FIELD: &'static str = "is_active";

  fn id(&self) -> &RowId {
    &self.id
  }
  fn current(&self) -> bool {
    self.is_active
  }
  fn flipped(&self) -> bool {
    !self.is_active
  }
  fn set(&mut self, value: bool) {
    self.is_active = value;
  }
}

/// Flip `row` locally, push the change, and restore the prior value if the backend refuses it.
pub async fn toggle<B: Backend, R: Toggle>(backend: &B, session: &Session, row: &mut R) -> Optimistic<R::Value> {
  let state = Optimistic::begin(row.current(), row.flipped());
  row.set(state.value().clone());

  let result = match serde_json::to_value(state.value()) {
    Ok(value) => {
      let mut patch = Map::new();
      patch.insert(R::FIELD.to_string(), value);
      match require_session(session) {
        Ok(()) => backend.update(R::TABLE, session, row.id(), Value::Object(patch)).await.map_err(AdminError::Backend),
        Err(e) => Err(e),
      }
    }
    Err(e) => Err(AdminError::Backend(e.into())),
  };

  let state = match result {
    Ok(()) => state.commit(),
    Err(e) => {
      warn!(table = R::TABLE.name(), id = %row.id(), err = %e, "admin: toggle rolled back");
      state.roll_back(e.to_string())
    }
  };
  row.set(state.value().clone());
  state
}

// --- Sign-in ---

pub async fn sign_in<B: Backend>(
  backend: &B,
  session: &mut Session,
  email: &str,
  password: &str,
) -> Result<(), AdminError> {
  let email = required(email, "Email")?;
  if password.is_empty() {
    return Err(AdminError::MissingField("Password"));
  }
  let user = backend.sign_in(&email, password).await.map_err(AdminError::Backend)?;
  if let Err(e) = session.sign_in(user) {
    // The session still works for this run.
    warn!(err = %e, "admin: could not persist session");
  }
  Ok(())
}

/// Public contact form submission, no session required.
pub async fn submit_contact<B: Backend>(
  backend: &B,
  session: &Session,
  draft: &ContactDraft,
) -> Result<Contact, AdminError> {
  let payload = draft.validate()?;
  let contact: Contact = backend.insert(Table::Contacts, session, &payload).await.map_err(AdminError::Backend)?;
  info!(id = %contact.id, "contact: message submitted");
  Ok(contact)
}

// --- Console ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminTab {
  #[default]
  Videos,
  Categories,
  Contacts,
  Testimonials,
  Services,
}

impl AdminTab {
  pub const ALL: [AdminTab; 5] =
    [AdminTab::Videos, AdminTab::Categories, AdminTab::Contacts, AdminTab::Testimonials, AdminTab::Services];

  pub fn label(self) -> &'static str {
    match self {
      AdminTab::Videos => "Videos",
      AdminTab::Categories => "Categories",
      AdminTab::Contacts => "Contacts",
      AdminTab::Testimonials => "Testimonials",
      AdminTab::Services => "Services",
    }
  }

  pub fn next(self) -> Self {
    let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }

  pub fn previous(self) -> Self {
    let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
    Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
  }
}

/// In-memory copy of the admin tables.
///
/// Creates and deletes touch local state only after the backend confirms them.
#[derive(Debug, Default)]
pub struct AdminConsole {
  pub categories: Vec<Category>,
  pub videos: Vec<VideoRecord>,
  pub contacts: Vec<Contact>,
  pub testimonials: Vec<Testimonial>,
  pub services: Vec<Service>,
  pub tab: AdminTab,
  pub list_state: ListState,
}

impl AdminConsole {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn refresh<B: Backend>(&mut self, backend: &B, session: &Session) -> Result<(), AdminError> {
    require_session(session)?;
    let (mut categories, mut videos, contacts, mut testimonials, mut services) = futures::try_join!(
      backend.list::<Category>(Table::VideoCategories, session),
      backend.list::<VideoRecord>(Table::DemoVideos, session),
      backend.list::<Contact>(Table::Contacts, session),
      backend.list::<Testimonial>(Table::Testimonials, session),
      backend.list::<Service>(Table::Services, session),
    )
    .map_err(AdminError::Backend)?;
    sort_by_position(&mut categories);
    sort_by_position(&mut videos);
    sort_by_position(&mut testimonials);
    sort_by_position(&mut services);
    info!(categories = categories.len(), videos = videos.len(), contacts = contacts.len(), "admin: refreshed");
    self.categories = categories;
    self.videos = videos;
    self.contacts = contacts;
    self.testimonials = testimonials;
    self.services = services;
    self.clamp_selection();
    Ok(())
  }

  pub async fn submit_video<B: Backend>(
    &mut self,
    backend: &B,
    session: &Session,
    draft: &VideoDraft,
  ) -> Result<VideoRecord, AdminError> {
    let payload = draft.validate(&self.categories, &self.videos)?;
    require_session(session)?;
    let created: VideoRecord =
      backend.insert(Table::DemoVideos, session, &payload).await.map_err(AdminError::Backend)?;
    info!(id = %created.id, reference = %payload.video_id, "admin: video created");
    self.videos.push(created.clone());
    sort_by_position(&mut self.videos);
    Ok(created)
  }

  pub async fn delete_video<B: Backend>(
    &mut self,
    backend: &B,
    session: &Session,
    id: &RowId,
  ) -> Result<(), AdminError> {
    if !self.videos.iter().any(|v| &v.id == id) {
      return Err(AdminError::NotFound { kind: "Video", id: id.clone() });
    }
    require_session(session)?;
    backend.delete(Table::DemoVideos, session, id).await.map_err(AdminError::Backend)?;
    info!(id = %id, "admin: video deleted");
    self.videos.retain(|v| &v.id != id);
    self.clamp_selection();
    Ok(())
  }

  pub async fn create_category<B: Backend>(
    &mut self,
    backend: &B,
    session: &Session,
    draft: &CategoryDraft,
  ) -> Result<Category, AdminError> {
    let payload = draft.validate(&self.categories)?;
    require_session(session)?;
    let created: Category =
      backend.insert(Table::VideoCategories, session, &payload).await.map_err(AdminError::Backend)?;
    info!(id = %created.id, name = %created.name, "admin: category created");
    self.categories.push(created.clone());
    sort_by_position(&mut self.categories);
    Ok(created)
  }

  pub async fn delete_category<B: Backend>(
    &mut self,
    backend: &B,
    session: &Session,
    id: &RowId,
  ) -> Result<(), AdminError> {
    let Some(category) = self.categories.iter().find(|c| &c.id == id) else {
      return Err(AdminError::NotFound { kind: "Category", id: id.clone() });
    };
    guard_category_delete(category, &self.videos)?;
    require_session(session)?;
    backend.delete(Table::VideoCategories, session, id).await.map_err(AdminError::Backend)?;
    info!(id = %id, "admin: category deleted");
    self.categories.retain(|c| &c.id != id);
    self.clamp_selection();
    Ok(())
  }

  /// Toggle the selected row of the current tab. `None` when the tab has nothing to toggle.
  pub async fn toggle_selected<B: Backend>(&mut self, backend: &B, session: &Session) -> Option<Result<(), String>> {
    let index = self.list_state.selected()?;
    let reason = match self.tab {
      AdminTab::Contacts => rolled_back(toggle(backend, session, self.contacts.get_mut(index)?).await),
      AdminTab::Testimonials => rolled_back(toggle(backend, session, self.testimonials.get_mut(index)?).await),
      AdminTab::Services => rolled_back(toggle(backend, session, self.services.get_mut(index)?).await),
      AdminTab::Videos | AdminTab::Categories => return None,
    };
    Some(reason.map_or(Ok(()), Err))
  }

  pub fn set_tab(&mut self, tab: AdminTab) {
    self.tab = tab;
    self.list_state.select(if self.is_empty() { None } else { Some(0) });
  }

  /// Rows in the current tab.
  pub fn len(&self) -> usize {
    match self.tab {
      AdminTab::Videos => self.videos.len(),
      AdminTab::Categories => self.categories.len(),
      AdminTab::Contacts => self.contacts.len(),
      AdminTab::Testimonials => self.testimonials.len(),
      AdminTab::Services => self.services.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn selected_video(&self) -> Option<&VideoRecord> {
    if self.tab != AdminTab::Videos {
      return None;
    }
    self.list_state.selected().and_then(|i| self.videos.get(i))
  }

  pub fn selected_category(&self) -> Option<&Category> {
    if self.tab != AdminTab::Categories {
      return None;
    }
    self.list_state.selected().and_then(|i| self.categories.get(i))
  }

  pub fn select_next(&mut self) {
    let count = self.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  fn clamp_selection(&mut self) {
    let count = self.len();
    if count == 0 {
      self.list_state.select(None);
    } else {
      let sel = self.list_state.selected().unwrap_or(0);
      self.list_state.select(Some(sel.min(count - 1)));
    }
  }
}

fn rolled_back<T>(state: Optimistic<T>) -> Option<String> {
  match state {
    Optimistic::RolledBack { reason, .. } => Some(reason),
    Optimistic::Pending { .. } | Optimistic::Committed(_) => None,
  }
}
