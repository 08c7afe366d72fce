use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::{Category, CompanyInfo, RowId, Service, Testimonial, VideoRecord, sort_by_position};
use crate::session::{AuthUser, Session};

/// Tables of the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Contacts,
  Services,
  CompanyInfo,
  Testimonials,
  VideoCategories,
  DemoVideos,
}

impl Table {
  pub fn name(self) -> &'static str {
    match self {
      Table::Contacts => "contacts",
      Table::Services => "services",
      Table::CompanyInfo => "company_info",
      Table::Testimonials => "testimonials",
      Table::VideoCategories => "video_categories",
      Table::DemoVideos => "demo_videos",
    }
  }

  /// Default listing order.
  pub fn order(self) -> Option<&'static str> {
    match self {
      Table::Contacts => Some("created_at.desc"),
      Table::Services | Table::Testimonials | Table::VideoCategories | Table::DemoVideos => Some("sort_order.asc"),
      Table::CompanyInfo => None,
    }
  }
}

/// CRUD and auth against the hosted backend.
///
/// Reads work signed out (public content); writes use the session token.
#[allow(async_fn_in_trait)]
pub trait Backend {
  async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

  async fn list<R: DeserializeOwned>(&self, table: Table, session: &Session) -> Result<Vec<R>>;

  /// Insert one row and return it as stored.
  async fn insert<P: Serialize, R: DeserializeOwned>(&self, table: Table, session: &Session, payload: &P) -> Result<R>;

  async fn update(&self, table: Table, session: &Session, id: &RowId, patch: Value) -> Result<()>;

  async fn delete(&self, table: Table, session: &Session, id: &RowId) -> Result<()>;
}

/// Everything the public site shows.
#[derive(Debug, Default)]
pub struct SiteContent {
  pub company: CompanyInfo,
  pub categories: Vec<Category>,
  pub videos: Vec<VideoRecord>,
  /// Active services only, in position order.
  pub services: Vec<Service>,
  /// Active testimonials only, in position order.
  pub testimonials: Vec<Testimonial>,
}

/// Fetch every public list concurrently. Hidden services and testimonials are dropped here.
pub async fn load_site<B: Backend>(backend: &B, session: &Session) -> Result<SiteContent> {
  let (company, categories, videos, mut services, mut testimonials) = futures::try_join!(
    backend.list::<CompanyInfo>(Table::CompanyInfo, session),
    backend.list::<Category>(Table::VideoCategories, session),
    backend.list::<VideoRecord>(Table::DemoVideos, session),
    backend.list::<Service>(Table::Services, session),
    backend.list::<Testimonial>(Table::Testimonials, session),
  )?;
  services.retain(|s| s.is_active);
  testimonials.retain(|t| t.is_active);
  sort_by_position(&mut services);
  sort_by_position(&mut testimonials);
  Ok(SiteContent { company: company.into_iter().next().unwrap_or_default(), categories, videos, services, testimonials })
}
