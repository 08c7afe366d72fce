use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{Backend, Table};
use crate::config::BackendSettings;
use crate::constants::constants;
use crate::model::RowId;
use crate::session::{AuthUser, Session};

/// `Backend` over a PostgREST-style hosted API.
#[derive(Debug, Clone)]
pub struct RestBackend {
  client: Client,
  base_url: String,
  api_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default = "default_expiry")]
  expires_in: i64,
  #[serde(default)]
  user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
  #[serde(default)]
  email: Option<String>,
}

fn default_expiry() -> i64 {
  3600
}

impl RestBackend {
  pub fn new(settings: &BackendSettings) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(constants().http_timeout_secs))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { client, base_url: settings.url.trim_end_matches('/').to_string(), api_key: settings.api_key.clone() })
  }

  pub fn client(&self) -> &Client {
    &self.client
  }

  fn table_url(&self, table: Table) -> String {
    format!("{}{}/{}", self.base_url, constants().rest_path, table.name())
  }

  fn list_url(&self, table: Table) -> String {
    match table.order() {
      Some(order) => format!("{}?select=*&order={}", self.table_url(table), order),
      None => format!("{}?select=*", self.table_url(table)),
    }
  }

  fn row_url(&self, table: Table, id: &RowId) -> String {
    format!("{}?id=eq.{}", self.table_url(table), id)
  }

  fn token_url(&self) -> String {
    format!("{}{}/token?grant_type=password", self.base_url, constants().auth_path)
  }

  /// Attach the API key and the bearer token: the session's when signed in, the anon key otherwise.
  fn authorize(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
    let token = session.access_token().unwrap_or(&self.api_key);
    request.header("apikey", &self.api_key).bearer_auth(token)
  }
}

async fn check(response: Response, what: &str) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  warn!(status = %status, what, "backend: request rejected");
  bail!("{} failed ({}): {}", what, status, body.trim())
}

impl Backend for RestBackend {
  async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
    let response = self
      .client
      .post(self.token_url())
      .header("apikey", &self.api_key)
      .json(&serde_json::json!({ "email": email, "password": password }))
      .send()
      .await
      .context("Sign-in request failed")?;
    let token: TokenResponse = check(response, "sign-in").await?.json().await.context("Malformed sign-in response")?;
    let email = token.user.and_then(|u| u.email).unwrap_or_else(|| email.to_string());
    Ok(AuthUser {
      email,
      access_token: token.access_token,
      expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
    })
  }

  async fn list<R: DeserializeOwned>(&self, table: Table, session: &Session) -> Result<Vec<R>> {
    let url = self.list_url(table);
    debug!(url = %url, "backend: list");
    let response = self
      .authorize(self.client.get(&url), session)
      .send()
      .await
      .with_context(|| format!("Failed to fetch {}", table.name()))?;
    check(response, table.name())
      .await?
      .json()
      .await
      .with_context(|| format!("Malformed {} response", table.name()))
  }

  async fn insert<P: Serialize, R: DeserializeOwned>(&self, table: Table, session: &Session, payload: &P) -> Result<R> {
    let response = self
      .authorize(self.client.post(self.table_url(table)), session)
      .header("Prefer", "return=representation")
      .json(payload)
      .send()
      .await
      .with_context(|| format!("Failed to insert into {}", table.name()))?;
    let rows: Vec<R> = check(response, table.name())
      .await?
      .json()
      .await
      .with_context(|| format!("Malformed {} insert response", table.name()))?;
    rows.into_iter().next().ok_or_else(|| anyhow!("{} insert returned no row", table.name()))
  }

  async fn update(&self, table: Table, session: &Session, id: &RowId, patch: Value) -> Result<()> {
    let response = self
      .authorize(self.client.patch(self.row_url(table, id)), session)
      .json(&patch)
      .send()
      .await
      .with_context(|| format!("Failed to update {} {}", table.name(), id))?;
    check(response, table.name()).await?;
    Ok(())
  }

  async fn delete(&self, table: Table, session: &Session, id: &RowId) -> Result<()> {
    let response = self
      .authorize(self.client.delete(self.row_url(table, id)), session)
      .send()
      .await
      .with_context(|| format!("Failed to delete {} {}", table.name(), id))?;
    check(response, table.name()).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn backend() -> RestBackend {
    RestBackend::new(&BackendSettings { url: "https://abc.example.co/".into(), api_key: "anon".into() }).unwrap()
  }

  #[test]
  fn list_urls_carry_order() {
    let b = backend();
    assert_eq!(b.list_url(Table::DemoVideos), "https://abc.example.co/rest/v1/demo_videos?select=*&order=sort_order.asc");
    assert_eq!(b.list_url(Table::Contacts), "https://abc.example.co/rest/v1/contacts?select=*&order=created_at.desc");
    assert_eq!(b.list_url(Table::CompanyInfo), "https://abc.example.co/rest/v1/company_info?select=*");
  }

  #[test]
  fn row_and_token_urls() {
    let b = backend();
    assert_eq!(b.row_url(Table::Services, &RowId::new("42")), "https://abc.example.co/rest/v1/services?id=eq.42");
    assert_eq!(b.token_url(), "https://abc.example.co/auth/v1/token?grant_type=password");
  }

  #[test]
  fn token_response_defaults() {
    let token: TokenResponse = serde_json::from_str(r#"{"access_token":"jwt"}"#).unwrap();
    assert_eq!(token.access_token, "jwt");
    assert_eq!(token.expires_in, 3600);
    assert!(token.user.is_none());
  }
}
