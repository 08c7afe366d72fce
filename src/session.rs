use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::constants;

/// The signed-in operator as returned by the backend's auth endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
  pub email: String,
  pub access_token: String,
  pub expires_at: DateTime<Utc>,
}

impl AuthUser {
  pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
    now < self.expires_at
  }
}

/// Admin session, owned by the app and handed by reference to whatever needs the token.
///
/// Restored from disk on start and wiped on logout.
#[derive(Debug, Default)]
pub struct Session {
  user: Option<AuthUser>,
  path: Option<PathBuf>,
}

fn session_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", &constants().app_name).map(|dirs| dirs.config_dir().join(&constants().session_file))
}

impl Session {
  /// Session without persistence.
  pub fn ephemeral() -> Self {
    Self::default()
  }

  pub fn load() -> Self {
    Self::load_from(session_path())
  }

  /// Restore a persisted, unexpired session from `path`. Missing or stale files give a signed-out session.
  pub fn load_from(path: Option<PathBuf>) -> Self {
    let user = path.as_deref().and_then(read_user).filter(|user| user.is_valid_at(Utc::now()));
    if let Some(ref user) = user {
      info!(email = %user.email, "session: restored");
    }
    Self { user, path }
  }

  pub fn sign_in(&mut self, user: AuthUser) -> Result<()> {
    info!(email = %user.email, expires_at = %user.expires_at, "session: signed in");
    self.user = Some(user);
    self.persist()
  }

  /// Forget the user and remove the persisted copy.
  pub fn clear(&mut self) {
    if let Some(user) = self.user.take() {
      info!(email = %user.email, "session: signed out");
    }
    if let Some(ref path) = self.path
      && path.exists()
      && let Err(e) = std::fs::remove_file(path)
    {
      warn!(err = %e, path = %path.display(), "session: failed to remove session file");
    }
  }

  pub fn user(&self) -> Option<&AuthUser> {
    self.user.as_ref().filter(|user| user.is_valid_at(Utc::now()))
  }

  /// Email of the last signed-in user, even once the token has expired.
  pub fn last_email(&self) -> Option<&str> {
    self.user.as_ref().map(|user| user.email.as_str())
  }

  pub fn access_token(&self) -> Option<&str> {
    self.user().map(|user| user.access_token.as_str())
  }

  pub fn is_signed_in(&self) -> bool {
    self.user().is_some()
  }

  fn persist(&self) -> Result<()> {
    let (Some(path), Some(user)) = (&self.path, &self.user) else { return Ok(()) };
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(user).context("Failed to serialize session")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), "session: persisted");
    Ok(())
  }
}

fn read_user(path: &Path) -> Option<AuthUser> {
  let content = std::fs::read_to_string(path).ok()?;
  match toml::from_str(&content) {
    Ok(user) => Some(user),
    Err(e) => {
      warn!(err = %e, "session: ignoring unreadable session file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn user(expires_in: Duration) -> AuthUser {
    AuthUser { email: "ops@studio.test".into(), access_token: "tok".into(), expires_at: Utc::now() + expires_in }
  }

  #[test]
  fn ephemeral_session_starts_signed_out() {
    let session = Session::ephemeral();
    assert!(!session.is_signed_in());
    assert_eq!(session.access_token(), None);
  }

  #[test]
  fn sign_in_persists_and_restores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.toml");

    let mut session = Session::load_from(Some(path.clone()));
    assert!(!session.is_signed_in());
    session.sign_in(user(Duration::hours(1))).unwrap();
    assert_eq!(session.access_token(), Some("tok"));

    let restored = Session::load_from(Some(path));
    assert_eq!(restored.user().map(|u| u.email.as_str()), Some("ops@studio.test"));
  }

  #[test]
  fn clear_removes_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    let mut session = Session::load_from(Some(path.clone()));
    session.sign_in(user(Duration::hours(1))).unwrap();
    assert!(path.exists());

    session.clear();
    assert!(!session.is_signed_in());
    assert!(!path.exists());
    assert!(!Session::load_from(Some(path)).is_signed_in());
  }

  #[test]
  fn expired_sessions_are_not_restored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    let mut session = Session::load_from(Some(path.clone()));
    session.sign_in(user(Duration::seconds(-5))).unwrap();
    assert!(!session.is_signed_in());
    assert_eq!(session.last_email(), Some("ops@studio.test"));
    assert!(!Session::load_from(Some(path)).is_signed_in());
  }

  #[test]
  fn garbage_session_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    std::fs::write(&path, "not = [valid").unwrap();
    assert!(!Session::load_from(Some(path)).is_signed_in());
  }
}
