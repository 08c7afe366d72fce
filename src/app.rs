use anyhow::Result;
use image::DynamicImage;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::admin::{self, AdminConsole, AdminTab};
use crate::backend::{SiteContent, load_site};
use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::form::{Form, FormKind};
use crate::gallery::{CloseReason, Gallery};
use crate::graphics::fetch_thumbnail;
use crate::model::{CompanyInfo, RowId, Service, Testimonial};
use crate::rest::RestBackend;
use crate::session::Session;
use crate::theme::{THEMES, Theme, theme_index};

type ThumbnailResult = (String, Result<DynamicImage>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Gallery,
  Admin,
  Form(FormKind),
}

/// Admin row waiting for a `y` to confirm its deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
  pub tab: AdminTab,
  pub id: RowId,
  pub label: String,
}

#[derive(Default)]
pub struct ThumbnailCache {
  /// Decoded thumbnail keyed by its URL.
  pub original: Option<(String, DynamicImage)>,
  /// The original fitted to the last area it was drawn in.
  pub fitted: Option<(String, Rect, DynamicImage)>,
}

#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) site_rx: Option<oneshot::Receiver<Result<SiteContent>>>,
  pub(crate) thumb_rx: Option<oneshot::Receiver<ThumbnailResult>>,
}

pub struct App {
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub company: CompanyInfo,
  /// Public services and testimonials shown next to the folders.
  pub services: Vec<Service>,
  pub testimonials: Vec<Testimonial>,
  pub gallery: Gallery,
  /// Where the playback overlay was last drawn. Clicks outside it close the video.
  pub overlay_area: Option<Rect>,
  pub admin: AdminConsole,
  pub session: Session,
  pub backend: RestBackend,
  pub form: Option<Form>,
  /// Mode to return to when the open form is closed.
  form_return: AppMode,
  pub pending_delete: Option<PendingDelete>,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Confirmation of a completed action, lower priority than status and errors.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub thumbs: ThumbnailCache,
  pub(crate) tasks: AsyncTasks,
  prefs: Config,
  error_time: Option<Instant>,
  info_time: Option<Instant>,
}

impl App {
  pub fn new(backend: RestBackend, session: Session, prefs: Config, display_mode: DisplayMode) -> Self {
    Self {
      mode: AppMode::Gallery,
      theme_index: theme_index(prefs.theme_name.as_deref()),
      display_mode,
      company: CompanyInfo::default(),
      services: Vec::new(),
      testimonials: Vec::new(),
      gallery: Gallery::new(),
      overlay_area: None,
      admin: AdminConsole::new(),
      session,
      backend,
      form: None,
      form_return: AppMode::Gallery,
      pending_delete: None,
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      thumbs: ThumbnailCache::default(),
      tasks: AsyncTasks::default(),
      prefs,
      error_time: None,
      info_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.prefs.theme_name = Some(self.theme().name.to_string());
    self.prefs.save();
  }

  // --- Notifications ---

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    warn!(msg = %msg, "notification");
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  pub fn set_info(&mut self, msg: String) {
    self.info_message = Some(msg);
    self.info_time = Some(Instant::now());
  }

  /// Drop errors and infos older than the dismiss timeout.
  pub fn expire_messages(&mut self) {
    let timeout = Duration::from_secs(constants().error_dismiss_secs);
    if self.error_time.is_some_and(|t| t.elapsed() >= timeout) {
      self.clear_error();
    }
    if self.info_time.is_some_and(|t| t.elapsed() >= timeout) {
      self.info_message = None;
      self.info_time = None;
    }
  }

  // --- Background tasks ---

  /// Fetch public content. Reads go out with the anon key only.
  pub fn trigger_site_load(&mut self) {
    if self.gallery.is_loading() && self.tasks.site_rx.is_some() {
      debug!("site load already in flight");
      return;
    }
    info!("site load triggered");
    self.gallery.set_loading();
    self.status_message = Some("Loading videos…".to_string());
    let backend = self.backend.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let session = Session::ephemeral();
      let _ = tx.send(load_site(&backend, &session).await);
    });
    self.tasks.site_rx = Some(rx);
  }

  fn trigger_thumbnail(&mut self) {
    let Some(url) = self.gallery.playing().and_then(|p| p.thumbnail_url.clone()) else { return };
    if self.thumbs.original.as_ref().is_some_and(|(cached, _)| *cached == url) {
      return;
    }
    self.thumbs.original = None;
    self.thumbs.fitted = None;
    let client = self.backend.client().clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = fetch_thumbnail(&client, &url).await;
      let _ = tx.send((url, result));
    });
    self.tasks.thumb_rx = Some(rx);
  }

  pub fn apply_site(&mut self, site: SiteContent) {
    info!(
      categories = site.categories.len(),
      videos = site.videos.len(),
      services = site.services.len(),
      testimonials = site.testimonials.len(),
      "site loaded"
    );
    self.company = site.company;
    self.services = site.services;
    self.testimonials = site.testimonials;
    self.gallery.load(site.categories, site.videos);
  }

  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.site_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok(site) => self.apply_site(site),
            Err(e) => {
              error!(err = %format!("{:#}", e), "site load failed");
              self.gallery.stop_loading();
              self.set_error(format!("Failed to load videos: {:#}", e));
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.site_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.gallery.stop_loading();
          self.set_error("Load task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.thumb_rx.take() {
      match rx.try_recv() {
        Ok((url, Ok(image))) => {
          // Drop results for a video that has been closed in the meantime.
          if self.gallery.playing().and_then(|p| p.thumbnail_url.as_deref()) == Some(url.as_str()) {
            self.thumbs.original = Some((url, image));
            self.thumbs.fitted = None;
          }
        }
        Ok((url, Err(e))) => {
          debug!(url = %url, err = %format!("{:#}", e), "thumbnail unavailable");
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.thumb_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }
  }

  // --- Gallery ---

  /// Enter on the gallery: open the folder, or play the video and fetch its thumbnail.
  pub fn activate_selected(&mut self) {
    self.gallery.activate_selected();
    self.trigger_thumbnail();
  }

  pub fn close_video(&mut self, reason: CloseReason) {
    if self.gallery.close_video(reason) {
      self.tasks.thumb_rx = None;
    }
  }

  /// Open the playing video's embed link in the default browser.
  pub fn open_in_browser(&mut self) {
    let Some(url) = self.gallery.playing().and_then(|p| p.embed.as_ref()).map(|e| e.url().to_string()) else {
      self.set_error("This video has no playable link.".to_string());
      return;
    };
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(&url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        info!(url = %url, "opened in browser");
        // Reap the child so it does not linger as a zombie.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => self.set_error(format!("Failed to open browser: {}", e)),
    }
  }

  // --- Forms ---

  pub fn open_form(&mut self, form: Form) {
    debug!(kind = ?form.kind, "form opened");
    self.form_return = if matches!(self.mode, AppMode::Form(_)) { self.form_return } else { self.mode };
    self.mode = AppMode::Form(form.kind);
    self.form = Some(form);
    self.clear_error();
  }

  /// The screen drawn underneath: the form's origin while a form is open.
  pub fn base_mode(&self) -> AppMode {
    match self.mode {
      AppMode::Form(_) => self.form_return,
      mode => mode,
    }
  }

  pub fn close_form(&mut self) {
    self.form = None;
    self.mode = self.form_return;
  }

  /// Validate and send the open form. On failure the form stays open with its input.
  pub async fn submit_form(&mut self) {
    let Some(form) = self.form.take() else { return };
    self.clear_error();
    let result = match form.kind {
      FormKind::Login => {
        match admin::sign_in(&self.backend, &mut self.session, form.value("Email"), form.value("Password")).await {
          Ok(()) => {
            let email = self.session.user().map(|u| u.email.clone()).unwrap_or_default();
            self.set_info(format!("Signed in as {}", email));
            self.form_return = AppMode::Admin;
            Ok(())
          }
          Err(e) => Err(e),
        }
      }
      FormKind::Video => match self.admin.submit_video(&self.backend, &self.session, &form.video_draft()).await {
        Ok(video) => {
          self.set_info(format!("Added '{}'", video.title));
          Ok(())
        }
        Err(e) => Err(e),
      },
      FormKind::Category => match self.admin.create_category(&self.backend, &self.session, &form.category_draft()).await
      {
        Ok(category) => {
          self.set_info(format!("Created category '{}'", category.name));
          Ok(())
        }
        Err(e) => Err(e),
      },
      FormKind::Contact => match admin::submit_contact(&self.backend, &self.session, &form.contact_draft()).await {
        Ok(_) => {
          self.set_info("Thanks! Your message has been sent.".to_string());
          Ok(())
        }
        Err(e) => Err(e),
      },
    };

    match result {
      Ok(()) => {
        self.close_form();
        if form.kind == FormKind::Login {
          self.gallery.reset();
          self.refresh_admin().await;
        }
      }
      Err(e) => {
        self.set_error(e.to_string());
        self.form = Some(form);
      }
    }
  }

  // --- Admin ---

  /// Switch to the admin console, asking for sign-in first when needed.
  pub async fn enter_admin(&mut self) {
    if !self.session.is_signed_in() {
      let email = self.session.last_email().map(str::to_string);
      self.open_form(Form::login(email.as_deref()));
      return;
    }
    self.gallery.reset();
    self.mode = AppMode::Admin;
    self.refresh_admin().await;
  }

  /// Back to the public gallery, reloading what the admin may have changed.
  pub fn leave_admin(&mut self) {
    self.mode = AppMode::Gallery;
    self.pending_delete = None;
    self.gallery.reset();
    self.trigger_site_load();
  }

  pub async fn refresh_admin(&mut self) {
    match self.admin.refresh(&self.backend, &self.session).await {
      Ok(()) => {
        let tab = self.admin.tab;
        self.admin.set_tab(tab);
      }
      Err(e) => self.set_error(format!("Refresh failed: {}", e)),
    }
  }

  pub fn switch_tab(&mut self, tab: AdminTab) {
    self.pending_delete = None;
    self.admin.set_tab(tab);
  }

  /// `n` in the admin console.
  pub fn start_create(&mut self) {
    match self.admin.tab {
      AdminTab::Videos => {
        let category = self.admin.categories.first().map(|c| c.name.clone());
        self.open_form(Form::video(category.as_deref()));
      }
      AdminTab::Categories => self.open_form(Form::category()),
      AdminTab::Contacts | AdminTab::Testimonials | AdminTab::Services => {
        self.set_info(format!("{} are managed on the website.", self.admin.tab.label()));
      }
    }
  }

  /// `d` in the admin console: remember the row and wait for confirmation.
  pub fn request_delete(&mut self) {
    let pending = if let Some(video) = self.admin.selected_video() {
      PendingDelete { tab: AdminTab::Videos, id: video.id.clone(), label: video.title.clone() }
    } else if let Some(category) = self.admin.selected_category() {
      if let Err(e) = admin::guard_category_delete(category, &self.admin.videos) {
        self.set_error(e.to_string());
        return;
      }
      PendingDelete { tab: AdminTab::Categories, id: category.id.clone(), label: category.name.clone() }
    } else {
      return;
    };
    self.status_message = Some(format!("Delete '{}'? y to confirm, any other key to cancel", pending.label));
    self.pending_delete = Some(pending);
  }

  pub async fn confirm_delete(&mut self) {
    self.status_message = None;
    let Some(pending) = self.pending_delete.take() else { return };
    let result = match pending.tab {
      AdminTab::Categories => self.admin.delete_category(&self.backend, &self.session, &pending.id).await,
      _ => self.admin.delete_video(&self.backend, &self.session, &pending.id).await,
    };
    match result {
      Ok(()) => self.set_info(format!("Deleted '{}'", pending.label)),
      Err(e) => self.set_error(e.to_string()),
    }
  }

  pub fn cancel_delete(&mut self) {
    if self.pending_delete.take().is_some() {
      self.status_message = None;
    }
  }

  pub async fn toggle_selected(&mut self) {
    if let Some(Err(reason)) = self.admin.toggle_selected(&self.backend, &self.session).await {
      self.set_error(format!("Change reverted: {}", reason));
    }
  }

  /// Play the selected admin video in the overlay.
  pub fn preview_selected(&mut self) {
    if let Some(video) = self.admin.selected_video().cloned() {
      self.gallery.open_video(video);
      self.trigger_thumbnail();
    }
  }

  pub fn logout(&mut self) {
    self.session.clear();
    self.admin = AdminConsole::new();
    self.set_info("Signed out.".to_string());
    self.leave_admin();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::BackendSettings;
  use crate::model::{Category, VideoRecord};

  fn app() -> App {
    let backend =
      RestBackend::new(&BackendSettings { url: "http://127.0.0.1:9".into(), api_key: "anon".into() }).unwrap();
    App::new(backend, Session::ephemeral(), Config::default(), DisplayMode::Ascii)
  }

  fn drive_video(id: &str, category: &str) -> VideoRecord {
    VideoRecord {
      id: RowId::new(id),
      title: id.to_string(),
      category: category.to_string(),
      video_url: "https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRs/view".into(),
      video_id: None,
      sort_order: 0,
      created_at: None,
    }
  }

  #[test]
  fn theme_from_prefs() {
    let mut app = app();
    assert_eq!(app.theme().name, THEMES[0].name);
    app.theme_index = THEMES.len() + 1;
    assert_eq!(app.theme().name, THEMES[1].name);
  }

  #[test]
  fn messages_expire() {
    let mut app = app();
    app.set_error("boom".into());
    app.set_info("done".into());
    app.expire_messages();
    assert_eq!(app.last_error.as_deref(), Some("boom"));

    let stale = Instant::now() - Duration::from_secs(constants().error_dismiss_secs + 1);
    app.error_time = Some(stale);
    app.info_time = Some(stale);
    app.expire_messages();
    assert!(app.last_error.is_none());
    assert!(app.info_message.is_none());
  }

  #[tokio::test]
  async fn drive_video_opens_without_thumbnail_fetch() {
    let mut app = app();
    app.gallery.load(
      vec![Category { id: RowId::new("c1"), name: "Events".into(), sort_order: 0, created_at: None }],
      vec![drive_video("v1", "Events")],
    );
    app.activate_selected();
    app.activate_selected();
    assert!(app.gallery.playing().is_some());
    assert!(app.tasks.thumb_rx.is_none());

    app.close_video(CloseReason::Backdrop);
    assert!(app.gallery.playing().is_none());
  }

  #[tokio::test]
  async fn admin_requires_sign_in() {
    let mut app = app();
    app.enter_admin().await;
    assert_eq!(app.mode, AppMode::Form(FormKind::Login));
    assert!(app.form.is_some());

    app.close_form();
    assert_eq!(app.mode, AppMode::Gallery);
    assert!(app.form.is_none());
  }

  #[tokio::test]
  async fn invalid_form_stays_open_with_error() {
    let mut app = app();
    app.open_form(Form::contact());
    app.submit_form().await;
    assert_eq!(app.mode, AppMode::Form(FormKind::Contact));
    assert!(app.form.is_some());
    assert_eq!(app.last_error.as_deref(), Some("Name is required"));
  }

  #[test]
  fn category_with_videos_is_not_offered_for_deletion() {
    let mut app = app();
    app.admin.categories = vec![Category { id: RowId::new("c1"), name: "Events".into(), sort_order: 0, created_at: None }];
    app.admin.videos = vec![drive_video("v1", "Events")];
    app.switch_tab(AdminTab::Categories);

    app.request_delete();
    assert!(app.pending_delete.is_none());
    assert!(app.last_error.as_deref().is_some_and(|e| e.contains("still has 1 video")));
  }

  #[test]
  fn delete_waits_for_confirmation() {
    let mut app = app();
    app.admin.videos = vec![drive_video("v1", "Events")];
    app.switch_tab(AdminTab::Videos);

    app.request_delete();
    assert_eq!(app.pending_delete.as_ref().map(|p| p.label.as_str()), Some("v1"));
    app.cancel_delete();
    assert!(app.pending_delete.is_none());
    assert!(app.status_message.is_none());
    assert_eq!(app.admin.videos.len(), 1);
  }

  #[tokio::test]
  async fn confirming_delete_of_a_vanished_row_reports_an_error() {
    let mut app = app();
    app.mode = AppMode::Admin;
    app.pending_delete = Some(PendingDelete { tab: AdminTab::Categories, id: RowId::new("gone"), label: "Ghost".into() });

    app.confirm_delete().await;
    assert!(app.pending_delete.is_none());
    assert!(app.info_message.is_none());
    assert!(app.last_error.as_deref().is_some_and(|e| e.contains("no longer exists")));
  }
}
