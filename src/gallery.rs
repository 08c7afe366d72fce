use ratatui::widgets::ListState;
use tracing::{debug, info};

use crate::model::{Category, VideoRecord, sort_by_position, videos_in};
use crate::resolver::{Embed, ReferenceId, embed_for, resolve_thumbnail};

/// Folder navigation underneath the playback overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
  Browsing,
  ViewingCategory { category: Category },
}

/// Ways of dismissing the playback overlay. All of them behave the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
  Button,
  Backdrop,
  Escape,
}

/// The video shown in the modal overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
  pub video: VideoRecord,
  pub reference: Option<ReferenceId>,
  /// `None` when the record carries no resolvable reference.
  pub embed: Option<Embed>,
  pub thumbnail_url: Option<String>,
}

impl Playback {
  fn new(video: VideoRecord) -> Self {
    let reference = video.reference_id();
    let embed = reference.as_ref().map(embed_for);
    let thumbnail_url = reference.as_ref().and_then(resolve_thumbnail);
    Self { video, reference, embed, thumbnail_url }
  }
}

/// A category with the number of videos filed under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Folder<'a> {
  pub category: &'a Category,
  pub count: usize,
}

/// What the gallery should draw for the current view.
#[derive(Debug, PartialEq)]
pub enum Screen<'a> {
  Loading,
  /// Nothing to show. A valid state, not an error.
  Empty,
  Folders(Vec<Folder<'a>>),
  /// An open folder. `videos` may be empty.
  Folder { category: &'a Category, videos: Vec<&'a VideoRecord> },
}

pub struct Gallery {
  categories: Vec<Category>,
  videos: Vec<VideoRecord>,
  loading: bool,
  view: View,
  playing: Option<Playback>,
  pub list_state: ListState,
  /// Folder selection to restore when leaving a category.
  folder_cursor: usize,
}

impl Default for Gallery {
  fn default() -> Self {
    Self::new()
  }
}

impl Gallery {
  pub fn new() -> Self {
    Self {
      categories: Vec::new(),
      videos: Vec::new(),
      loading: false,
      view: View::Browsing,
      playing: None,
      list_state: ListState::default(),
      folder_cursor: 0,
    }
  }

  pub fn set_loading(&mut self) {
    self.loading = true;
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// A failed fetch keeps whatever was loaded before.
  pub fn stop_loading(&mut self) {
    self.loading = false;
  }

  /// Replace the fetched lists. Navigation state is kept.
  pub fn load(&mut self, mut categories: Vec<Category>, mut videos: Vec<VideoRecord>) {
    sort_by_position(&mut categories);
    sort_by_position(&mut videos);
    debug!(categories = categories.len(), videos = videos.len(), "gallery: lists loaded");
    self.categories = categories;
    self.videos = videos;
    self.loading = false;
    self.clamp_selection();
  }

  #[cfg(test)]
  pub fn categories(&self) -> &[Category] {
    &self.categories
  }

  #[cfg(test)]
  pub fn videos(&self) -> &[VideoRecord] {
    &self.videos
  }

  #[cfg(test)]
  pub fn view(&self) -> &View {
    &self.view
  }

  pub fn playing(&self) -> Option<&Playback> {
    self.playing.as_ref()
  }

  pub fn screen(&self) -> Screen<'_> {
    match &self.view {
      View::Browsing if self.loading => Screen::Loading,
      View::Browsing if self.categories.is_empty() => Screen::Empty,
      View::Browsing => Screen::Folders(
        self
          .categories
          .iter()
          .map(|category| Folder { category, count: videos_in(&self.videos, &category.name).len() })
          .collect(),
      ),
      View::ViewingCategory { category } => Screen::Folder { category, videos: videos_in(&self.videos, &category.name) },
    }
  }

  /// Number of selectable rows in the current view.
  pub fn len(&self) -> usize {
    match &self.view {
      View::Browsing => self.categories.len(),
      View::ViewingCategory { category } => videos_in(&self.videos, &category.name).len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  // --- Transitions ---

  /// Browsing -> ViewingCategory.
  pub fn select_category(&mut self, index: usize) -> bool {
    let Some(category) = self.categories.get(index).cloned() else { return false };
    info!(category = %category.name, "gallery: open folder");
    self.folder_cursor = index;
    self.view = View::ViewingCategory { category };
    self.list_state.select(if self.is_empty() { None } else { Some(0) });
    true
  }

  /// ViewingCategory -> Browsing.
  pub fn back(&mut self) -> bool {
    if self.view == View::Browsing {
      return false;
    }
    debug!("gallery: back to folders");
    self.view = View::Browsing;
    self.list_state.select(if self.categories.is_empty() { None } else { Some(self.folder_cursor) });
    self.clamp_selection();
    true
  }

  /// (any) -> PlayingVideo. The current view stays underneath the overlay.
  pub fn open_video(&mut self, video: VideoRecord) {
    let playback = Playback::new(video);
    info!(
      title = %playback.video.title,
      reference = playback.reference.as_ref().map(|r| r.as_str()).unwrap_or("-"),
      "gallery: open video"
    );
    self.playing = Some(playback);
  }

  /// PlayingVideo -> previous view.
  pub fn close_video(&mut self, reason: CloseReason) -> bool {
    let closed = self.playing.take().is_some();
    if closed {
      debug!(?reason, "gallery: close video");
    }
    closed
  }

  /// Escape key: dismiss the overlay first, otherwise leave the folder.
  pub fn escape(&mut self) -> bool {
    self.close_video(CloseReason::Escape) || self.back()
  }

  /// Enter on the selected row: open the folder or play the video.
  pub fn activate_selected(&mut self) {
    let Some(selected) = self.list_state.selected() else { return };
    match &self.view {
      View::Browsing => {
        self.select_category(selected);
      }
      View::ViewingCategory { category } => {
        let video = videos_in(&self.videos, &category.name).get(selected).map(|v| (*v).clone());
        if let Some(video) = video {
          self.open_video(video);
        }
      }
    }
  }

  /// Leaving the gallery drops the selected category and any open video.
  pub fn reset(&mut self) {
    self.view = View::Browsing;
    self.playing = None;
    self.folder_cursor = 0;
    self.list_state.select(if self.categories.is_empty() { None } else { Some(0) });
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
