use ratatui::crossterm::event::{self, KeyCode, KeyModifiers, MouseButton, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{App, AppMode};
use crate::form::Form;
use crate::gallery::CloseReason;

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  // The overlay captures input until it is closed.
  if app.gallery.playing().is_some() {
    handle_overlay_key(app, key);
    return;
  }

  match app.mode {
    AppMode::Gallery => handle_gallery_key(app, key).await,
    AppMode::Admin => handle_admin_key(app, key).await,
    AppMode::Form(_) => handle_form_key(app, key).await,
  }
}

/// A left click outside the playback overlay dismisses it. Other mouse input is ignored.
pub fn handle_mouse_event(app: &mut App, mouse: event::MouseEvent) {
  if mouse.kind != MouseEventKind::Down(MouseButton::Left) || app.gallery.playing().is_none() {
    return;
  }
  let Some(area) = app.overlay_area else { return };
  if !area.contains(Position::new(mouse.column, mouse.row)) {
    app.close_video(CloseReason::Backdrop);
  }
}

fn handle_overlay_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Esc => app.close_video(CloseReason::Escape),
    KeyCode::Char('q') | KeyCode::Char('x') => app.close_video(CloseReason::Button),
    KeyCode::Char('o') => app.open_in_browser(),
    _ => {}
  }
}

async fn handle_gallery_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.activate_selected(),
    KeyCode::Down | KeyCode::Char('j') => app.gallery.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.gallery.select_previous(),
    KeyCode::Esc | KeyCode::Backspace => {
      if !app.gallery.escape() && key.code == KeyCode::Esc {
        app.should_quit = true;
      }
    }
    KeyCode::Char('q') => app.should_quit = true,
    KeyCode::Char('c') => app.open_form(Form::contact()),
    KeyCode::Char('r') => app.trigger_site_load(),
    KeyCode::Tab => app.enter_admin().await,
    _ => {}
  }
}

async fn handle_admin_key(app: &mut App, key: event::KeyEvent) {
  if app.pending_delete.is_some() {
    if key.code == KeyCode::Char('y') {
      app.confirm_delete().await;
    } else {
      app.cancel_delete();
    }
    return;
  }

  app.clear_error();
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => app.switch_tab(app.admin.tab.previous()),
    KeyCode::Right | KeyCode::Char('l') => app.switch_tab(app.admin.tab.next()),
    KeyCode::Down | KeyCode::Char('j') => app.admin.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.admin.select_previous(),
    KeyCode::Char('n') => app.start_create(),
    KeyCode::Char('d') => app.request_delete(),
    KeyCode::Char(' ') => app.toggle_selected().await,
    KeyCode::Char('p') | KeyCode::Enter => app.preview_selected(),
    KeyCode::Char('r') => app.refresh_admin().await,
    KeyCode::Char('L') => app.logout(),
    KeyCode::Tab | KeyCode::Esc => app.leave_admin(),
    _ => {}
  }
}

async fn handle_form_key(app: &mut App, key: event::KeyEvent) {
  if app.form.is_none() {
    app.close_form();
    return;
  }
  let Some(form) = app.form.as_mut() else { return };
  match key.code {
    KeyCode::Esc => app.close_form(),
    KeyCode::Enter => {
      if form.is_last_field() {
        app.submit_form().await;
      } else {
        form.focus_next();
      }
    }
    KeyCode::Tab | KeyCode::Down => form.focus_next(),
    KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
    KeyCode::Char(c) => form.focused().insert(c),
    KeyCode::Backspace => form.focused().backspace(),
    KeyCode::Delete => form.focused().delete(),
    KeyCode::Left => form.focused().left(),
    KeyCode::Right => form.focused().right(),
    KeyCode::Home => form.focused().home(),
    KeyCode::End => form.focused().end(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BackendSettings, Config};
  use crate::display::DisplayMode;
  use crate::form::FormKind;
  use crate::gallery::View;
  use crate::model::{Category, RowId, VideoRecord};
  use crate::rest::RestBackend;
  use crate::session::Session;
  use ratatui::crossterm::event::{KeyEvent, MouseEvent};
  use ratatui::{Terminal, backend::TestBackend};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app_with_folder() -> App {
    let backend =
      RestBackend::new(&BackendSettings { url: "http://127.0.0.1:9".into(), api_key: "anon".into() }).unwrap();
    let mut app = App::new(backend, Session::ephemeral(), Config::default(), DisplayMode::Ascii);
    app.gallery.load(
      vec![
        Category { id: RowId::new("c1"), name: "Events".into(), sort_order: 0, created_at: None },
        Category { id: RowId::new("c2"), name: "Empty".into(), sort_order: 1, created_at: None },
      ],
      vec![VideoRecord {
        id: RowId::new("v1"),
        title: "Gala".into(),
        category: "Events".into(),
        video_url: "https://drive.google.com/open?id=1aBcDeFgHiJkLmNoPqRs".into(),
        video_id: None,
        sort_order: 0,
        created_at: None,
      }],
    );
    app
  }

  #[tokio::test]
  async fn overlay_closes_back_to_folder() {
    let mut app = app_with_folder();
    handle_key_event(&mut app, key(KeyCode::Enter)).await;
    handle_key_event(&mut app, key(KeyCode::Enter)).await;
    assert!(app.gallery.playing().is_some());

    // Navigation keys are swallowed by the overlay.
    handle_key_event(&mut app, key(KeyCode::Char('j'))).await;
    handle_key_event(&mut app, key(KeyCode::Char('x'))).await;
    assert!(app.gallery.playing().is_none());
    assert!(matches!(app.gallery.view(), View::ViewingCategory { category } if category.name == "Events"));

    handle_key_event(&mut app, key(KeyCode::Esc)).await;
    assert_eq!(app.gallery.view(), &View::Browsing);
    assert!(!app.should_quit);
    handle_key_event(&mut app, key(KeyCode::Esc)).await;
    assert!(app.should_quit);
  }

  fn click(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
  }

  #[tokio::test]
  async fn clicking_the_backdrop_closes_the_overlay() {
    let mut app = app_with_folder();
    handle_key_event(&mut app, key(KeyCode::Enter)).await;
    handle_key_event(&mut app, key(KeyCode::Enter)).await;
    let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
    terminal.draw(|frame| crate::ui::ui(frame, &mut app)).unwrap();
    let area = app.overlay_area.unwrap();

    // Inside the modal, or not a left press: nothing happens.
    handle_mouse_event(&mut app, click(MouseEventKind::Down(MouseButton::Left), area.x + 1, area.y + 1));
    handle_mouse_event(&mut app, click(MouseEventKind::Down(MouseButton::Right), 0, 5));
    handle_mouse_event(&mut app, click(MouseEventKind::Moved, 0, 5));
    assert!(app.gallery.playing().is_some());

    handle_mouse_event(&mut app, click(MouseEventKind::Down(MouseButton::Left), 0, 5));
    assert!(app.gallery.playing().is_none());
    assert!(matches!(app.gallery.view(), View::ViewingCategory { category } if category.name == "Events"));
  }

  #[tokio::test]
  async fn clicks_without_an_overlay_are_ignored() {
    let mut app = app_with_folder();
    handle_mouse_event(&mut app, click(MouseEventKind::Down(MouseButton::Left), 0, 5));
    assert_eq!(app.gallery.view(), &View::Browsing);
    assert!(!app.should_quit);
  }

  #[tokio::test]
  async fn backspace_never_quits() {
    let mut app = app_with_folder();
    handle_key_event(&mut app, key(KeyCode::Backspace)).await;
    assert!(!app.should_quit);
  }

  #[tokio::test]
  async fn contact_form_edits_and_cancels() {
    let mut app = app_with_folder();
    handle_key_event(&mut app, key(KeyCode::Char('c'))).await;
    assert_eq!(app.mode, AppMode::Form(FormKind::Contact));

    for c in "Ana".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c))).await;
    }
    handle_key_event(&mut app, key(KeyCode::Enter)).await;
    assert_eq!(app.form.as_ref().map(|f| f.focus), Some(1));
    assert_eq!(app.form.as_ref().map(|f| f.value("Name")), Some("Ana"));

    handle_key_event(&mut app, key(KeyCode::Esc)).await;
    assert_eq!(app.mode, AppMode::Gallery);
    assert!(app.form.is_none());
  }

  #[tokio::test]
  async fn ctrl_c_quits_from_anywhere() {
    let mut app = app_with_folder();
    app.open_form(Form::category());
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).await;
    assert!(app.should_quit);
  }
}
