use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph, Tabs, Wrap},
};

use crate::admin::AdminTab;
use crate::app::{App, AppMode};
use crate::form::Field;
use crate::gallery::Screen;
use crate::graphics::{ThumbnailWidget, fit_thumbnail};
use crate::model::{ContactStatus, videos_in};
use crate::resolver::Embed;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn popup(area: Rect, width: Constraint, height: Constraint) -> Rect {
  let [area] = Layout::vertical([height]).flex(Flex::Center).areas(area);
  let [area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
  area
}

fn panel<'a>(theme: &Theme, title: impl Into<Line<'a>>) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

/// A row with `left` truncated to leave room for a muted `right` column.
fn split_row(theme: &Theme, left: &str, right: &str, width: usize, fg: ratatui::style::Color) -> Line<'static> {
  if right.is_empty() {
    return Line::from(Span::styled(truncate_str(left, width), Style::default().fg(fg)));
  }
  let right_w = right.chars().count();
  let left = truncate_str(left, width.saturating_sub(right_w + 2));
  let gap = width.saturating_sub(left.chars().count() + right_w);
  Line::from(vec![
    Span::styled(left, Style::default().fg(fg)),
    Span::raw(" ".repeat(gap)),
    Span::styled(right.to_string(), Style::default().fg(theme.muted)),
  ])
}

fn striped_items(theme: &Theme, rows: Vec<(String, String)>, selected: Option<usize>, width: usize) -> Vec<ListItem<'static>> {
  rows
    .into_iter()
    .enumerate()
    .map(|(i, (left, right))| {
      let is_selected = Some(i) == selected;
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };
      ListItem::new(split_row(theme, &left, &right, width, fg)).bg(bg)
    })
    .collect()
}

fn highlighted_list<'a>(theme: &Theme, items: Vec<ListItem<'a>>, block: Block<'a>) -> List<'a> {
  List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD))
}

fn message(frame: &mut Frame, theme: &Theme, area: Rect, block: Block, headline: &str, hint: &str) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled(headline.to_string(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(hint.to_string(), Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  app.overlay_area = None;
  match app.base_mode() {
    AppMode::Admin => render_admin(frame, app, main_area),
    AppMode::Gallery | AppMode::Form(_) => render_gallery(frame, app, main_area),
  }
  if app.form.is_some() {
    render_form(frame, app, main_area);
  }
  if app.gallery.playing().is_some() {
    render_overlay(frame, app, main_area);
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let name = if app.company.name.is_empty() { "reel" } else { app.company.name.as_str() };
  let mut spans = vec![Span::styled(format!(" ▶ {} ", name), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if !app.company.tagline.is_empty() {
    spans.push(Span::styled(app.company.tagline.clone(), Style::default().fg(theme.muted)));
  }
  frame.render_widget(Line::from(spans), area);

  let right_text = match app.session.user() {
    Some(user) => format!("{}  v{} ", user.email, env!("CARGO_PKG_VERSION")),
    None => format!("v{} ", env!("CARGO_PKG_VERSION")),
  };
  let width = right_text.chars().count() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(Line::from(Span::styled(right_text, Style::default().fg(theme.muted))), right_area);
}

// --- Gallery ---

fn render_gallery(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let has_showcase = !app.services.is_empty() || !app.testimonials.is_empty();
  let area = if has_showcase && area.width >= 60 {
    let [folders_area, side_area] =
      Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
    render_showcase(frame, app, side_area);
    folders_area
  } else {
    area
  };
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.gallery.list_state.selected();

  let (items, title) = match app.gallery.screen() {
    Screen::Loading => {
      message(frame, theme, area, panel(theme, " Gallery "), "Loading videos…", "Fetching the catalog");
      return;
    }
    Screen::Empty => {
      message(frame, theme, area, panel(theme, " Gallery "), "No videos yet", "Check back soon, or press r to reload");
      return;
    }
    Screen::Folder { category, videos } if videos.is_empty() => {
      let block = panel(theme, format!(" {} ", category.name));
      message(frame, theme, area, block, "This folder is empty", "Esc to go back to all folders");
      return;
    }
    Screen::Folders(folders) => {
      let rows = folders
        .iter()
        .map(|f| {
          let count = if f.count == 1 { "1 video".to_string() } else { format!("{} videos", f.count) };
          (format!("▸ {}", f.category.name), count)
        })
        .collect();
      (striped_items(theme, rows, selected, inner_w), " Gallery ".to_string())
    }
    Screen::Folder { category, videos } => {
      let rows = videos
        .iter()
        .map(|v| {
          let kind = v.reference_id().map_or("no link", |r| r.kind().label());
          (v.title.clone(), kind.to_string())
        })
        .collect();
      (striped_items(theme, rows, selected, inner_w), format!(" Gallery › {} ", category.name))
    }
  };

  let list = highlighted_list(theme, items, panel(theme, title));
  frame.render_stateful_widget(list, area, &mut app.gallery.list_state);
}

/// Active services and testimonials, stacked beside the folders.
fn render_showcase(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let width = area.width.saturating_sub(4) as usize;
  let muted = Style::default().fg(theme.muted);

  let mut sections: Vec<(&str, Vec<Line>)> = Vec::new();
  if !app.services.is_empty() {
    let lines = app
      .services
      .iter()
      .flat_map(|s| {
        let price = s.price.clone().unwrap_or_default();
        [
          split_row(theme, &s.title, &price, width, theme.fg),
          Line::from(Span::styled(truncate_str(&s.description, width), muted)),
        ]
      })
      .collect();
    sections.push((" Services ", lines));
  }
  if !app.testimonials.is_empty() {
    let lines = app
      .testimonials
      .iter()
      .flat_map(|t| {
        let stars = "★".repeat(t.stars() as usize);
        [
          split_row(theme, &t.client_name, &stars, width, theme.fg),
          Line::from(Span::styled(truncate_str(&t.content, width), muted)),
        ]
      })
      .collect();
    sections.push((" Testimonials ", lines));
  }

  let areas = Layout::vertical(vec![Constraint::Fill(1); sections.len()]).split(area);
  for ((title, lines), section_area) in sections.into_iter().zip(areas.iter()) {
    let block = panel(theme, title).padding(Padding::horizontal(1));
    frame.render_widget(Paragraph::new(lines).block(block), *section_area);
  }
}

fn render_overlay(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(playing) = app.gallery.playing() else { return };
  let title = truncate_str(&playing.video.title, area.width.saturating_sub(8) as usize);
  let embed = playing.embed.clone();
  let thumbnail_url = playing.thumbnail_url.clone();

  let popup_area = popup(area, Constraint::Percentage(80), Constraint::Percentage(85));
  app.overlay_area = Some(popup_area);
  frame.render_widget(Clear, popup_area);
  let block = panel(theme, format!(" {} ", title)).padding(Padding::horizontal(1)).style(Style::default().bg(theme.bg));
  let inner = block.inner(popup_area);
  frame.render_widget(block, popup_area);

  let [media_area, info_area] = Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(inner);

  match (&embed, thumbnail_url) {
    (Some(Embed::YouTube { .. }), Some(url)) => render_thumbnail(frame, app, media_area, &url),
    (Some(Embed::DrivePreview { .. }), _) => {
      let text = vec![
        Line::from(Span::styled("Live preview only", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("Drive files have no still thumbnail. Press o to play it.", Style::default().fg(theme.muted))),
      ];
      let [centered] = Layout::vertical([Constraint::Length(2)]).flex(Flex::Center).areas(media_area);
      frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), centered);
    }
    _ => {
      let [centered] = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center).areas(media_area);
      let line = Span::styled("This video has no playable link.", Style::default().fg(theme.error));
      frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), centered);
    }
  }

  let mut lines = Vec::new();
  if let Some(embed) = &embed {
    let width = info_area.width as usize;
    lines.push(Line::from(Span::styled(embed.label(), Style::default().fg(theme.muted))));
    lines.push(Line::from(Span::styled(
      truncate_str(embed.url(), width),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )));
  }
  frame.render_widget(Paragraph::new(lines), info_area);
}

fn render_thumbnail(frame: &mut Frame, app: &mut App, area: Rect, url: &str) {
  let theme = app.theme();
  let Some((ref cached_url, ref image)) = app.thumbs.original else {
    let [centered] = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center).areas(area);
    let line = Span::styled("Loading thumbnail…", Style::default().fg(theme.status));
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), centered);
    return;
  };
  if cached_url != url {
    return;
  }

  let stale = match &app.thumbs.fitted {
    Some((fitted_url, fitted_area, _)) => fitted_url != url || *fitted_area != area,
    None => true,
  };
  if stale {
    let fitted = fit_thumbnail(image, area, app.display_mode);
    app.thumbs.fitted = Some((url.to_string(), area, fitted));
  }
  if let Some((_, _, ref fitted)) = app.thumbs.fitted {
    frame.render_widget(ThumbnailWidget { image: fitted, display_mode: app.display_mode }, area);
  }
}

// --- Admin ---

fn visibility(active: bool) -> &'static str {
  if active { "visible" } else { "hidden" }
}

fn render_admin(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [tabs_area, list_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).areas(area);

  let titles: Vec<String> = AdminTab::ALL.iter().map(|t| format!(" {} ", t.label())).collect();
  let selected_tab = AdminTab::ALL.iter().position(|t| *t == app.admin.tab).unwrap_or(0);
  let tabs = Tabs::new(titles)
    .select(selected_tab)
    .style(Style::default().fg(theme.muted))
    .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .divider("│");
  frame.render_widget(tabs, tabs_area);

  let admin = &app.admin;
  let rows: Vec<(String, String)> = match admin.tab {
    AdminTab::Videos => admin
      .videos
      .iter()
      .map(|v| {
        let reference = v.reference_id().map_or_else(|| "no link".to_string(), |r| format!("{} {}", r.kind().label(), r));
        (v.title.clone(), format!("{}  {}", v.category, reference))
      })
      .collect(),
    AdminTab::Categories => admin
      .categories
      .iter()
      .map(|c| (c.name.clone(), format!("{} videos", videos_in(&admin.videos, &c.name).len())))
      .collect(),
    AdminTab::Contacts => admin
      .contacts
      .iter()
      .map(|c| {
        let marker = if c.status == ContactStatus::New { "●" } else { " " };
        (format!("{} {} <{}>  {}", marker, c.name, c.email, c.message), c.status.label().to_string())
      })
      .collect(),
    AdminTab::Testimonials => admin
      .testimonials
      .iter()
      .map(|t| {
        let stars = "★".repeat(t.stars() as usize);
        let company = t.company.as_deref().map(|c| format!(" ({})", c)).unwrap_or_default();
        (format!("{} {}{}  {}", stars, t.client_name, company, t.content), visibility(t.is_active).to_string())
      })
      .collect(),
    AdminTab::Services => admin
      .services
      .iter()
      .map(|s| {
        let price = s.price.as_deref().map(|p| format!("  {}", p)).unwrap_or_default();
        (format!("{}{}", s.title, price), visibility(s.is_active).to_string())
      })
      .collect(),
  };

  let title = format!(" Admin › {} ({}) ", admin.tab.label(), rows.len());
  if rows.is_empty() {
    message(frame, theme, list_area, panel(theme, title), "Nothing here yet", "r to refresh");
    return;
  }
  let inner_w = list_area.width.saturating_sub(4) as usize;
  let items = striped_items(theme, rows, admin.list_state.selected(), inner_w);
  let list = highlighted_list(theme, items, panel(theme, title));
  frame.render_stateful_widget(list, list_area, &mut app.admin.list_state);
}

// --- Forms ---

fn render_form(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(form) = app.form.as_mut() else { return };

  let height = form.fields.len() as u16 * 3 + 3;
  let popup_area = popup(area, Constraint::Percentage(60), Constraint::Length(height));
  frame.render_widget(Clear, popup_area);
  let block = panel(theme, format!(" {} ", form.kind.title())).style(Style::default().bg(theme.bg));
  let inner = block.inner(popup_area);
  frame.render_widget(block, popup_area);

  let mut constraints = vec![Constraint::Length(3); form.fields.len()];
  constraints.push(Constraint::Length(1));
  let rows = Layout::vertical(constraints).split(inner);

  let focus = form.focus;
  for (i, field) in form.fields.iter_mut().enumerate() {
    render_field(frame, theme, field, rows[i], i == focus);
  }

  let hint = Line::from(vec![
    Span::styled(" Enter ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
    Span::styled(format!(" {} ", form.kind.submit_label()), Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(hint.alignment(Alignment::Right), rows[form.fields.len()]);
}

fn render_field(frame: &mut Frame, theme: &Theme, field: &mut Field, area: Rect, focused: bool) {
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(format!(" {} ", field.label))
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let shown = field.display();
  let inner_w = (area.width.saturating_sub(4) as usize).max(1);
  let cursor_col = display_width(&shown, field.cursor);
  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = shown
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= field.scroll)
    .take_while(|(start, _, _)| *start < field.scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block), area);
  if focused {
    let cursor_x = area.x + 2 + (cursor_col - field.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

// --- Status and footer ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ✓ {}", info), Style::default().fg(theme.info))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style).wrap(Wrap { trim: true }), area);
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  if app.gallery.playing().is_some() {
    return vec![("o", "Open in browser"), ("x", "Close"), ("Esc", "Close")];
  }
  match app.mode {
    AppMode::Form(_) => vec![("Enter", "Next/Submit"), ("Tab", "Next field"), ("Esc", "Cancel")],
    AppMode::Admin if app.pending_delete.is_some() => vec![("y", "Delete"), ("any", "Cancel")],
    AppMode::Admin => {
      let mut k = vec![("←/→", "Tab"), ("j/k", "Navigate")];
      match app.admin.tab {
        AdminTab::Videos => k.extend([("n", "New"), ("d", "Delete"), ("p", "Preview")]),
        AdminTab::Categories => k.extend([("n", "New"), ("d", "Delete")]),
        AdminTab::Contacts => k.push(("Space", "Read/unread")),
        AdminTab::Testimonials | AdminTab::Services => k.push(("Space", "Show/hide")),
      }
      k.extend([("r", "Refresh"), ("L", "Log out"), ("Tab", "Gallery")]);
      k
    }
    AppMode::Gallery => {
      let mut k = vec![("Enter", "Open"), ("j/k", "Navigate")];
      if matches!(app.gallery.screen(), Screen::Folder { .. }) {
        k.push(("Esc", "Back"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k.extend([("c", "Contact"), ("Tab", "Admin"), ("^t", "Theme")]);
      k
    }
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();
  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
