use anyhow::{Context, Result, bail};
use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use reqwest::Client;
use tracing::debug;

use crate::display::DisplayMode;

// --- Thumbnail Widget ---

/// Draws an already fitted image (see [`fit_thumbnail`]) centered in its area.
pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
    }
  }
}

/// Cell position for image column `x`, row `y` when a `w`×`h` cell image is centered in `area`.
fn cell(area: Rect, w: u32, h: u32, x: u32, y: u32) -> (u16, u16) {
  let offset_x = u32::from(area.width).saturating_sub(w) / 2;
  let offset_y = u32::from(area.height).saturating_sub(h) / 2;
  let col = u16::try_from(offset_x + x).unwrap_or(u16::MAX);
  let row = u16::try_from(offset_y + y).unwrap_or(u16::MAX);
  (area.x.saturating_add(col), area.y.saturating_add(row))
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(u32::from(area.width));
  let img_h = rgb.height();
  let rows = img_h.div_ceil(2).min(u32::from(area.height));

  for y in 0..rows {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let bg = if y * 2 + 1 < img_h {
        let lower = rgb.get_pixel(x, y * 2 + 1);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (col, row) = cell(area, img_w, rows, x, y);
      buf.set_string(col, row, "▀", Style::default().fg(Color::Rgb(upper[0], upper[1], upper[2])).bg(bg));
    }
  }
}

fn ascii_glyph(luma: u8) -> &'static str {
  let idx = (f32::from(luma) / 255.0 * (ASCII_RAMP.len() - 1) as f32).round() as usize;
  ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)]
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(u32::from(area.width));
  let img_h = luma.height().min(u32::from(area.height));

  for y in 0..img_h {
    for x in 0..img_w {
      let (col, row) = cell(area, img_w, img_h, x, y);
      buf.set_string(col, row, ascii_glyph(luma.get_pixel(x, y)[0]), Style::default());
    }
  }
}

/// Resize `image` to a 16:9 frame that fills `area`.
///
/// Half-blocks pack two pixel rows per cell, ASCII one. Cells are roughly twice as tall as wide.
pub fn fit_thumbnail(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let width = u32::from(area.width).max(1);
  let rows_per_cell = match mode {
    DisplayMode::Direct => 2,
    DisplayMode::Ascii => 1,
  };
  let height = (width * 9 / 32 * rows_per_cell).clamp(1, u32::from(area.height).max(1) * rows_per_cell);
  image.resize_to_fill(width, height, FilterType::Triangle)
}

/// Download and decode a thumbnail.
pub async fn fetch_thumbnail(client: &Client, url: &str) -> Result<DynamicImage> {
  debug!(url = %url, "thumbnail: fetching");
  let response = client.get(url).send().await.with_context(|| format!("Failed to fetch thumbnail {}", url))?;
  if !response.status().is_success() {
    bail!("Thumbnail request failed ({}): {}", response.status(), url);
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read thumbnail bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode thumbnail (URL: {})", url))
}
