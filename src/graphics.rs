use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// Scale a poster to fit inside `cols` x `rows` cells, keeping its aspect ratio.
///
/// Cells are roughly twice as tall as they are wide. Half-block rendering packs
/// two pixel rows per cell; ASCII gets one pixel per cell, so its height is halved.
pub fn fit_poster(image: &DynamicImage, cols: u16, rows: u16, mode: DisplayMode) -> DynamicImage {
  let fitted = image.resize(u32::from(cols).max(1), (u32::from(rows) * 2).max(1), FilterType::Triangle);
  match mode {
    DisplayMode::Ascii => {
      fitted.resize_exact(fitted.width(), (fitted.height() / 2).max(1), FilterType::Triangle)
    }
    DisplayMode::Direct | DisplayMode::Off => fitted,
  }
}

/// Draws an already-fitted poster centred in its area.
pub struct PosterWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

/// Top-left corner that centres a `w` x `h` cell block inside `area`.
fn centred_origin(area: Rect, w: u32, h: u32) -> (u16, u16) {
  let dx = u32::from(area.width).saturating_sub(w) / 2;
  let dy = u32::from(area.height).saturating_sub(h) / 2;
  (area.x.saturating_add(dx as u16), area.y.saturating_add(dy as u16))
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let cols = rgb.width().min(u32::from(area.width));
  let rows = rgb.height().div_ceil(2).min(u32::from(area.height));
  let (x0, y0) = centred_origin(area, cols, rows);

  for row in 0..rows {
    for col in 0..cols {
      let top = rgb.get_pixel(col, row * 2);
      let bottom = if row * 2 + 1 < rgb.height() {
        let p = rgb.get_pixel(col, row * 2 + 1);
        Color::Rgb(p[0], p[1], p[2])
      } else {
        Color::Reset
      };
      buf.set_string(
        x0 + col as u16,
        y0 + row as u16,
        "▀",
        Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bottom),
      );
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let cols = luma.width().min(u32::from(area.width));
  let rows = luma.height().min(u32::from(area.height));
  let (x0, y0) = centred_origin(area, cols, rows);
  let last = ASCII_RAMP.len() - 1;

  for row in 0..rows {
    for col in 0..cols {
      let level = f32::from(luma.get_pixel(col, row)[0]) / 255.0;
      let idx = ((level * last as f32).round() as usize).min(last);
      buf.set_string(x0 + col as u16, y0 + row as u16, ASCII_RAMP[idx], Style::default());
    }
  }
}
