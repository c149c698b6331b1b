// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/annotate/label.rs - 标签位置、引线与文字
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::f32::consts::FRAC_PI_4;

use ab_glyph::{FontArc, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size},
  rect::Rect,
};
use serde::{Deserialize, Serialize};

// 标签相对质心的偏移：右上方
pub const LABEL_OFFSET_X: i32 = 60;
pub const LABEL_OFFSET_Y: i32 = -40;
pub const LABEL_RIGHT_MARGIN: i32 = 10;
pub const LABEL_MIN_Y: i32 = 20;

const LABEL_PADDING_X: i32 = 5;
const LABEL_PADDING_Y: i32 = 8;
const LEADER_THICKNESS: u32 = 2;
const LEADER_TIP_RATIO: f32 = 0.2;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 18.0;
const LABEL_HIGHLIGHT_COLOR: [u8; 3] = [200, 255, 255]; // 浅青色
const LABEL_TEXT_COLOR: [u8; 3] = [0, 0, 0];

// DejaVu Sans，许可见 assets/LICENSE-font.txt
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

/// 内置字体，未配置字体文件时使用
pub fn default_font() -> Result<FontArc, InvalidFont> {
  FontArc::try_from_slice(BUNDLED_FONT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
  pub font_size: f32,
  pub highlight: [u8; 3],
  pub text_color: [u8; 3],
}

impl Default for LabelStyle {
  fn default() -> Self {
    Self {
      font_size: LABEL_FONT_SIZE,
      highlight: LABEL_HIGHLIGHT_COLOR,
      text_color: LABEL_TEXT_COLOR,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
  pub text: String,
  pub centroid: (i32, i32),
  pub anchor: (i32, i32),
}

impl LabelPlacement {
  pub fn new(text: String, centroid: (i32, i32), image_width: u32) -> Self {
    Self {
      text,
      centroid,
      anchor: label_anchor(centroid, image_width),
    }
  }
}

pub fn label_text(name: &str, confidence: f32) -> String {
  format!("{} ({:.2})", name, confidence)
}

/// 质心加固定偏移后夹紧到画布内：x 不超过 `宽度 - 10`，y 不小于 20。
/// 密集实例的标签仍可能互相重叠。
pub fn label_anchor(centroid: (i32, i32), image_width: u32) -> (i32, i32) {
  let (cx, cy) = centroid;
  let x = (cx + LABEL_OFFSET_X).min(image_width as i32 - LABEL_RIGHT_MARGIN);
  let y = (cy + LABEL_OFFSET_Y).max(LABEL_MIN_Y);
  (x, y)
}

fn draw_thick_line(
  image: &mut RgbImage,
  start: (f32, f32),
  end: (f32, f32),
  color: Rgb<u8>,
  thickness: u32,
) {
  // 沿次要方向平移叠画
  let horizontal = (end.0 - start.0).abs() >= (end.1 - start.1).abs();
  for t in 0..thickness {
    let o = t as f32;
    let (dx, dy) = if horizontal { (0.0, o) } else { (o, 0.0) };
    draw_line_segment_mut(
      image,
      (start.0 + dx, start.1 + dy),
      (end.0 + dx, end.1 + dy),
      color,
    );
  }
}

/// 从标签锚点指向质心的箭头，箭头长度为线长的 20%
pub(super) fn draw_leader(image: &mut RgbImage, placement: &LabelPlacement, color: Rgb<u8>) {
  let from = (placement.anchor.0 as f32, placement.anchor.1 as f32);
  let to = (placement.centroid.0 as f32, placement.centroid.1 as f32);
  draw_thick_line(image, from, to, color, LEADER_THICKNESS);

  let length = ((from.0 - to.0).powi(2) + (from.1 - to.1).powi(2)).sqrt();
  if length == 0.0 {
    return;
  }
  let tip = length * LEADER_TIP_RATIO;
  let angle = (from.1 - to.1).atan2(from.0 - to.0);
  for side in [FRAC_PI_4, -FRAC_PI_4] {
    let wing = (
      to.0 + tip * (angle + side).cos(),
      to.1 + tip * (angle + side).sin(),
    );
    draw_thick_line(image, wing, to, color, LEADER_THICKNESS);
  }
}

fn measure(text: &str, style: &LabelStyle, font: &FontArc) -> (u32, u32) {
  text_size(PxScale::from(style.font_size), font, text)
}

/// 浅色底框加黑色文字，文字底边落在锚点上
pub(super) fn draw_label(
  image: &mut RgbImage,
  placement: &LabelPlacement,
  style: &LabelStyle,
  font: &FontArc,
) {
  let (text_w, text_h) = measure(&placement.text, style, font);
  let (x, y) = placement.anchor;

  let rect = Rect::at(x - LABEL_PADDING_X, y - text_h as i32 - LABEL_PADDING_Y).of_size(
    text_w + 2 * LABEL_PADDING_X as u32 + 1,
    text_h + 2 * LABEL_PADDING_Y as u32 + 1,
  );
  draw_filled_rect_mut(image, rect, Rgb(style.highlight));

  draw_text_mut(
    image,
    Rgb(style.text_color),
    x,
    y - text_h as i32,
    PxScale::from(style.font_size),
    font,
    &placement.text,
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn label_text_rounds_to_two_places() {
    assert_eq!(label_text("forniceal", 0.87), "forniceal (0.87)");
    assert_eq!(label_text("palpebral", 0.4567), "palpebral (0.46)");
  }

  #[test]
  fn anchor_is_offset_up_and_right() {
    assert_eq!(label_anchor((200, 150), 400), (260, 110));
  }

  #[test]
  fn anchor_is_clamped_to_canvas() {
    assert_eq!(label_anchor((395, 5), 400), (390, 20));
    assert_eq!(label_anchor((0, 0), 30), (20, 20));
    for cx in (0..400).step_by(17) {
      for cy in (0..300).step_by(13) {
        let (x, y) = label_anchor((cx, cy), 400);
        assert!(x <= 390);
        assert!(y >= 20);
      }
    }
  }

  #[test]
  fn bundled_font_loads() {
    let font = default_font().unwrap();
    let (w, h) = measure("forniceal (0.87)", &LabelStyle::default(), &font);
    assert!(w > 0 && h > 0);
  }

  #[test]
  fn label_background_covers_padded_text_box() {
    let mut image = RgbImage::new(200, 100);
    let placement = LabelPlacement::new("ab".into(), (50, 90), 200);
    let style = LabelStyle::default();
    let font = default_font().unwrap();
    draw_label(&mut image, &placement, &style, &font);

    let (w, h) = measure("ab", &style, &font);
    let (x, y) = placement.anchor;
    let highlight = Rgb(style.highlight);
    assert_eq!(*image.get_pixel((x - 5) as u32, (y + 8) as u32), highlight);
    assert_eq!(
      *image.get_pixel((x + w as i32 + 5) as u32, (y - h as i32 - 8) as u32),
      highlight
    );
    assert_eq!(*image.get_pixel((x - 6) as u32, y as u32), Rgb([0, 0, 0]));
    assert_eq!(*image.get_pixel(x as u32, (y + 9) as u32), Rgb([0, 0, 0]));
  }

  #[test]
  fn label_text_is_drawn_in_text_color() {
    let style = LabelStyle::default();
    let font = default_font().unwrap();
    let placement = LabelPlacement::new("forniceal (0.87)".into(), (60, 100), 300);
    let mut image = RgbImage::from_pixel(300, 120, Rgb([255, 255, 255]));
    draw_label(&mut image, &placement, &style, &font);

    let (w, h) = measure(&placement.text, &style, &font);
    let (x, y) = placement.anchor;
    let dark = (x..x + w as i32)
      .flat_map(|px| (y - h as i32..=y).map(move |py| (px, py)))
      .filter(|&(px, py)| {
        let p = image.get_pixel(px as u32, py as u32);
        p.0.iter().all(|&c| c < 100)
      })
      .count();
    assert!(dark > 20, "dark pixels: {}", dark);

    // 底框以外没有文字
    assert_eq!(*image.get_pixel(0, 0), Rgb([255, 255, 255]));
  }

  #[test]
  fn leader_reaches_centroid() {
    let mut image = RgbImage::new(100, 100);
    let placement = LabelPlacement::new("x".into(), (20, 70), 100);
    let color = Rgb([0, 100, 0]);
    draw_leader(&mut image, &placement, color);
    assert_eq!(*image.get_pixel(20, 70), color);
    assert_eq!(*image.get_pixel(80, 30), color);
  }

  #[test]
  fn leader_of_zero_length_is_a_dot() {
    let mut image = RgbImage::new(40, 40);
    let placement = LabelPlacement {
      text: "x".into(),
      centroid: (30, 20),
      anchor: (30, 20),
    };
    draw_leader(&mut image, &placement, Rgb([1, 2, 3]));
    assert_eq!(*image.get_pixel(30, 20), Rgb([1, 2, 3]));
  }
}
