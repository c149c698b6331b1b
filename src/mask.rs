// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/mask.rs - 实例掩码
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

use image::{GrayImage, ImageBuffer, Luma};

/// 模型输出的软掩码，取值一般在 [0, 1]
pub type SoftMask = ImageBuffer<Luma<f32>, Vec<f32>>;

pub const MASK_THRESHOLD: f32 = 0.5;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// 二值掩码，前景像素为 255，背景为 0
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
  pixels: GrayImage,
}

impl BinaryMask {
  /// 严格大于阈值的像素视为前景
  pub fn threshold(mask: &SoftMask, threshold: f32) -> Self {
    let pixels = ImageBuffer::from_fn(mask.width(), mask.height(), |x, y| {
      if mask.get_pixel(x, y)[0] > threshold {
        Luma([FOREGROUND])
      } else {
        Luma([BACKGROUND])
      }
    });
    Self { pixels }
  }

  pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
    let pixels = ImageBuffer::from_fn(width, height, |x, y| {
      Luma([if f(x, y) { FOREGROUND } else { BACKGROUND }])
    });
    Self { pixels }
  }

  pub fn width(&self) -> u32 {
    self.pixels.width()
  }

  pub fn height(&self) -> u32 {
    self.pixels.height()
  }

  pub fn dimensions(&self) -> (u32, u32) {
    self.pixels.dimensions()
  }

  pub fn contains(&self, x: u32, y: u32) -> bool {
    self.pixels.get_pixel(x, y)[0] == FOREGROUND
  }

  /// 最近邻缩放，保留硬边缘。
  ///
  /// 目标像素 `d` 取源像素 `min(floor(d * src / dst), src - 1)`。
  /// 尺寸相同时直接复制。
  pub fn resize_nearest(&self, width: u32, height: u32) -> Self {
    let (src_w, src_h) = self.dimensions();
    if (src_w, src_h) == (width, height) {
      return self.clone();
    }
    if src_w == 0 || src_h == 0 {
      return Self {
        pixels: GrayImage::new(width, height),
      };
    }

    let map = |d: u32, src: u32, dst: u32| -> u32 {
      let s = (d as u64 * src as u64 / dst as u64) as u32;
      s.min(src - 1)
    };

    let xs: Vec<u32> = (0..width).map(|x| map(x, src_w, width)).collect();
    let ys: Vec<u32> = (0..height).map(|y| map(y, src_h, height)).collect();

    let pixels = ImageBuffer::from_fn(width, height, |x, y| {
      *self.pixels.get_pixel(xs[x as usize], ys[y as usize])
    });
    Self { pixels }
  }

  /// 前景像素数量
  pub fn area(&self) -> u64 {
    self
      .pixels
      .pixels()
      .filter(|p| p[0] == FOREGROUND)
      .count() as u64
  }

  /// 一阶矩质心，截断为整数像素坐标；空掩码返回 `None`
  pub fn centroid(&self) -> Option<(i32, i32)> {
    let (mut m00, mut m10, mut m01) = (0u64, 0u64, 0u64);
    for (x, y, p) in self.pixels.enumerate_pixels() {
      if p[0] == FOREGROUND {
        m00 += 1;
        m10 += x as u64;
        m01 += y as u64;
      }
    }
    if m00 == 0 {
      return None;
    }
    let cx = (m10 as f64 / m00 as f64) as i32;
    let cy = (m01 as f64 / m00 as f64) as i32;
    Some((cx, cy))
  }

  pub fn as_gray_image(&self) -> &GrayImage {
    &self.pixels
  }
}
