// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/annotate/overlay.rs - 掩码颜色叠加
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

use image::{Rgb, RgbImage};

use crate::mask::BinaryMask;

/// 叠加层权重，原图权重固定为 1.0，不做归一化
pub const OVERLAY_ALPHA: f32 = 0.6;

// out = saturate(round(base + overlay * alpha))
fn blend_channel(base: u8, overlay: u8, alpha: f32) -> u8 {
  (base as f32 + overlay as f32 * alpha).round().min(255.0) as u8
}

/// 前景像素叠加类别颜色，背景像素保持不变。
/// 掩码尺寸必须与图像一致。
pub fn blend_mask(image: &mut RgbImage, mask: &BinaryMask, color: Rgb<u8>, alpha: f32) {
  debug_assert_eq!(image.dimensions(), mask.dimensions());
  for (x, y, pixel) in image.enumerate_pixels_mut() {
    if mask.contains(x, y) {
      for c in 0..3 {
        pixel[c] = blend_channel(pixel[c], color[c], alpha);
      }
    }
  }
}
