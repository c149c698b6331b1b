// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/frame.rs - 图像帧定义
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

use std::path::Path;

use image::RgbImage;

/// 已解码的 RGB 图像及其来源文件名
#[derive(Debug, Clone)]
pub struct ImageFrame {
  name: String,
  image: RgbImage,
}

impl ImageFrame {
  pub fn new(name: impl Into<String>, image: RgbImage) -> Self {
    Self {
      name: name.into(),
      image,
    }
  }

  /// 以路径的文件名部分命名
  pub fn from_path(path: &Path, image: RgbImage) -> Self {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "image.png".to_string());
    Self::new(name, image)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// 不含扩展名的文件名
  pub fn stem(&self) -> &str {
    Path::new(&self.name)
      .file_stem()
      .and_then(|s| s.to_str())
      .unwrap_or(&self.name)
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }
}
