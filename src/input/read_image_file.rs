// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::{
  collections::VecDeque,
  path::{Path, PathBuf},
};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::ImageFrame, url_to_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Input path not found: {0}")]
  NotFound(String),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error ({0}): {1}")]
  ImageLoadError(String, image::ImageError),
  #[error("Invalid path encoding: {0}")]
  PathDecodeError(#[from] std::string::FromUtf8Error),
}

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff"];

fn is_image_file(path: &Path) -> bool {
  path.is_file()
    && path
      .extension()
      .and_then(|e| e.to_str())
      .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
      .unwrap_or(false)
}

/// 单个图像文件，或目录下的全部图像（按文件名排序）。
/// 图像在迭代时才解码，解码失败作为单项错误返回。
pub struct ImageFileInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }
    Self::open(&url_to_path(url)?)
  }
}

impl ImageFileInput {
  pub fn open(path: &Path) -> Result<Self, ImageFileInputError> {
    let pending: VecDeque<PathBuf> = if path.is_dir() {
      let mut files = std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
      files.retain(|p| is_image_file(p));
      files.sort();
      debug!("目录 {} 中共有 {} 张图像", path.display(), files.len());
      files.into()
    } else if path.is_file() {
      VecDeque::from([path.to_path_buf()])
    } else {
      return Err(ImageFileInputError::NotFound(path.display().to_string()));
    };

    Ok(ImageFileInput { pending })
  }

  pub fn remaining(&self) -> usize {
    self.pending.len()
  }

  fn read(path: &Path) -> Result<ImageFrame, ImageFileInputError> {
    let load_error = |e| ImageFileInputError::ImageLoadError(path.display().to_string(), e);
    let image = ImageReader::open(path)?
      .with_guessed_format()?
      .decode()
      .map_err(load_error)?
      .to_rgb8();
    debug!(
      "读取图像 {}: {}x{}",
      path.display(),
      image.width(),
      image.height()
    );
    Ok(ImageFrame::from_path(path, image))
  }
}

impl Iterator for ImageFileInput {
  type Item = Result<ImageFrame, ImageFileInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.pending.pop_front().map(|path| Self::read(&path))
  }
}
