// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{Datelike, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme, annotate::Annotation, frame::ImageFrame, output::Render,
  url_to_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("路径编码无效: {0}")]
  PathDecodeError(#[from] std::string::FromUtf8Error),
}

const DETECTED_PREFIX: &str = "detected_";

/// 以 `detected_<原文件名>` 保存到目录。
///
/// 查询参数：`record` 同时写入摘要 JSON，`dated` 按 `年/月/日` 分子目录，
/// `skip_empty` 摘要为空时不保存。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  record: bool,
  dated: bool,
  skip_empty: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let has = |key: &str| uri.query_pairs().any(|(k, _)| k == key);

    Ok(DirectoryRecordOutput {
      directory: url_to_path(uri)?,
      record: has("record"),
      dated: has("dated"),
      skip_empty: has("skip_empty"),
    })
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
      record: false,
      dated: false,
      skip_empty: false,
    }
  }

  pub fn with_record(mut self, record: bool) -> Self {
    self.record = record;
    self
  }

  pub fn with_dated(mut self, dated: bool) -> Self {
    self.dated = dated;
    self
  }

  pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
    self.skip_empty = skip_empty;
    self
  }

  fn target_directory(&self) -> PathBuf {
    if !self.dated {
      return self.directory.clone();
    }
    let now = Utc::now();
    self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()))
  }

  /// 结果图像路径
  pub fn result_path(&self, frame: &ImageFrame) -> PathBuf {
    self
      .target_directory()
      .join(format!("{}{}", DETECTED_PREFIX, frame.name()))
  }

  /// 摘要路径保留完整文件名，`eye.png` 与 `eye.jpg` 互不覆盖
  pub fn summary_path(result_path: &Path) -> PathBuf {
    let mut name = result_path.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
  }

  fn save(&self, path: &Path, annotation: &Annotation) -> Result<(), DirectoryRecordOutputError> {
    if let Some(parent) = path.parent()
      && !parent.exists()
    {
      std::fs::create_dir_all(parent)?;
    }

    annotation.image.save(path)?;
    info!("保存标注结果: {}", path.display());

    if self.record {
      annotation.summary.write_json(&Self::summary_path(path))?;
    }
    Ok(())
  }
}

impl Render<ImageFrame, Annotation> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &ImageFrame, result: &Annotation) -> Result<(), Self::Error> {
    if self.skip_empty && result.summary.is_empty() {
      debug!("{} 没有检测结果，跳过保存", frame.name());
      return Ok(());
    }
    let path = self.result_path(frame);
    self.save(&path, result)
  }
}
