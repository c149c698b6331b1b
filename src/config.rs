// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/config.rs - 标注器配置
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

use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  annotate::{AnnotateError, Annotator, LabelStyle, default_font},
  catalog::{CatalogError, ClassCatalog, ClassEntry},
};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("类别表错误: {0}")]
  CatalogError(#[from] CatalogError),
  #[error("字体无效: {0}")]
  FontError(String),
  #[error("标注器错误: {0}")]
  AnnotateError(#[from] AnnotateError),
}

/// 标注器配置文件。
///
/// ```toml
/// font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
///
/// [label]
/// font_size = 18.0
///
/// [[class]]
/// name = "forniceal"
/// color = [139, 0, 0]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
  pub font: Option<PathBuf>,
  pub label: LabelStyle,
  pub class: Option<Vec<ClassEntry>>,
}

impl AnnotatorConfig {
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(text)?)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    info!("加载配置文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_toml_str(&text)
  }

  pub fn with_font(mut self, font: Option<PathBuf>) -> Self {
    if font.is_some() {
      self.font = font;
    }
    self
  }

  /// 未配置类别时使用默认的结膜类别
  pub fn catalog(&self) -> Result<ClassCatalog, ConfigError> {
    match &self.class {
      Some(entries) => Ok(ClassCatalog::from_entries(entries.clone())?),
      None => Ok(ClassCatalog::default()),
    }
  }

  /// 配置了字体文件时读取该文件，否则使用内置字体
  pub fn load_font(&self) -> Result<FontArc, ConfigError> {
    let Some(path) = &self.font else {
      debug!("使用内置字体");
      return Ok(default_font().map_err(AnnotateError::from)?);
    };
    info!("加载字体: {}", path.display());
    let data = std::fs::read(path)?;
    FontArc::try_from_vec(data)
      .map_err(|e| ConfigError::FontError(format!("{}: {}", path.display(), e)))
  }

  pub fn build_annotator(&self) -> Result<Annotator, ConfigError> {
    Ok(Annotator::new(
      self.catalog()?,
      self.label.clone(),
      self.load_font()?,
    ))
  }
}
