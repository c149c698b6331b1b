// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/catalog.rs - 类别名称与颜色表
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

use image::Rgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CatalogError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别表解析错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("类别表为空")]
  Empty,
}

/// 单个类别：显示名称与叠加颜色（RGB）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
  pub name: String,
  pub color: [u8; 3],
}

impl ClassEntry {
  pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
    Self {
      name: name.into(),
      color,
    }
  }

  pub fn rgb(&self) -> Rgb<u8> {
    Rgb(self.color)
  }
}

/// 有序的类别表，类别索引即表中下标。
///
/// 名称与颜色成对存放，因此两者数量总是一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCatalog {
  entries: Box<[ClassEntry]>,
}

#[derive(Deserialize)]
struct CatalogFile {
  #[serde(default)]
  class: Vec<ClassEntry>,
}

impl Default for ClassCatalog {
  // 结膜分割模型的三个类别
  fn default() -> Self {
    Self::new(vec![
      ClassEntry::new("forniceal", [139, 0, 0]),
      ClassEntry::new("forniceal_palpebral", [0, 100, 0]),
      ClassEntry::new("palpebral", [139, 0, 139]),
    ])
  }
}

impl ClassCatalog {
  pub fn new(entries: Vec<ClassEntry>) -> Self {
    Self {
      entries: entries.into_boxed_slice(),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// 越界索引返回 `None`
  pub fn get(&self, class_index: usize) -> Option<&ClassEntry> {
    self.entries.get(class_index)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
    self.entries.iter()
  }

  pub fn from_entries(entries: Vec<ClassEntry>) -> Result<Self, CatalogError> {
    if entries.is_empty() {
      return Err(CatalogError::Empty);
    }
    Ok(Self::new(entries))
  }

  /// 从 TOML 文本读取，格式为若干 `[[class]]` 表
  pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
    let file: CatalogFile = toml::from_str(text)?;
    Self::from_entries(file.class)
  }

  pub fn load(path: &Path) -> Result<Self, CatalogError> {
    info!("加载类别表: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let catalog = Self::from_toml_str(&text)?;
    debug!("类别数量: {}", catalog.len());
    Ok(catalog)
  }
}
