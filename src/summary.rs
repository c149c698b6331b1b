// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/summary.rs - 检测摘要
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

use serde::{Deserialize, Serialize};

/// 单个实例的摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
  pub class: String,
  pub confidence: f32,
  /// 缩放到原图尺寸后的前景像素数
  pub area: u64,
}

/// 按输入顺序排列的实例摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionSummary {
  records: Vec<DetectionRecord>,
}

const NO_DETECTIONS: &str = "No specific detections";

impl DetectionSummary {
  pub fn push(&mut self, record: DetectionRecord) {
    self.records.push(record);
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn records(&self) -> &[DetectionRecord] {
    &self.records
  }

  pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
    self.records.iter()
  }

  /// 供下游文字分析使用的列表文本
  pub fn to_prompt_text(&self) -> String {
    if self.records.is_empty() {
      return NO_DETECTIONS.to_string();
    }
    self
      .records
      .iter()
      .map(|r| format!("- {}: {:.2} confidence", r.class, r.confidence))
      .collect::<Vec<_>>()
      .join("\n")
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }

  pub fn write_json(&self, path: &Path) -> Result<(), std::io::Error> {
    let text = self.to_json().map_err(std::io::Error::other)?;
    std::fs::write(path, text)
  }
}

impl FromIterator<DetectionRecord> for DetectionSummary {
  fn from_iter<I: IntoIterator<Item = DetectionRecord>>(iter: I) -> Self {
    Self {
      records: iter.into_iter().collect(),
    }
  }
}
