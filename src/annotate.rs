// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/annotate.rs - 分割结果可视化
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

use std::fmt;

use ab_glyph::{FontArc, InvalidFont};
use image::RgbImage;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  catalog::ClassCatalog,
  mask::{BinaryMask, MASK_THRESHOLD},
  model::{DetectItem, DetectResult},
  summary::{DetectionRecord, DetectionSummary},
};

mod label;
mod overlay;

pub use self::label::{
  LABEL_MIN_Y, LABEL_OFFSET_X, LABEL_OFFSET_Y, LABEL_RIGHT_MARGIN, LabelPlacement, LabelStyle,
  default_font, label_anchor, label_text,
};
pub use self::overlay::{OVERLAY_ALPHA, blend_mask};

#[derive(Error, Debug)]
pub enum AnnotateError {
  #[error("内置字体无效: {0}")]
  FontError(#[from] InvalidFont),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  IndexOutOfRange {
    class_index: usize,
    catalog_len: usize,
  },
}

impl SkipReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      SkipReason::IndexOutOfRange { .. } => "index_out_of_range",
    }
  }
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::IndexOutOfRange {
        class_index,
        catalog_len,
      } => write!(
        f,
        "{} (类别索引 {} 超出类别表长度 {})",
        self.as_str(),
        class_index,
        catalog_len
      ),
    }
  }
}

/// 单个实例的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceOutcome {
  /// 空掩码没有标签，但仍计入摘要
  Annotated {
    record: DetectionRecord,
    label: Option<LabelPlacement>,
  },
  Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skipped {
  /// 实例在输入中的位置
  pub position: usize,
  pub reason: SkipReason,
}

/// 标注结果。图像尺寸与输入一致，归调用方所有。
#[derive(Debug, Clone)]
pub struct Annotation {
  pub image: RgbImage,
  pub summary: DetectionSummary,
  pub labels: Vec<LabelPlacement>,
  pub skipped: Vec<Skipped>,
}

impl Annotation {
  fn new(image: RgbImage) -> Self {
    Self {
      image,
      summary: DetectionSummary::default(),
      labels: Vec::new(),
      skipped: Vec::new(),
    }
  }

  fn with_outcome(mut self, position: usize, outcome: InstanceOutcome) -> Self {
    match outcome {
      InstanceOutcome::Annotated { record, label } => {
        self.summary.push(record);
        self.labels.extend(label);
      }
      InstanceOutcome::Skipped(reason) => self.skipped.push(Skipped { position, reason }),
    }
    self
  }
}

/// 将实例掩码叠加到图像上并生成摘要。
///
/// 类别表在构造时注入，之后只读；同一个标注器可在多个线程间共享。
pub struct Annotator {
  catalog: ClassCatalog,
  style: LabelStyle,
  font: FontArc,
}

impl Annotator {
  pub fn new(catalog: ClassCatalog, style: LabelStyle, font: FontArc) -> Self {
    Self {
      catalog,
      style,
      font,
    }
  }

  /// 默认标签样式与内置字体
  pub fn with_catalog(catalog: ClassCatalog) -> Result<Self, AnnotateError> {
    Ok(Self::new(catalog, LabelStyle::default(), default_font()?))
  }

  pub fn catalog(&self) -> &ClassCatalog {
    &self.catalog
  }

  pub fn style(&self) -> &LabelStyle {
    &self.style
  }

  /// 按输入顺序依次合成每个实例，输入图像不被修改
  pub fn annotate(&self, image: &RgbImage, result: &DetectResult) -> Annotation {
    let annotation = result.items.iter().enumerate().fold(
      Annotation::new(image.clone()),
      |acc, (position, item)| {
        let (image, outcome) = self.composite(acc.image, item);
        Annotation { image, ..acc }.with_outcome(position, outcome)
      },
    );

    debug!(
      "标注完成: {} 个实例, {} 个跳过",
      annotation.summary.len(),
      annotation.skipped.len()
    );
    annotation
  }

  /// 合成单个实例，返回新图像与该实例的处理结果
  pub fn composite(&self, mut image: RgbImage, item: &DetectItem) -> (RgbImage, InstanceOutcome) {
    let Some(entry) = self.catalog.get(item.class_index) else {
      let reason = SkipReason::IndexOutOfRange {
        class_index: item.class_index,
        catalog_len: self.catalog.len(),
      };
      warn!("跳过实例: {}", reason);
      return (image, InstanceOutcome::Skipped(reason));
    };

    let (width, height) = image.dimensions();
    let mask = BinaryMask::threshold(&item.mask, MASK_THRESHOLD).resize_nearest(width, height);
    let color = entry.rgb();

    blend_mask(&mut image, &mask, color, OVERLAY_ALPHA);

    let label = mask.centroid().map(|centroid| {
      let placement = LabelPlacement::new(label_text(&entry.name, item.score), centroid, width);
      debug!(
        "标签 '{}': 质心 {:?}, 锚点 {:?}",
        placement.text, placement.centroid, placement.anchor
      );
      label::draw_leader(&mut image, &placement, color);
      label::draw_label(&mut image, &placement, &self.style, &self.font);
      placement
    });

    let record = DetectionRecord {
      class: entry.name.clone(),
      confidence: item.score,
      area: mask.area(),
    };
    (image, InstanceOutcome::Annotated { record, label })
  }
}
