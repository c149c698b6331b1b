// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/model/replay.rs - 回放预先计算的推理结果
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

use image::ImageBuffer;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  mask::SoftMask,
  model::{DetectItem, DetectResult, Model},
  url_to_path,
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("回放路径不存在: {0}")]
  PathNotFound(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("掩码图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("掩码尺寸不匹配: {width}x{height}, 数据长度 {len}")]
  MaskShape { width: u32, height: u32, len: usize },
  #[error("路径编码无效: {0}")]
  PathDecodeError(#[from] std::string::FromUtf8Error),
}

#[derive(Deserialize, Debug)]
struct Sidecar {
  #[serde(default)]
  instances: Option<Vec<InstanceRecord>>,
}

#[derive(Deserialize, Debug)]
struct InstanceRecord {
  // 负数同样视为越界索引，交给标注器跳过
  class_index: i64,
  confidence: f32,
  mask: MaskSource,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum MaskSource {
  File {
    path: PathBuf,
  },
  Inline {
    width: u32,
    height: u32,
    data: Vec<f32>,
  },
}

impl MaskSource {
  fn load(self, base: &Path) -> Result<SoftMask, ReplayError> {
    match self {
      MaskSource::File { path } => {
        let path = if path.is_absolute() {
          path
        } else {
          base.join(path)
        };
        debug!("读取掩码文件: {}", path.display());
        Ok(image::open(&path)?.to_luma32f())
      }
      MaskSource::Inline {
        width,
        height,
        data,
      } => {
        let len = data.len();
        ImageBuffer::from_vec(width, height, data).ok_or(ReplayError::MaskShape {
          width,
          height,
          len,
        })
      }
    }
  }
}

enum ReplaySource {
  // 所有图像共用同一个结果文件
  File(PathBuf),
  // 目录下按 `<文件名>.json` 查找
  Directory(PathBuf),
}

/// 从 JSON 旁车文件读取实例，代替真实模型
pub struct ReplayModel {
  source: ReplaySource,
}

impl FromUrlWithScheme for ReplayModel {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayModel {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayError::SchemeMismatch(format!(
        "期望方案 '{}', 实际方案 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    Self::open(&url_to_path(url)?)
  }
}

impl ReplayModel {
  pub fn open(path: &Path) -> Result<Self, ReplayError> {
    let source = if path.is_dir() {
      ReplaySource::Directory(path.to_path_buf())
    } else if path.is_file() {
      ReplaySource::File(path.to_path_buf())
    } else {
      return Err(ReplayError::PathNotFound(path.display().to_string()));
    };
    info!("回放推理结果: {}", path.display());
    Ok(Self { source })
  }

  fn sidecar_path(&self, frame: &ImageFrame) -> PathBuf {
    match &self.source {
      ReplaySource::File(path) => path.clone(),
      ReplaySource::Directory(dir) => dir.join(format!("{}.json", frame.stem())),
    }
  }

  fn load(path: &Path) -> Result<DetectResult, ReplayError> {
    let text = std::fs::read_to_string(path)?;
    let sidecar: Sidecar = serde_json::from_str(&text)?;

    let Some(instances) = sidecar.instances else {
      warn!("结果文件中没有掩码数据: {}", path.display());
      return Ok(DetectResult::empty());
    };

    let base = path.parent().unwrap_or(Path::new("."));
    let items = instances
      .into_iter()
      .map(|record| {
        Ok(DetectItem {
          class_index: usize::try_from(record.class_index).unwrap_or(usize::MAX),
          score: record.confidence,
          mask: record.mask.load(base)?,
        })
      })
      .collect::<Result<Vec<_>, ReplayError>>()?;

    Ok(DetectResult::from(items))
  }
}

impl Model for ReplayModel {
  type Input = ImageFrame;
  type Output = DetectResult;
  type Error = ReplayError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let path = self.sidecar_path(input);
    if !path.exists() {
      warn!("未找到 {} 的结果文件: {}", input.name(), path.display());
      return Ok(DetectResult::empty());
    }

    debug!(
      "回放 {} ({}x{}) 的结果: {}",
      input.name(),
      input.width(),
      input.height(),
      path.display()
    );
    let result = Self::load(&path)?;
    debug!("回放实例数量: {}", result.len());
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{GrayImage, Luma, RgbImage};

  fn frame(name: &str) -> ImageFrame {
    ImageFrame::new(name, RgbImage::new(8, 8))
  }

  #[test]
  fn inline_and_file_masks() {
    let dir = tempfile::tempdir().unwrap();
    let mask = GrayImage::from_fn(4, 4, |x, _| Luma([if x < 2 { 255 } else { 0 }]));
    mask.save(dir.path().join("m.png")).unwrap();
    std::fs::write(
      dir.path().join("eye.json"),
      r#"{"instances": [
        {"class_index": 1, "confidence": 0.9, "mask": {"path": "m.png"}},
        {"class_index": -1, "confidence": 0.4, "mask": {"width": 2, "height": 1, "data": [1.0, 0.0]}}
      ]}"#,
    )
    .unwrap();

    let model = ReplayModel::open(dir.path()).unwrap();
    let result = model.infer(&frame("eye.png")).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.items[0].class_index, 1);
    assert_eq!(result.items[0].mask.dimensions(), (4, 4));
    assert_eq!(result.items[0].mask.get_pixel(0, 0)[0], 1.0);
    assert_eq!(result.items[0].mask.get_pixel(3, 0)[0], 0.0);
    assert_eq!(result.items[1].class_index, usize::MAX);
    assert_eq!(result.items[1].mask.dimensions(), (2, 1));
  }

  #[test]
  fn missing_instances_is_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all.json");
    std::fs::write(&path, "{}").unwrap();
    let model = ReplayModel::open(&path).unwrap();
    assert!(model.infer(&frame("any.jpg")).unwrap().is_empty());
  }

  #[test]
  fn missing_sidecar_is_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let model = ReplayModel::open(dir.path()).unwrap();
    assert!(model.infer(&frame("nothing.jpg")).unwrap().is_empty());
  }

  #[test]
  fn inline_shape_mismatch_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
      &path,
      r#"{"instances": [{"class_index": 0, "confidence": 0.5, "mask": {"width": 3, "height": 3, "data": [1.0]}}]}"#,
    )
    .unwrap();
    let model = ReplayModel::open(&path).unwrap();
    assert!(matches!(
      model.infer(&frame("x.png")),
      Err(ReplayError::MaskShape { len: 1, .. })
    ));
  }

  #[test]
  fn rejects_wrong_scheme() {
    let url = Url::parse("yolo:///tmp/model").unwrap();
    assert!(matches!(
      ReplayModel::from_url(&url),
      Err(ReplayError::SchemeMismatch(_))
    ));
  }
}
