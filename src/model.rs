// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/model.rs - 模型
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

use thiserror::Error;

use crate::{FromUrl, frame::ImageFrame, mask::SoftMask};

/// 推理提供者。模型本身对本库不透明。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone)]
pub struct DetectItem {
  pub class_index: usize,
  pub score: f32,
  pub mask: SoftMask,
}

/// 一次推理的全部实例。模型未给出掩码时为空。
#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

#[cfg(feature = "model_replay")]
mod replay;
#[cfg(feature = "model_replay")]
pub use self::replay::{ReplayError, ReplayModel};

#[derive(Error, Debug)]
pub enum ModelError {
  #[cfg(feature = "model_replay")]
  #[error("回放模型错误: {0}")]
  ReplayError(#[from] ReplayError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum ModelWrapper {
  #[cfg(feature = "model_replay")]
  Replay(ReplayModel),
}

impl FromUrl for ModelWrapper {
  type Error = ModelError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "model_replay")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ReplayModel::SCHEME {
        return Ok(ModelWrapper::Replay(ReplayModel::from_url(url)?));
      }
    }
    Err(ModelError::SchemeMismatch)
  }
}

impl Model for ModelWrapper {
  type Input = ImageFrame;
  type Output = DetectResult;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    match self {
      #[cfg(feature = "model_replay")]
      ModelWrapper::Replay(model) => model.infer(input).map_err(ModelError::from),
    }
  }
}
