// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod annotate;
pub mod catalog;
pub mod config;
pub mod frame;
pub mod input;
pub mod mask;
pub mod model;
pub mod output;
pub mod summary;
pub mod task;

use std::{path::PathBuf, string::FromUtf8Error};

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// URL 路径部分解码后的文件系统路径，例如 `eye%20scan.png` 解码为 `eye scan.png`
pub fn url_to_path(url: &url::Url) -> Result<PathBuf, FromUtf8Error> {
  Ok(PathBuf::from(urlencoding::decode(url.path())?.into_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_path_is_percent_decoded() {
    let url = url::Url::parse("image:///data/uploads/eye%20scan.png").unwrap();
    assert_eq!(url_to_path(&url).unwrap(), PathBuf::from("/data/uploads/eye scan.png"));

    let url = url::Url::parse("folder:///data/眼/results?record").unwrap();
    assert_eq!(url_to_path(&url).unwrap(), PathBuf::from("/data/眼/results"));
  }

  #[test]
  fn invalid_utf8_escape_is_error() {
    let url = url::Url::parse("image:///data/%FF.png").unwrap();
    assert!(url_to_path(&url).is_err());
  }
}
