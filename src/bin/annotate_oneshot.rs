// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/bin/annotate_oneshot.rs - 单张图像标注
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use jiemo::{
  FromUrl,
  config::AnnotatorConfig,
  input::InputWrapper,
  model::ModelWrapper,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

/// Jiemo 单张图像标注
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理提供者，例如 replay:///data/results
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，例如 image:///data/uploads/eye.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 image:///data/out.png?record 或 folder:///data/results
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 标注器配置文件（TOML）
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 标签字体文件，覆盖配置文件中的设置
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理提供者: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = match &args.config {
    Some(path) => AnnotatorConfig::load(path)?,
    None => AnnotatorConfig::default(),
  }
  .with_font(args.font);
  let annotator = config.build_annotator()?;

  let input = InputWrapper::from_url(&args.input)?;
  let model = ModelWrapper::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let report = OneShotTask.run_task(input, model, &annotator, output)?;
  for processed in &report.processed {
    info!("{} 检测摘要:\n{}", processed.name, processed.summary.to_prompt_text());
  }
  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(())
}
