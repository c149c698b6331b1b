// 该文件是 Jiemo （结膜标注） 项目的一部分。
// src/task.rs - 标注任务
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

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
  annotate::{Annotation, Annotator},
  frame::ImageFrame,
  model::{DetectResult, Model},
  output::Render,
  summary::DetectionSummary,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(
    self,
    input: I,
    model: M,
    annotator: &Annotator,
    output: O,
  ) -> Result<TaskReport, Self::Error>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
  pub name: String,
  pub summary: DetectionSummary,
  pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskReport {
  pub processed: Vec<ProcessedImage>,
  pub failures: usize,
}

impl TaskReport {
  pub fn total_detections(&self) -> usize {
    self.processed.iter().map(|p| p.summary.len()).sum()
  }
}

#[derive(Error, Debug)]
enum FrameError<ME, RE> {
  #[error("推理失败: {0}")]
  Infer(#[source] ME),
  #[error("输出失败: {0}")]
  Render(#[source] RE),
}

fn annotate_frame<M, ME, O, RE>(
  frame: &ImageFrame,
  model: &M,
  annotator: &Annotator,
  output: &O,
) -> Result<ProcessedImage, FrameError<ME, RE>>
where
  M: Model<Input = ImageFrame, Output = DetectResult, Error = ME>,
  O: Render<ImageFrame, Annotation, Error = RE>,
{
  let now = std::time::Instant::now();
  let result = model.infer(frame).map_err(FrameError::Infer)?;
  let inferred = now.elapsed();
  let annotation = annotator.annotate(frame.image(), &result);
  let annotated = now.elapsed();
  if !annotation.skipped.is_empty() {
    warn!(
      "{}: 跳过 {} 个类别越界的实例",
      frame.name(),
      annotation.skipped.len()
    );
  }
  output
    .render_result(frame, &annotation)
    .map_err(FrameError::Render)?;
  info!(
    "{}: {} 个实例, 推理 {:.2?} / 标注 {:.2?} / 输出 {:.2?}",
    frame.name(),
    annotation.summary.len(),
    inferred,
    annotated - inferred,
    now.elapsed() - annotated
  );

  Ok(ProcessedImage {
    name: frame.name().to_string(),
    skipped: annotation.skipped.len(),
    summary: annotation.summary,
  })
}

/// 只处理第一张图像，任何错误都直接返回
pub struct OneShotTask;

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<ImageFrame, IE>>,
  M: Model<Input = ImageFrame, Output = DetectResult, Error = ME>,
  O: Render<ImageFrame, Annotation, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    model: M,
    annotator: &Annotator,
    output: O,
  ) -> Result<TaskReport, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    let processed = annotate_frame(&frame, &model, annotator, &output)?;
    info!("任务完成");

    Ok(TaskReport {
      processed: vec![processed],
      failures: 0,
    })
  }
}

/// 依次处理全部图像。读取或推理失败的图像记录后跳过，输出失败则中止。
#[derive(Default, Debug)]
pub struct BatchTask {
  max_images: Option<usize>,
}

impl BatchTask {
  pub fn with_max_images(mut self, max_images: Option<usize>) -> Self {
    self.max_images = max_images;
    self
  }
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<ImageFrame, IE>>,
  M: Model<Input = ImageFrame, Output = DetectResult, Error = ME>,
  O: Render<ImageFrame, Annotation, Error = RE>,
> Task<I, M, O> for BatchTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: I,
    model: M,
    annotator: &Annotator,
    output: O,
  ) -> Result<TaskReport, Self::Error> {
    info!("开始批量任务...");
    let mut report = TaskReport::default();

    let limit = self.max_images.unwrap_or(usize::MAX);
    for (index, frame) in input.take(limit).enumerate() {
      let frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
          error!("读取第 {} 张图像失败: {}", index + 1, e);
          report.failures += 1;
          continue;
        }
      };

      match annotate_frame(&frame, &model, annotator, &output) {
        Ok(processed) => report.processed.push(processed),
        Err(FrameError::Infer(e)) => {
          error!("{} 推理失败: {}", frame.name(), e);
          report.failures += 1;
        }
        Err(e @ FrameError::Render(_)) => return Err(e.into()),
      }
    }

    info!(
      "任务完成: {} 张图像, {} 个实例, {} 张失败",
      report.processed.len(),
      report.total_detections(),
      report.failures
    );
    Ok(report)
  }
}
