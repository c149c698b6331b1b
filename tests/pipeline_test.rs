// 该文件是 Jiemo （结膜标注） 项目的一部分。
// tests/pipeline_test.rs - 输入、回放推理、标注与输出的端到端测试
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

use image::{Rgb, RgbImage};
use url::Url;

use jiemo::{
  FromUrl,
  annotate::Annotator,
  catalog::ClassCatalog,
  input::{ImageFileInput, InputWrapper},
  model::{ModelWrapper, ReplayModel},
  output::{DirectoryRecordOutput, OutputWrapper},
  summary::DetectionRecord,
  task::{BatchTask, OneShotTask, Task},
};

const EYE1_SIDECAR: &str = r#"{
  "instances": [
    {"class_index": 1, "confidence": 0.75, "mask": {"width": 4, "height": 4, "data": [
      1, 1, 0, 0,
      1, 1, 0, 0,
      0, 0, 0, 0,
      0, 0, 0, 0
    ]}},
    {"class_index": 9, "confidence": 0.9, "mask": {"width": 1, "height": 1, "data": [1]}}
  ]
}"#;

fn setup(root: &Path) {
  let uploads = root.join("uploads");
  let results = root.join("results");
  std::fs::create_dir_all(&uploads).unwrap();
  std::fs::create_dir_all(&results).unwrap();
  RgbImage::from_pixel(80, 80, Rgb([30, 30, 30]))
    .save(uploads.join("eye1.png"))
    .unwrap();
  RgbImage::from_pixel(40, 40, Rgb([30, 30, 30]))
    .save(uploads.join("eye2.png"))
    .unwrap();
  std::fs::write(uploads.join("eye3.png"), b"corrupted").unwrap();
  std::fs::write(results.join("eye1.json"), EYE1_SIDECAR).unwrap();
}

fn url(scheme: &str, path: &Path, query: &str) -> Url {
  Url::parse(&format!("{}://{}{}", scheme, path.display(), query)).unwrap()
}

#[test]
fn batch_writes_detected_images_and_summaries() {
  let dir = tempfile::tempdir().unwrap();
  setup(dir.path());
  let out = dir.path().join("out");

  let input = ImageFileInput::open(&dir.path().join("uploads")).unwrap();
  let model = ReplayModel::open(&dir.path().join("results")).unwrap();
  let output = DirectoryRecordOutput::new(&out).with_record(true);
  let annotator = Annotator::with_catalog(ClassCatalog::default()).unwrap();

  let report = BatchTask::default()
    .run_task(input, model, &annotator, output)
    .unwrap();

  assert_eq!(report.processed.len(), 2);
  assert_eq!(report.failures, 1);
  assert_eq!(report.total_detections(), 1);
  assert_eq!(report.processed[0].skipped, 1);

  let annotated = image::open(out.join("detected_eye1.png")).unwrap().to_rgb8();
  assert_eq!(annotated.dimensions(), (80, 80));
  // 4x4 掩码放大到 80x80，左上 40x40 为前景
  assert_eq!(*annotated.get_pixel(2, 38), Rgb([30, 90, 30]));
  assert_eq!(*annotated.get_pixel(70, 75), Rgb([30, 30, 30]));

  let summary: Vec<DetectionRecord> =
    serde_json::from_str(&std::fs::read_to_string(out.join("detected_eye1.png.json")).unwrap()).unwrap();
  assert_eq!(
    summary,
    [DetectionRecord {
      class: "forniceal_palpebral".to_string(),
      confidence: 0.75,
      area: 1600,
    }]
  );

  // 没有结果文件的图像原样保存
  let untouched = image::open(out.join("detected_eye2.png")).unwrap().to_rgb8();
  assert!(untouched.pixels().all(|p| *p == Rgb([30, 30, 30])));
}

#[test]
fn batch_respects_max_images_and_skip_empty() {
  let dir = tempfile::tempdir().unwrap();
  setup(dir.path());
  let out = dir.path().join("out");

  let input = ImageFileInput::open(&dir.path().join("uploads")).unwrap();
  let model = ReplayModel::open(&dir.path().join("results")).unwrap();
  let output = DirectoryRecordOutput::new(&out).with_skip_empty(true);
  let annotator = Annotator::with_catalog(ClassCatalog::default()).unwrap();

  let report = BatchTask::default()
    .with_max_images(Some(2))
    .run_task(input, model, &annotator, output)
    .unwrap();

  assert_eq!(report.processed.len(), 2);
  assert_eq!(report.failures, 0);
  assert!(out.join("detected_eye1.png").exists());
  assert!(!out.join("detected_eye2.png").exists());
}

#[test]
fn oneshot_through_url_wrappers() {
  let dir = tempfile::tempdir().unwrap();
  setup(dir.path());
  let target = dir.path().join("single").join("annotated.png");

  let input = InputWrapper::from_url(&url("image", &dir.path().join("uploads/eye1.png"), "")).unwrap();
  let model = ModelWrapper::from_url(&url("replay", &dir.path().join("results"), "")).unwrap();
  let output = OutputWrapper::from_url(&url("image", &target, "?record")).unwrap();
  let annotator = Annotator::with_catalog(ClassCatalog::default()).unwrap();

  let report = OneShotTask
    .run_task(input, model, &annotator, output)
    .unwrap();

  assert_eq!(report.processed.len(), 1);
  assert_eq!(report.processed[0].name, "eye1.png");
  assert_eq!(
    report.processed[0].summary.to_prompt_text(),
    "- forniceal_palpebral: 0.75 confidence"
  );
  assert!(target.exists());
  assert!(target.with_extension("json").exists());
}

#[test]
fn url_paths_with_spaces_are_decoded() {
  let dir = tempfile::tempdir().unwrap();
  let uploads = dir.path().join("patient uploads");
  let results = dir.path().join("model results");
  std::fs::create_dir_all(&uploads).unwrap();
  std::fs::create_dir_all(&results).unwrap();
  RgbImage::from_pixel(80, 80, Rgb([30, 30, 30]))
    .save(uploads.join("eye 1.png"))
    .unwrap();
  std::fs::write(results.join("eye 1.json"), EYE1_SIDECAR).unwrap();
  let out = dir.path().join("annotated out");

  let input = InputWrapper::from_url(&url("image", &uploads, "")).unwrap();
  let model = ModelWrapper::from_url(&url("replay", &results, "")).unwrap();
  let output = OutputWrapper::from_url(&url("folder", &out, "?record")).unwrap();
  let annotator = Annotator::with_catalog(ClassCatalog::default()).unwrap();

  let report = BatchTask::default()
    .run_task(input, model, &annotator, output)
    .unwrap();

  assert_eq!(report.total_detections(), 1);
  assert!(out.join("detected_eye 1.png").exists());
  assert!(out.join("detected_eye 1.png.json").exists());
  assert!(!dir.path().join("annotated%20out").exists());
}

#[test]
fn dated_directory_layout() {
  let dir = tempfile::tempdir().unwrap();
  let output_url = url("folder", &dir.path().join("out"), "?dated&record");
  let output = DirectoryRecordOutput::from_url(&output_url).unwrap();
  let frame = jiemo::frame::ImageFrame::new("eye.jpg", RgbImage::new(2, 2));
  let path = output.result_path(&frame);

  let relative = path.strip_prefix(dir.path().join("out")).unwrap();
  let parts: Vec<_> = relative.iter().map(|p| p.to_string_lossy().into_owned()).collect();
  assert_eq!(parts.len(), 4);
  assert_eq!(parts[0].len(), 4);
  assert_eq!(parts[1].len(), 2);
  assert_eq!(parts[2].len(), 2);
  assert_eq!(parts[3], "detected_eye.jpg");
}

#[test]
fn unknown_schemes_are_rejected() {
  let bogus = Url::parse("rtsp://camera/stream").unwrap();
  assert!(InputWrapper::from_url(&bogus).is_err());
  assert!(ModelWrapper::from_url(&bogus).is_err());
  assert!(OutputWrapper::from_url(&bogus).is_err());
}
