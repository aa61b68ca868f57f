//! 採点の入口（モデル / ヒューリスティックの選択）
//!
//! モデルは任意装備。ロード失敗・推論失敗はすべてヒューリスティックへ
//! 落とし、呼び出し側にエラーを返さない。どちらの経路も同じ
//! `InferenceResult` スキーマを返す。

pub mod heuristic;
pub mod model;

use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::boundary::AnalysisWindow;
use crate::config::AnalysisConfig;
use crate::features::{AngleKind, FrameMeasurement};
use crate::orientation::Capabilities;
use crate::pose::Frame;
use crate::shot::ShotType;

pub use model::{ShotModel, MODEL_LABELS};

/// スコアの出所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InferenceSource {
    Model,
    Heuristic,
}

/// ヒューリスティック採点の項目別内訳
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleContribution {
    pub kind: AngleKind,
    pub observed: f32,
    pub ideal_min: f32,
    pub ideal_max: f32,
    pub penalty: f32,
}

/// 採点結果。モデル・ヒューリスティックで共通
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResult {
    pub source: InferenceSource,
    /// 0〜100
    pub score: f32,
    /// 0〜1
    pub confidence: f32,
    pub labels: Vec<String>,
    /// ヒューリスティック経路のみ。モデル経路は None
    pub contributions: Option<Vec<AngleContribution>>,
}

/// プロセス内で1つだけ作る採点器
///
/// モデルのロードは構築時に最大1回。セッションは Mutex 越しに
/// 共有し、複数リクエストから同時に使える
pub struct ShotScorer {
    model: Option<Mutex<ShotModel>>,
}

impl ShotScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        let model = match &config.model_path {
            None => {
                debug!("no model path configured, heuristic-only mode");
                None
            }
            Some(path) => match ShotModel::load(path) {
                Ok(model) => {
                    debug!(path = %path.display(), "shot model loaded");
                    Some(Mutex::new(model))
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "model load failed, falling back to heuristic");
                    None
                }
            },
        };
        Self { model }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// 採点する。決してエラーを返さない
    ///
    /// モデル経路で失敗した場合もヒューリスティックの結果を返す
    pub fn infer(
        &self,
        frames: &[Frame],
        window: &AnalysisWindow,
        measurements: &[FrameMeasurement],
        shot_type: ShotType,
        capabilities: &Capabilities,
        config: &AnalysisConfig,
    ) -> InferenceResult {
        if let Some(model) = &self.model {
            match model.lock() {
                Ok(mut model) => match model.infer(frames, window) {
                    Ok(result) => return result,
                    Err(err) => {
                        warn!(error = %err, "model inference failed, falling back to heuristic");
                    }
                },
                Err(_) => {
                    warn!("model session lock poisoned, falling back to heuristic");
                }
            }
        }
        heuristic::score(
            measurements,
            shot_type,
            capabilities,
            window.low_confidence,
            &config.heuristic,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;
    use crate::pose::{Keypoint, LandmarkIndex};
    use std::io::Write;

    fn dummy_frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let mut keypoints = [Keypoint::default(); LandmarkIndex::COUNT];
                keypoints[LandmarkIndex::RightShoulder as usize] = Keypoint::new(0.5, 0.3, 0.9);
                keypoints[LandmarkIndex::RightElbow as usize] = Keypoint::new(0.55, 0.4, 0.9);
                keypoints[LandmarkIndex::RightWrist as usize] = Keypoint::new(0.5, 0.5, 0.9);
                Frame::new(i as u32, i as f64 / 30.0, keypoints)
            })
            .collect()
    }

    fn measurements(frames: &[Frame], window: &AnalysisWindow) -> Vec<FrameMeasurement> {
        use crate::features::{compute_measurements, Side};
        compute_measurements(frames, window, Side::Right, 0.25)
    }

    #[test]
    fn test_no_model_uses_heuristic() {
        let config = AnalysisConfig::default();
        let scorer = ShotScorer::new(&config);
        assert!(!scorer.has_model());

        let frames = dummy_frames(5);
        let window = AnalysisWindow {
            start: 0,
            end: 4,
            low_confidence: false,
        };
        let result = scorer.infer(
            &frames,
            &window,
            &measurements(&frames, &window),
            ShotType::JumpShot,
            &Capabilities::for_orientation(Orientation::LateralRight),
            &config,
        );
        assert_eq!(result.source, InferenceSource::Heuristic);
        assert!((0.0..=100.0).contains(&result.score));
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_corrupt_model_falls_back_without_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not onnx").unwrap();

        let config = AnalysisConfig {
            model_path: Some(file.path().to_path_buf()),
            ..AnalysisConfig::default()
        };
        let scorer = ShotScorer::new(&config);
        assert!(!scorer.has_model());

        let frames = dummy_frames(5);
        let window = AnalysisWindow {
            start: 0,
            end: 4,
            low_confidence: false,
        };
        let result = scorer.infer(
            &frames,
            &window,
            &measurements(&frames, &window),
            ShotType::JumpShot,
            &Capabilities::for_orientation(Orientation::LateralRight),
            &config,
        );
        assert_eq!(result.source, InferenceSource::Heuristic);
    }

    #[test]
    fn test_schema_parity_between_sources() {
        // 両経路とも同じ直列化キーを持つ
        let heuristic = InferenceResult {
            source: InferenceSource::Heuristic,
            score: 80.0,
            confidence: 0.9,
            labels: vec![],
            contributions: Some(vec![]),
        };
        let model = InferenceResult {
            source: InferenceSource::Model,
            score: 70.0,
            confidence: 0.8,
            labels: vec!["wrist_early".to_string()],
            contributions: None,
        };
        let h = serde_json::to_value(&heuristic).unwrap();
        let m = serde_json::to_value(&model).unwrap();
        for key in ["source", "score", "confidence", "labels", "contributions"] {
            assert!(h.get(key).is_some(), "missing {key} in heuristic");
            assert!(m.get(key).is_some(), "missing {key} in model");
        }
        assert_eq!(h["source"], "heuristic");
        assert_eq!(m["source"], "model");
    }
}
