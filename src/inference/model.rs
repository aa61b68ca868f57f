use anyhow::{bail, Context, Result};
use ndarray::{Array4, ArrayViewD};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use crate::boundary::AnalysisWindow;
use crate::inference::{InferenceResult, InferenceSource};
use crate::pose::{Frame, LandmarkIndex};

/// 学習済みシーケンスモデルの不良ラベル（logits の並び順）
pub const MODEL_LABELS: [&str; 4] = [
    "low_transfer",
    "wrist_early",
    "late_release",
    "short_follow_through",
];

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// ONNXシーケンスモデルによる採点器
pub struct ShotModel {
    session: Session,
}

impl ShotModel {
    /// ONNXモデルを読み込んで初期化
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .context("Failed to load ONNX model")?;

        Ok(Self { session })
    }

    /// 解析区間のフレーム列から採点
    ///
    /// 入力: `x` [1, T, 33, 3] (x, y, visibility)
    /// 出力: `logits` [1, 4]（不良ラベル）, `preds` [1, 2]（先頭がスコア）
    pub fn infer(&mut self, frames: &[Frame], window: &AnalysisWindow) -> Result<InferenceResult> {
        let slice = &frames[window.start..=window.end];
        let mut input = Array4::<f32>::zeros((1, slice.len(), LandmarkIndex::COUNT, 3));
        for (t, frame) in slice.iter().enumerate() {
            for (k, kp) in frame.keypoints.iter().enumerate() {
                input[[0, t, k, 0]] = kp.x;
                input[[0, t, k, 1]] = kp.y;
                input[[0, t, k, 2]] = kp.visibility;
            }
        }

        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["x" => input_tensor])
            .context("Inference failed")?;

        let logits: ndarray::ArrayViewD<f32> = outputs["logits"]
            .try_extract_array()
            .context("Failed to extract logits tensor")?;
        let preds: ndarray::ArrayViewD<f32> = outputs["preds"]
            .try_extract_array()
            .context("Failed to extract preds tensor")?;

        result_from_outputs(logits, preds)
    }
}

/// モデル出力テンソルを採点結果へ変換
///
/// 形状が契約と合わないモデルはロードに成功しても使えない。
/// 添字アクセスの前に検証し、エラーとして返す（呼び出し側で
/// ヒューリスティックへ落ちる）
fn result_from_outputs(
    logits: ArrayViewD<'_, f32>,
    preds: ArrayViewD<'_, f32>,
) -> Result<InferenceResult> {
    if logits.shape() != [1, MODEL_LABELS.len()] {
        bail!("unexpected logits shape {:?}", logits.shape());
    }
    if preds.ndim() != 2 || preds.shape()[0] != 1 || preds.shape()[1] < 1 {
        bail!("unexpected preds shape {:?}", preds.shape());
    }

    let mut labels = Vec::new();
    let mut certainty_sum = 0.0f32;
    for (i, label) in MODEL_LABELS.iter().enumerate() {
        let p = sigmoid(logits[[0, i]]);
        certainty_sum += (p - 0.5).abs() * 2.0;
        if p > 0.5 {
            labels.push((*label).to_string());
        }
    }

    Ok(InferenceResult {
        source: InferenceSource::Model,
        score: preds[[0, 0]].clamp(0.0, 100.0),
        confidence: (certainty_sum / MODEL_LABELS.len() as f32).clamp(0.0, 1.0),
        labels,
        contributions: None,
    })
}
