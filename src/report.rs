//! レポート合成
//!
//! パイプライン各段の結果を `AnalysisReport` へ構造的にまとめる。
//! ナレーション生成は外部コラボレータの仕事で、失敗してもレポート
//! 自体は必ず成立する。

use serde::Serialize;
use tracing::warn;

use crate::boundary::AnalysisWindow;
use crate::features::{AngleKind, FrameMeasurement};
use crate::inference::InferenceResult;
use crate::orientation::{Capabilities, Orientation, OrientationResult};
use crate::shot::ShotType;

/// ルールベースの定型フィードバック
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
}

/// 解析レポート（外部公開形式、camelCase JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub shot_type: ShotType,
    pub orientation: OrientationResult,
    pub capabilities: Capabilities,
    pub window: AnalysisWindow,
    pub measurements: Vec<FrameMeasurement>,
    pub inference: InferenceResult,
    pub feedback: Feedback,
    pub narrative: Option<String>,
}

/// ナレーション生成の境界
///
/// タイムアウト等の制御は実装側の責務。エラーはレポートを壊さない
pub trait NarrativeGenerator {
    fn narrate(&self, report: &AnalysisReport) -> anyhow::Result<String>;
}

fn strength_text(kind: AngleKind) -> &'static str {
    match kind {
        AngleKind::Elbow => "solid elbow extension through the release",
        AngleKind::Knee => "good knee load depth",
        AngleKind::Hip => "stable hip hinge through the motion",
        AngleKind::Shoulder => "shoulder alignment stays in the ideal band",
        AngleKind::Wrist => "clean wrist position at release",
        AngleKind::ShoulderHipOffset => "torso stays stacked over the hips",
    }
}

fn issue_text(label: &str) -> String {
    match label {
        "elbow_out_of_range" => "extend the shooting elbow fully through the release".to_string(),
        "knee_out_of_range" => "adjust the knee bend during the load phase".to_string(),
        "hip_out_of_range" => "keep the hip hinge inside the ideal band".to_string(),
        "shoulder_out_of_range" => "check shoulder elevation at the set point".to_string(),
        "wrist_out_of_range" => "work on the wrist set before the release".to_string(),
        "shoulder_hip_offset_out_of_range" => {
            "reduce torso lean, keep shoulders stacked over the hips".to_string()
        }
        "low_transfer" => "drive more energy from the legs into the release".to_string(),
        "wrist_early" => "delay the wrist snap until full arm extension".to_string(),
        "late_release" => "release earlier, near the peak of the jump".to_string(),
        "short_follow_through" => "hold the follow-through until the ball hits the rim".to_string(),
        other => format!("flagged by analysis: {other}"),
    }
}

/// 採点結果と文脈から定型フィードバックを組み立てる
pub fn build_feedback(
    inference: &InferenceResult,
    orientation: Orientation,
    window: &AnalysisWindow,
) -> Feedback {
    let mut feedback = Feedback::default();

    if let Some(contributions) = &inference.contributions {
        for c in contributions {
            if c.penalty == 0.0 {
                feedback.strengths.push(strength_text(c.kind).to_string());
            }
        }
    }
    for label in &inference.labels {
        feedback.issues.push(issue_text(label));
    }

    if orientation == Orientation::Unknown {
        feedback
            .issues
            .push("camera orientation could not be determined, analysis may be partial".to_string());
    }
    if window.low_confidence {
        feedback
            .issues
            .push("shot boundaries were unclear, the whole clip was analyzed".to_string());
    }
    feedback
}

/// 各段の結果を構造的に合成する。失敗しない
pub fn compose(
    shot_type: ShotType,
    orientation: OrientationResult,
    capabilities: Capabilities,
    window: AnalysisWindow,
    measurements: Vec<FrameMeasurement>,
    inference: InferenceResult,
) -> AnalysisReport {
    let feedback = build_feedback(&inference, orientation.orientation, &window);
    AnalysisReport {
        shot_type,
        orientation,
        capabilities,
        window,
        measurements,
        inference,
        feedback,
        narrative: None,
    }
}

/// ナレーションを付与する。生成失敗は None のまま進める
pub fn enrich(report: &mut AnalysisReport, generator: &dyn NarrativeGenerator) {
    match generator.narrate(report) {
        Ok(text) => report.narrative = Some(text),
        Err(err) => {
            warn!(error = %err, "narrative generation failed, report ships without it");
            report.narrative = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceSource;
    use crate::orientation::OrientationMetrics;

    fn sample_report() -> AnalysisReport {
        let orientation = OrientationResult {
            orientation: Orientation::LateralRight,
            confidence: 0.8,
            metrics: OrientationMetrics::default(),
        };
        let capabilities = Capabilities::for_orientation(Orientation::LateralRight);
        let window = AnalysisWindow {
            start: 1,
            end: 8,
            low_confidence: false,
        };
        let inference = InferenceResult {
            source: InferenceSource::Heuristic,
            score: 72.0,
            confidence: 0.9,
            labels: vec!["elbow_out_of_range".to_string()],
            contributions: Some(vec![]),
        };
        compose(
            ShotType::JumpShot,
            orientation,
            capabilities,
            window,
            vec![],
            inference,
        )
    }

    struct FailingNarrator;
    impl NarrativeGenerator for FailingNarrator {
        fn narrate(&self, _report: &AnalysisReport) -> anyhow::Result<String> {
            anyhow::bail!("narrative service unavailable")
        }
    }

    struct EchoNarrator;
    impl NarrativeGenerator for EchoNarrator {
        fn narrate(&self, report: &AnalysisReport) -> anyhow::Result<String> {
            Ok(format!("score {:.0}", report.inference.score))
        }
    }

    #[test]
    fn test_compose_maps_labels_to_issues() {
        let report = sample_report();
        assert_eq!(report.feedback.issues.len(), 1);
        assert!(report.feedback.issues[0].contains("elbow"));
        assert!(report.narrative.is_none());
    }

    #[test]
    fn test_failed_narrator_leaves_report_intact() {
        let mut report = sample_report();
        enrich(&mut report, &FailingNarrator);
        assert!(report.narrative.is_none());
        assert_eq!(report.inference.score, 72.0);
    }

    #[test]
    fn test_narrator_attaches_text() {
        let mut report = sample_report();
        enrich(&mut report, &EchoNarrator);
        assert_eq!(report.narrative.as_deref(), Some("score 72"));
    }

    #[test]
    fn test_low_confidence_window_noted() {
        let inference = InferenceResult {
            source: InferenceSource::Heuristic,
            score: 50.0,
            confidence: 0.2,
            labels: vec![],
            contributions: Some(vec![]),
        };
        let window = AnalysisWindow {
            start: 0,
            end: 5,
            low_confidence: true,
        };
        let feedback = build_feedback(&inference, Orientation::Unknown, &window);
        assert_eq!(feedback.issues.len(), 2);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = sample_report();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("shotType").is_some());
        assert!(value.get("measurements").is_some());
        assert!(value["window"].get("lowConfidence").is_some());
    }
}
