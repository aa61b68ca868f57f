//! ルールベースの採点フォールバック
//!
//! 区間統計（肘は最大伸展、膝は最深屈曲など）を理想レンジと比較し、
//! 重み付き逸脱からスコアを作る。モデルと同一のスキーマを返す。

use crate::config::HeuristicConfig;
use crate::features::{AngleKind, FrameMeasurement};
use crate::inference::{AngleContribution, InferenceResult, InferenceSource};
use crate::orientation::Capabilities;
use crate::shot::ShotType;

/// 肩腰オフセットの逸脱正規化幅（正規化座標単位）
const OFFSET_TOLERANCE: f32 = 0.08;

/// 向き不明で全項目にフォールバックしたときの信頼度上限
const UNKNOWN_VIEW_CONFIDENCE_CAP: f32 = 0.5;

/// 計測項目ごとの理想レンジ
#[derive(Debug, Clone, Copy)]
pub struct IdealRange {
    pub kind: AngleKind,
    pub min: f32,
    pub max: f32,
    pub weight: f32,
}

const fn range(kind: AngleKind, min: f32, max: f32, weight: f32) -> IdealRange {
    IdealRange {
        kind,
        min,
        max,
        weight,
    }
}

/// ショット種別ごとの理想レンジ表
///
/// 角度は度、オフセットは正規化座標。較正用の出発点であって
/// 競技レベルごとに調整される前提
pub fn ideal_ranges(shot_type: ShotType) -> &'static [IdealRange] {
    static FREE_THROW_RANGES: [IdealRange; 6] = [
        range(AngleKind::Elbow, 155.0, 180.0, 3.0),
        range(AngleKind::Knee, 100.0, 140.0, 2.0),
        range(AngleKind::Hip, 110.0, 160.0, 2.0),
        range(AngleKind::Shoulder, 90.0, 150.0, 2.0),
        range(AngleKind::Wrist, 120.0, 180.0, 1.0),
        range(AngleKind::ShoulderHipOffset, 0.0, 0.06, 2.0),
    ];
    static JUMP_SHOT_RANGES: [IdealRange; 6] = [
        range(AngleKind::Elbow, 150.0, 180.0, 3.0),
        range(AngleKind::Knee, 90.0, 130.0, 3.0),
        range(AngleKind::Hip, 100.0, 150.0, 2.0),
        range(AngleKind::Shoulder, 90.0, 160.0, 2.0),
        range(AngleKind::Wrist, 120.0, 180.0, 1.0),
        range(AngleKind::ShoulderHipOffset, 0.0, 0.08, 2.0),
    ];
    static THREE_POINT_RANGES: [IdealRange; 6] = [
        range(AngleKind::Elbow, 150.0, 180.0, 3.0),
        range(AngleKind::Knee, 85.0, 125.0, 3.0),
        range(AngleKind::Hip, 95.0, 145.0, 2.0),
        range(AngleKind::Shoulder, 95.0, 165.0, 2.0),
        range(AngleKind::Wrist, 120.0, 180.0, 1.0),
        range(AngleKind::ShoulderHipOffset, 0.0, 0.10, 2.0),
    ];
    match shot_type {
        ShotType::FreeThrow => &FREE_THROW_RANGES,
        ShotType::JumpShot => &JUMP_SHOT_RANGES,
        ShotType::ThreePoint => &THREE_POINT_RANGES,
    }
}

/// 項目ごとの区間代表値
///
/// 伸展系（肘・肩・手首）はピーク、屈曲系（膝・股）は最深値、
/// オフセットは平均を採る
fn window_statistic(measurements: &[FrameMeasurement], kind: AngleKind) -> Option<f32> {
    let values: Vec<f32> = measurements.iter().filter_map(|m| m.value(kind)).collect();
    if values.is_empty() {
        return None;
    }
    let stat = match kind {
        AngleKind::Elbow | AngleKind::Shoulder | AngleKind::Wrist => {
            values.iter().cloned().fold(f32::MIN, f32::max)
        }
        AngleKind::Knee | AngleKind::Hip => values.iter().cloned().fold(f32::MAX, f32::min),
        AngleKind::ShoulderHipOffset => values.iter().sum::<f32>() / values.len() as f32,
    };
    Some(stat)
}

/// ヒューリスティック採点
///
/// 信頼できる計測対象が空（向き不明）なら全項目で採点した上で
/// 信頼度に上限をかける。計測値が一つも無い場合は中立スコア
pub fn score(
    measurements: &[FrameMeasurement],
    shot_type: ShotType,
    capabilities: &Capabilities,
    window_low_confidence: bool,
    config: &HeuristicConfig,
) -> InferenceResult {
    let all_ranges = ideal_ranges(shot_type);
    let unknown_view = capabilities.reliable.is_empty();
    let considered: Vec<&IdealRange> = if unknown_view {
        all_ranges.iter().collect()
    } else {
        all_ranges
            .iter()
            .filter(|r| capabilities.is_reliable(r.kind))
            .collect()
    };

    let mut contributions = Vec::new();
    let mut labels = Vec::new();
    let mut penalty_sum = 0.0f32;
    let mut weight_with_data = 0.0f32;
    let total_weight: f32 = considered.iter().map(|r| r.weight).sum();

    for target in &considered {
        let Some(observed) = window_statistic(measurements, target.kind) else {
            continue;
        };
        let deviation = if observed < target.min {
            target.min - observed
        } else if observed > target.max {
            observed - target.max
        } else {
            0.0
        };
        let tolerance = match target.kind {
            AngleKind::ShoulderHipOffset => OFFSET_TOLERANCE,
            _ => config.tolerance_deg,
        };
        let penalty = target.weight * (deviation / tolerance).min(1.0);

        if penalty / target.weight > 0.6 {
            labels.push(format!("{}_out_of_range", target.kind.name()));
        }
        penalty_sum += penalty;
        weight_with_data += target.weight;
        contributions.push(AngleContribution {
            kind: target.kind,
            observed,
            ideal_min: target.min,
            ideal_max: target.max,
            penalty,
        });
    }

    let score = if weight_with_data > 0.0 {
        (100.0 * (1.0 - penalty_sum / weight_with_data)).clamp(0.0, 100.0)
    } else {
        50.0
    };

    let mut confidence = if total_weight > 0.0 {
        weight_with_data / total_weight
    } else {
        0.0
    };
    if unknown_view {
        confidence = confidence.min(UNKNOWN_VIEW_CONFIDENCE_CAP);
    }
    if window_low_confidence {
        confidence *= 0.5;
    }

    InferenceResult {
        source: InferenceSource::Heuristic,
        score,
        confidence: confidence.clamp(0.0, 1.0),
        labels,
        contributions: Some(contributions),
    }
}
