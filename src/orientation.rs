//! カメラ向きの分類
//!
//! 姿勢の左右非対称性から正面・側面を推定する。各シグナルが
//! 重み付き票を投じ、合計で判定する多数決方式。判定不能は
//! Unknown であってエラーではない。

use serde::Serialize;

use crate::features::AngleKind;
use crate::pose::{Frame, LandmarkIndex};

const EPS: f32 = 1e-6;

/// カメラから見た選手の向き
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Frontal,
    LateralLeft,
    LateralRight,
    Unknown,
}

impl Orientation {
    pub fn is_lateral(&self) -> bool {
        matches!(self, Self::LateralLeft | Self::LateralRight)
    }
}

/// 向きごとに信頼できる計測対象の集合
///
/// 正面視では股関節・膝の屈伸が奥行きに潰れるため運動連鎖系の
/// 角度を外す。Unknown は空集合
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub reliable: Vec<AngleKind>,
    pub recommendation: &'static str,
}

impl Capabilities {
    pub fn for_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::LateralLeft | Orientation::LateralRight => Self {
                reliable: vec![
                    AngleKind::Elbow,
                    AngleKind::Knee,
                    AngleKind::Hip,
                    AngleKind::Shoulder,
                    AngleKind::Wrist,
                    AngleKind::ShoulderHipOffset,
                ],
                recommendation: "lateral view: full kinetic chain analysis available",
            },
            Orientation::Frontal => Self {
                reliable: vec![
                    AngleKind::Elbow,
                    AngleKind::Shoulder,
                    AngleKind::Wrist,
                    AngleKind::ShoulderHipOffset,
                ],
                recommendation:
                    "frontal view: hip and knee flexion collapse in depth, upload a profile video for full analysis",
            },
            Orientation::Unknown => Self {
                reliable: Vec::new(),
                recommendation: "orientation undetermined: analysis may be partial",
            },
        }
    }

    pub fn is_reliable(&self, kind: AngleKind) -> bool {
        self.reliable.contains(&kind)
    }
}

/// 判定に使ったシグナルの生値（デバッグ用に保持）
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationMetrics {
    pub shoulder_visibility: f32,
    pub shoulder_vis_diff_avg: f32,
    pub ear_vis_diff_avg: f32,
    pub wrist_verticality_avg: f32,
    pub lateral_strength: f32,
    pub frontal_strength: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationResult {
    pub orientation: Orientation,
    pub confidence: f32,
    pub metrics: OrientationMetrics,
}

fn average(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// フレーム列からカメラ向きを分類する
///
/// シグナル:
/// - 左右肩の可視度差（側面では奥の肩が隠れる）
/// - 左右耳の可視度差
/// - 支配的な手首の縦横移動比（シュート動作は側面視で縦に出る）
pub fn classify(frames: &[Frame], visibility_floor: f32) -> OrientationResult {
    if frames.is_empty() {
        return OrientationResult {
            orientation: Orientation::Unknown,
            confidence: 0.0,
            metrics: OrientationMetrics::default(),
        };
    }

    let mut shoulder_visible_count = 0usize;
    let mut shoulder_vis_diff = Vec::new();
    let mut ear_vis_diff = Vec::new();
    let mut wrist_ratios = Vec::new();

    // 側面判定時の向き（左半身/右半身どちらがカメラ側か）
    let mut left_side_vis = 0.0f32;
    let mut right_side_vis = 0.0f32;

    for (i, frame) in frames.iter().enumerate() {
        let ls = frame.get(LandmarkIndex::LeftShoulder);
        let rs = frame.get(LandmarkIndex::RightShoulder);
        if ls.is_valid(visibility_floor) && rs.is_valid(visibility_floor) {
            shoulder_visible_count += 1;
            shoulder_vis_diff.push((rs.visibility - ls.visibility).abs());
        }

        let le = frame.get(LandmarkIndex::LeftEar);
        let re = frame.get(LandmarkIndex::RightEar);
        if le.is_valid(visibility_floor) && re.is_valid(visibility_floor) {
            ear_vis_diff.push((re.visibility - le.visibility).abs());
        }

        for lm in [
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::LeftElbow,
            LandmarkIndex::LeftHip,
            LandmarkIndex::LeftEar,
        ] {
            left_side_vis += frame.get(lm).visibility;
        }
        for lm in [
            LandmarkIndex::RightShoulder,
            LandmarkIndex::RightElbow,
            LandmarkIndex::RightHip,
            LandmarkIndex::RightEar,
        ] {
            right_side_vis += frame.get(lm).visibility;
        }

        if i == 0 {
            continue;
        }
        let prev = &frames[i - 1];
        let lw = frame.get(LandmarkIndex::LeftWrist);
        let rw = frame.get(LandmarkIndex::RightWrist);
        let (wrist_lm, wrist) = if rw.is_valid(visibility_floor)
            && (!lw.is_valid(visibility_floor) || rw.visibility >= lw.visibility)
        {
            (LandmarkIndex::RightWrist, rw)
        } else if lw.is_valid(visibility_floor) {
            (LandmarkIndex::LeftWrist, lw)
        } else {
            continue;
        };
        let prev_wrist = prev.get(wrist_lm);
        if !prev_wrist.is_valid(visibility_floor) {
            continue;
        }
        let dx = wrist.x - prev_wrist.x;
        let dy = wrist.y - prev_wrist.y;
        let ratio = dy.abs() / dx.abs().max(EPS);
        if ratio.is_finite() {
            wrist_ratios.push(ratio);
        }
    }

    let shoulder_vis_diff_avg = average(&shoulder_vis_diff);
    let ear_vis_diff_avg = average(&ear_vis_diff);
    let wrist_verticality_avg = average(&wrist_ratios);
    let shoulder_visibility = shoulder_visible_count as f32 / frames.len() as f32;

    // (側面寄与, 正面寄与) の重み付き票
    let mut lateral_strength = 0.0f32;
    let mut frontal_strength = 0.0f32;
    let mut contributions = 0usize;

    if !shoulder_vis_diff.is_empty() {
        if shoulder_vis_diff_avg >= 0.12 {
            lateral_strength += ((shoulder_vis_diff_avg - 0.1) / 0.4).clamp(0.0, 1.0);
            contributions += 1;
        } else if shoulder_vis_diff_avg <= 0.06 {
            frontal_strength += ((0.1 - shoulder_vis_diff_avg) / 0.1).clamp(0.0, 1.0);
            contributions += 1;
        }
    }
    if !ear_vis_diff.is_empty() {
        if ear_vis_diff_avg >= 0.2 {
            lateral_strength += ((ear_vis_diff_avg - 0.15) / 0.5).clamp(0.0, 1.0);
            contributions += 1;
        } else if ear_vis_diff_avg <= 0.08 {
            frontal_strength += ((0.12 - ear_vis_diff_avg) / 0.12).clamp(0.0, 1.0);
            contributions += 1;
        }
    }
    if !wrist_ratios.is_empty() {
        if wrist_verticality_avg >= 1.2 {
            lateral_strength += ((wrist_verticality_avg - 1.0) / 1.5).clamp(0.0, 1.0);
            contributions += 1;
        } else if wrist_verticality_avg <= 0.7 {
            frontal_strength += ((0.9 - wrist_verticality_avg) / 0.9).clamp(0.0, 1.0);
            contributions += 1;
        }
    }

    let total_strength = lateral_strength + frontal_strength;
    let lacks_variation =
        shoulder_vis_diff_avg < 0.02 && ear_vis_diff_avg < 0.02 && wrist_ratios.is_empty();

    let metrics = OrientationMetrics {
        shoulder_visibility,
        shoulder_vis_diff_avg,
        ear_vis_diff_avg,
        wrist_verticality_avg,
        lateral_strength,
        frontal_strength,
    };

    // 肩が見えていない・シグナル不足・引き分けは Unknown
    let orientation = if shoulder_visibility < 0.2 || lacks_variation || total_strength == 0.0 {
        Orientation::Unknown
    } else if lateral_strength > frontal_strength {
        if left_side_vis >= right_side_vis {
            Orientation::LateralLeft
        } else {
            Orientation::LateralRight
        }
    } else if frontal_strength > lateral_strength {
        Orientation::Frontal
    } else {
        Orientation::Unknown
    };

    let confidence = if orientation == Orientation::Unknown {
        0.0
    } else {
        (total_strength / contributions.max(1) as f32).clamp(0.0, 1.0)
    };

    OrientationResult {
        orientation,
        confidence,
        metrics,
    }
}
