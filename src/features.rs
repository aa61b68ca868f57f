//! 関節角度・距離の特徴量エンジン
//!
//! 区間内の各フレームから関節角度と肩腰オフセットを計測する。
//! 純関数であり、同じ入力に対して常に同じ系列を返す。必要な
//! キーポイントが可視度下限未満ならその計測値だけが None になる。

use serde::Serialize;

use crate::boundary::AnalysisWindow;
use crate::pose::{Frame, Keypoint, LandmarkIndex};

/// 計測対象の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleKind {
    Elbow,
    Knee,
    Hip,
    Shoulder,
    Wrist,
    ShoulderHipOffset,
}

impl AngleKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Elbow => "elbow",
            Self::Knee => "knee",
            Self::Hip => "hip",
            Self::Shoulder => "shoulder",
            Self::Wrist => "wrist",
            Self::ShoulderHipOffset => "shoulder_hip_offset",
        }
    }
}

/// シュートサイド（計測に使う半身）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn shoulder(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftShoulder,
            Self::Right => LandmarkIndex::RightShoulder,
        }
    }
    fn elbow(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftElbow,
            Self::Right => LandmarkIndex::RightElbow,
        }
    }
    fn wrist(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftWrist,
            Self::Right => LandmarkIndex::RightWrist,
        }
    }
    fn index_finger(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftIndex,
            Self::Right => LandmarkIndex::RightIndex,
        }
    }
    fn hip(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftHip,
            Self::Right => LandmarkIndex::RightHip,
        }
    }
    fn knee(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftKnee,
            Self::Right => LandmarkIndex::RightKnee,
        }
    }
    fn ankle(&self) -> LandmarkIndex {
        match self {
            Self::Left => LandmarkIndex::LeftAnkle,
            Self::Right => LandmarkIndex::RightAnkle,
        }
    }
}

/// 1フレーム分の計測結果。計測不能な項目は None
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeasurement {
    pub frame_index: u32,
    pub time_sec: f64,
    pub elbow_deg: Option<f32>,
    pub knee_deg: Option<f32>,
    pub hip_deg: Option<f32>,
    pub shoulder_deg: Option<f32>,
    pub wrist_deg: Option<f32>,
    pub shoulder_hip_offset: Option<f32>,
}

impl FrameMeasurement {
    pub fn value(&self, kind: AngleKind) -> Option<f32> {
        match kind {
            AngleKind::Elbow => self.elbow_deg,
            AngleKind::Knee => self.knee_deg,
            AngleKind::Hip => self.hip_deg,
            AngleKind::Shoulder => self.shoulder_deg,
            AngleKind::Wrist => self.wrist_deg,
            AngleKind::ShoulderHipOffset => self.shoulder_hip_offset,
        }
    }
}

/// 頂点 b における平面3点角度（度、0〜180）
///
/// どちらかのベクトルが退化している場合は None
pub fn angle_at(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> Option<f32> {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);
    let norm_ba = (bax * bax + bay * bay).sqrt();
    let norm_bc = (bcx * bcx + bcy * bcy).sqrt();
    if norm_ba < f32::EPSILON || norm_bc < f32::EPSILON {
        return None;
    }
    let cos = ((bax * bcx + bay * bcy) / (norm_ba * norm_bc)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

fn joint_angle(
    frame: &Frame,
    a: LandmarkIndex,
    b: LandmarkIndex,
    c: LandmarkIndex,
    visibility_floor: f32,
) -> Option<f32> {
    let (ka, kb, kc) = (frame.get(a), frame.get(b), frame.get(c));
    if ka.is_valid(visibility_floor) && kb.is_valid(visibility_floor) && kc.is_valid(visibility_floor)
    {
        angle_at(ka, kb, kc)
    } else {
        None
    }
}

/// 区間全体の腕チェーン可視度からシュートサイドを一度だけ決める
///
/// フレームごとに切り替わると角度系列が跳ぶため、区間で固定する
pub fn shooting_side(frames: &[Frame], window: &AnalysisWindow) -> Side {
    let mut left = 0.0f32;
    let mut right = 0.0f32;
    for frame in &frames[window.start..=window.end] {
        for lm in [
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::LeftElbow,
            LandmarkIndex::LeftWrist,
            LandmarkIndex::LeftIndex,
        ] {
            left += frame.get(lm).visibility;
        }
        for lm in [
            LandmarkIndex::RightShoulder,
            LandmarkIndex::RightElbow,
            LandmarkIndex::RightWrist,
            LandmarkIndex::RightIndex,
        ] {
            right += frame.get(lm).visibility;
        }
    }
    if left > right {
        Side::Left
    } else {
        Side::Right
    }
}

fn measure_frame(frame: &Frame, side: Side, visibility_floor: f32) -> FrameMeasurement {
    let elbow_deg = joint_angle(
        frame,
        side.shoulder(),
        side.elbow(),
        side.wrist(),
        visibility_floor,
    );
    let knee_deg = joint_angle(frame, side.hip(), side.knee(), side.ankle(), visibility_floor);
    let hip_deg = joint_angle(
        frame,
        side.shoulder(),
        side.hip(),
        side.knee(),
        visibility_floor,
    );
    let shoulder_deg = joint_angle(
        frame,
        side.elbow(),
        side.shoulder(),
        side.hip(),
        visibility_floor,
    );
    let wrist_deg = joint_angle(
        frame,
        side.elbow(),
        side.wrist(),
        side.index_finger(),
        visibility_floor,
    );

    let shoulder_hip_offset = frame
        .midpoint(
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::RightShoulder,
            visibility_floor,
        )
        .zip(frame.midpoint(
            LandmarkIndex::LeftHip,
            LandmarkIndex::RightHip,
            visibility_floor,
        ))
        .map(|((sx, _), (hx, _))| (sx - hx).abs());

    FrameMeasurement {
        frame_index: frame.index,
        time_sec: frame.time_sec,
        elbow_deg,
        knee_deg,
        hip_deg,
        shoulder_deg,
        wrist_deg,
        shoulder_hip_offset,
    }
}

/// 区間内の全フレームを計測する（純関数）
pub fn compute_measurements(
    frames: &[Frame],
    window: &AnalysisWindow,
    side: Side,
    visibility_floor: f32,
) -> Vec<FrameMeasurement> {
    frames[window.start..=window.end]
        .iter()
        .map(|frame| measure_frame(frame, side, visibility_floor))
        .collect()
}
