/// MediaPipe Pose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

const LANDMARK_NAMES: [&str; LandmarkIndex::COUNT] = [
    "nose",
    "left_eye_inner",
    "left_eye",
    "left_eye_outer",
    "right_eye_inner",
    "right_eye",
    "right_eye_outer",
    "left_ear",
    "right_ear",
    "mouth_left",
    "mouth_right",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_pinky",
    "right_pinky",
    "left_index",
    "right_index",
    "left_thumb",
    "right_thumb",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_heel",
    "right_heel",
    "left_foot_index",
    "right_foot_index",
];

const ALL_LANDMARKS: [LandmarkIndex; LandmarkIndex::COUNT] = [
    LandmarkIndex::Nose,
    LandmarkIndex::LeftEyeInner,
    LandmarkIndex::LeftEye,
    LandmarkIndex::LeftEyeOuter,
    LandmarkIndex::RightEyeInner,
    LandmarkIndex::RightEye,
    LandmarkIndex::RightEyeOuter,
    LandmarkIndex::LeftEar,
    LandmarkIndex::RightEar,
    LandmarkIndex::MouthLeft,
    LandmarkIndex::MouthRight,
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftElbow,
    LandmarkIndex::RightElbow,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
    LandmarkIndex::LeftPinky,
    LandmarkIndex::RightPinky,
    LandmarkIndex::LeftIndex,
    LandmarkIndex::RightIndex,
    LandmarkIndex::LeftThumb,
    LandmarkIndex::RightThumb,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
    LandmarkIndex::LeftHeel,
    LandmarkIndex::RightHeel,
    LandmarkIndex::LeftFootIndex,
    LandmarkIndex::RightFootIndex,
];

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    pub fn from_index(index: usize) -> Option<Self> {
        ALL_LANDMARKS.get(index).copied()
    }

    /// 検出器が出力するランドマーク名から解決。未知の名前は None
    pub fn from_name(name: &str) -> Option<Self> {
        LANDMARK_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(Self::from_index)
    }

    pub fn name(&self) -> &'static str {
        LANDMARK_NAMES[*self as usize]
    }
}

/// 単一キーポイント（正規化座標 + 可視度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 可視度スコア (0.0〜1.0)。欠損時は 0.0
    pub visibility: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// 可視度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            visibility: 0.0,
        }
    }
}

/// 1フレーム分の姿勢観測
///
/// キーポイントは LandmarkIndex で引く固定長配列。名前の重複は
/// 構造上あり得ない
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u32,
    pub time_sec: f64,
    pub keypoints: [Keypoint; LandmarkIndex::COUNT],
}

impl Frame {
    pub fn new(index: u32, time_sec: f64, keypoints: [Keypoint; LandmarkIndex::COUNT]) -> Self {
        Self {
            index,
            time_sec,
            keypoints,
        }
    }

    pub fn get(&self, index: LandmarkIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// 左右ペアの中点。どちらかが閾値未満なら None
    pub fn midpoint(
        &self,
        left: LandmarkIndex,
        right: LandmarkIndex,
        threshold: f32,
    ) -> Option<(f32, f32)> {
        let l = self.get(left);
        let r = self.get(right);
        if l.is_valid(threshold) && r.is_valid(threshold) {
            Some(((l.x + r.x) / 2.0, (l.y + r.y) / 2.0))
        } else {
            None
        }
    }

    /// 全キーポイントの平均可視度
    pub fn average_visibility(&self) -> f32 {
        let sum: f32 = self.keypoints.iter().map(|k| k.visibility).sum();
        sum / LandmarkIndex::COUNT as f32
    }
}
