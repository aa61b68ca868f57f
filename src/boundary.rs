//! ショット境界（開始・終了）の検出
//!
//! 腰中心の垂直速度を運動シグナルとして使う。腰が両方欠損した
//! フレームは膝中心で代替し、それも無ければ 0 とみなす。閾値は
//! 正規化身長あたりの速度 (1/s) で、ショット種別ごとの既定
//! プロファイルを設定で上書きできる。

use serde::Serialize;

use crate::config::BoundaryConfig;
use crate::error::AnalysisError;
use crate::pose::{Frame, LandmarkIndex};
use crate::shot::ShotType;

/// dt が壊れている場合に仮定するフレーム間隔
const FALLBACK_DT: f64 = 1.0 / 30.0;

/// 解析対象の閉区間。`start < end` を常に満たす
///
/// `low_confidence` は立ち上がりが検出できず全区間へフォールバック
/// したことを示す
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisWindow {
    pub start: usize,
    pub end: usize,
    pub low_confidence: bool,
}

impl AnalysisWindow {
    pub fn frame_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// ショット種別ごとの既定モーションプロファイル
#[derive(Debug, Clone, Copy)]
pub struct MotionProfile {
    pub start_threshold: f32,
    pub quiescence_threshold: f32,
}

impl MotionProfile {
    pub fn for_shot(shot_type: ShotType) -> Self {
        match shot_type {
            ShotType::FreeThrow => Self {
                start_threshold: 0.20,
                quiescence_threshold: 0.10,
            },
            ShotType::JumpShot => Self {
                start_threshold: 0.25,
                quiescence_threshold: 0.12,
            },
            ShotType::ThreePoint => Self {
                start_threshold: 0.30,
                quiescence_threshold: 0.15,
            },
        }
    }

    /// 設定の明示値があればそちらを優先
    pub fn with_overrides(self, config: &BoundaryConfig) -> Self {
        Self {
            start_threshold: config.start_threshold.unwrap_or(self.start_threshold),
            quiescence_threshold: config
                .quiescence_threshold
                .unwrap_or(self.quiescence_threshold),
        }
    }
}

/// 腰中心（フォールバック: 膝中心）のY座標
fn vertical_center(frame: &Frame, visibility_floor: f32) -> Option<f32> {
    frame
        .midpoint(LandmarkIndex::LeftHip, LandmarkIndex::RightHip, visibility_floor)
        .or_else(|| {
            frame.midpoint(
                LandmarkIndex::LeftKnee,
                LandmarkIndex::RightKnee,
                visibility_floor,
            )
        })
        .map(|(_, y)| y)
}

/// フレームごとの垂直速度 |dy|/dt。先頭と欠損は 0
pub fn motion_signal(frames: &[Frame], visibility_floor: f32) -> Vec<f32> {
    let mut signal = vec![0.0f32; frames.len()];
    for i in 1..frames.len() {
        let (Some(prev_y), Some(cur_y)) = (
            vertical_center(&frames[i - 1], visibility_floor),
            vertical_center(&frames[i], visibility_floor),
        ) else {
            continue;
        };
        let mut dt = frames[i].time_sec - frames[i - 1].time_sec;
        if dt <= 0.0 {
            dt = FALLBACK_DT;
        }
        signal[i] = ((cur_y - prev_y).abs() as f64 / dt) as f32;
    }
    signal
}

/// 3点移動平均。端は自身で埋める
pub fn smooth3(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    (0..n)
        .map(|i| {
            let prev = if i > 0 { signal[i - 1] } else { signal[i] };
            let next = if i + 1 < n { signal[i + 1] } else { signal[i] };
            (prev + signal[i] + next) / 3.0
        })
        .collect()
}

/// 立ち上がり検出
///
/// 平滑化シグナルが開始閾値を hysteresis フレーム連続で超えた最初の
/// 位置の1つ手前を開始とする。検出できなければ (0, true)
pub fn detect_start(
    frames: &[Frame],
    shot_type: ShotType,
    config: &BoundaryConfig,
    visibility_floor: f32,
) -> Result<(usize, bool), AnalysisError> {
    if frames.len() < 2 {
        return Err(AnalysisError::InsufficientFrames {
            needed: 2,
            got: frames.len(),
        });
    }
    let profile = MotionProfile::for_shot(shot_type).with_overrides(config);
    let signal = smooth3(&motion_signal(frames, visibility_floor));
    let hysteresis = config.hysteresis_frames.max(1);

    for i in 0..signal.len() {
        let run_end = (i + hysteresis).min(signal.len());
        if run_end - i < hysteresis {
            break;
        }
        if signal[i..run_end].iter().all(|&v| v >= profile.start_threshold) {
            let start = i.saturating_sub(1).min(frames.len() - 2);
            return Ok((start, false));
        }
    }
    Ok((0, true))
}

/// 終了検出
///
/// 開始以降のピークを過ぎて最初に静止閾値を下回った位置。戻らなければ
/// 最終フレーム。`start` は末尾2フレーム手前までに丸められ、どの経路でも
/// `start < end` が成り立つ
pub fn detect_end(
    frames: &[Frame],
    shot_type: ShotType,
    start: usize,
    config: &BoundaryConfig,
    visibility_floor: f32,
) -> Result<usize, AnalysisError> {
    if frames.len() < 3 {
        return Err(AnalysisError::InsufficientFrames {
            needed: 3,
            got: frames.len(),
        });
    }
    let profile = MotionProfile::for_shot(shot_type).with_overrides(config);
    let signal = smooth3(&motion_signal(frames, visibility_floor));

    let start = start.min(frames.len() - 2);
    let mut peak = start + 1;
    for i in (start + 1)..signal.len() {
        if signal[i] > signal[peak] {
            peak = i;
        }
    }
    for (i, &v) in signal.iter().enumerate().skip(peak + 1) {
        if v < profile.quiescence_threshold {
            return Ok(i);
        }
    }
    Ok(frames.len() - 1)
}

/// 開始と終了をまとめて検出する
///
/// 立ち上がりが見つからない場合は全区間 + low_confidence
pub fn detect_window(
    frames: &[Frame],
    shot_type: ShotType,
    config: &BoundaryConfig,
    visibility_floor: f32,
) -> Result<AnalysisWindow, AnalysisError> {
    let (start, low_confidence) = detect_start(frames, shot_type, config, visibility_floor)?;
    if low_confidence {
        return Ok(AnalysisWindow {
            start: 0,
            end: frames.len() - 1,
            low_confidence: true,
        });
    }
    let end = detect_end(frames, shot_type, start, config, visibility_floor)?;
    Ok(AnalysisWindow {
        start,
        end,
        low_confidence: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    /// 指定した腰中心Y座標列からフレームを組み立てる
    fn hip_frames(ys: &[f32]) -> Vec<Frame> {
        ys.iter()
            .enumerate()
            .map(|(i, &y)| {
                let mut keypoints = [Keypoint::default(); LandmarkIndex::COUNT];
                keypoints[LandmarkIndex::LeftHip as usize] = Keypoint::new(0.45, y, 0.9);
                keypoints[LandmarkIndex::RightHip as usize] = Keypoint::new(0.55, y, 0.9);
                Frame::new(i as u32, i as f64 / 30.0, keypoints)
            })
            .collect()
    }

    /// 静止 → 沈み込み/伸展 → 静止 のジャンプショット軌跡
    fn shot_trace() -> Vec<Frame> {
        hip_frames(&[0.60, 0.60, 0.60, 0.58, 0.55, 0.50, 0.45, 0.43, 0.43, 0.43])
    }

    #[test]
    fn test_window_bounds() {
        let frames = shot_trace();
        let window =
            detect_window(&frames, ShotType::JumpShot, &BoundaryConfig::default(), 0.25).unwrap();
        assert!(window.start < window.end);
        assert!(window.end < frames.len());
        assert!(!window.low_confidence);
    }

    #[test]
    fn test_window_covers_peak() {
        let frames = shot_trace();
        let window =
            detect_window(&frames, ShotType::JumpShot, &BoundaryConfig::default(), 0.25).unwrap();
        // 最大速度はフレーム5付近
        let signal = smooth3(&motion_signal(&frames, 0.25));
        let peak = (0..signal.len()).max_by(|&a, &b| signal[a].total_cmp(&signal[b])).unwrap();
        assert!(window.start <= peak && peak <= window.end);
    }

    #[test]
    fn test_too_few_frames_for_start() {
        let frames = hip_frames(&[0.6]);
        let err =
            detect_start(&frames, ShotType::JumpShot, &BoundaryConfig::default(), 0.25).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientFrames { needed: 2, got: 1 }
        ));
    }

    #[test]
    fn test_too_few_frames_for_end() {
        let frames = hip_frames(&[0.6, 0.5]);
        let err = detect_end(&frames, ShotType::JumpShot, 0, &BoundaryConfig::default(), 0.25)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientFrames { needed: 3, got: 2 }
        ));
    }

    #[test]
    fn test_end_with_last_frame_start_does_not_panic() {
        let frames = shot_trace();
        let end = detect_end(
            &frames,
            ShotType::JumpShot,
            frames.len() - 1,
            &BoundaryConfig::default(),
            0.25,
        )
        .unwrap();
        assert!(end > frames.len() - 2);
        assert!(end < frames.len());
    }

    #[test]
    fn test_flat_signal_falls_back_to_whole_sequence() {
        let frames = hip_frames(&[0.6; 8]);
        let window =
            detect_window(&frames, ShotType::JumpShot, &BoundaryConfig::default(), 0.25).unwrap();
        assert_eq!(window.start, 0);
        assert_eq!(window.end, 7);
        assert!(window.low_confidence);
    }

    #[test]
    fn test_missing_hips_uses_knees() {
        let mut frames = shot_trace();
        // 腰を膝に移し替えても同じシグナルになる
        for frame in &mut frames {
            let hip = frame.keypoints[LandmarkIndex::LeftHip as usize];
            frame.keypoints[LandmarkIndex::LeftKnee as usize] = hip;
            frame.keypoints[LandmarkIndex::RightKnee as usize] =
                frame.keypoints[LandmarkIndex::RightHip as usize];
            frame.keypoints[LandmarkIndex::LeftHip as usize] = Keypoint::default();
            frame.keypoints[LandmarkIndex::RightHip as usize] = Keypoint::default();
        }
        let window =
            detect_window(&frames, ShotType::JumpShot, &BoundaryConfig::default(), 0.25).unwrap();
        assert!(window.start < window.end);
        assert!(!window.low_confidence);
    }

    #[test]
    fn test_config_override_changes_detection() {
        let frames = shot_trace();
        let config = BoundaryConfig {
            // 誰も超えない開始閾値
            start_threshold: Some(100.0),
            quiescence_threshold: None,
            hysteresis_frames: 2,
        };
        let window = detect_window(&frames, ShotType::JumpShot, &config, 0.25).unwrap();
        assert!(window.low_confidence);
    }
}
