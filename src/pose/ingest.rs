//! JSONペイロードの取り込み境界
//!
//! 上流（キーポイント抽出サービス）の出力をそのまま受け取り、
//! 構造検証した上で固定長配列の Frame 列へ変換する。未知の
//! ランドマーク名はここで拒否する。

use serde::Deserialize;

use crate::error::AnalysisError;
use crate::pose::keypoint::{Frame, Keypoint, LandmarkIndex};
use crate::shot::ShotType;

/// 外部ペイロード（camelCase JSON）
///
/// `fps` / `version` は受理するがコアでは使用しない
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    pub frames: Vec<RawFrame>,
    #[serde(default)]
    pub shot_type: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFrame {
    pub index: u32,
    pub time_sec: f64,
    pub keypoints: Vec<RawKeypoint>,
}

#[derive(Debug, Deserialize)]
pub struct RawKeypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// 旧ペイロードは "score" キーを使う
    #[serde(default, alias = "score")]
    pub visibility: Option<f32>,
}

/// JSON文字列からフレーム列とショット種別を構築
pub fn parse_payload(json: &str) -> Result<(Vec<Frame>, ShotType), AnalysisError> {
    let payload: RawPayload = serde_json::from_str(json)?;
    let shot_type = ShotType::from_label(payload.shot_type.as_deref());
    let frames = validate_frames(payload.frames)?;
    Ok((frames, shot_type))
}

/// 構造検証 + 固定長配列への変換
///
/// - フレーム列は非空、index は厳密増加、time_sec は非減少
/// - 未知・重複のランドマーク名はエラー（取り込み境界で拒否）
/// - リストにないランドマークは可視度 0 のデフォルト値（欠損扱い）
pub fn validate_frames(raw: Vec<RawFrame>) -> Result<Vec<Frame>, AnalysisError> {
    if raw.is_empty() {
        return Err(AnalysisError::EmptyFrames);
    }

    let mut frames = Vec::with_capacity(raw.len());
    for (pos, rf) in raw.into_iter().enumerate() {
        if let Some(prev) = frames.last() {
            let prev: &Frame = prev;
            if rf.index <= prev.index || rf.time_sec < prev.time_sec {
                return Err(AnalysisError::NonMonotonicFrames { position: pos });
            }
        }

        let mut keypoints = [Keypoint::default(); LandmarkIndex::COUNT];
        let mut seen = [false; LandmarkIndex::COUNT];
        for rk in &rf.keypoints {
            let lm = LandmarkIndex::from_name(&rk.name).ok_or_else(|| {
                AnalysisError::UnknownLandmark {
                    name: rk.name.clone(),
                }
            })?;
            if seen[lm as usize] {
                return Err(AnalysisError::DuplicateLandmark {
                    name: rk.name.clone(),
                });
            }
            seen[lm as usize] = true;
            let visibility = rk.visibility.unwrap_or(0.0).clamp(0.0, 1.0);
            keypoints[lm as usize] = Keypoint::new(rk.x, rk.y, visibility);
        }
        frames.push(Frame::new(rf.index, rf.time_sec, keypoints));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_json(frames: &str) -> String {
        format!(r#"{{"frames": {}, "shotType": "jump-shot"}}"#, frames)
    }

    #[test]
    fn test_parse_minimal_payload() {
        let json = payload_json(
            r#"[
                {"index": 0, "timeSec": 0.0, "keypoints": [
                    {"name": "left_hip", "x": 0.4, "y": 0.6, "visibility": 0.9}
                ]},
                {"index": 1, "timeSec": 0.033, "keypoints": []}
            ]"#,
        );
        let (frames, shot) = parse_payload(&json).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(shot, ShotType::JumpShot);
        assert_eq!(frames[0].get(LandmarkIndex::LeftHip).x, 0.4);
        // リストにないランドマークは可視度 0
        assert_eq!(frames[0].get(LandmarkIndex::Nose).visibility, 0.0);
    }

    #[test]
    fn test_legacy_score_alias() {
        let json = payload_json(
            r#"[{"index": 0, "timeSec": 0.0, "keypoints": [
                {"name": "nose", "x": 0.5, "y": 0.2, "score": 0.8}
            ]}]"#,
        );
        let (frames, _) = parse_payload(&json).unwrap();
        assert_eq!(frames[0].get(LandmarkIndex::Nose).visibility, 0.8);
    }

    #[test]
    fn test_empty_frames_rejected() {
        let json = payload_json("[]");
        assert!(matches!(
            parse_payload(&json),
            Err(AnalysisError::EmptyFrames)
        ));
    }

    #[test]
    fn test_unknown_landmark_rejected() {
        let json = payload_json(
            r#"[{"index": 0, "timeSec": 0.0, "keypoints": [
                {"name": "left_tail", "x": 0.5, "y": 0.5, "visibility": 1.0}
            ]}]"#,
        );
        match parse_payload(&json) {
            Err(AnalysisError::UnknownLandmark { name }) => assert_eq!(name, "left_tail"),
            other => panic!("expected UnknownLandmark, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_monotonic_index_rejected() {
        let json = payload_json(
            r#"[
                {"index": 0, "timeSec": 0.0, "keypoints": []},
                {"index": 0, "timeSec": 0.033, "keypoints": []}
            ]"#,
        );
        assert!(matches!(
            parse_payload(&json),
            Err(AnalysisError::NonMonotonicFrames { position: 1 })
        ));
    }

    #[test]
    fn test_decreasing_time_rejected() {
        // index は増えているがタイムスタンプが巻き戻っている
        let json = payload_json(
            r#"[
                {"index": 0, "timeSec": 0.5, "keypoints": []},
                {"index": 1, "timeSec": 0.2, "keypoints": []}
            ]"#,
        );
        let err = parse_payload(&json).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::NonMonotonicFrames { position: 1 }
        ));
        assert!(err.to_string().contains("timestamps"));
    }

    #[test]
    fn test_duplicate_landmark_rejected() {
        let json = payload_json(
            r#"[{"index": 0, "timeSec": 0.0, "keypoints": [
                {"name": "left_hip", "x": 0.4, "y": 0.6, "visibility": 0.9},
                {"name": "left_hip", "x": 0.5, "y": 0.7, "visibility": 0.8}
            ]}]"#,
        );
        match parse_payload(&json) {
            Err(AnalysisError::DuplicateLandmark { name }) => assert_eq!(name, "left_hip"),
            other => panic!("expected DuplicateLandmark, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_visibility_clamped() {
        let json = payload_json(
            r#"[{"index": 0, "timeSec": 0.0, "keypoints": [
                {"name": "nose", "x": 0.5, "y": 0.2, "visibility": 1.7}
            ]}]"#,
        );
        let (frames, _) = parse_payload(&json).unwrap();
        assert_eq!(frames[0].get(LandmarkIndex::Nose).visibility, 1.0);
    }
}
