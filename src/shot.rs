use serde::{Deserialize, Serialize};
use tracing::warn;

/// ショット種別
///
/// モーションプロファイル（境界検出の閾値）とヒューリスティック採点の
/// 理想角度レンジをパラメータ化する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotType {
    FreeThrow,
    JumpShot,
    ThreePoint,
}

impl ShotType {
    /// ペイロードのラベル文字列から解決
    ///
    /// 未指定・未知のラベルは JumpShot にフォールバック（警告ログのみ、
    /// エラーにはしない）
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            None => Self::JumpShot,
            Some(s) => match s {
                "free-throw" | "free_throw" | "freethrow" => Self::FreeThrow,
                "jump-shot" | "jump_shot" | "jumpshot" => Self::JumpShot,
                "three-point" | "three_point" | "threepoint" | "three" => Self::ThreePoint,
                other => {
                    warn!(shot_type = other, "unknown shot type, assuming jump-shot");
                    Self::JumpShot
                }
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FreeThrow => "free-throw",
            Self::JumpShot => "jump-shot",
            Self::ThreePoint => "three-point",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label() {
        assert_eq!(ShotType::from_label(Some("free-throw")), ShotType::FreeThrow);
        assert_eq!(ShotType::from_label(Some("three_point")), ShotType::ThreePoint);
        assert_eq!(ShotType::from_label(None), ShotType::JumpShot);
        assert_eq!(ShotType::from_label(Some("dunk")), ShotType::JumpShot);
    }

    #[test]
    fn test_label_roundtrip() {
        for shot in [ShotType::FreeThrow, ShotType::JumpShot, ShotType::ThreePoint] {
            assert_eq!(ShotType::from_label(Some(shot.label())), shot);
        }
    }
}
