use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 解析パイプライン設定
///
/// モデルパスは環境変数ではなく必ずここ経由で注入する。閾値類は
/// ラベル付きクリップでの較正を前提としたパラメータで、既定値は
/// 較正の出発点にすぎない
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// ONNXモデルのパス。None ならヒューリスティックのみで動作
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// キーポイント可視度の下限。未満は欠損扱い
    #[serde(default = "default_visibility_floor")]
    pub visibility_floor: f32,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub heuristic: HeuristicConfig,
}

/// 境界検出（start/end）の較正パラメータ
///
/// 閾値の単位は正規化身長あたりの垂直速度 (1/s)。None なら
/// ショット種別ごとの既定プロファイルを使う
#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryConfig {
    #[serde(default)]
    pub start_threshold: Option<f32>,
    #[serde(default)]
    pub quiescence_threshold: Option<f32>,
    /// 立ち上がり検出のヒステリシス（連続フレーム数）
    #[serde(default = "default_hysteresis_frames")]
    pub hysteresis_frames: usize,
}

/// ヒューリスティック採点の較正パラメータ
#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicConfig {
    /// 理想レンジ外の逸脱がこの角度に達したら重み満額のペナルティ
    #[serde(default = "default_tolerance_deg")]
    pub tolerance_deg: f32,
}

fn default_visibility_floor() -> f32 {
    0.25
}
fn default_hysteresis_frames() -> usize {
    2
}
fn default_tolerance_deg() -> f32 {
    25.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            visibility_floor: default_visibility_floor(),
            boundary: BoundaryConfig::default(),
            heuristic: HeuristicConfig::default(),
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            start_threshold: None,
            quiescence_threshold: None,
            hysteresis_frames: default_hysteresis_frames(),
        }
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            tolerance_deg: default_tolerance_deg(),
        }
    }
}

impl AnalysisConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// ファイルがなければ既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.model_path.is_none());
        assert_eq!(config.visibility_floor, 0.25);
        assert_eq!(config.boundary.hysteresis_frames, 2);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            model_path = "models/shot_tcn.onnx"

            [boundary]
            start_threshold = 0.4
            "#,
        )
        .unwrap();
        assert_eq!(
            config.model_path.as_deref(),
            Some(Path::new("models/shot_tcn.onnx"))
        );
        assert_eq!(config.boundary.start_threshold, Some(0.4));
        assert_eq!(config.boundary.quiescence_threshold, None);
        assert_eq!(config.heuristic.tolerance_deg, 25.0);
    }
}
