//! リクエスト単位の同期パイプライン
//!
//! 取り込み → 向き分類 → 境界検出 → 特徴量 → 採点 → 合成 を
//! この順で実行する。モデル関連の失敗は内部で吸収され、呼び出し側に
//! 返るエラーは入力の構造不正のみ。

use tracing::{debug, info};

use crate::boundary;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features;
use crate::inference::ShotScorer;
use crate::orientation::{self, Capabilities};
use crate::pose::{self, Frame};
use crate::report::{self, AnalysisReport, NarrativeGenerator};
use crate::shot::ShotType;

/// 解析パイプライン本体。プロセス内で1つ作って使い回す
pub struct Analyzer {
    config: AnalysisConfig,
    scorer: ShotScorer,
}

impl Analyzer {
    /// 設定からパイプラインを構築。モデルのロードはここで1回だけ試みる
    pub fn new(config: AnalysisConfig) -> Self {
        let scorer = ShotScorer::new(&config);
        Self { config, scorer }
    }

    pub fn has_model(&self) -> bool {
        self.scorer.has_model()
    }

    /// JSONペイロードを解析する
    pub fn analyze_json(&self, json: &str) -> Result<AnalysisReport, AnalysisError> {
        let (frames, shot_type) = pose::parse_payload(json)?;
        self.analyze(&frames, shot_type)
    }

    /// 検証済みフレーム列を解析する
    pub fn analyze(
        &self,
        frames: &[Frame],
        shot_type: ShotType,
    ) -> Result<AnalysisReport, AnalysisError> {
        if frames.is_empty() {
            return Err(AnalysisError::EmptyFrames);
        }
        let floor = self.config.visibility_floor;

        let orientation = orientation::classify(frames, floor);
        let capabilities = Capabilities::for_orientation(orientation.orientation);
        debug!(
            orientation = ?orientation.orientation,
            confidence = orientation.confidence,
            "camera orientation classified"
        );

        let window = boundary::detect_window(frames, shot_type, &self.config.boundary, floor)?;
        debug!(
            start = window.start,
            end = window.end,
            low_confidence = window.low_confidence,
            "analysis window detected"
        );

        let side = features::shooting_side(frames, &window);
        let measurements = features::compute_measurements(frames, &window, side, floor);

        let inference = self.scorer.infer(
            frames,
            &window,
            &measurements,
            shot_type,
            &capabilities,
            &self.config,
        );
        info!(
            source = ?inference.source,
            score = inference.score,
            confidence = inference.confidence,
            "shot scored"
        );

        Ok(report::compose(
            shot_type,
            orientation,
            capabilities,
            window,
            measurements,
            inference,
        ))
    }

    /// 解析してナレーションも付与する。ナレーション失敗は握りつぶす
    pub fn analyze_with_narrative(
        &self,
        frames: &[Frame],
        shot_type: ShotType,
        narrator: &dyn NarrativeGenerator,
    ) -> Result<AnalysisReport, AnalysisError> {
        let mut report = self.analyze(frames, shot_type)?;
        report::enrich(&mut report, narrator);
        Ok(report)
    }
}
