use thiserror::Error;

/// 解析カーネルの致命的エラー
///
/// 構造的に不正な入力のみが呼び出し元へ返る。キーポイント欠損や
/// モデル不在などの数値的・可用性の問題はパイプライン内で
/// 劣化処理され、エラーにはならない。
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("frame sequence is empty")]
    EmptyFrames,

    #[error("insufficient frames: need at least {needed}, got {got}")]
    InsufficientFrames { needed: usize, got: usize },

    #[error("unknown landmark name: {name}")]
    UnknownLandmark { name: String },

    #[error("duplicate landmark name in frame: {name}")]
    DuplicateLandmark { name: String },

    #[error("frame ordering violated at position {position}: indices must be strictly increasing and timestamps non-decreasing")]
    NonMonotonicFrames { position: usize },

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}
