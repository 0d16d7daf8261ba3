/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 回復可能性をエラー型で表現（Pose/Capture は再試行対象、
///   InvalidMove / RestartExhausted は呼び出し側へ伝播する）

use thiserror::Error;

/// Domain層の統一エラー型
#[derive(Error, Debug)]
pub enum DomainError {
    /// キャプチャ関連のエラー
    #[error("Capture error: {0}")]
    Capture(String),

    /// 姿勢推定（ポーズモデル）関連のエラー
    #[error("Pose estimation error: {0}")]
    Pose(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// ゲーム層への不正な入力（1〜6の範囲外）
    ///
    /// プログラミング契約違反。丸め込みは行わず、呼び出し自体を失敗させる。
    #[error("Invalid move {0}: must be in 1..=6")]
    InvalidMove(u8),

    /// 許可されないゲーム操作（フェーズ不一致など）
    #[error("Invalid game state: {0}")]
    InvalidGameState(String),

    /// キャプチャ再起動の試行回数を使い切った（Non-recoverable）
    ///
    /// バックオフ付きの自動再試行が尽きた後にのみ発生する。
    #[error("Capture restart attempts exhausted")]
    RestartExhausted,

    /// その他のエラー
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
