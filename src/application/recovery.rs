//! 再起動ロジックモジュール
//!
//! キャプチャ再起動を指数バックオフと有界な試行回数で制御します。
//! 一時的な知覚系の失敗は内部で吸収・再試行し、試行が尽きた場合のみ
//! 持続的エラーとして呼び出し側へ伝播します。

use std::time::Duration;

use crate::domain::CaptureConfig;

/// 再起動戦略
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// 初期バックオフ時間
    pub initial_backoff: Duration,
    /// 最大バックオフ時間
    pub max_backoff: Duration,
    /// 最大試行回数（超えたら持続的エラー）
    pub max_attempts: u32,
}

impl RestartPolicy {
    /// 設定から戦略を構築
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            initial_backoff: config.restart_initial_delay(),
            max_backoff: config.restart_max_delay(),
            max_attempts: config.max_restart_attempts,
        }
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

/// 再起動状態管理
#[derive(Debug)]
pub struct RecoveryState {
    policy: RestartPolicy,
    attempts: u32,
    current_backoff: Duration,
    total_restarts: u64,
}

impl RecoveryState {
    /// 新しいRecoveryStateを作成
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            current_backoff: policy.initial_backoff,
            policy,
            attempts: 0,
            total_restarts: 0,
        }
    }

    /// 再起動試行を記録し、その試行前に待つべきバックオフを返す
    ///
    /// # Returns
    /// - `Some(backoff)`: 試行してよい（この時間待ってから再起動する）
    /// - `None`: 試行回数を使い切った（持続的エラーとして扱う）
    pub fn next_attempt(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }

        self.attempts += 1;
        self.total_restarts += 1;

        let backoff = self.current_backoff;
        // 指数バックオフ: 次回の待機時間を2倍にする
        self.current_backoff = (self.current_backoff * 2).min(self.policy.max_backoff);
        Some(backoff)
    }

    /// 成功を記録（試行カウンターとバックオフをリセット）
    ///
    /// 再起動後に手の観測が復帰したら呼び出す。
    pub fn record_success(&mut self) {
        self.attempts = 0;
        self.current_backoff = self.policy.initial_backoff;
    }

    /// 試行回数を使い切ったか
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// 累計再起動回数
    pub fn total_restarts(&self) -> u64 {
        self.total_restarts
    }
}
