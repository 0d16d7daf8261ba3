//! フレームレート制限（Application層）
//!
//! センサーレートで到着するフレームのうち、解析チェーンへ転送するものを
//! 1秒あたり最大N枚（デフォルト15枚）に制限します。最小フレーム間隔が
//! 経過する前に到着したフレームはキューイングせず破棄します。
//!
//! これによりCPUコストが有界になり、デバウンスのストリーク数の単位が
//! 「処理済みフレーム」として安定する。

use std::time::{Duration, Instant};

/// フレーム転送ゲート
#[derive(Debug)]
pub struct FrameRateLimiter {
    min_interval: Duration,
    last_admitted: Option<Instant>,
}

impl FrameRateLimiter {
    /// 新しいリミッターを作成
    ///
    /// # Arguments
    /// - `min_interval`: 許可するフレーム間の最小間隔（= 1000/N ms）
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: None,
        }
    }

    /// フレームを転送してよいか判定
    ///
    /// # Returns
    /// - `true`: 転送可（内部の基準時刻を更新する）
    /// - `false`: 破棄（下流に一切の状態変化を起こしてはならない）
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }

    /// 基準時刻をクリア（次のフレームを必ず許可する）
    pub fn reset(&mut self) {
        self.last_admitted = None;
    }
}
