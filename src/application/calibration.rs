//! キャリブレーション収集（Application層）
//!
//! キャリブレーション中の各処理フレームから、基準となる手のサイズと
//! 親指-人差し指間の距離をサンプリングします。
//!
//! 収集した基準値は現状advisory（分類しきい値には反映しない）。
//! しきい値の適応はプロダクト意図の確認待ちであり、
//! 観測された非適応の挙動をそのまま保存している。

use std::time::{Duration, Instant};

use crate::domain::{CalibrationConfig, HandObservation};

/// セッション内で一度計測される基準手形状
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBaseline {
    /// 手首(0)から中指の指先(12)までの正規化3D距離
    pub hand_size: f32,
    /// 親指の指先(4)から人差し指の指先(8)までの距離 × スケール係数
    pub thumb_index_dist: f32,
}

/// 固定長のキャリブレーション窓を管理するコレクター
#[derive(Debug)]
pub struct CalibrationCollector {
    window: Duration,
    thumb_index_scale: f32,
    /// 窓の終了時刻（キャリブレーション中のみ Some）
    deadline: Option<Instant>,
    baseline: Option<CalibrationBaseline>,
}

impl CalibrationCollector {
    /// 新しいコレクターを作成
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            window: config.window(),
            thumb_index_scale: config.thumb_index_scale,
            deadline: None,
            baseline: None,
        }
    }

    /// キャリブレーションを開始
    ///
    /// 既存の基準値をクリアし、固定長の窓に入る。
    /// 呼び出し側はデバウンサーの状態も同時にクリアすること。
    pub fn start(&mut self, now: Instant) {
        self.baseline = None;
        self.deadline = Some(now + self.window);
    }

    /// キャリブレーション窓の中か
    ///
    /// アクティブな間、呼び出し側は分類器の出力をゲートし
    /// ジェスチャーイベントを発火させてはならない。
    pub fn is_active(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                // 窓の満了でキャリブレーション終了（基準値は保持）
                self.deadline = None;
                false
            }
            None => false,
        }
    }

    /// 有効な観測で基準値を更新
    ///
    /// 窓の外、または不正な観測では何もしない。
    pub fn observe(&mut self, obs: &HandObservation, now: Instant) {
        if !self.is_active(now) {
            return;
        }

        if let (Some(hand_size), Some(raw_dist)) = (obs.hand_size(), obs.thumb_index_distance()) {
            self.baseline = Some(CalibrationBaseline {
                hand_size,
                thumb_index_dist: self.thumb_index_scale * raw_dist,
            });
        }
    }

    /// 収集済みの基準値
    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.baseline.as_ref()
    }

    /// キャリブレーションを中断し、基準値もクリア
    pub fn reset(&mut self) {
        self.deadline = None;
        self.baseline = None;
    }
}
