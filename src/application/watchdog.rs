//! ストール検出ウォッチドッグ（Application層）
//!
//! ランドマーク更新の長時間の欠落を検出し、外部のキャプチャ協調者への
//! 復旧アクション（キャプチャ再起動）を指示します。
//!
//! 2つの独立したタイマーで別々の故障モードをカバーする：
//! - 無観測タイマー: 「一度も手を取得できていない」（コールドスタート）
//! - 生存タイマー: 「取得できていたのに、いつの間にか止まった」
//!
//! どちらも同じ復旧アクションに収束する。タイマーはコールバックではなく
//! デッドライン保持+ポーリングで表現し、リセットと満了の競合を避ける。

use std::time::{Duration, Instant};

use crate::domain::WatchdogConfig;

/// ウォッチドッグが指示する復旧アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogSignal {
    /// キャプチャを停止して再取得すべき
    RestartCapture,
}

/// ランドマーク更新の欠落を監視する状態機械
#[derive(Debug)]
pub struct TrackingWatchdog {
    no_observation_timeout: Duration,
    liveness_timeout: Duration,
    /// 無観測タイマーの満了時刻（作動中のみ Some）
    no_observation_deadline: Option<Instant>,
    /// 最後に手の観測に成功した時刻（一度も成功していなければ None）
    last_observation: Option<Instant>,
}

impl TrackingWatchdog {
    /// 新しいウォッチドッグを作成
    pub fn new(config: &WatchdogConfig) -> Self {
        Self {
            no_observation_timeout: config.no_observation_timeout(),
            liveness_timeout: config.liveness_timeout(),
            no_observation_deadline: None,
            last_observation: None,
        }
    }

    /// 手の観測成功を記録
    ///
    /// 両タイマーをキャンセル/リセットする。
    pub fn record_observation(&mut self, now: Instant) {
        self.no_observation_deadline = None;
        self.last_observation = Some(now);
    }

    /// 手が検出されなかった処理フレームを記録
    ///
    /// 無観測タイマーが未作動であれば起動する（作動中なら何もしない）。
    pub fn record_empty_frame(&mut self, now: Instant) {
        if self.no_observation_deadline.is_none() {
            self.no_observation_deadline = Some(now + self.no_observation_timeout);
        }
    }

    /// タイマー満了を確認
    ///
    /// # Returns
    /// いずれかのタイマーが満了していれば `Some(RestartCapture)`。
    /// シグナルを返すと同時に両タイマーをクリアするため、
    /// 本当に新たなストールが起きない限り同じ窓内で二重発火しない。
    pub fn poll(&mut self, now: Instant) -> Option<WatchdogSignal> {
        let no_observation_expired = self
            .no_observation_deadline
            .is_some_and(|deadline| now >= deadline);

        let liveness_expired = self
            .last_observation
            .is_some_and(|last| now.duration_since(last) >= self.liveness_timeout);

        if no_observation_expired || liveness_expired {
            self.reset();
            return Some(WatchdogSignal::RestartCapture);
        }

        None
    }

    /// 全タイマーをクリア
    ///
    /// キャプチャ再起動時・キャリブレーション開始時に呼び出される。
    pub fn reset(&mut self) {
        self.no_observation_deadline = None;
        self.last_observation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watchdog() -> TrackingWatchdog {
        TrackingWatchdog::new(&WatchdogConfig::default())
    }

    fn clock() -> impl Fn(u64) -> Instant {
        let t0 = Instant::now();
        move |ms| t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_cold_start_fires_once_after_five_seconds() {
        let mut w = watchdog();
        let at = clock();

        // コールドスタート: 手なしフレームだけが続く
        w.record_empty_frame(at(0));
        assert_eq!(w.poll(at(1000)), None);
        w.record_empty_frame(at(2000)); // 作動中のタイマーは延長されない
        assert_eq!(w.poll(at(4999)), None);

        assert_eq!(w.poll(at(5000)), Some(WatchdogSignal::RestartCapture));

        // 発火後はタイマーがリセットされ、二重発火しない
        assert_eq!(w.poll(at(5100)), None);
        assert_eq!(w.poll(at(9999)), None);
    }

    #[test]
    fn test_observation_cancels_no_observation_timer() {
        let mut w = watchdog();
        let at = clock();

        w.record_empty_frame(at(0));
        w.record_observation(at(3000));

        // 無観測タイマーはキャンセル済み。生存タイマーだけが残る
        assert_eq!(w.poll(at(5500)), None);
    }

    #[test]
    fn test_liveness_fires_after_silent_stall() {
        let mut w = watchdog();
        let at = clock();

        // 取得できていた
        w.record_observation(at(0));
        assert_eq!(w.poll(at(2999)), None);

        // 3秒間観測なし → 生存タイマー発火
        assert_eq!(w.poll(at(3000)), Some(WatchdogSignal::RestartCapture));

        // 発火でリセットされるため、観測が再開するまで生存タイマーは作動しない
        assert_eq!(w.poll(at(6500)), None);
    }

    #[test]
    fn test_liveness_requires_prior_observation() {
        let mut w = watchdog();
        let at = clock();

        // 一度も観測がなければ生存タイマーは作動しない
        assert_eq!(w.poll(at(10_000)), None);
    }

    #[test]
    fn test_observation_keeps_resetting_liveness() {
        let mut w = watchdog();
        let at = clock();

        for i in 0..5 {
            w.record_observation(at(i * 2000));
            assert_eq!(w.poll(at(i * 2000 + 1999)), None);
        }
    }

    #[test]
    fn test_genuine_second_stall_fires_again() {
        let mut w = watchdog();
        let at = clock();

        w.record_empty_frame(at(0));
        assert_eq!(w.poll(at(5000)), Some(WatchdogSignal::RestartCapture));

        // 再起動後も手が来ない → 新たな無観測タイマーで再度発火する
        w.record_empty_frame(at(5200));
        assert_eq!(w.poll(at(10_199)), None);
        assert_eq!(w.poll(at(10_200)), Some(WatchdogSignal::RestartCapture));
    }
}
