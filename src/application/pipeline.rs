//! ジェスチャーパイプライン制御モジュール
//!
//! フレームレート制限 → ランドマーク幾何解析 → 分類 → デバウンス の
//! 処理チェーンと、ウォッチドッグ・キャリブレーションを1つの
//! 所有オブジェクトに束ねます。
//!
//! グローバルなシングルトンは持たない。呼び出し側がインスタンスを所有し、
//! 明示的な `reset()` でライフサイクルを制御する。
//! 1フレームの処理は同期的・非プリエンプティブであり、共有可変状態は
//! すべてこの単一の論理シーケンスからのみ触られる。

use std::time::Instant;

use crate::application::{
    calibration::{CalibrationBaseline, CalibrationCollector},
    classifier, debounce::ConfidenceDebouncer, geometry,
    rate_limiter::FrameRateLimiter,
    watchdog::{TrackingWatchdog, WatchdogSignal},
};
use crate::domain::{AppConfig, ClassifierConfig, GestureCode, GestureEvent, HandObservation};

/// 1フレーム処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameOutcome {
    /// フレームがレート制限を通過したか（false = 破棄、状態変化なし）
    pub admitted: bool,
    /// このフレームで分類されたコード（破棄・キャリブレーション中は None）
    pub code: Option<GestureCode>,
    /// デバウンサーが発火したジェスチャーイベント
    pub gesture: Option<GestureEvent>,
    /// キャプチャ再起動をキャプチャ協調者へ指示すべきか
    pub restart_capture: bool,
}

/// ジェスチャー分類パイプライン
#[derive(Debug)]
pub struct GesturePipeline {
    thresholds: ClassifierConfig,
    limiter: FrameRateLimiter,
    debouncer: ConfidenceDebouncer,
    watchdog: TrackingWatchdog,
    calibration: CalibrationCollector,
}

impl GesturePipeline {
    /// 設定からパイプラインを構築
    pub fn new(config: &AppConfig) -> Self {
        Self {
            thresholds: config.classifier,
            limiter: FrameRateLimiter::new(config.pipeline.min_frame_interval()),
            debouncer: ConfidenceDebouncer::new(&config.debounce),
            watchdog: TrackingWatchdog::new(&config.watchdog),
            calibration: CalibrationCollector::new(&config.calibration),
        }
    }

    /// 1フレーム分の観測を処理
    ///
    /// # Arguments
    /// - `observation`: ポーズモデルの出力（None = 手が検出されなかった）
    /// - `now`: フレームの処理時刻
    ///
    /// # Returns
    /// フレームの処理結果。`restart_capture` が立っている場合、呼び出し側は
    /// キャプチャ協調者の再起動を行うこと（パイプライン側の状態クリアは済んでいる）。
    pub fn process_frame(
        &mut self,
        observation: Option<&HandObservation>,
        now: Instant,
    ) -> FrameOutcome {
        // レート制限: 破棄フレームは下流に一切の状態変化を起こさない
        if !self.limiter.admit(now) {
            return FrameOutcome::default();
        }

        let mut outcome = FrameOutcome {
            admitted: true,
            ..FrameOutcome::default()
        };

        match observation {
            Some(obs) if obs.is_valid() => {
                self.watchdog.record_observation(now);

                if self.calibration.is_active(now) {
                    // キャリブレーション中は分類せず、イベントも発火しない
                    self.calibration.observe(obs, now);
                } else {
                    let flags = geometry::analyze(obs, &self.thresholds);
                    let code = classifier::classify(&flags);
                    outcome.code = Some(code);
                    outcome.gesture = self.debouncer.observe(code, now);

                    if let Some(event) = outcome.gesture {
                        tracing::debug!(code = event.code.as_u8(), "Gesture event fired");
                    }
                }
            }
            _ => {
                // 手なし、または不正な観測（21点未満）はジェスチャーなしとして扱う
                self.watchdog.record_empty_frame(now);
                if observation.is_some() {
                    outcome.code = Some(GestureCode::None);
                }
            }
        }

        outcome.restart_capture = self.poll_watchdog(now);
        outcome
    }

    /// フレームが到着していないときの定期ポーリング
    ///
    /// セッションループの待ち受けタイムアウトから呼び出され、
    /// フレーム供給そのものが止まった場合でもウォッチドッグを満了させる。
    ///
    /// # Returns
    /// キャプチャ再起動を指示すべき場合 true
    pub fn poll_idle(&mut self, now: Instant) -> bool {
        self.poll_watchdog(now)
    }

    /// キャリブレーションを開始
    ///
    /// 確信度状態と既存の基準値をクリアする。保留中のデバウンス
    /// クールダウンもここでキャンセルされ、古い満了が状態を汚さない。
    pub fn start_calibration(&mut self, now: Instant) {
        self.debouncer.reset();
        self.watchdog.reset();
        self.calibration.start(now);
        tracing::info!("Calibration started");
    }

    /// キャリブレーション窓の中か（UIゲーティング用）
    pub fn calibration_active(&mut self, now: Instant) -> bool {
        self.calibration.is_active(now)
    }

    /// 収集済みのキャリブレーション基準値
    #[allow(dead_code)] // 現状advisory（しきい値適応は未実装）
    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.calibration.baseline()
    }

    /// 全コンポーネントの状態を明示的にクリア
    pub fn reset(&mut self) {
        self.limiter.reset();
        self.debouncer.reset();
        self.watchdog.reset();
        self.calibration.reset();
    }

    fn poll_watchdog(&mut self, now: Instant) -> bool {
        match self.watchdog.poll(now) {
            Some(WatchdogSignal::RestartCapture) => {
                // 再起動に伴い、保留中のデバウンスクールダウンもキャンセルする
                self.debouncer.reset();
                tracing::warn!("Tracking stalled - requesting capture restart");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{landmark, Landmark, LANDMARK_COUNT};
    use std::time::Duration;

    fn pipeline() -> GesturePipeline {
        GesturePipeline::new(&AppConfig::default())
    }

    fn clock() -> impl Fn(u64) -> Instant {
        let t0 = Instant::now();
        move |ms| t0 + Duration::from_millis(ms)
    }

    /// 指定した本数の非親指を伸ばした観測を作る
    fn fingers_up(count: usize) -> HandObservation {
        let tips = [
            landmark::INDEX_TIP,
            landmark::MIDDLE_TIP,
            landmark::RING_TIP,
            landmark::PINKY_TIP,
        ];
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        for tip in tips.iter().take(count) {
            points[*tip] = Landmark::new(0.5, 0.3, 0.0);
        }
        HandObservation::new(points)
    }

    /// サムズアップの観測
    fn thumbs_up() -> HandObservation {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        points[landmark::THUMB_TIP] = Landmark::new(0.5, 0.3, 0.0);
        HandObservation::new(points)
    }

    #[test]
    fn test_end_to_end_two_fingers() {
        // 3連続フレームで「2本指」→ ちょうど1回、値2のイベント
        let mut p = pipeline();
        let at = clock();
        let obs = fingers_up(2);

        let o1 = p.process_frame(Some(&obs), at(0));
        assert!(o1.admitted);
        assert_eq!(o1.code, Some(GestureCode::Two));
        assert!(o1.gesture.is_none());

        let o2 = p.process_frame(Some(&obs), at(70));
        assert!(o2.gesture.is_none());

        let o3 = p.process_frame(Some(&obs), at(140));
        let event = o3.gesture.expect("3フレーム目で発火するはず");
        assert_eq!(event.code, GestureCode::Two);
        assert_eq!(event.code.runs(), Some(2));

        // クールダウン窓内の4フレーム目は再発火しない
        let o4 = p.process_frame(Some(&obs), at(210));
        assert!(o4.gesture.is_none());
    }

    #[test]
    fn test_rate_limited_frames_cause_no_state_change() {
        let mut p = pipeline();
        let at = clock();
        let obs = fingers_up(3);

        assert!(p.process_frame(Some(&obs), at(0)).admitted);
        // 最小間隔（66ms）未満のフレームは破棄され、ストリークも進まない
        for ms in [10, 20, 30, 40, 50, 60] {
            let outcome = p.process_frame(Some(&obs), at(ms));
            assert!(!outcome.admitted);
            assert!(outcome.gesture.is_none());
        }

        // 処理済みフレーム換算ではまだ1枚目。あと2枚で発火する
        assert!(p.process_frame(Some(&obs), at(70)).gesture.is_none());
        assert!(p.process_frame(Some(&obs), at(140)).gesture.is_some());
    }

    #[test]
    fn test_malformed_observation_is_no_gesture() {
        let mut p = pipeline();
        let at = clock();
        let malformed = HandObservation::new(vec![Landmark::default(); 10]);

        let outcome = p.process_frame(Some(&malformed), at(0));
        assert!(outcome.admitted);
        assert_eq!(outcome.code, Some(GestureCode::None));
        assert!(outcome.gesture.is_none());
    }

    #[test]
    fn test_thumbs_up_scores_six() {
        let mut p = pipeline();
        let at = clock();
        let obs = thumbs_up();

        p.process_frame(Some(&obs), at(0));
        p.process_frame(Some(&obs), at(70));
        let outcome = p.process_frame(Some(&obs), at(140));
        assert_eq!(outcome.gesture.unwrap().code, GestureCode::ThumbsUp);
    }

    #[test]
    fn test_watchdog_restart_through_pipeline() {
        let mut p = pipeline();
        let at = clock();

        // 手なしフレームが続く（レート制限に合わせて66ms刻み）
        let mut restart_count = 0;
        for i in 0..80u64 {
            let outcome = p.process_frame(None, at(i * 70));
            if outcome.restart_capture {
                restart_count += 1;
            }
        }
        // 5秒の無観測タイマーが1回だけ発火する
        assert_eq!(restart_count, 1);
    }

    #[test]
    fn test_poll_idle_fires_watchdog_without_frames() {
        let mut p = pipeline();
        let at = clock();

        // 一度手を観測した後、フレーム供給自体が停止
        p.process_frame(Some(&fingers_up(1)), at(0));
        assert!(!p.poll_idle(at(2000)));
        // 生存タイマー（3秒）の満了
        assert!(p.poll_idle(at(3100)));
        // 二重発火しない
        assert!(!p.poll_idle(at(3200)));
    }

    #[test]
    fn test_calibration_gates_events_and_collects_baseline() {
        let mut p = pipeline();
        let at = clock();
        let obs = fingers_up(2);

        p.start_calibration(at(0));
        assert!(p.calibration_active(at(1)));

        // 窓内は何フレーム処理してもイベントは発火しない
        for i in 0..20u64 {
            let outcome = p.process_frame(Some(&obs), at(i * 70));
            assert!(outcome.gesture.is_none());
            assert!(outcome.code.is_none());
        }
        assert!(p.baseline().is_some());

        // 窓明け（5秒後）は通常の分類に戻る
        assert!(!p.calibration_active(at(5001)));
        assert!(p.process_frame(Some(&obs), at(5100)).gesture.is_none());
        assert!(p.process_frame(Some(&obs), at(5170)).gesture.is_none());
        assert!(p.process_frame(Some(&obs), at(5240)).gesture.is_some());
    }

    #[test]
    fn test_calibration_start_clears_streaks() {
        let mut p = pipeline();
        let at = clock();
        let obs = fingers_up(2);

        // ストリークを2まで進める
        p.process_frame(Some(&obs), at(0));
        p.process_frame(Some(&obs), at(70));

        p.start_calibration(at(100));

        // 窓明け直後の1フレームでは発火しない（ストリークはクリア済み）
        let outcome = p.process_frame(Some(&obs), at(5200));
        assert!(outcome.gesture.is_none());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut p = pipeline();
        let at = clock();
        let obs = fingers_up(1);

        p.process_frame(Some(&obs), at(0));
        p.process_frame(Some(&obs), at(70));
        p.reset();

        // リセット後は改めて3フレーム必要
        assert!(p.process_frame(Some(&obs), at(140)).gesture.is_none());
        assert!(p.process_frame(Some(&obs), at(210)).gesture.is_none());
        assert!(p.process_frame(Some(&obs), at(280)).gesture.is_some());
    }
}
