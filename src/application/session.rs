//! セッション実行モジュール
//!
//! ポーズ供給スレッドとジェスチャーパイプラインを接続し、
//! 1セッション分のイベントループを実行します。
//!
//! フレームは bounded(1) チャネルで受け渡し、消費が追いつかない場合は
//! 破棄する（最新性優先、キューイングしない）。受信はタイムアウト付きで、
//! フレーム供給そのものが停止してもウォッチドッグのポーリングが継続する。

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::application::{
    pipeline::GesturePipeline,
    recovery::{RecoveryState, RestartPolicy},
    stats::{StatKind, StatsCollector},
};
use crate::domain::{
    ports::{CapturePort, PoseSource},
    AppConfig, DomainError, DomainResult, GestureEvent, HandObservation,
};

/// ジェスチャーイベント受領後のループ制御
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    /// セッションを継続
    Continue,
    /// セッションを終了（対戦の決着など）
    Stop,
}

/// ポーズ供給スレッドから渡される観測とタイムスタンプのペア
#[derive(Debug, Clone)]
struct TimestampedObservation {
    observation: Option<HandObservation>,
    captured_at: Instant,
}

/// 1セッション分のジェスチャー認識の実行主体
///
/// キャプチャ協調者・パイプライン・リカバリ・統計を所有する。
/// グローバル状態は持たず、セッションを跨ぐ場合は新しいインスタンスを作る。
pub struct GestureSession<C: CapturePort> {
    capture: C,
    pipeline: GesturePipeline,
    recovery: RecoveryState,
    stats: StatsCollector,
    poll_interval: Duration,
}

impl<C: CapturePort> GestureSession<C> {
    /// 新しいセッションを構築
    pub fn new(capture: C, config: &AppConfig) -> Self {
        Self {
            capture,
            pipeline: GesturePipeline::new(config),
            recovery: RecoveryState::new(RestartPolicy::from_config(&config.capture)),
            stats: StatsCollector::new(config.pipeline.stats_interval()),
            poll_interval: config.capture.poll_interval(),
        }
    }

    /// セッションを実行
    ///
    /// キャプチャを起動し、キャリブレーション窓を経て、ポーズソースが
    /// 尽きるか `on_gesture` が `Stop` を返すまでイベントループを回す。
    ///
    /// # Returns
    /// - `Ok(())`: 正常終了（ソース終端 または Stop指示）
    /// - `Err(DomainError::RestartExhausted)`: キャプチャ再起動の試行を使い切った
    pub fn run<P, F>(&mut self, pose: P, mut on_gesture: F) -> DomainResult<()>
    where
        P: PoseSource + 'static,
        F: FnMut(GestureEvent) -> SessionControl,
    {
        self.capture.start()?;
        self.pipeline.start_calibration(Instant::now());

        let (tx, rx) = bounded::<TimestampedObservation>(1);
        let feed = std::thread::spawn(move || feed_thread(pose, tx));

        let result = self.event_loop(&rx, &mut on_gesture);

        // 受信側を閉じるとフィードスレッドは次の送信で終了する
        drop(rx);
        let _ = feed.join();
        self.capture.stop();

        result
    }

    fn event_loop<F>(
        &mut self,
        rx: &Receiver<TimestampedObservation>,
        on_gesture: &mut F,
    ) -> DomainResult<()>
    where
        F: FnMut(GestureEvent) -> SessionControl,
    {
        loop {
            match rx.recv_timeout(self.poll_interval) {
                Ok(frame) => {
                    let received_at = Instant::now();

                    // 手の観測が得られている間はリカバリの試行カウンターを戻す
                    if frame.observation.as_ref().is_some_and(|o| o.is_valid()) {
                        self.recovery.record_success();
                    }

                    let outcome = self
                        .pipeline
                        .process_frame(frame.observation.as_ref(), received_at);
                    let classified_at = Instant::now();

                    if outcome.admitted {
                        self.stats.record_frame();
                        self.stats.record_duration(
                            StatKind::Classify,
                            classified_at.duration_since(received_at),
                        );
                        self.stats.record_duration(
                            StatKind::EndToEnd,
                            classified_at.duration_since(frame.captured_at),
                        );

                        if let Some(event) = outcome.gesture {
                            self.stats.record_gesture_event();
                            if on_gesture(event) == SessionControl::Stop {
                                return Ok(());
                            }
                        }
                    } else {
                        self.stats.record_dropped_frame();
                    }

                    if outcome.restart_capture {
                        self.restart_capture()?;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // フレームが来なくてもウォッチドッグは進める
                    if self.pipeline.poll_idle(Instant::now()) {
                        self.restart_capture()?;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("Pose source closed - session finished");
                    return Ok(());
                }
            }

            if self.stats.should_report() {
                self.stats.report_and_reset();
            }
        }
    }

    /// バックオフ付きでキャプチャを再起動
    ///
    /// 個々の再起動失敗は吸収して次のウォッチドッグ満了に委ねる。
    /// 試行回数を使い切った場合のみ持続的エラーとして返す。
    fn restart_capture(&mut self) -> DomainResult<()> {
        let Some(backoff) = self.recovery.next_attempt() else {
            tracing::error!("Capture restart attempts exhausted - giving up");
            return Err(DomainError::RestartExhausted);
        };

        tracing::info!(
            backoff_ms = backoff.as_millis() as u64,
            total = self.recovery.total_restarts(),
            "Restarting capture"
        );
        std::thread::sleep(backoff);
        self.stats.add_failure_duration(backoff);

        match self.capture.restart() {
            Ok(()) => {
                self.stats.record_restart();
                Ok(())
            }
            Err(e) => {
                // 次のウォッチドッグ満了でバックオフを増やして再試行する
                tracing::warn!("Capture restart failed: {e}");
                Ok(())
            }
        }
    }
}

/// ポーズ供給スレッドのメインループ
///
/// ソースの観測を取得し次第チャネルへ流す。チャネルが満杯の場合は
/// このフレームを破棄する（受信側は常に直近の値を処理する）。
fn feed_thread<P: PoseSource>(mut pose: P, tx: Sender<TimestampedObservation>) {
    tracing::debug!("Pose feed thread started");

    loop {
        match pose.next_observation() {
            Ok(observation) => {
                let frame = TimestampedObservation {
                    observation,
                    captured_at: Instant::now(),
                };
                match tx.try_send(frame) {
                    Ok(_) => {}
                    Err(TrySendError::Full(_)) => {
                        // 消費側が追いついていない。このフレームは破棄
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(e) => {
                tracing::debug!("Pose source ended: {e}");
                break;
            }
        }
    }
}
