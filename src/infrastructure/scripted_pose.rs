//! スクリプト再生ポーズソース
//!
//! あらかじめ用意した観測列を順に返す `PoseSource` 実装。
//! テストと再現実験向け。スクリプトが尽きたらエラーを返し、
//! セッションのフィードスレッドを終了させる。

use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::{ports::PoseSource, DomainError, DomainResult, HandObservation};

/// 観測列を再生するポーズソース
#[derive(Debug)]
pub struct ScriptedPoseSource {
    frames: VecDeque<Option<HandObservation>>,
    /// フレーム間の擬似的な撮像間隔（ゼロなら最速で供給）
    frame_delay: Duration,
}

impl ScriptedPoseSource {
    /// 観測列からソースを作成
    ///
    /// `None` の要素は「手が検出されなかったフレーム」を表す。
    pub fn new(frames: Vec<Option<HandObservation>>) -> Self {
        Self {
            frames: frames.into(),
            frame_delay: Duration::ZERO,
        }
    }

    /// フレーム間隔を設定
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// 残りフレーム数
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for ScriptedPoseSource {
    fn next_observation(&mut self) -> DomainResult<Option<HandObservation>> {
        match self.frames.pop_front() {
            Some(frame) => {
                if !self.frame_delay.is_zero() {
                    std::thread::sleep(self.frame_delay);
                }
                Ok(frame)
            }
            None => Err(DomainError::Pose("script exhausted".to_string())),
        }
    }
}
