//! 合成ポーズソース
//!
//! カメラなしでパイプライン全体を動かすための `PoseSource` 実装。
//! 1〜6の手に対応するランドマーク配置を生成し、座標に微小な
//! ノイズを載せて実機に近い揺らぎを再現する。
//!
//! 各ポーズを数フレーム保持したあと手なしフレームを挟むことで、
//! デバウンスのクールダウンを跨いで連続した手を出せる。

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::types::{landmark, Landmark, LANDMARK_COUNT};
use crate::domain::{ports::PoseSource, DomainResult, HandObservation};

/// ポーズ1回あたりの保持フレーム数（デバウンスの3フレームを確実に超える）
const HOLD_FRAMES: u32 = 5;
/// ポーズ間の手なしフレーム数（66ms間隔でクールダウン1秒を跨ぐ）
const REST_FRAMES: u32 = 12;
/// 擬似的な撮像間隔
const FRAME_DELAY: Duration = Duration::from_millis(66);
/// 座標ノイズの振幅（分類マージン0.07より十分小さい）
const JITTER: f32 = 0.01;

/// ジェスチャーで表現できる手
///
/// 4本指は分類上「開いた手」(5) に吸収されるため、4はポーズとして
/// 表現できない。乱数の選択肢からも外す。
const PLAYABLE_MOVES: [u8; 5] = [1, 2, 3, 5, 6];

/// ランダムな手を出し続ける合成ポーズソース
#[derive(Debug)]
pub struct SyntheticPoseSource {
    rng: SmallRng,
    current_move: u8,
    frame_in_cycle: u32,
}

impl SyntheticPoseSource {
    /// シード付きでソースを作成
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let first = PLAYABLE_MOVES[rng.random_range(0..PLAYABLE_MOVES.len())];
        Self {
            rng,
            current_move: first,
            frame_in_cycle: 0,
        }
    }

    /// 指定した手に対応するランドマーク配置を生成
    fn pose_for_move(&mut self, value: u8) -> HandObservation {
        // 手のひらを画面中央、指先は関節より0.2上（マージン0.07を大きく超える）
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];

        let finger_tips = [
            landmark::INDEX_TIP,
            landmark::MIDDLE_TIP,
            landmark::RING_TIP,
            landmark::PINKY_TIP,
        ];

        match value {
            1..=3 => {
                for tip in finger_tips.iter().take(usize::from(value)) {
                    points[*tip] = Landmark::new(0.5, 0.3, 0.0);
                }
            }
            5 => {
                // 全指を開いた手
                for tip in finger_tips {
                    points[tip] = Landmark::new(0.5, 0.3, 0.0);
                }
                points[landmark::THUMB_TIP] = Landmark::new(0.5, 0.3, 0.0);
            }
            _ => {
                // サムズアップ: 親指のみ
                points[landmark::THUMB_TIP] = Landmark::new(0.5, 0.3, 0.0);
            }
        }

        for point in &mut points {
            point.x += self.rng.random_range(-JITTER..JITTER);
            point.y += self.rng.random_range(-JITTER..JITTER);
            point.z += self.rng.random_range(-JITTER..JITTER);
        }

        HandObservation::new(points)
    }
}

impl PoseSource for SyntheticPoseSource {
    fn next_observation(&mut self) -> DomainResult<Option<HandObservation>> {
        std::thread::sleep(FRAME_DELAY);

        let frame = self.frame_in_cycle;
        self.frame_in_cycle += 1;

        if frame < HOLD_FRAMES {
            let value = self.current_move;
            return Ok(Some(self.pose_for_move(value)));
        }

        if self.frame_in_cycle >= HOLD_FRAMES + REST_FRAMES {
            // 次のサイクルへ
            self.frame_in_cycle = 0;
            self.current_move = PLAYABLE_MOVES[self.rng.random_range(0..PLAYABLE_MOVES.len())];
        }

        Ok(None)
    }
}
