//! 乱数ベースの対戦相手
//!
//! 一様乱数で1〜6の手を出す `MoveSource` 実装。

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::ports::MoveSource;

/// 一様乱数で手を選ぶ対戦相手
#[derive(Debug)]
pub struct RandomMoveSource {
    rng: SmallRng,
}

impl RandomMoveSource {
    /// OSエントロピーから初期化
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// シード付きで初期化（再現用）
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomMoveSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveSource for RandomMoveSource {
    fn next_move(&mut self) -> u8 {
        self.rng.random_range(1..=6)
    }
}
