//! Application層
//!
//! ジェスチャー認識のユースケース実装。
//! Domain層の型とポートのみに依存し、具体的なポーズモデルや
//! カメラ実装には依存しない。

pub mod calibration;
pub mod classifier;
pub mod debounce;
pub mod game;
pub mod geometry;
pub mod pipeline;
pub mod rate_limiter;
pub mod recovery;
pub mod session;
pub mod stats;
pub mod watchdog;
