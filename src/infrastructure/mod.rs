//! Infrastructure層
//!
//! Domain層のポートに対する具体実装。
//! カメラを持たない環境向けのモック・合成実装と、乱数対戦相手を含む。

pub mod mock_capture;
pub mod random_move;
pub mod scripted_pose;
pub mod synthetic_pose;
