/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。
///
/// ポーズモデルや描画ライブラリを動的型のグローバルとして扱うのではなく、
/// 狭く明示的に型付けされたcapabilityインターフェースとして定義する。

use crate::domain::{DomainResult, HandObservation};

/// キャプチャポート: カメラ等のフレーム供給源のライフサイクルを抽象化
///
/// フレームデータ自体はポーズモデル側（`PoseSource`）が消費するため、
/// このポートは起動・停止・再起動のみを扱う。
pub trait CapturePort: Send {
    /// キャプチャを開始
    fn start(&mut self) -> DomainResult<()>;

    /// キャプチャを停止
    fn stop(&mut self);

    /// キャプチャセッションを再起動
    ///
    /// ウォッチドッグがストールを検出した場合に呼び出される。
    ///
    /// # Returns
    /// - `Ok(())`: 再起動成功
    /// - `Err(DomainError)`: 再起動失敗（リカバリ層がバックオフ付きで再試行）
    fn restart(&mut self) -> DomainResult<()>;
}

/// ポーズソース: 手のランドマーク推定を抽象化
///
/// フレームごとに0個または1個の手の観測を返す。
/// モデルの内部（推論方式・前処理）はこのポートの背後に隠蔽される。
pub trait PoseSource: Send {
    /// 次のフレームの観測を取得
    ///
    /// # Returns
    /// - `Ok(Some(HandObservation))`: 手が検出された
    /// - `Ok(None)`: フレームは処理されたが手は検出されなかった
    /// - `Err(DomainError)`: ソースの終端または致命的エラー
    fn next_observation(&mut self) -> DomainResult<Option<HandObservation>>;
}

/// 相手プレイヤーの手の供給源を抽象化
///
/// 自動対戦相手（乱数）もスクリプト（テスト）も同じインターフェースで注入する。
pub trait MoveSource: Send {
    /// 次の一球で出す手（1〜6）
    fn next_move(&mut self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Landmark, LANDMARK_COUNT};

    struct OneShotSource {
        served: bool,
    }

    impl PoseSource for OneShotSource {
        fn next_observation(&mut self) -> DomainResult<Option<HandObservation>> {
            if self.served {
                Ok(None)
            } else {
                self.served = true;
                Ok(Some(HandObservation::new(vec![
                    Landmark::default();
                    LANDMARK_COUNT
                ])))
            }
        }
    }

    #[test]
    fn test_pose_source_contract() {
        let mut source = OneShotSource { served: false };

        let first = source.next_observation().unwrap();
        assert!(first.is_some());
        assert!(first.unwrap().is_valid());

        // 2回目は手なしフレーム
        assert!(source.next_observation().unwrap().is_none());
    }
}
