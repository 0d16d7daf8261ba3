//! 確信度デバウンス（Application層）
//!
//! 単一フレームのノイズと、保持されたポーズの連続再発火を抑制します。
//! ジェスチャーコードが一定の連続処理フレーム数だけ持続して初めて
//! 「検出」とみなし、発火後はクールダウンが明けるまで再発火しません。
//!
//! クールダウンはコールバックではなくデッドライン保持+ポーリングで表現する。
//! `reset()` がデッドラインごと消すため、リセットと満了が競合しない。

use std::time::{Duration, Instant};

use crate::domain::{DebounceConfig, GestureCode, GestureEvent};

/// ジェスチャーコードの総数（0〜6）
const CODE_COUNT: usize = 7;

/// ジェスチャーコード→連続一致フレーム数のカウンター状態機械
#[derive(Debug)]
pub struct ConfidenceDebouncer {
    streak_threshold: u32,
    cooldown: Duration,
    /// コードごとのストリーク（インデックス = コード値）
    streaks: [u32; CODE_COUNT],
    /// 最後に発火したコード（None = 未発火またはクールダウン明け）
    last_fired: Option<GestureCode>,
    /// クールダウン満了時刻（発火中のみ Some）
    cooldown_deadline: Option<Instant>,
}

impl ConfidenceDebouncer {
    /// 新しいデバウンサーを作成
    pub fn new(config: &DebounceConfig) -> Self {
        Self {
            streak_threshold: config.streak_threshold,
            cooldown: config.cooldown(),
            streaks: [0; CODE_COUNT],
            last_fired: None,
            cooldown_deadline: None,
        }
    }

    /// 処理フレーム1枚分のジェスチャーコードを観測
    ///
    /// # Arguments
    /// - `code`: 分類器が出力したフレームのコード
    /// - `now`: フレームの処理時刻
    ///
    /// # Returns
    /// しきい値に到達し、かつ前回発火と異なる場合のみ `Some(GestureEvent)`。
    /// このイベントがコンポーネント唯一の外部可視な副作用。
    pub fn observe(&mut self, code: GestureCode, now: Instant) -> Option<GestureEvent> {
        self.expire_cooldown(now);

        // コード0はストリークに触れない（瞬間的な取りこぼしへの意図的な耐性）
        if code == GestureCode::None {
            return None;
        }

        // 異なるコードのストリークをすべてリセットしてから加算
        let slot = code.as_u8() as usize;
        for (i, streak) in self.streaks.iter_mut().enumerate() {
            if i != slot {
                *streak = 0;
            }
        }
        self.streaks[slot] += 1;

        if self.streaks[slot] >= self.streak_threshold && self.last_fired != Some(code) {
            self.last_fired = Some(code);
            self.cooldown_deadline = Some(now + self.cooldown);
            return Some(GestureEvent { code, at: now });
        }

        None
    }

    /// 全状態をクリア
    ///
    /// キャリブレーション開始時とキャプチャ再起動時に呼び出される。
    /// 保留中のクールダウンもここで確実にキャンセルされる。
    pub fn reset(&mut self) {
        self.streaks = [0; CODE_COUNT];
        self.last_fired = None;
        self.cooldown_deadline = None;
    }

    /// クールダウンが満了していれば発火状態と全ストリークをクリア
    fn expire_cooldown(&mut self, now: Instant) {
        if let Some(deadline) = self.cooldown_deadline {
            if now >= deadline {
                self.streaks = [0; CODE_COUNT];
                self.last_fired = None;
                self.cooldown_deadline = None;
            }
        }
    }

    /// 現在のストリーク（テスト・統計用）
    #[allow(dead_code)]
    pub fn streak(&self, code: GestureCode) -> u32 {
        self.streaks[code.as_u8() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> ConfidenceDebouncer {
        ConfidenceDebouncer::new(&DebounceConfig::default())
    }

    /// 基準時刻から ms 後の Instant
    fn clock() -> impl Fn(u64) -> Instant {
        let t0 = Instant::now();
        move |ms| t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_fires_on_third_consecutive_frame() {
        let mut d = debouncer();
        let at = clock();

        assert!(d.observe(GestureCode::Two, at(0)).is_none());
        assert!(d.observe(GestureCode::Two, at(70)).is_none());

        let event = d.observe(GestureCode::Two, at(140)).expect("3連続で発火するはず");
        assert_eq!(event.code, GestureCode::Two);
    }

    #[test]
    fn test_two_frames_then_other_code_never_fires() {
        let mut d = debouncer();
        let at = clock();

        assert!(d.observe(GestureCode::Two, at(0)).is_none());
        assert!(d.observe(GestureCode::Two, at(70)).is_none());
        // 異なるコードが出たら2のストリークは0に戻る
        assert!(d.observe(GestureCode::OpenHand, at(140)).is_none());
        assert_eq!(d.streak(GestureCode::Two), 0);

        // 2を続けても改めて3フレーム必要
        assert!(d.observe(GestureCode::Two, at(210)).is_none());
        assert!(d.observe(GestureCode::Two, at(280)).is_none());
        assert!(d.observe(GestureCode::Two, at(350)).is_some());
    }

    #[test]
    fn test_zero_frames_do_not_reset_streaks() {
        let mut d = debouncer();
        let at = clock();

        assert!(d.observe(GestureCode::Three, at(0)).is_none());
        assert!(d.observe(GestureCode::Three, at(70)).is_none());
        // 瞬間的な取りこぼし（コード0）はストリークを保持する
        assert!(d.observe(GestureCode::None, at(140)).is_none());
        assert_eq!(d.streak(GestureCode::Three), 2);

        assert!(d.observe(GestureCode::Three, at(210)).is_some());
    }

    #[test]
    fn test_held_pose_does_not_refire_within_cooldown() {
        let mut d = debouncer();
        let at = clock();

        for i in 0..2 {
            assert!(d.observe(GestureCode::ThumbsUp, at(i * 70)).is_none());
        }
        assert!(d.observe(GestureCode::ThumbsUp, at(140)).is_some());

        // クールダウン中はいくら保持しても再発火しない
        for i in 3..15 {
            assert!(d.observe(GestureCode::ThumbsUp, at(i * 70)).is_none());
        }
    }

    #[test]
    fn test_refires_after_cooldown() {
        let mut d = debouncer();
        let at = clock();

        assert!(d.observe(GestureCode::Four, at(0)).is_none());
        assert!(d.observe(GestureCode::Four, at(70)).is_none());
        assert!(d.observe(GestureCode::Four, at(140)).is_some());

        // クールダウン（1秒）明けの最初のフレームで状態がクリアされ、
        // 改めて3フレームの蓄積で同じポーズが再発火する
        assert!(d.observe(GestureCode::Four, at(1200)).is_none());
        assert!(d.observe(GestureCode::Four, at(1270)).is_none());
        assert!(d.observe(GestureCode::Four, at(1340)).is_some());
    }

    #[test]
    fn test_different_code_fires_during_cooldown_wait() {
        let mut d = debouncer();
        let at = clock();

        assert!(d.observe(GestureCode::One, at(0)).is_none());
        assert!(d.observe(GestureCode::One, at(70)).is_none());
        assert!(d.observe(GestureCode::One, at(140)).is_some());

        // 発火直後でも異なるコードはしきい値到達で発火できる
        assert!(d.observe(GestureCode::Two, at(210)).is_none());
        assert!(d.observe(GestureCode::Two, at(280)).is_none());
        let event = d.observe(GestureCode::Two, at(350)).expect("別コードは発火する");
        assert_eq!(event.code, GestureCode::Two);
    }

    #[test]
    fn test_reset_cancels_pending_cooldown() {
        let mut d = debouncer();
        let at = clock();

        assert!(d.observe(GestureCode::Two, at(0)).is_none());
        assert!(d.observe(GestureCode::Two, at(70)).is_none());
        assert!(d.observe(GestureCode::Two, at(140)).is_some());

        d.reset();

        // リセット後はクールダウンの残りに関係なく新規に数え直す
        assert!(d.observe(GestureCode::Two, at(200)).is_none());
        assert!(d.observe(GestureCode::Two, at(270)).is_none());
        assert!(d.observe(GestureCode::Two, at(340)).is_some());
    }
}
