//! ジェスチャー分類（Application層）
//!
//! 指の伸展フラグから1フレーム分の離散ジェスチャーコードを決定します。
//!
//! # 判定順序（最初に一致したルールが勝つ）
//! 順序は優先度を符号化しており、入れ替えてはならない：
//! 1. サムズアップは非親指が0本のときだけ成立する。そうでないと
//!    親指も開いた「開いた手」と二重一致する。
//! 2. 開いた手（非親指4本以上）は本数ルールより先に判定する。
//!    これにより「ちょうど4本伸展」はルール2経由でのみ5になる。
//! 3. 1〜4本はその本数がそのままコードになる（実際には4はルール2が
//!    先に拾うため、ここに到達するのは1〜3本のみ）。

use crate::domain::{FingerFlags, GestureCode};

/// 伸展フラグを1つのジェスチャーコードへ分類
pub fn classify(flags: &FingerFlags) -> GestureCode {
    let count = flags.extended_count();

    if flags.thumb_up && count == 0 {
        return GestureCode::ThumbsUp;
    }

    if count >= 4 {
        return GestureCode::OpenHand;
    }

    match count {
        1 => GestureCode::One,
        2 => GestureCode::Two,
        3 => GestureCode::Three,
        4 => GestureCode::Four, // 到達しないがルール3の上限は4を保つ
        _ => GestureCode::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(index: bool, middle: bool, ring: bool, pinky: bool, thumb_up: bool) -> FingerFlags {
        FingerFlags {
            index,
            middle,
            ring,
            pinky,
            thumb_up,
        }
    }

    #[test]
    fn test_counts_one_to_three() {
        assert_eq!(
            classify(&flags(true, false, false, false, false)),
            GestureCode::One
        );
        assert_eq!(
            classify(&flags(true, true, false, false, false)),
            GestureCode::Two
        );
        assert_eq!(
            classify(&flags(true, true, true, false, false)),
            GestureCode::Three
        );
    }

    #[test]
    fn test_four_fingers_is_open_hand() {
        // 4本伸展はルール2（開いた手）が先に成立し、コード4にはならない
        assert_eq!(
            classify(&flags(true, true, true, true, false)),
            GestureCode::OpenHand
        );
    }

    #[test]
    fn test_open_hand_regardless_of_thumb() {
        // 全指伸展は親指の状態に関わらず5
        assert_eq!(
            classify(&flags(true, true, true, true, true)),
            GestureCode::OpenHand
        );
    }

    #[test]
    fn test_thumbs_up_requires_zero_fingers() {
        assert_eq!(
            classify(&flags(false, false, false, false, true)),
            GestureCode::ThumbsUp
        );

        // 親指+1本はサムズアップではなく本数1
        assert_eq!(
            classify(&flags(true, false, false, false, true)),
            GestureCode::One
        );
    }

    #[test]
    fn test_nothing_recognized() {
        assert_eq!(
            classify(&flags(false, false, false, false, false)),
            GestureCode::None
        );
    }
}
