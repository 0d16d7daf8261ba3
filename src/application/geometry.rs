//! ランドマーク幾何解析（Application層）
//!
//! 1つの手の観測（21ランドマーク）から、指ごとの伸展フラグと
//! 親指が立っているかを純関数で判定します。
//!
//! 画面座標系では y は下方向に増加するため、「指が上がっている」とは
//! 指先の y が中間関節（PIP）より数値的に小さいことを意味する。
//! z の差分チェックは、上がってはいるがカメラ方向に曲がっている指を棄却する。

use crate::domain::{
    types::landmark, ClassifierConfig, FingerFlags, HandObservation, Landmark,
};

/// 非親指の (tip, pip) インデックスペア
const FINGER_JOINTS: [(usize, usize); 4] = [
    (landmark::INDEX_TIP, landmark::INDEX_PIP),
    (landmark::MIDDLE_TIP, landmark::MIDDLE_PIP),
    (landmark::RING_TIP, landmark::RING_PIP),
    (landmark::PINKY_TIP, landmark::PINKY_PIP),
];

/// 観測から指の伸展フラグを算出
///
/// # Arguments
/// - `obs`: 1フレーム分の手の観測
/// - `config`: 幾何しきい値（yマージン・z許容差）
///
/// # Returns
/// 5つの真偽値（index/middle/ring/pinky の伸展と thumb_up）。
/// 不正な観測（21点未満）の場合はすべて false。
pub fn analyze(obs: &HandObservation, config: &ClassifierConfig) -> FingerFlags {
    if !obs.is_valid() {
        // 不正な観測はジェスチャーなしに落とす（エラーにしない）
        return FingerFlags::default();
    }

    let finger = |tip_idx: usize, pip_idx: usize| -> bool {
        match (obs.get(tip_idx), obs.get(pip_idx)) {
            (Some(tip), Some(pip)) => {
                is_raised(tip, pip, config.finger_y_margin, config.finger_z_tolerance)
            }
            _ => false,
        }
    };

    let thumb_up = match (obs.get(landmark::THUMB_TIP), obs.get(landmark::THUMB_IP)) {
        (Some(tip), Some(ip)) => {
            is_raised(tip, ip, config.thumb_y_margin, config.thumb_z_tolerance)
        }
        _ => false,
    };

    FingerFlags {
        index: finger(FINGER_JOINTS[0].0, FINGER_JOINTS[0].1),
        middle: finger(FINGER_JOINTS[1].0, FINGER_JOINTS[1].1),
        ring: finger(FINGER_JOINTS[2].0, FINGER_JOINTS[2].1),
        pinky: finger(FINGER_JOINTS[3].0, FINGER_JOINTS[3].1),
        thumb_up,
    }
}

/// 指先が関節より明確に上にあり、かつ奥行き方向に曲がっていないか
#[inline]
fn is_raised(tip: &Landmark, joint: &Landmark, y_margin: f32, z_tolerance: f32) -> bool {
    tip.y < joint.y - y_margin && (tip.z - joint.z).abs() < z_tolerance
}
