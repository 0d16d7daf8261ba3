/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// すべての処理で共有される不変の型。

use std::time::Instant;

/// 手のランドマーク数（MediaPipe Hand Landmark 互換）
pub const LANDMARK_COUNT: usize = 21;

/// ランドマークの解剖学的インデックス
///
/// インデックスの並び順は固定であり、並べ替えてはならない。
/// 0 = 手首、4/8/12/16/20 = 各指の指先、中間インデックスは関節。
#[allow(dead_code)]
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

/// カメラフレームに対する正規化3D座標のランドマーク点
///
/// 画面座標系のため y は下方向に増加する（「上がっている」= y が小さい）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    /// 新しいランドマークを作成
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 他のランドマークとの3Dユークリッド距離
    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// 1フレーム分の手の観測（21ランドマークの順序付き列）
///
/// 長さが21でない観測は不正（malformed）として扱われ、
/// 分類結果は常にジェスチャーなし（コード0）に落ちる。
/// エラーにはせず、ジェスチャーなしへ静かに縮退する。
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: Vec<Landmark>,
}

impl HandObservation {
    /// 新しい観測を作成（長さの検証は行わない）
    ///
    /// 不正な長さも受け付ける。妥当性は `is_valid()` で判定する。
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// 観測が正確に21ランドマークを持つか
    pub fn is_valid(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT
    }

    /// インデックス指定でランドマークを取得
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// ランドマーク数
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// 観測が空か
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// 手のサイズ: 手首(0)から中指の指先(12)までの3D距離
    ///
    /// 不正な観測の場合は None
    pub fn hand_size(&self) -> Option<f32> {
        if !self.is_valid() {
            return None;
        }
        let wrist = self.get(landmark::WRIST)?;
        let middle_tip = self.get(landmark::MIDDLE_TIP)?;
        Some(wrist.distance_to(middle_tip))
    }

    /// 親指の指先(4)と人差し指の指先(8)の3D距離
    ///
    /// 不正な観測の場合は None
    pub fn thumb_index_distance(&self) -> Option<f32> {
        if !self.is_valid() {
            return None;
        }
        let thumb_tip = self.get(landmark::THUMB_TIP)?;
        let index_tip = self.get(landmark::INDEX_TIP)?;
        Some(thumb_tip.distance_to(index_tip))
    }
}

/// フレームごとの指の伸展フラグ
///
/// 非親指4本の伸展状態と、親指が立っているかの独立したフラグ。
/// フレームスコープであり永続化されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerFlags {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
    pub thumb_up: bool,
}

impl FingerFlags {
    /// 伸展している非親指の本数（0〜4）
    pub fn extended_count(&self) -> u8 {
        u8::from(self.index)
            + u8::from(self.middle)
            + u8::from(self.ring)
            + u8::from(self.pinky)
    }
}

/// ジェスチャーコード（クリケットの手に対応する離散値）
///
/// 0 = 認識なし、1〜4 = 指の本数、5 = 開いた手、6 = サムズアップ。
/// 処理フレームごとに新しく算出されるエフェメラルな値。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GestureCode {
    None = 0,
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    OpenHand = 5,
    ThumbsUp = 6,
}

impl GestureCode {
    /// 数値表現（0〜6）
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// クリケットのラン数（1〜6）。認識なしの場合は None
    pub fn runs(self) -> Option<u8> {
        match self {
            GestureCode::None => None,
            other => Some(other.as_u8()),
        }
    }

    /// 数値からの変換（テスト・デモ用）
    #[allow(dead_code)]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GestureCode::None),
            1 => Some(GestureCode::One),
            2 => Some(GestureCode::Two),
            3 => Some(GestureCode::Three),
            4 => Some(GestureCode::Four),
            5 => Some(GestureCode::OpenHand),
            6 => Some(GestureCode::ThumbsUp),
            _ => None,
        }
    }
}

/// デバウンサーが発火したジェスチャーイベント
///
/// デバウンスサイクルごとに最大1回だけ発火する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    /// 検出されたジェスチャー（常に1〜6、Noneは発火しない）
    pub code: GestureCode,
    /// 発火時刻
    pub at: Instant,
}
