//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。
//! 各セクションのデフォルト値は調整済みの基準値（指の伸展マージン0.07、
//! デバウンス3フレーム/1秒、15fps制限、ウォッチドッグ5秒/3秒、
//! キャリブレーション5秒窓）をそのまま持つ。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// キャプチャ・再起動設定
    pub capture: CaptureConfig,
    /// パイプライン設定（フレームレート制限・統計）
    pub pipeline: PipelineConfig,
    /// ジェスチャー分類の幾何しきい値
    pub classifier: ClassifierConfig,
    /// 確信度デバウンス設定
    pub debounce: DebounceConfig,
    /// ストール検出ウォッチドッグ設定
    pub watchdog: WatchdogConfig,
    /// キャリブレーション設定
    pub calibration: CalibrationConfig,
}

/// キャプチャ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    /// セッションループの待ち受けタイムアウト（ミリ秒）
    ///
    /// フレームが到着しない間もこの間隔でウォッチドッグを確認する
    /// デフォルト: 20ms
    pub poll_interval_ms: u64,

    /// 再起動時の初期待機時間（ミリ秒）
    ///
    /// デフォルト: 100ms
    pub restart_initial_delay_ms: u64,

    /// 再起動時の最大待機時間（ミリ秒、指数バックオフの上限）
    ///
    /// デフォルト: 5000ms
    pub restart_max_delay_ms: u64,

    /// 再起動の最大試行回数
    ///
    /// この回数を超えたら持続的エラーとして呼び出し側に伝播する
    /// デフォルト: 5回
    pub max_restart_attempts: u32,
}

impl CaptureConfig {
    /// デフォルトの待ち受けタイムアウト（ミリ秒）
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;
    /// デフォルトの再起動初期遅延（ミリ秒）
    pub const DEFAULT_RESTART_INITIAL_DELAY_MS: u64 = 100;
    /// デフォルトの再起動最大遅延（ミリ秒）
    pub const DEFAULT_RESTART_MAX_DELAY_MS: u64 = 5000;
    /// デフォルトの再起動最大試行回数
    pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 5;

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn restart_initial_delay(&self) -> Duration {
        Duration::from_millis(self.restart_initial_delay_ms)
    }

    pub fn restart_max_delay(&self) -> Duration {
        Duration::from_millis(self.restart_max_delay_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            restart_initial_delay_ms: Self::DEFAULT_RESTART_INITIAL_DELAY_MS,
            restart_max_delay_ms: Self::DEFAULT_RESTART_MAX_DELAY_MS,
            max_restart_attempts: Self::DEFAULT_MAX_RESTART_ATTEMPTS,
        }
    }
}

/// パイプライン設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// 解析チェーンへ転送する1秒あたりの最大フレーム数
    ///
    /// 超過フレームはキューイングせず破棄される
    /// デフォルト: 15
    pub max_fps: u32,

    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,
}

impl PipelineConfig {
    /// デフォルトの最大処理フレームレート
    pub const DEFAULT_MAX_FPS: u32 = 15;
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;

    /// フレーム間の最小間隔
    pub fn min_frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.max_fps.max(1)))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_fps: Self::DEFAULT_MAX_FPS,
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
        }
    }
}

/// ジェスチャー分類の幾何しきい値
///
/// 画面座標系では y は下方向に増加するため、「指が上がっている」とは
/// 指先の y が関節より小さいことを意味する。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct ClassifierConfig {
    /// 非親指の y マージン
    ///
    /// 指先が PIP 関節よりこの値以上「上」にあれば伸展と判定
    /// デフォルト: 0.07
    pub finger_y_margin: f32,

    /// 非親指の z 許容差
    ///
    /// カメラ方向に曲がった指を棄却する
    /// デフォルト: 0.07
    pub finger_z_tolerance: f32,

    /// 親指の y マージン（親指の運動学は他指と異なるため緩め）
    ///
    /// デフォルト: 0.05
    pub thumb_y_margin: f32,

    /// 親指の z 許容差
    ///
    /// デフォルト: 0.1
    pub thumb_z_tolerance: f32,
}

impl ClassifierConfig {
    pub const DEFAULT_FINGER_Y_MARGIN: f32 = 0.07;
    pub const DEFAULT_FINGER_Z_TOLERANCE: f32 = 0.07;
    pub const DEFAULT_THUMB_Y_MARGIN: f32 = 0.05;
    pub const DEFAULT_THUMB_Z_TOLERANCE: f32 = 0.1;
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            finger_y_margin: Self::DEFAULT_FINGER_Y_MARGIN,
            finger_z_tolerance: Self::DEFAULT_FINGER_Z_TOLERANCE,
            thumb_y_margin: Self::DEFAULT_THUMB_Y_MARGIN,
            thumb_z_tolerance: Self::DEFAULT_THUMB_Z_TOLERANCE,
        }
    }
}

/// 確信度デバウンス設定
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct DebounceConfig {
    /// イベント発火に必要な連続一致フレーム数
    ///
    /// 単位は「処理済みフレーム」であり壁時計時間ではない
    /// デフォルト: 3
    pub streak_threshold: u32,

    /// 発火後のクールダウン（ミリ秒）
    ///
    /// 経過後に last-fired と全ストリークをクリアし、
    /// 同じポーズの再検出を許可する
    /// デフォルト: 1000ms
    pub cooldown_ms: u64,
}

impl DebounceConfig {
    pub const DEFAULT_STREAK_THRESHOLD: u32 = 3;
    pub const DEFAULT_COOLDOWN_MS: u64 = 1000;

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            streak_threshold: Self::DEFAULT_STREAK_THRESHOLD,
            cooldown_ms: Self::DEFAULT_COOLDOWN_MS,
        }
    }
}

/// ストール検出ウォッチドッグ設定
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct WatchdogConfig {
    /// 無観測タイマー（ミリ秒）
    ///
    /// 手なしフレームの処理から起動し、手の検出なしに満了したら
    /// キャプチャ再起動を指示する
    /// デフォルト: 5000ms
    pub no_observation_timeout_ms: u64,

    /// 生存タイマー（ミリ秒）
    ///
    /// 最後の手の観測成功からの経過がこの値を超えたら再起動を指示する
    /// （一度も観測がない間は作動しない）
    /// デフォルト: 3000ms
    pub liveness_timeout_ms: u64,
}

impl WatchdogConfig {
    pub const DEFAULT_NO_OBSERVATION_TIMEOUT_MS: u64 = 5000;
    pub const DEFAULT_LIVENESS_TIMEOUT_MS: u64 = 3000;

    pub fn no_observation_timeout(&self) -> Duration {
        Duration::from_millis(self.no_observation_timeout_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            no_observation_timeout_ms: Self::DEFAULT_NO_OBSERVATION_TIMEOUT_MS,
            liveness_timeout_ms: Self::DEFAULT_LIVENESS_TIMEOUT_MS,
        }
    }
}

/// キャリブレーション設定
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationConfig {
    /// キャリブレーション窓の長さ（ミリ秒）
    ///
    /// デフォルト: 5000ms
    pub window_ms: u64,

    /// 親指-人差し指間距離に掛けるスケール係数
    ///
    /// デフォルト: 0.7
    pub thumb_index_scale: f32,
}

impl CalibrationConfig {
    pub const DEFAULT_WINDOW_MS: u64 = 5000;
    pub const DEFAULT_THUMB_INDEX_SCALE: f32 = 0.7;

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_ms: Self::DEFAULT_WINDOW_MS,
            thumb_index_scale: Self::DEFAULT_THUMB_INDEX_SCALE,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        if self.pipeline.max_fps == 0 {
            return Err(DomainError::Configuration(
                "pipeline.max_fps must be greater than 0".to_string(),
            ));
        }

        if self.debounce.streak_threshold == 0 {
            return Err(DomainError::Configuration(
                "debounce.streak_threshold must be greater than 0".to_string(),
            ));
        }
        if self.debounce.cooldown_ms == 0 {
            return Err(DomainError::Configuration(
                "debounce.cooldown_ms must be greater than 0".to_string(),
            ));
        }

        let c = &self.classifier;
        for (name, value) in [
            ("classifier.finger_y_margin", c.finger_y_margin),
            ("classifier.finger_z_tolerance", c.finger_z_tolerance),
            ("classifier.thumb_y_margin", c.thumb_y_margin),
            ("classifier.thumb_z_tolerance", c.thumb_z_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::Configuration(format!(
                    "{} must be a non-negative finite number",
                    name
                )));
            }
        }

        if self.watchdog.no_observation_timeout_ms == 0 || self.watchdog.liveness_timeout_ms == 0 {
            return Err(DomainError::Configuration(
                "watchdog timeouts must be greater than 0".to_string(),
            ));
        }

        if self.calibration.window_ms == 0 {
            return Err(DomainError::Configuration(
                "calibration.window_ms must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.calibration.thumb_index_scale) {
            return Err(DomainError::Configuration(
                "calibration.thumb_index_scale must be within 0.0..=1.0".to_string(),
            ));
        }

        if self.capture.max_restart_attempts == 0 {
            return Err(DomainError::Configuration(
                "capture.max_restart_attempts must be greater than 0".to_string(),
            ));
        }
        if self.capture.restart_initial_delay_ms > self.capture.restart_max_delay_ms {
            return Err(DomainError::Configuration(
                "capture.restart_initial_delay_ms must not exceed restart_max_delay_ms"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.max_fps, 15);
        assert_eq!(config.debounce.streak_threshold, 3);
        assert_eq!(config.debounce.cooldown_ms, 1000);
        assert_eq!(config.watchdog.no_observation_timeout_ms, 5000);
        assert_eq!(config.watchdog.liveness_timeout_ms, 3000);
        assert_eq!(config.calibration.window_ms, 5000);
        assert!((config.classifier.finger_y_margin - 0.07).abs() < f32::EPSILON);
    }

    #[test]
    fn test_min_frame_interval() {
        let pipeline = PipelineConfig::default();
        // 15fps → 1000/15 = 66ms（整数切り捨て）
        assert_eq!(pipeline.min_frame_interval(), Duration::from_millis(66));
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.pipeline.max_fps = 0;
        assert!(config.validate().is_err());
        config.pipeline.max_fps = 15;

        config.debounce.streak_threshold = 0;
        assert!(config.validate().is_err());
        config.debounce.streak_threshold = 3;

        config.classifier.finger_y_margin = -0.1;
        assert!(config.validate().is_err());
        config.classifier.finger_y_margin = 0.07;

        config.calibration.thumb_index_scale = 1.5;
        assert!(config.validate().is_err());
        config.calibration.thumb_index_scale = 0.7;

        config.capture.restart_initial_delay_ms = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_full_toml_parses() {
        let toml = r#"
            [capture]
            poll_interval_ms = 20
            restart_initial_delay_ms = 100
            restart_max_delay_ms = 5000
            max_restart_attempts = 5

            [pipeline]
            max_fps = 15
            stats_interval_sec = 10

            [classifier]
            finger_y_margin = 0.07
            finger_z_tolerance = 0.07
            thumb_y_margin = 0.05
            thumb_z_tolerance = 0.1

            [debounce]
            streak_threshold = 3
            cooldown_ms = 1000

            [watchdog]
            no_observation_timeout_ms = 5000
            liveness_timeout_ms = 3000

            [calibration]
            window_ms = 5000
            thumb_index_scale = 0.7
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.max_restart_attempts, 5);
    }

    #[test]
    fn test_config_loads() {
        // config.tomlが正常に読み込めることを確認
        let config = AppConfig::from_file("config.toml").expect("config.tomlが読み込めません");
        config
            .validate()
            .expect("設定値のバリデーションに失敗しました");
    }

    #[test]
    fn test_config_example_loads() {
        // config.toml.exampleが正常に読み込めることを確認
        let config = AppConfig::from_file("config.toml.example")
            .expect("config.toml.exampleが読み込めません");
        config
            .validate()
            .expect("設定値のバリデーションに失敗しました");
    }

    #[test]
    fn test_write_default_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        AppConfig::write_default(&path).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap();

        assert!(loaded.validate().is_ok());
        assert_eq!(loaded.pipeline.max_fps, AppConfig::default().pipeline.max_fps);
    }
}
