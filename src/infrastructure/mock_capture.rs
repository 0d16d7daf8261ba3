//! モックキャプチャ実装
//!
//! カメラを持たない環境（テスト・デモ）向けの `CapturePort` 実装。
//! ライフサイクル呼び出しを記録するだけで、実際のデバイスには触らない。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::{ports::CapturePort, DomainError, DomainResult};

/// 呼び出し記録つきのキャプチャモック
#[derive(Debug, Default)]
pub struct MockCapture {
    started: bool,
    restart_count: Arc<AtomicU64>,
    /// trueの場合、restart()が常に失敗する
    fail_restarts: bool,
}

impl MockCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// restart()が常に失敗するモックを作成
    #[allow(dead_code)] // リカバリ経路のテスト用
    pub fn failing() -> Self {
        Self {
            fail_restarts: true,
            ..Self::default()
        }
    }

    /// 再起動回数カウンターへのハンドルを取得
    ///
    /// モック本体がセッションへ移動した後も観測できるよう共有する。
    pub fn restart_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.restart_count)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl CapturePort for MockCapture {
    fn start(&mut self) -> DomainResult<()> {
        tracing::debug!("Mock capture started");
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        tracing::debug!("Mock capture stopped");
        self.started = false;
    }

    fn restart(&mut self) -> DomainResult<()> {
        if self.fail_restarts {
            return Err(DomainError::Capture("mock restart failure".to_string()));
        }
        self.restart_count.fetch_add(1, Ordering::SeqCst);
        self.started = true;
        Ok(())
    }
}
