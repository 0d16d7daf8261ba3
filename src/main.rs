mod application;
mod domain;
mod infrastructure;
mod logging;

use crate::application::game::{
    HandCricketMatch, InningsChoice, MatchPhase, MatchResult, Parity, Side,
};
use crate::application::session::{GestureSession, SessionControl};
use crate::domain::config::AppConfig;
use crate::domain::ports::MoveSource;
use crate::domain::DomainResult;
use crate::infrastructure::mock_capture::MockCapture;
use crate::infrastructure::random_move::RandomMoveSource;
use crate::infrastructure::synthetic_pose::SyntheticPoseSource;
use crate::logging::init_logging;
use std::path::PathBuf;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("GoldenDuck starting...");

    match run() {
        Ok(_) => {
            tracing::info!("GoldenDuck terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
///
/// 合成ポーズソースでジェスチャーパイプラインを駆動し、
/// 乱数対戦相手とのハンドクリケット1試合を実行する。
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Pipeline: max_fps={}, debounce={}frames/{}ms",
        config.pipeline.max_fps,
        config.debounce.streak_threshold,
        config.debounce.cooldown_ms
    );
    tracing::info!(
        "Watchdog: no_observation={}ms, liveness={}ms",
        config.watchdog.no_observation_timeout_ms,
        config.watchdog.liveness_timeout_ms
    );

    let mut opponent = RandomMoveSource::new();
    let mut game = HandCricketMatch::new();

    let capture = MockCapture::new();
    let mut session = GestureSession::new(capture, &config);
    let pose = SyntheticPoseSource::new(0x600D_D0C6);

    tracing::info!("Starting gesture session with synthetic pose source...");

    session.run(pose, |event| {
        let Some(pick) = event.code.runs() else {
            return SessionControl::Continue;
        };
        tracing::info!(pick, "Player gesture recognized");

        match advance_match(&mut game, &mut opponent, pick) {
            Ok(control) => control,
            Err(e) => {
                tracing::error!("Match error: {e}");
                SessionControl::Stop
            }
        }
    })?;

    report_scorecard(&game);
    Ok(())
}

/// ジェスチャー1回分で試合を進める
fn advance_match(
    game: &mut HandCricketMatch,
    opponent: &mut RandomMoveSource,
    pick: u8,
) -> DomainResult<SessionControl> {
    match game.phase() {
        MatchPhase::Toss => {
            let winner = game.toss(Parity::Odd, pick, opponent.next_move())?;
            // トス勝者は打撃を選ぶ
            game.choose_innings(InningsChoice::Bat)?;
            tracing::info!(?winner, batting = ?game.batting_side(), "Toss complete");
            Ok(SessionControl::Continue)
        }
        MatchPhase::FirstInnings | MatchPhase::SecondInnings => {
            let ball = game.play_ball(pick, opponent.next_move())?;
            let score = game.scoreboard();
            tracing::info!(
                batter = ?ball.batter,
                runs = ball.runs_scored,
                out = ball.out,
                player = score.player_runs,
                opponent = score.opponent_runs,
                chase_target = ?score.target,
                "Ball played"
            );

            if ball.match_finished {
                Ok(SessionControl::Stop)
            } else {
                Ok(SessionControl::Continue)
            }
        }
        _ => Ok(SessionControl::Continue),
    }
}

/// 最終スコアカードを出力
fn report_scorecard(game: &HandCricketMatch) {
    let score = game.scoreboard();
    tracing::info!("=== Final Scorecard ===");
    tracing::info!("Player:   {} runs", score.player_runs);
    tracing::info!("Opponent: {} runs", score.opponent_runs);
    match game.result() {
        Some(MatchResult::Won(Side::Player)) => tracing::info!("Result: Player wins!"),
        Some(MatchResult::Won(Side::Opponent)) => tracing::info!("Result: Opponent wins"),
        Some(MatchResult::Tie) => tracing::info!("Result: Tie"),
        None => tracing::info!("Result: unfinished"),
    }
    tracing::info!("=======================");
}
