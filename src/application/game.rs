//! ハンドクリケット対戦エンジン（Application層）
//!
//! トス → 先攻イニング → 後攻イニング → 決着、の有限状態機械と
//! スコア管理。ジェスチャーパイプラインが発火した1〜6の整数を
//! 不透明なイベントとして消費する。
//!
//! 範囲外の手（1〜6以外）はプログラミング契約違反であり、
//! 丸め込まずに呼び出しを失敗させる。

use crate::domain::{DomainError, DomainResult};

/// トスのコール（両者の出した手の合計の偶奇を当てる）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Odd,
    Even,
}

/// 対戦の側
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

/// トス勝者の選択
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InningsChoice {
    Bat,
    Bowl,
}

/// 対戦のフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// トス待ち
    Toss,
    /// トス勝者の打順選択待ち
    ChoosingInnings,
    /// 先攻イニング進行中
    FirstInnings,
    /// 後攻イニング（チェイス）進行中
    SecondInnings,
    /// 決着済み
    Finished,
}

/// 対戦結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Won(Side),
    Tie,
}

/// 1球の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallOutcome {
    /// この球の打者
    pub batter: Side,
    /// 打者が獲得したラン（アウト時は0）
    pub runs_scored: u8,
    /// 両者の手が一致してアウトになったか
    pub out: bool,
    /// この球でイニングが終了したか
    pub innings_ended: bool,
    /// この球で対戦が決着したか
    pub match_finished: bool,
}

/// スコアボード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoreboard {
    pub player_runs: u32,
    pub opponent_runs: u32,
    /// 後攻イニングの勝利に必要なラン数（先攻終了後に設定）
    pub target: Option<u32>,
}

/// ハンドクリケットの1試合
#[derive(Debug)]
pub struct HandCricketMatch {
    phase: MatchPhase,
    toss_winner: Option<Side>,
    /// 現在の打者（イニング中のみ意味を持つ）
    batting: Side,
    player_runs: u32,
    opponent_runs: u32,
    target: Option<u32>,
    result: Option<MatchResult>,
}

impl HandCricketMatch {
    /// 新しい試合をトス待ちで開始
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::Toss,
            toss_winner: None,
            batting: Side::Player,
            player_runs: 0,
            opponent_runs: 0,
            target: None,
            result: None,
        }
    }

    /// トスを実行
    ///
    /// プレイヤーが合計の偶奇をコールし、的中すればトス勝ち。
    ///
    /// # Returns
    /// トス勝者
    pub fn toss(&mut self, call: Parity, player_pick: u8, opponent_pick: u8) -> DomainResult<Side> {
        self.expect_phase(MatchPhase::Toss)?;
        validate_move(player_pick)?;
        validate_move(opponent_pick)?;

        let sum = u32::from(player_pick) + u32::from(opponent_pick);
        let actual = if sum % 2 == 0 { Parity::Even } else { Parity::Odd };
        let winner = if actual == call { Side::Player } else { Side::Opponent };

        self.toss_winner = Some(winner);
        self.phase = MatchPhase::ChoosingInnings;
        tracing::info!(?winner, sum, "Toss resolved");
        Ok(winner)
    }

    /// トス勝者が打つか投げるかを選択
    pub fn choose_innings(&mut self, choice: InningsChoice) -> DomainResult<()> {
        self.expect_phase(MatchPhase::ChoosingInnings)?;
        let winner = self
            .toss_winner
            .ok_or_else(|| DomainError::InvalidGameState("toss winner not set".to_string()))?;

        self.batting = match choice {
            InningsChoice::Bat => winner,
            InningsChoice::Bowl => winner.other(),
        };
        self.phase = MatchPhase::FirstInnings;
        tracing::info!(batting = ?self.batting, "First innings begins");
        Ok(())
    }

    /// 1球をプレイ
    ///
    /// # Arguments
    /// - `player_pick`: プレイヤーの手（ジェスチャーイベントの値、1〜6）
    /// - `opponent_pick`: 相手の手（1〜6）
    pub fn play_ball(&mut self, player_pick: u8, opponent_pick: u8) -> DomainResult<BallOutcome> {
        if !matches!(
            self.phase,
            MatchPhase::FirstInnings | MatchPhase::SecondInnings
        ) {
            return Err(DomainError::InvalidGameState(format!(
                "cannot play a ball in phase {:?}",
                self.phase
            )));
        }
        validate_move(player_pick)?;
        validate_move(opponent_pick)?;

        let batter = self.batting;
        let (bat_pick, bowl_pick) = match batter {
            Side::Player => (player_pick, opponent_pick),
            Side::Opponent => (opponent_pick, player_pick),
        };

        let mut outcome = BallOutcome {
            batter,
            runs_scored: 0,
            out: false,
            innings_ended: false,
            match_finished: false,
        };

        if bat_pick == bowl_pick {
            // 両者の手が一致 → アウト、イニング終了（1ウィケット制）
            outcome.out = true;
            outcome.innings_ended = true;
            self.end_innings(&mut outcome);
        } else {
            outcome.runs_scored = bat_pick;
            *self.runs_of_mut(batter) += u32::from(bat_pick);

            // チェイス中は目標到達で即決着
            if self.phase == MatchPhase::SecondInnings {
                if let Some(target) = self.target {
                    if self.runs_of(batter) >= target {
                        outcome.innings_ended = true;
                        outcome.match_finished = true;
                        self.result = Some(MatchResult::Won(batter));
                        self.phase = MatchPhase::Finished;
                        tracing::info!(winner = ?batter, "Target chased down");
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// スコアボードを取得
    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard {
            player_runs: self.player_runs,
            opponent_runs: self.opponent_runs,
            target: self.target,
        }
    }

    /// 現在のフェーズ
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// 現在の打者
    pub fn batting_side(&self) -> Side {
        self.batting
    }

    /// 決着済みなら結果を返す
    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    fn end_innings(&mut self, outcome: &mut BallOutcome) {
        match self.phase {
            MatchPhase::FirstInnings => {
                // 目標 = 先攻スコア + 1、攻守交替
                self.target = Some(self.runs_of(self.batting) + 1);
                self.batting = self.batting.other();
                self.phase = MatchPhase::SecondInnings;
                tracing::info!(chase_target = ?self.target, chasing = ?self.batting, "Second innings begins");
            }
            MatchPhase::SecondInnings => {
                outcome.match_finished = true;
                self.phase = MatchPhase::Finished;

                let chaser = self.batting;
                let chaser_runs = self.runs_of(chaser);
                // 目標はチェイス中に到達済みなら既に決着している。
                // ここに来るのはアウトで終わった場合のみ。
                let target = self.target.unwrap_or(0);
                self.result = Some(if chaser_runs + 1 == target {
                    MatchResult::Tie
                } else {
                    MatchResult::Won(chaser.other())
                });
                tracing::info!(result = ?self.result, "Match finished");
            }
            _ => {}
        }
    }

    fn runs_of(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_runs,
            Side::Opponent => self.opponent_runs,
        }
    }

    fn runs_of_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Player => &mut self.player_runs,
            Side::Opponent => &mut self.opponent_runs,
        }
    }

    fn expect_phase(&self, expected: MatchPhase) -> DomainResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidGameState(format!(
                "expected phase {:?}, but match is in {:?}",
                expected, self.phase
            )))
        }
    }
}

impl Default for HandCricketMatch {
    fn default() -> Self {
        Self::new()
    }
}

/// 手が1〜6の範囲内であることを検証（範囲外は契約違反）
fn validate_move(value: u8) -> DomainResult<()> {
    if (1..=6).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::InvalidMove(value))
    }
}
