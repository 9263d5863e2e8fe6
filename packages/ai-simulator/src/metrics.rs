//! Per-game records written by the simulator.

use cafebot::ai::registry::by_difficulty;
use cafebot::domain::{Difficulty, Mark, Verdict};
use serde::Serialize;

use crate::simulator::GameResult;

#[derive(Debug, Clone, Serialize)]
pub struct GameMetrics {
    pub game_id: u32,
    pub seed: u64,
    pub timestamp: String,
    pub config: GameConfig,
    pub result: GameResultMetrics,
    pub moves: Vec<MoveMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameConfig {
    pub x: SideConfig,
    pub o: SideConfig,
    pub total_games: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideConfig {
    pub difficulty: Difficulty,
    pub strategy: &'static str,
    pub version: &'static str,
}

impl From<Difficulty> for SideConfig {
    fn from(difficulty: Difficulty) -> Self {
        let factory = by_difficulty(difficulty);
        Self {
            difficulty,
            strategy: factory.name,
            version: factory.version,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameResultMetrics {
    pub first_mover: Mark,
    pub outcome: Outcome,
    pub verdict: Verdict,
    pub move_count: usize,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    XWin,
    OWin,
    Draw,
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Win(Mark::X) => Outcome::XWin,
            Verdict::Win(Mark::O) => Outcome::OWin,
            Verdict::Draw => Outcome::Draw,
        }
    }
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::XWin => "x_win",
            Outcome::OWin => "o_win",
            Outcome::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveMetrics {
    pub ply: u8,
    pub mark: Mark,
    pub cell: u8,
}

/// Flat row for the CSV summary.
#[derive(Debug, Clone, Serialize)]
pub struct CsvSummaryRow {
    pub game_id: u32,
    pub seed: u64,
    pub first_mover: char,
    pub outcome: &'static str,
    pub move_count: usize,
    pub x_ai: &'static str,
    pub o_ai: &'static str,
}

impl From<&GameMetrics> for CsvSummaryRow {
    fn from(m: &GameMetrics) -> Self {
        Self {
            game_id: m.game_id,
            seed: m.seed,
            first_mover: m.result.first_mover.symbol(),
            outcome: m.result.outcome.as_str(),
            move_count: m.result.move_count,
            x_ai: m.config.x.strategy,
            o_ai: m.config.o.strategy,
        }
    }
}

pub fn build_game_metrics(
    game_id: u32,
    seed: u64,
    sides: (Difficulty, Difficulty),
    total_games: u32,
    result: &GameResult,
    duration_ms: f64,
) -> GameMetrics {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"));

    let moves = result
        .moves
        .iter()
        .enumerate()
        .map(|(i, ply)| MoveMetrics {
            ply: i as u8 + 1,
            mark: ply.mark,
            cell: ply.cell,
        })
        .collect();

    GameMetrics {
        game_id,
        seed,
        timestamp,
        config: GameConfig {
            x: sides.0.into(),
            o: sides.1.into(),
            total_games,
        },
        result: GameResultMetrics {
            first_mover: result.first_mover,
            outcome: result.verdict.into(),
            verdict: result.verdict,
            move_count: result.moves.len(),
            duration_ms,
        },
        moves,
    }
}
