//! In-memory game runner.
//!
//! Two strategies play a full round on a bare board: no sessions, no
//! delays, no gateway. Each game gets fresh players built from the game's
//! seed so any single game can be replayed on its own.

use cafebot::ai::create_ai;
use cafebot::domain::{Board, Difficulty, Mark, Verdict};

/// Mixed into the seed so the two sides never share an RNG stream.
const O_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ply {
    pub mark: Mark,
    pub cell: u8,
}

#[derive(Debug, Clone)]
pub struct GameResult {
    pub first_mover: Mark,
    pub verdict: Verdict,
    pub moves: Vec<Ply>,
    pub board: Board,
}

pub struct Simulator {
    x: Difficulty,
    o: Difficulty,
}

impl Simulator {
    pub fn new(x: Difficulty, o: Difficulty) -> Self {
        Self { x, o }
    }

    /// Odd games open with X, even games with O.
    pub fn first_mover(game_num: u32) -> Mark {
        if game_num % 2 == 1 {
            Mark::X
        } else {
            Mark::O
        }
    }

    pub fn simulate_game(&self, game_num: u32, seed: u64) -> Result<GameResult, String> {
        let x_player = create_ai(self.x, Some(seed));
        let o_player = create_ai(self.o, Some(seed ^ O_SEED_SALT));

        let first_mover = Self::first_mover(game_num);
        let mut board = Board::new();
        let mut to_move = first_mover;
        let mut moves = Vec::with_capacity(9);

        loop {
            if let Some(verdict) = board.verdict() {
                return Ok(GameResult {
                    first_mover,
                    verdict,
                    moves,
                    board,
                });
            }
            let player = match to_move {
                Mark::X => &x_player,
                Mark::O => &o_player,
            };
            let cell = player
                .choose_cell(&board, to_move)
                .map_err(|e| format!("{to_move} could not move: {e}"))?;
            board
                .place(cell, to_move)
                .map_err(|e| format!("{to_move} chose an illegal cell {cell}: {e}"))?;
            moves.push(Ply {
                mark: to_move,
                cell,
            });
            to_move = to_move.other();
        }
    }
}
