//! Easy difficulty: a uniformly random free cell.

use std::sync::Mutex;

use rand::prelude::*;

use super::trait_def::{AiError, ComputerPlayer};
use crate::domain::{Board, Mark};

/// Picks any free cell. Seedable so tests can replay a game.
pub struct RandomPlayer {
    rng: Mutex<StdRng>,
}

impl RandomPlayer {
    pub const NAME: &'static str = "RandomPlayer";
    pub const VERSION: &'static str = "1.0.0";

    /// `Some(seed)` for reproducible picks, `None` to draw from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

/// Choose uniformly from `cells` with a locked RNG.
pub(super) fn pick_from(rng: &Mutex<StdRng>, cells: &[u8]) -> Result<u8, AiError> {
    let mut rng = rng
        .lock()
        .map_err(|e| AiError::Internal(format!("RNG lock poisoned: {e}")))?;
    cells.choose(&mut *rng).copied().ok_or(AiError::NoMoves)
}

impl ComputerPlayer for RandomPlayer {
    fn choose_cell(&self, board: &Board, _me: Mark) -> Result<u8, AiError> {
        pick_from(&self.rng, &board.empty_cells())
    }
}
