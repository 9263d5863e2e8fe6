//! Hard difficulty.
//!
//! Fixed priority list, first match wins:
//! 1. complete our own line
//! 2. block the opponent's line
//! 3. take the center
//! 4. take a random free corner
//! 5. take a random free cell

use std::sync::Mutex;

use rand::prelude::*;

use super::random::pick_from;
use super::trait_def::{AiError, ComputerPlayer};
use crate::domain::board::{CENTER, CORNERS};
use crate::domain::{Board, Mark};

pub struct Tactician {
    rng: Mutex<StdRng>,
}

impl Tactician {
    pub const NAME: &'static str = "Tactician";
    pub const VERSION: &'static str = "1.0.0";

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

impl ComputerPlayer for Tactician {
    fn choose_cell(&self, board: &Board, me: Mark) -> Result<u8, AiError> {
        if let Some(cell) = board.winning_cell(me) {
            return Ok(cell);
        }
        if let Some(cell) = board.winning_cell(me.other()) {
            return Ok(cell);
        }
        if board.is_free(CENTER) {
            return Ok(CENTER);
        }
        let corners: Vec<u8> = CORNERS.iter().copied().filter(|&c| board.is_free(c)).collect();
        if !corners.is_empty() {
            return pick_from(&self.rng, &corners);
        }
        pick_from(&self.rng, &board.empty_cells())
    }
}
