//! Medium difficulty: the tactician's move most of the time, a random free
//! cell otherwise.

use std::sync::Mutex;

use rand::prelude::*;

use super::random::RandomPlayer;
use super::tactician::Tactician;
use super::trait_def::{AiError, ComputerPlayer};
use crate::domain::{Board, Mark};

pub const SHARP_MOVE_CHANCE: f64 = 0.7;

pub struct Journeyman {
    rng: Mutex<StdRng>,
    sharp: Tactician,
    loose: RandomPlayer,
}

impl Journeyman {
    pub const NAME: &'static str = "Journeyman";
    pub const VERSION: &'static str = "1.0.0";

    /// The two inner strategies get seeds derived from `seed` so one seed
    /// reproduces the whole game.
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let sharp_seed = seed.map(|_| rng.random::<u64>());
        let loose_seed = seed.map(|_| rng.random::<u64>());
        Self {
            rng: Mutex::new(rng),
            sharp: Tactician::new(sharp_seed),
            loose: RandomPlayer::new(loose_seed),
        }
    }

    fn roll_sharp(&self) -> Result<bool, AiError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| AiError::Internal(format!("RNG lock poisoned: {e}")))?;
        Ok(rng.random_bool(SHARP_MOVE_CHANCE))
    }
}

impl ComputerPlayer for Journeyman {
    fn choose_cell(&self, board: &Board, me: Mark) -> Result<u8, AiError> {
        if self.roll_sharp()? {
            self.sharp.choose_cell(board, me)
        } else {
            self.loose.choose_cell(board, me)
        }
    }
}
