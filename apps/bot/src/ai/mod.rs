//! Computer opponents for the grid game.
//!
//! - RandomPlayer: easy, any free cell
//! - Journeyman: medium, usually plays like the Tactician
//! - Tactician: hard, win > block > center > corner > anything

mod journeyman;
mod random;
pub mod registry;
mod tactician;
mod trait_def;

pub use journeyman::Journeyman;
pub use random::RandomPlayer;
pub use tactician::Tactician;
pub use trait_def::{AiError, ComputerPlayer};

use crate::domain::Difficulty;

/// Build the strategy registered for `difficulty`.
pub fn create_ai(difficulty: Difficulty, seed: Option<u64>) -> Box<dyn ComputerPlayer> {
    (registry::by_difficulty(difficulty).make)(seed)
}
