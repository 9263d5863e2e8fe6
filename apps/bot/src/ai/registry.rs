//! Registered computer strategies, one per difficulty.
//!
//! Keep ordering stable and constructors free of side effects: the same seed
//! must always give the same player.

use crate::ai::{ComputerPlayer, Journeyman, RandomPlayer, Tactician};
use crate::domain::Difficulty;

/// Factory definition for constructing computer players.
pub struct AiFactory {
    pub name: &'static str,
    pub version: &'static str,
    pub difficulty: Difficulty,
    pub make: fn(seed: Option<u64>) -> Box<dyn ComputerPlayer>,
}

static AI_FACTORIES: &[AiFactory] = &[
    AiFactory {
        name: RandomPlayer::NAME,
        version: RandomPlayer::VERSION,
        difficulty: Difficulty::Easy,
        make: make_random_player,
    },
    AiFactory {
        name: Journeyman::NAME,
        version: Journeyman::VERSION,
        difficulty: Difficulty::Medium,
        make: make_journeyman,
    },
    AiFactory {
        name: Tactician::NAME,
        version: Tactician::VERSION,
        difficulty: Difficulty::Hard,
        make: make_tactician,
    },
];

pub fn registered_ais() -> &'static [AiFactory] {
    AI_FACTORIES
}

pub fn by_name(name: &str) -> Option<&'static AiFactory> {
    registered_ais().iter().find(|f| f.name == name)
}

pub fn by_difficulty(difficulty: Difficulty) -> &'static AiFactory {
    match difficulty {
        Difficulty::Easy => &AI_FACTORIES[0],
        Difficulty::Medium => &AI_FACTORIES[1],
        Difficulty::Hard => &AI_FACTORIES[2],
    }
}

fn make_random_player(seed: Option<u64>) -> Box<dyn ComputerPlayer> {
    Box::new(RandomPlayer::new(seed))
}

fn make_journeyman(seed: Option<u64>) -> Box<dyn ComputerPlayer> {
    Box::new(Journeyman::new(seed))
}

fn make_tactician(seed: Option<u64>) -> Box<dyn ComputerPlayer> {
    Box::new(Tactician::new(seed))
}
