//! Computer player trait definition.

use std::fmt;

use crate::domain::{Board, Mark};
use crate::errors::domain::{DomainError, InfraErrorKind};

/// Errors that can occur while the computer picks a cell.
#[derive(Debug)]
pub enum AiError {
    /// The board has no free cell (the caller should not have asked).
    NoMoves,
    /// Internal failure such as a poisoned RNG lock.
    Internal(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::NoMoves => write!(f, "AI asked to move on a full board"),
            AiError::Internal(msg) => write!(f, "AI internal error: {msg}"),
        }
    }
}

impl std::error::Error for AiError {}

impl From<AiError> for DomainError {
    fn from(err: AiError) -> Self {
        DomainError::infra(InfraErrorKind::Other("AI".into()), err.to_string())
    }
}

/// A strategy for the computer seat.
///
/// Implementations receive the current board and the mark they play, and
/// must return a free cell index (0-8).
pub trait ComputerPlayer: Send + Sync {
    fn choose_cell(&self, board: &Board, me: Mark) -> Result<u8, AiError>;
}
