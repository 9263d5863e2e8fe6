//! Button payloads.
//!
//! Every interactive control on a game message carries a token of the form
//! `ttt:<session-id>:<action>`, where action is `accept`, `decline`, `reset`,
//! `quit` or a cell digit. Tokens are opaque to the platform and come back
//! verbatim when the button is pressed.

use std::fmt;
use std::str::FromStr;

use super::ids::SessionId;
use crate::errors::domain::{DomainError, ValidationKind};

pub const TOKEN_PREFIX: &str = "ttt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Accept,
    Decline,
    Reset,
    Quit,
    Move(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionToken {
    pub session: SessionId,
    pub action: GameAction,
}

impl ActionToken {
    pub fn new(session: SessionId, action: GameAction) -> Self {
        Self { session, action }
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}:{}:", self.session)?;
        match self.action {
            GameAction::Accept => f.write_str("accept"),
            GameAction::Decline => f.write_str("decline"),
            GameAction::Reset => f.write_str("reset"),
            GameAction::Quit => f.write_str("quit"),
            GameAction::Move(cell) => write!(f, "{cell}"),
        }
    }
}

fn malformed(raw: &str) -> DomainError {
    DomainError::validation(
        ValidationKind::InvalidActionToken,
        format!("unrecognised action token '{raw}'"),
    )
}

impl FromStr for ActionToken {
    type Err = DomainError;

    /// Cell digits are not range-checked here; the session rejects them.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(':');
        let (Some(prefix), Some(session), Some(action), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed(raw));
        };
        if prefix != TOKEN_PREFIX {
            return Err(malformed(raw));
        }
        let session: SessionId = session.parse().map_err(|_| malformed(raw))?;
        let action = match action {
            "accept" => GameAction::Accept,
            "decline" => GameAction::Decline,
            "reset" => GameAction::Reset,
            "quit" => GameAction::Quit,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                GameAction::Move(digits.parse().map_err(|_| malformed(raw))?)
            }
            _ => return Err(malformed(raw)),
        };
        Ok(Self { session, action })
    }
}
