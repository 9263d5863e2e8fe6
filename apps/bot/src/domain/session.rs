//! Game session state machine.
//!
//! ```text
//! PendingInvite --accept--> Active --win/draw--> Finished --reset--> Active
//!       |
//!       +--decline--> Declined (terminal, the service drops the session)
//! ```
//!
//! Every transition validates first and mutates last: a rejected call leaves
//! the session exactly as it was.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::board::{Board, Mark, Verdict};
use super::ids::{ChannelId, CommunityId, MemberId, SessionId};
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(DomainError::validation(
                ValidationKind::Other("UNKNOWN_DIFFICULTY".into()),
                format!("unknown difficulty '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "difficulty", rename_all = "snake_case")]
pub enum GameMode {
    HumanVsHuman,
    HumanVsComputer(Difficulty),
}

/// Who holds the O mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "member_id", rename_all = "snake_case")]
pub enum SecondSeat {
    /// Open challenge: the first other member to play O claims the seat.
    Unclaimed,
    Member(MemberId),
    Computer,
}

/// Who is entitled to make a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Member(MemberId),
    Computer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    PendingInvite { invitee: MemberId },
    Active,
    Finished { verdict: Verdict },
    Declined,
}

/// Round results accumulated across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

impl Tally {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Win(Mark::X) => self.x_wins += 1,
            Verdict::Win(Mark::O) => self.o_wins += 1,
            Verdict::Draw => self.draws += 1,
        }
    }

    pub fn rounds(&self) -> u32 {
        self.x_wins + self.o_wins + self.draws
    }

    /// Percentage of rounds won by `mark`, rounded down. Zero before any round ends.
    pub fn win_rate(&self, mark: Mark) -> u32 {
        let rounds = self.rounds();
        if rounds == 0 {
            return 0;
        }
        let wins = match mark {
            Mark::X => self.x_wins,
            Mark::O => self.o_wins,
        };
        wins * 100 / rounds
    }
}

/// Parameters for opening a session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub community: Option<CommunityId>,
    pub channel: Option<ChannelId>,
    pub initiator: MemberId,
    pub mode: GameMode,
    pub invitee: Option<Invitee>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invitee {
    pub member: MemberId,
    pub is_bot: bool,
}

/// A placed mark and what it did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub cell: u8,
    pub mark: Mark,
    pub verdict: Option<Verdict>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    community: Option<CommunityId>,
    channel: Option<ChannelId>,
    mode: GameMode,
    player_a: MemberId,
    second: SecondSeat,
    board: Board,
    to_move: Mark,
    tally: Tally,
    status: SessionStatus,
}

impl GameSession {
    /// Open a session. `first` is the mark that moves first; only
    /// human-vs-computer sessions ever start with O.
    pub fn open(id: SessionId, request: SessionRequest, first: Mark) -> Result<Self, DomainError> {
        let (second, status) = match request.mode {
            GameMode::HumanVsComputer(_) => (SecondSeat::Computer, SessionStatus::Active),
            GameMode::HumanVsHuman => match request.invitee {
                Some(invitee) if invitee.member == request.initiator => {
                    return Err(DomainError::validation(
                        ValidationKind::SelfChallenge,
                        "you cannot challenge yourself",
                    ));
                }
                Some(invitee) if invitee.is_bot => {
                    return Err(DomainError::validation(
                        ValidationKind::NonHumanOpponent,
                        "bots cannot be challenged",
                    ));
                }
                Some(invitee) => (
                    SecondSeat::Member(invitee.member),
                    SessionStatus::PendingInvite {
                        invitee: invitee.member,
                    },
                ),
                None => (SecondSeat::Unclaimed, SessionStatus::Active),
            },
        };
        let to_move = match request.mode {
            GameMode::HumanVsComputer(_) => first,
            GameMode::HumanVsHuman => Mark::X,
        };

        Ok(Self {
            id,
            community: request.community,
            channel: request.channel,
            mode: request.mode,
            player_a: request.initiator,
            second,
            board: Board::new(),
            to_move,
            tally: Tally::default(),
            status,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }
    pub fn community(&self) -> Option<CommunityId> {
        self.community
    }
    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }
    pub fn mode(&self) -> GameMode {
        self.mode
    }
    pub fn player_a(&self) -> MemberId {
        self.player_a
    }
    pub fn second_seat(&self) -> SecondSeat {
        self.second
    }
    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn to_move(&self) -> Mark {
        self.to_move
    }
    pub fn tally(&self) -> Tally {
        self.tally
    }
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match self.mode {
            GameMode::HumanVsComputer(d) => Some(d),
            GameMode::HumanVsHuman => None,
        }
    }

    /// Player A, a bound or invited player B.
    pub fn is_participant(&self, member: MemberId) -> bool {
        member == self.player_a || self.second == SecondSeat::Member(member)
    }

    /// The seat that owns the mark to move.
    pub fn seat_to_move(&self) -> TurnHolder {
        match self.to_move {
            Mark::X => TurnHolder::PlayerA(self.player_a),
            Mark::O => TurnHolder::Seat(self.second),
        }
    }

    pub fn computer_to_move(&self) -> bool {
        self.is_active() && self.to_move == Mark::O && self.second == SecondSeat::Computer
    }

    pub fn accept(&mut self, actor: MemberId) -> Result<(), DomainError> {
        let invitee = self.pending_invitee()?;
        if actor != invitee {
            return Err(DomainError::forbidden("this invitation is addressed to someone else"));
        }
        self.status = SessionStatus::Active;
        self.to_move = Mark::X;
        Ok(())
    }

    pub fn decline(&mut self, actor: MemberId) -> Result<(), DomainError> {
        let invitee = self.pending_invitee()?;
        if actor != invitee {
            return Err(DomainError::forbidden("this invitation is addressed to someone else"));
        }
        self.status = SessionStatus::Declined;
        Ok(())
    }

    fn pending_invitee(&self) -> Result<MemberId, DomainError> {
        match self.status {
            SessionStatus::PendingInvite { invitee } => Ok(invitee),
            _ => Err(DomainError::validation(
                ValidationKind::Other("NO_PENDING_INVITE".into()),
                "there is no pending invitation on this session",
            )),
        }
    }

    /// Place the mark of the side to move.
    ///
    /// Rejections are checked in a fixed order: session not active, cell off
    /// the grid or taken, then turn ownership.
    pub fn apply_move(&mut self, actor: Actor, cell: u8) -> Result<MoveRecord, DomainError> {
        match self.status {
            SessionStatus::Active => {}
            SessionStatus::PendingInvite { .. } => {
                return Err(DomainError::validation(
                    ValidationKind::InvitePending,
                    "the invitation has not been accepted yet",
                ));
            }
            SessionStatus::Finished { .. } | SessionStatus::Declined => {
                return Err(DomainError::validation(
                    ValidationKind::SessionInactive,
                    "this round is over; reset to play again",
                ));
            }
        }
        self.board.check_placeable(cell)?;
        let claims_seat = self.check_turn(actor)?;

        let mark = self.to_move;
        self.board.place(cell, mark)?;
        if let (true, Actor::Member(member)) = (claims_seat, actor) {
            self.second = SecondSeat::Member(member);
        }

        let verdict = self.board.verdict();
        match verdict {
            Some(v) => {
                self.tally.record(v);
                self.status = SessionStatus::Finished { verdict: v };
            }
            None => self.to_move = mark.other(),
        }

        Ok(MoveRecord {
            cell,
            mark,
            verdict,
        })
    }

    // Ok(true) when the move would bind an open O seat to the actor.
    fn check_turn(&self, actor: Actor) -> Result<bool, DomainError> {
        let allowed = match (self.seat_to_move(), actor) {
            (TurnHolder::PlayerA(a), Actor::Member(m)) => (a == m).then_some(false),
            (TurnHolder::Seat(SecondSeat::Member(b)), Actor::Member(m)) => {
                (b == m).then_some(false)
            }
            (TurnHolder::Seat(SecondSeat::Unclaimed), Actor::Member(m)) => {
                (m != self.player_a).then_some(true)
            }
            (TurnHolder::Seat(SecondSeat::Computer), Actor::Computer) => Some(false),
            _ => None,
        };
        allowed.ok_or_else(|| {
            DomainError::validation(
                ValidationKind::NotYourTurn,
                format!("it is {}'s turn", self.to_move),
            )
        })
    }

    /// Clear the board for a new round. The tally survives.
    pub fn reset(&mut self, actor: MemberId) -> Result<(), DomainError> {
        if !self.is_participant(actor) {
            return Err(DomainError::forbidden("only players of this game can reset it"));
        }
        match self.status {
            SessionStatus::PendingInvite { .. } => Err(DomainError::validation(
                ValidationKind::InvitePending,
                "the invitation has not been accepted yet",
            )),
            SessionStatus::Declined => Err(DomainError::validation(
                ValidationKind::SessionInactive,
                "this invitation was declined",
            )),
            SessionStatus::Active | SessionStatus::Finished { .. } => {
                self.board = Board::new();
                self.to_move = Mark::X;
                self.status = SessionStatus::Active;
                Ok(())
            }
        }
    }
}

/// Owner of the mark to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnHolder {
    PlayerA(MemberId),
    Seat(SecondSeat),
}
