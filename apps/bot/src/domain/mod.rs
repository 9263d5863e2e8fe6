//! Domain layer: join-rate bookkeeping, the grid game, chat heuristics,
//! the broadcast calendar and bulk-delete rules.
//! Nothing in here touches the network or a clock.

pub mod action_token;
pub mod board;
pub mod broadcast;
pub mod chatter;
pub mod ids;
pub mod join_rate;
pub mod purge;
pub mod render;
pub mod session;


pub use action_token::{ActionToken, GameAction};
pub use board::{hint_for, Board, Hint, Mark, Verdict};
pub use ids::{ChannelId, CommunityId, MemberId, MessageId, RoleId, SessionId};
pub use join_rate::{JoinCheck, JoinRateDetector, JoinRateSettings};
pub use purge::{PurgeChoice, PurgeId, PurgeToken};
pub use session::{
    Actor, Difficulty, GameMode, GameSession, Invitee, MoveRecord, SecondSeat, SessionRequest,
    SessionStatus, Tally, TurnHolder,
};
