//! Application services: orchestration over the domain and the gateway.

pub mod audit;
pub mod broadcast;
pub mod chatter;
pub mod games;
pub mod guard;
pub mod info;
pub mod members;
pub mod purge;

#[cfg(test)]
mod tests_broadcast;
#[cfg(test)]
mod tests_games;
#[cfg(test)]
mod tests_guard;

pub use audit::{AuditEvent, AuditLog, QuarantineReason};
pub use broadcast::BroadcastService;
pub use chatter::{ChatReply, ChatterService, IncomingMessage};
pub use games::{GameService, SessionView};
pub use guard::{GuardService, GuardStats, QuarantineOutcome};
pub use info::{CommandReply, InfoService, ReplyButton, Requester};
pub use members::{JoinOutcome, MemberEvents, MemberJoined};
pub use purge::PurgeService;
