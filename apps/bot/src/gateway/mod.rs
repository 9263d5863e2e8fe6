//! Outbound side of the platform: roles, channel overrides, messages and
//! the profile lookups behind the informational commands.
//!
//! Services only see the `Gateway` trait. `DiscordRest` talks to the real
//! API; `MemoryGateway` keeps everything in process for tests and dry runs.

use std::fmt;
use std::ops::BitOr;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::{ChannelId, CommunityId, MemberId, MessageId, RoleId};
use crate::errors::domain::{DomainError, InfraErrorKind, NotFoundKind};

pub mod discord;
pub mod memory;

pub use discord::DiscordRest;
pub use memory::MemoryGateway;

/// Permission bit set as used by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_GUILD: Permissions = Permissions(1 << 5);
    pub const ADD_REACTIONS: Permissions = Permissions(1 << 6);
    pub const SEND_MESSAGES: Permissions = Permissions(1 << 11);
    pub const MANAGE_MESSAGES: Permissions = Permissions(1 << 13);
    pub const CONNECT: Permissions = Permissions(1 << 20);
    pub const SPEAK: Permissions = Permissions(1 << 21);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);
    pub const USE_APPLICATION_COMMANDS: Permissions = Permissions(1 << 31);
    pub const MODERATE_MEMBERS: Permissions = Permissions(1 << 40);

    /// Everything a quarantined member loses in every channel.
    pub const QUARANTINE_DENY: Permissions = Permissions(
        Self::SEND_MESSAGES.0
            | Self::ADD_REACTIONS.0
            | Self::CONNECT.0
            | Self::SPEAK.0
            | Self::USE_APPLICATION_COMMANDS.0,
    );

    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u64 {
        self.0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Thread,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
}

impl ChannelInfo {
    /// Threads inherit from their parent and carry no overrides of their own.
    pub fn accepts_overrides(&self) -> bool {
        matches!(self.kind, ChannelKind::Text | ChannelKind::Voice)
    }
}

const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Custom avatar when `hash` is set, otherwise one of the six defaults.
pub fn avatar_url(user: MemberId, hash: Option<&str>) -> String {
    match hash {
        Some(hash) => {
            let ext = if hash.starts_with("a_") { "gif" } else { "png" };
            format!("{CDN_BASE}/avatars/{user}/{hash}.{ext}?size=2048")
        }
        None => format!("{CDN_BASE}/embed/avatars/{}.png", (user.get() >> 22) % 6),
    }
}

pub fn community_icon_url(community: CommunityId, hash: &str) -> String {
    format!("{CDN_BASE}/icons/{community}/{hash}.png?size=2048")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityProfile {
    pub id: CommunityId,
    pub name: String,
    pub owner: MemberId,
    pub icon_url: Option<String>,
    pub member_count: Option<u64>,
    pub channel_count: usize,
    pub role_count: usize,
    /// 0 (none) through 4 (very high).
    pub verification_level: u8,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: MemberId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: String,
    pub is_bot: bool,
}

impl UserProfile {
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub user: UserProfile,
    pub joined_at: Option<OffsetDateTime>,
    /// Role names, highest first, without the implicit everyone role.
    pub roles: Vec<String>,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
    /// 0xRRGGBB
    pub color: u32,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing permission: {0}")]
    MissingPermission(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("platform returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MissingPermission(detail) => DomainError::capability(detail),
            GatewayError::NotFound(detail) => {
                DomainError::not_found(NotFoundKind::Other("platform".into()), detail)
            }
            GatewayError::Timeout => {
                DomainError::infra(InfraErrorKind::Timeout, "platform request timed out")
            }
            GatewayError::Transport(e) if e.is_timeout() => {
                DomainError::infra(InfraErrorKind::Timeout, e.to_string())
            }
            other => DomainError::infra(InfraErrorKind::Gateway, other.to_string()),
        }
    }
}

/// Role, channel and message operations the bot needs from the platform.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Whether the bot itself may create and assign roles in `community`.
    async fn can_manage_roles(&self, community: CommunityId) -> Result<bool, GatewayError>;

    async fn find_role_by_name(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<Option<RoleId>, GatewayError>;

    async fn create_role(
        &self,
        community: CommunityId,
        spec: &RoleSpec,
    ) -> Result<RoleId, GatewayError>;

    async fn list_channels(&self, community: CommunityId) -> Result<Vec<ChannelInfo>, GatewayError>;

    async fn deny_channel_permissions(
        &self,
        channel: ChannelId,
        role: RoleId,
        deny: Permissions,
    ) -> Result<(), GatewayError>;

    async fn add_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError>;

    async fn remove_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError>;

    async fn member_has_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<bool, GatewayError>;

    /// Whether `member` is still in `community`.
    async fn member_present(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, GatewayError>;

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), GatewayError>;

    async fn community_profile(&self, community: CommunityId)
        -> Result<CommunityProfile, GatewayError>;

    async fn user_profile(&self, user: MemberId) -> Result<UserProfile, GatewayError>;

    /// `None` when `member` is not in `community`.
    async fn member_profile(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<Option<MemberProfile>, GatewayError>;

    /// Up to `limit` message ids, newest first.
    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: u8,
    ) -> Result<Vec<MessageId>, GatewayError>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId)
        -> Result<(), GatewayError>;

    /// Delete 2 to 100 messages in one call.
    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        messages: &[MessageId],
    ) -> Result<(), GatewayError>;
}
