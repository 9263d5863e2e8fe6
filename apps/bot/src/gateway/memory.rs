//! In-process `Gateway` for tests and `BOT_DRY_RUN`.
//!
//! Members are assumed present unless explicitly removed. Every outbound
//! message is recorded so tests can assert on what the bot said.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::{
    ChannelInfo, ChannelKind, CommunityProfile, Gateway, GatewayError, MemberProfile,
    Permissions, RoleSpec, UserProfile,
};
use crate::domain::{ChannelId, CommunityId, MemberId, MessageId, RoleId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOverride {
    pub channel: ChannelId,
    pub role: RoleId,
    pub deny: Permissions,
}

#[derive(Debug, Default)]
struct MemoryState {
    roles: HashMap<CommunityId, Vec<(RoleId, String)>>,
    member_roles: HashMap<(CommunityId, MemberId), HashSet<RoleId>>,
    departed: HashSet<(CommunityId, MemberId)>,
    channels: HashMap<CommunityId, Vec<ChannelInfo>>,
    overrides: Vec<ChannelOverride>,
    failing_channels: HashSet<ChannelId>,
    failing_removals: bool,
    slow_lookups: bool,
    sent: Vec<SentMessage>,
    role_removals: u32,
    roles_created: u32,
    cannot_manage: HashSet<CommunityId>,
    communities: HashMap<CommunityId, CommunityProfile>,
    profiles: HashMap<(CommunityId, MemberId), MemberProfile>,
    users: HashMap<MemberId, UserProfile>,
    /// Oldest first, as posted.
    history: HashMap<ChannelId, Vec<MessageId>>,
    deleted: Vec<MessageId>,
    bulk_deletes: u32,
}

#[derive(Debug)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    next_id: AtomicU64,
    echo: bool,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            next_id: AtomicU64::new(10_000),
            echo: false,
        }
    }

    /// Dry-run flavour: also logs every outbound message.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    fn next_snowflake(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn with_channel(self, community: CommunityId, name: &str, kind: ChannelKind) -> Self {
        let id = ChannelId(self.next_snowflake());
        self.state
            .lock()
            .channels
            .entry(community)
            .or_default()
            .push(ChannelInfo {
                id,
                name: name.to_string(),
                kind,
            });
        self
    }

    pub fn with_role(self, community: CommunityId, role: RoleId, name: &str) -> Self {
        self.state
            .lock()
            .roles
            .entry(community)
            .or_default()
            .push((role, name.to_string()));
        self
    }

    pub fn with_community(self, profile: CommunityProfile) -> Self {
        self.state.lock().communities.insert(profile.id, profile);
        self
    }

    /// Register `profile` as a member of `community`; the user becomes known too.
    pub fn with_member(self, community: CommunityId, profile: MemberProfile) -> Self {
        let mut state = self.state.lock();
        state.users.insert(profile.user.id, profile.user.clone());
        state.profiles.insert((community, profile.user.id), profile);
        drop(state);
        self
    }

    pub fn with_history(self, channel: ChannelId, messages: &[MessageId]) -> Self {
        self.state
            .lock()
            .history
            .entry(channel)
            .or_default()
            .extend_from_slice(messages);
        self
    }

    pub fn deleted_messages(&self) -> Vec<MessageId> {
        self.state.lock().deleted.clone()
    }

    pub fn bulk_deletes(&self) -> u32 {
        self.state.lock().bulk_deletes
    }

    pub fn deny_role_management(&self, community: CommunityId) {
        self.state.lock().cannot_manage.insert(community);
    }

    pub fn fail_overrides_on(&self, channel: ChannelId) {
        self.state.lock().failing_channels.insert(channel);
    }

    /// Every later `remove_role` fails with a platform error.
    pub fn fail_role_removal(&self) {
        self.state.lock().failing_removals = true;
    }

    /// Role lookups yield to the scheduler once before answering, so
    /// concurrent callers interleave the way they do against the real API.
    pub fn slow_role_lookups(&self) {
        self.state.lock().slow_lookups = true;
    }

    /// Strip a role the way a moderator would in the platform's UI.
    pub fn strip_role(&self, community: CommunityId, member: MemberId, role: RoleId) {
        if let Some(roles) = self.state.lock().member_roles.get_mut(&(community, member)) {
            roles.remove(&role);
        }
    }

    pub fn remove_member(&self, community: CommunityId, member: MemberId) {
        let mut state = self.state.lock();
        state.departed.insert((community, member));
        state.member_roles.remove(&(community, member));
    }

    pub fn channels_of(&self, community: CommunityId) -> Vec<ChannelInfo> {
        self.state
            .lock()
            .channels
            .get(&community)
            .cloned()
            .unwrap_or_default()
    }

    pub fn roles_of(&self, community: CommunityId, member: MemberId) -> HashSet<RoleId> {
        self.state
            .lock()
            .member_roles
            .get(&(community, member))
            .cloned()
            .unwrap_or_default()
    }

    pub fn role_named(&self, community: CommunityId, name: &str) -> Option<RoleId> {
        self.state
            .lock()
            .roles
            .get(&community)
            .and_then(|roles| roles.iter().find(|(_, n)| n == name).map(|(id, _)| *id))
    }

    pub fn overrides(&self) -> Vec<ChannelOverride> {
        self.state.lock().overrides.clone()
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.lock().sent.clone()
    }

    pub fn messages_to(&self, channel: ChannelId) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|m| m.channel == channel)
            .map(|m| m.content.clone())
            .collect()
    }

    pub fn role_removals(&self) -> u32 {
        self.state.lock().role_removals
    }

    pub fn roles_created(&self) -> u32 {
        self.state.lock().roles_created
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn can_manage_roles(&self, community: CommunityId) -> Result<bool, GatewayError> {
        Ok(!self.state.lock().cannot_manage.contains(&community))
    }

    async fn find_role_by_name(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<Option<RoleId>, GatewayError> {
        let slow = self.state.lock().slow_lookups;
        if slow {
            tokio::task::yield_now().await;
        }
        Ok(self.role_named(community, name))
    }

    async fn create_role(
        &self,
        community: CommunityId,
        spec: &RoleSpec,
    ) -> Result<RoleId, GatewayError> {
        let id = RoleId(self.next_snowflake());
        let mut state = self.state.lock();
        if state.cannot_manage.contains(&community) {
            return Err(GatewayError::MissingPermission("manage roles".into()));
        }
        state
            .roles
            .entry(community)
            .or_default()
            .push((id, spec.name.clone()));
        state.roles_created += 1;
        Ok(id)
    }

    async fn list_channels(&self, community: CommunityId) -> Result<Vec<ChannelInfo>, GatewayError> {
        Ok(self.channels_of(community))
    }

    async fn deny_channel_permissions(
        &self,
        channel: ChannelId,
        role: RoleId,
        deny: Permissions,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        if state.failing_channels.contains(&channel) {
            return Err(GatewayError::MissingPermission(format!(
                "cannot edit overrides on {channel}"
            )));
        }
        state.overrides.push(ChannelOverride {
            channel,
            role,
            deny,
        });
        Ok(())
    }

    async fn add_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        if state.departed.contains(&(community, member)) {
            return Err(GatewayError::NotFound(format!("member {member}")));
        }
        let known = state
            .roles
            .get(&community)
            .is_some_and(|roles| roles.iter().any(|(id, _)| *id == role));
        if !known {
            return Err(GatewayError::NotFound(format!("role {role}")));
        }
        state
            .member_roles
            .entry((community, member))
            .or_default()
            .insert(role);
        Ok(())
    }

    async fn remove_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        if state.departed.contains(&(community, member)) {
            return Err(GatewayError::NotFound(format!("member {member}")));
        }
        if state.failing_removals {
            return Err(GatewayError::Status {
                status: 500,
                detail: "role removal failed".into(),
            });
        }
        if let Some(roles) = state.member_roles.get_mut(&(community, member)) {
            roles.remove(&role);
        }
        state.role_removals += 1;
        Ok(())
    }

    async fn member_has_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<bool, GatewayError> {
        Ok(self.roles_of(community, member).contains(&role))
    }

    async fn member_present(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, GatewayError> {
        Ok(!self.state.lock().departed.contains(&(community, member)))
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), GatewayError> {
        if self.echo {
            info!(channel = %channel, content, "dry-run message");
        }
        self.state.lock().sent.push(SentMessage {
            channel,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn community_profile(
        &self,
        community: CommunityId,
    ) -> Result<CommunityProfile, GatewayError> {
        self.state
            .lock()
            .communities
            .get(&community)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("community {community}")))
    }

    async fn user_profile(&self, user: MemberId) -> Result<UserProfile, GatewayError> {
        self.state
            .lock()
            .users
            .get(&user)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("user {user}")))
    }

    async fn member_profile(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<Option<MemberProfile>, GatewayError> {
        let state = self.state.lock();
        if state.departed.contains(&(community, member)) {
            return Ok(None);
        }
        Ok(state.profiles.get(&(community, member)).cloned())
    }

    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: u8,
    ) -> Result<Vec<MessageId>, GatewayError> {
        Ok(self
            .state
            .lock()
            .history
            .get(&channel)
            .map(|ids| ids.iter().rev().take(usize::from(limit)).copied().collect())
            .unwrap_or_default())
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        let history = state.history.entry(channel).or_default();
        let before = history.len();
        history.retain(|id| *id != message);
        if history.len() == before {
            return Err(GatewayError::NotFound(format!("message {message}")));
        }
        state.deleted.push(message);
        Ok(())
    }

    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        messages: &[MessageId],
    ) -> Result<(), GatewayError> {
        if !(2..=100).contains(&messages.len()) {
            return Err(GatewayError::Status {
                status: 400,
                detail: format!("bulk delete takes 2..=100 messages, got {}", messages.len()),
            });
        }
        let mut state = self.state.lock();
        state
            .history
            .entry(channel)
            .or_default()
            .retain(|id| !messages.contains(id));
        state.deleted.extend_from_slice(messages);
        state.bulk_deletes += 1;
        Ok(())
    }
}
