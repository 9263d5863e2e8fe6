//! `Gateway` over the Discord REST API (v10).

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{
    avatar_url, community_icon_url, ChannelInfo, ChannelKind, CommunityProfile, Gateway,
    GatewayError, MemberProfile, Permissions, RoleSpec, UserProfile,
};
use crate::domain::{ChannelId, CommunityId, MemberId, MessageId, RoleId};

const AUDIT_REASON_HEADER: &str = "X-Audit-Log-Reason";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct UserObject {
    id: MemberId,
    #[serde(default)]
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    bot: bool,
}

impl From<UserObject> for UserProfile {
    fn from(user: UserObject) -> Self {
        UserProfile {
            avatar_url: avatar_url(user.id, user.avatar.as_deref()),
            id: user.id,
            username: user.username,
            display_name: user.global_name,
            is_bot: user.bot,
        }
    }
}

#[derive(Deserialize)]
struct MemberObject {
    #[serde(default)]
    user: Option<UserObject>,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<RoleId>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    joined_at: Option<OffsetDateTime>,
}

#[derive(Deserialize)]
struct RoleObject {
    id: RoleId,
    name: String,
    #[serde(default)]
    permissions: String,
    #[serde(default)]
    position: i64,
}

#[derive(Deserialize)]
struct GuildObject {
    id: CommunityId,
    name: String,
    owner_id: MemberId,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    verification_level: u8,
    #[serde(default)]
    preferred_locale: Option<String>,
    #[serde(default)]
    approximate_member_count: Option<u64>,
    #[serde(default)]
    roles: Vec<RoleObject>,
}

#[derive(Deserialize)]
struct MessageObject {
    id: MessageId,
}

/// Union of @everyone and every role the member holds.
fn granted_permissions(community: CommunityId, held: &[RoleId], roles: &[RoleObject]) -> Permissions {
    // @everyone shares the guild's id.
    roles
        .iter()
        .filter(|r| r.id.get() == community.get() || held.contains(&r.id))
        .filter_map(|r| r.permissions.parse::<u64>().ok())
        .fold(Permissions::default(), |acc, bits| acc | Permissions(bits))
}

#[derive(Deserialize)]
struct ChannelObject {
    id: ChannelId,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
}

fn channel_kind(raw: u8) -> ChannelKind {
    match raw {
        0 | 5 | 15 | 16 => ChannelKind::Text,
        2 | 13 => ChannelKind::Voice,
        4 => ChannelKind::Category,
        10..=12 => ChannelKind::Thread,
        _ => ChannelKind::Other,
    }
}

pub struct DiscordRest {
    http: Client,
    base: String,
    token: String,
    bot_user: OnceCell<MemberId>,
}

impl DiscordRest {
    pub fn new(api_base: &str, token: impl Into<String>) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("cafebot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
            bot_user: OnceCell::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    fn with_reason(builder: RequestBuilder, reason: &str) -> RequestBuilder {
        let encoded = utf8_percent_encode(reason, NON_ALPHANUMERIC).to_string();
        builder.header(AUDIT_REASON_HEADER, encoded)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, GatewayError> {
        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Transport(e)
            }
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %detail, "platform request failed");
        Err(match status {
            StatusCode::FORBIDDEN => GatewayError::MissingPermission(detail),
            StatusCode::NOT_FOUND => GatewayError::NotFound(detail),
            _ => GatewayError::Status {
                status: status.as_u16(),
                detail,
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let resp = Self::send(self.request(Method::GET, path)).await?;
        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn bot_user_id(&self) -> Result<MemberId, GatewayError> {
        self.bot_user
            .get_or_try_init(|| async {
                let me: UserObject = self.get_json("/users/@me").await?;
                Ok::<_, GatewayError>(me.id)
            })
            .await
            .copied()
    }

    async fn member(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<MemberObject, GatewayError> {
        self.get_json(&format!("/guilds/{community}/members/{member}"))
            .await
    }

    async fn roles(&self, community: CommunityId) -> Result<Vec<RoleObject>, GatewayError> {
        self.get_json(&format!("/guilds/{community}/roles")).await
    }
}

#[async_trait]
impl Gateway for DiscordRest {
    async fn can_manage_roles(&self, community: CommunityId) -> Result<bool, GatewayError> {
        let me = self.bot_user_id().await?;
        let member = self.member(community, me).await?;
        let roles = self.roles(community).await?;
        let granted = granted_permissions(community, &member.roles, &roles);

        Ok(granted.contains(Permissions::ADMINISTRATOR)
            || granted.contains(Permissions::MANAGE_ROLES))
    }

    async fn find_role_by_name(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<Option<RoleId>, GatewayError> {
        let roles = self.roles(community).await?;
        Ok(roles.into_iter().find(|r| r.name == name).map(|r| r.id))
    }

    async fn create_role(
        &self,
        community: CommunityId,
        spec: &RoleSpec,
    ) -> Result<RoleId, GatewayError> {
        let body = json!({
            "name": spec.name,
            "color": spec.color,
            "permissions": "0",
            "mentionable": false,
        });
        let builder = self
            .request(Method::POST, &format!("/guilds/{community}/roles"))
            .json(&body);
        let resp = Self::send(Self::with_reason(builder, &spec.reason)).await?;
        let role: RoleObject = resp
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(role.id)
    }

    async fn list_channels(&self, community: CommunityId) -> Result<Vec<ChannelInfo>, GatewayError> {
        let raw: Vec<ChannelObject> = self
            .get_json(&format!("/guilds/{community}/channels"))
            .await?;
        Ok(raw
            .into_iter()
            .map(|c| ChannelInfo {
                id: c.id,
                name: c.name.unwrap_or_default(),
                kind: channel_kind(c.kind),
            })
            .collect())
    }

    async fn deny_channel_permissions(
        &self,
        channel: ChannelId,
        role: RoleId,
        deny: Permissions,
    ) -> Result<(), GatewayError> {
        // type 0 targets a role rather than a member.
        let body = json!({
            "type": 0,
            "allow": "0",
            "deny": deny.bits().to_string(),
        });
        let builder = self
            .request(Method::PUT, &format!("/channels/{channel}/permissions/{role}"))
            .json(&body);
        Self::send(builder).await.map(|_| ())
    }

    async fn add_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        let builder = self.request(
            Method::PUT,
            &format!("/guilds/{community}/members/{member}/roles/{role}"),
        );
        Self::send(Self::with_reason(builder, reason))
            .await
            .map(|_| ())
    }

    async fn remove_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        let builder = self.request(
            Method::DELETE,
            &format!("/guilds/{community}/members/{member}/roles/{role}"),
        );
        Self::send(Self::with_reason(builder, reason))
            .await
            .map(|_| ())
    }

    async fn member_has_role(
        &self,
        community: CommunityId,
        member: MemberId,
        role: RoleId,
    ) -> Result<bool, GatewayError> {
        match self.member(community, member).await {
            Ok(m) => Ok(m.roles.contains(&role)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn member_present(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<bool, GatewayError> {
        match self.member(community, member).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), GatewayError> {
        let body = json!({
            "content": content,
            "allowed_mentions": { "parse": ["users"] },
        });
        let builder = self
            .request(Method::POST, &format!("/channels/{channel}/messages"))
            .json(&body);
        Self::send(builder).await.map(|_| ())
    }

    async fn community_profile(
        &self,
        community: CommunityId,
    ) -> Result<CommunityProfile, GatewayError> {
        let guild: GuildObject = self
            .get_json(&format!("/guilds/{community}?with_counts=true"))
            .await?;
        let channel_count = self.list_channels(community).await?.len();
        Ok(CommunityProfile {
            icon_url: guild.icon.as_deref().map(|h| community_icon_url(guild.id, h)),
            id: guild.id,
            name: guild.name,
            owner: guild.owner_id,
            member_count: guild.approximate_member_count,
            channel_count,
            role_count: guild.roles.len(),
            verification_level: guild.verification_level,
            locale: guild.preferred_locale,
        })
    }

    async fn user_profile(&self, user: MemberId) -> Result<UserProfile, GatewayError> {
        let raw: UserObject = self.get_json(&format!("/users/{user}")).await?;
        Ok(raw.into())
    }

    async fn member_profile(
        &self,
        community: CommunityId,
        id: MemberId,
    ) -> Result<Option<MemberProfile>, GatewayError> {
        let member = match self.member(community, id).await {
            Ok(m) => m,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut user = match member.user {
            Some(user) => UserProfile::from(user),
            None => self.user_profile(id).await?,
        };
        if member.nick.is_some() {
            user.display_name = member.nick;
        }

        let roles = self.roles(community).await?;
        let permissions = granted_permissions(community, &member.roles, &roles);
        let mut held: Vec<&RoleObject> = roles
            .iter()
            .filter(|r| member.roles.contains(&r.id))
            .collect();
        held.sort_by(|a, b| b.position.cmp(&a.position));

        Ok(Some(MemberProfile {
            user,
            joined_at: member.joined_at,
            roles: held.into_iter().map(|r| r.name.clone()).collect(),
            permissions,
        }))
    }

    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: u8,
    ) -> Result<Vec<MessageId>, GatewayError> {
        let raw: Vec<MessageObject> = self
            .get_json(&format!("/channels/{channel}/messages?limit={limit}"))
            .await?;
        Ok(raw.into_iter().map(|m| m.id).collect())
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), GatewayError> {
        let builder = self.request(
            Method::DELETE,
            &format!("/channels/{channel}/messages/{message}"),
        );
        Self::send(builder).await.map(|_| ())
    }

    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        messages: &[MessageId],
    ) -> Result<(), GatewayError> {
        let body = json!({ "messages": messages });
        let builder = self
            .request(
                Method::POST,
                &format!("/channels/{channel}/messages/bulk-delete"),
            )
            .json(&body);
        Self::send(builder).await.map(|_| ())
    }
}
