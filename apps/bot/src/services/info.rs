//! Informational commands: server info, user info, avatar and a preview of
//! the welcome message. Replies are plain text handed back to the relay.

use std::fmt::Write;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use super::members::welcome_text;
use crate::domain::{CommunityId, MemberId};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::gateway::{CommunityProfile, Gateway, MemberProfile, Permissions, UserProfile};

/// Roles listed by name before the rest are summarised.
pub const ROLE_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Danger,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyButton {
    pub custom_id: String,
    pub label: &'static str,
    pub style: ButtonStyle,
}

/// What the relay should answer a command or button press with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub content: String,
    /// Visible only to the member who invoked the command.
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ReplyButton>,
}

impl CommandReply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
            buttons: Vec::new(),
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            ephemeral: true,
            ..Self::public(content)
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<ReplyButton>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Who ran the command; shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: MemberId,
    pub name: Option<String>,
}

impl Requester {
    fn footer(&self) -> String {
        match &self.name {
            Some(name) => format!("_Requested by {name}_"),
            None => format!("_Requested by <@{}>_", self.id),
        }
    }
}

fn full_and_relative(at: OffsetDateTime) -> String {
    let ts = at.unix_timestamp();
    format!("<t:{ts}:F> (<t:{ts}:R>)")
}

pub fn verification_label(level: u8) -> &'static str {
    match level {
        0 => "None",
        1 => "Low",
        2 => "Medium",
        3 => "High",
        4 => "Very high",
        _ => "Unknown",
    }
}

/// Highest special permission worth calling out, if any.
pub fn special_permission(permissions: Permissions) -> Option<&'static str> {
    if permissions.contains(Permissions::ADMINISTRATOR) {
        Some("🔧 Administrator")
    } else if permissions.contains(Permissions::MANAGE_GUILD) {
        Some("🛠️ Manage server")
    } else if permissions.contains(Permissions::MODERATE_MEMBERS) {
        Some("🛡️ Moderator")
    } else {
        None
    }
}

pub fn render_server_info(profile: &CommunityProfile, requester: &Requester) -> String {
    let mut out = String::from("📊 **Server info**\n");
    let _ = writeln!(out, "🏷️ Name: {}", profile.name);
    let _ = writeln!(out, "🆔 ID: {}", profile.id);
    let _ = writeln!(out, "👑 Owner: <@{}>", profile.owner);
    let _ = writeln!(out, "📅 Created: <t:{}:F>", profile.id.created_at().unix_timestamp());
    let _ = writeln!(out, "📺 Channels: {}", profile.channel_count);
    match profile.member_count {
        Some(n) => {
            let _ = writeln!(out, "👥 Members: {n}");
        }
        None => out.push_str("👥 Members: unknown\n"),
    }
    let _ = writeln!(out, "🎭 Roles: {}", profile.role_count);
    let _ = writeln!(
        out,
        "🔒 Verification: {}",
        verification_label(profile.verification_level)
    );
    let _ = writeln!(
        out,
        "🌍 Locale: {}",
        profile.locale.as_deref().unwrap_or("not set")
    );
    if let Some(icon) = &profile.icon_url {
        let _ = writeln!(out, "🖼️ {icon}");
    }
    out.push_str(&requester.footer());
    out
}

pub fn render_user_info(member: &MemberProfile, requester: &Requester) -> String {
    let user = &member.user;
    let mut out = String::from("👤 **User info**\n");
    let _ = writeln!(out, "🏷️ Name: {} ({})", user.shown_name(), user.username);
    let _ = writeln!(out, "🆔 ID: {}", user.id);
    let _ = writeln!(out, "📅 Account created: {}", full_and_relative(user.id.created_at()));
    match member.joined_at {
        Some(at) => {
            let _ = writeln!(out, "📥 Joined: {}", full_and_relative(at));
        }
        None => out.push_str("📥 Joined: unknown\n"),
    }

    let total = member.roles.len();
    if total == 0 {
        out.push_str("🎭 Roles (0): none\n");
    } else {
        let shown = member.roles[..total.min(ROLE_LIST_LIMIT)].join(", ");
        let _ = write!(out, "🎭 Roles ({total}): {shown}");
        if total > ROLE_LIST_LIMIT {
            let _ = write!(out, " … and {} more", total - ROLE_LIST_LIMIT);
        }
        out.push('\n');
    }
    if let Some(special) = special_permission(member.permissions) {
        let _ = writeln!(out, "⚡ Special permissions: {special}");
    }
    out.push_str(&requester.footer());
    out
}

pub fn render_avatar(user: &UserProfile, requester: &Requester) -> String {
    format!(
        "🖼️ **Avatar of {}**\nTag: {} · ID: {}\n{}\n{}",
        user.shown_name(),
        user.username,
        user.id,
        user.avatar_url,
        requester.footer()
    )
}

pub struct InfoService {
    gateway: Arc<dyn Gateway>,
}

impl InfoService {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn server_info(
        &self,
        community: CommunityId,
        requester: &Requester,
    ) -> Result<CommandReply, DomainError> {
        let profile = self.gateway.community_profile(community).await?;
        Ok(CommandReply::public(render_server_info(&profile, requester)))
    }

    /// `target` defaults to the requester.
    pub async fn user_info(
        &self,
        community: CommunityId,
        target: Option<MemberId>,
        requester: &Requester,
    ) -> Result<CommandReply, DomainError> {
        let target = target.unwrap_or(requester.id);
        let member = self
            .gateway
            .member_profile(community, target)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Member,
                    format!("user {target} is not a member of this server"),
                )
            })?;
        Ok(CommandReply::public(render_user_info(&member, requester)))
    }

    pub async fn avatar(
        &self,
        target: Option<MemberId>,
        requester: &Requester,
    ) -> Result<CommandReply, DomainError> {
        let user = self
            .gateway
            .user_profile(target.unwrap_or(requester.id))
            .await?;
        Ok(CommandReply::public(render_avatar(&user, requester)))
    }

    /// The welcome message exactly as a join would post it, shown only to
    /// the requester.
    pub async fn welcome_preview(
        &self,
        community: CommunityId,
        target: Option<MemberId>,
        requester: &Requester,
    ) -> Result<CommandReply, DomainError> {
        let target = target.unwrap_or(requester.id);
        let user = self.gateway.user_profile(target).await?;
        let member_count = match self.gateway.community_profile(community).await {
            Ok(profile) => profile.member_count,
            Err(e) => {
                debug!(community = %community, error = %e, "member count unavailable for preview");
                None
            }
        };
        Ok(CommandReply::private(welcome_text(
            target,
            &user.username,
            member_count,
        )))
    }
}
