//! What happens when someone joins: screening, then either quarantine or
//! the usual welcome.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use super::audit::{AuditEvent, AuditLog, QuarantineReason};
use super::guard::GuardService;
use crate::config::WelcomeSettings;
use crate::domain::{CommunityId, MemberId};
use crate::gateway::Gateway;

/// A member-joined notification from the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberJoined {
    pub community_id: CommunityId,
    pub member_id: MemberId,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub account_created_at: OffsetDateTime,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JoinOutcome {
    Welcomed,
    Quarantined { reason: QuarantineReason },
    /// Screening flagged the member but quarantine could not be applied.
    Flagged { reason: QuarantineReason, error: String },
    Ignored,
}

pub struct MemberEvents {
    guard: Arc<GuardService>,
    gateway: Arc<dyn Gateway>,
    audit: Arc<AuditLog>,
    welcome: WelcomeSettings,
}

impl MemberEvents {
    pub fn new(
        guard: Arc<GuardService>,
        gateway: Arc<dyn Gateway>,
        audit: Arc<AuditLog>,
        welcome: WelcomeSettings,
    ) -> Self {
        Self {
            guard,
            gateway,
            audit,
            welcome,
        }
    }

    /// Screen a newcomer. The join always counts toward the rate; a young
    /// account is held before the raid check, and a flagged member never
    /// receives the welcome.
    pub async fn on_member_joined(&self, joined: &MemberJoined, at: Instant) -> JoinOutcome {
        if joined.is_bot {
            return JoinOutcome::Ignored;
        }
        let community = joined.community_id;
        let check = self.guard.record_join_and_check(community, at);
        // Announce once, on the join that crossed the threshold, even when
        // that member is held for its account age instead.
        if check.crossed_threshold() {
            self.audit
                .record(
                    community,
                    AuditEvent::RaidDetected {
                        recent_joins: check.recent_joins,
                        window: self.guard.settings().join_rate.window,
                    },
                )
                .await;
        }

        let age = OffsetDateTime::now_utc() - joined.account_created_at;
        let min_age = self.guard.settings().min_account_age;
        let young = age < min_age;

        let reason = if young {
            QuarantineReason::NewAccount
        } else if check.is_raid() {
            QuarantineReason::RaidDetected
        } else {
            self.welcome(joined).await;
            return JoinOutcome::Welcomed;
        };

        match self.guard.quarantine(community, joined.member_id, reason).await {
            Ok(_) => JoinOutcome::Quarantined { reason },
            Err(e) => {
                warn!(community = %community, member = %joined.member_id, error = %e, "screening flagged member but quarantine failed");
                JoinOutcome::Flagged {
                    reason,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn welcome(&self, joined: &MemberJoined) {
        let community = joined.community_id;
        if let Some(role) = self.welcome.auto_role {
            match self
                .gateway
                .add_role(community, joined.member_id, role, "Auto role on join")
                .await
            {
                Ok(()) => info!(member = %joined.member_id, role = %role, "auto role assigned"),
                Err(e) => warn!(member = %joined.member_id, role = %role, error = %e, "auto role not assigned"),
            }
        }

        let Some(channel) = self.welcome.channel else {
            return;
        };
        let text = welcome_text(joined.member_id, &joined.username, joined.member_count);
        if let Err(e) = self.gateway.send_message(channel, &text).await {
            warn!(channel = %channel, error = %e, "welcome message not sent");
        }
    }
}

pub fn welcome_text(member: MemberId, username: &str, member_count: Option<u64>) -> String {
    let count = member_count
        .map(|n| format!(" You are member #{n}."))
        .unwrap_or_default();
    format!("☕ Welcome, <@{member}>! Grab a coffee, {username} and make yourself at home.{count}")
}
