//! Moderation audit trail.
//!
//! Every entry is logged through `tracing`; when a log channel is configured
//! it is also posted there. Posting is best effort and never fails the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::domain::{ChannelId, CommunityId, MemberId};
use crate::gateway::Gateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineReason {
    RaidDetected,
    NewAccount,
}

impl QuarantineReason {
    pub const fn describe(self) -> &'static str {
        match self {
            QuarantineReason::RaidDetected => "join raid detected",
            QuarantineReason::NewAccount => "account younger than the minimum age",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    RaidDetected {
        recent_joins: usize,
        window: Duration,
    },
    MemberQuarantined {
        member: MemberId,
        reason: QuarantineReason,
        duration: Duration,
    },
    QuarantineReleased {
        member: MemberId,
        manual: bool,
    },
    ManualAction {
        actor: MemberId,
        action: String,
        target: Option<MemberId>,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::RaidDetected { .. } => "raid_detected",
            AuditEvent::MemberQuarantined { .. } => "member_quarantined",
            AuditEvent::QuarantineReleased { .. } => "quarantine_released",
            AuditEvent::ManualAction { .. } => "manual_action",
        }
    }

    pub fn render(&self, at: OffsetDateTime) -> String {
        let stamp = at.unix_timestamp();
        let body = match self {
            AuditEvent::RaidDetected {
                recent_joins,
                window,
            } => format!(
                "🚨 Raid detected: {recent_joins} joins in the last {} minutes. New members are being quarantined.",
                window.as_secs() / 60
            ),
            AuditEvent::MemberQuarantined {
                member,
                reason,
                duration,
            } => format!(
                "🔒 <@{member}> quarantined for {} minutes ({}).",
                duration.as_secs() / 60,
                reason.describe()
            ),
            AuditEvent::QuarantineReleased { member, manual } => {
                let how = if *manual { "manually" } else { "after timeout" };
                format!("🔓 <@{member}> released from quarantine {how}.")
            }
            AuditEvent::ManualAction {
                actor,
                action,
                target,
            } => match target {
                Some(t) => format!("🛠️ <@{actor}> ran `{action}` on <@{t}>."),
                None => format!("🛠️ <@{actor}> ran `{action}`."),
            },
        };
        format!("{body} <t:{stamp}:f>")
    }
}

pub struct AuditLog {
    gateway: Arc<dyn Gateway>,
    channel: Option<ChannelId>,
}

impl AuditLog {
    pub fn new(gateway: Arc<dyn Gateway>, channel: Option<ChannelId>) -> Self {
        Self { gateway, channel }
    }

    pub async fn record(&self, community: CommunityId, event: AuditEvent) {
        info!(community = %community, audit = event.kind(), ?event, "audit");
        let Some(channel) = self.channel else {
            return;
        };
        let text = event.render(OffsetDateTime::now_utc());
        if let Err(e) = self.gateway.send_message(channel, &text).await {
            warn!(channel = %channel, error = %e, "failed to post audit entry");
        }
    }
}
