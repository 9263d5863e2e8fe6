//! Moderated bulk delete.
//!
//! A request only records what to delete and answers with confirm/cancel
//! buttons. Nothing is removed until the requester confirms within the
//! window; an unanswered request expires on its own.

use std::sync::Arc;

use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::audit::{AuditEvent, AuditLog};
use super::info::{ButtonStyle, CommandReply, ReplyButton};
use crate::domain::purge::{deletable, purge_amount, PURGE_CONFIRM_WINDOW};
use crate::domain::{ChannelId, CommunityId, MemberId, PurgeChoice, PurgeId, PurgeToken};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::gateway::Gateway;
use crate::infra::scheduler::schedule_after;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPurge {
    community: CommunityId,
    channel: ChannelId,
    requester: MemberId,
    amount: u8,
}

pub struct PurgeService {
    gateway: Arc<dyn Gateway>,
    audit: Arc<AuditLog>,
    pending: Arc<DashMap<PurgeId, PendingPurge>>,
}

impl PurgeService {
    pub fn new(gateway: Arc<dyn Gateway>, audit: Arc<AuditLog>) -> Self {
        Self {
            gateway,
            audit,
            pending: Arc::new(DashMap::new()),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Validate and park a request. Only administrators may ask.
    pub fn request(
        &self,
        community: CommunityId,
        channel: ChannelId,
        actor: MemberId,
        actor_is_admin: bool,
        amount: Option<i64>,
    ) -> Result<CommandReply, DomainError> {
        if !actor_is_admin {
            return Err(DomainError::forbidden(
                "clearing messages requires the administrator permission",
            ));
        }
        let amount = purge_amount(amount)?;
        let id = PurgeId::generate();
        self.pending.insert(
            id,
            PendingPurge {
                community,
                channel,
                requester: actor,
                amount,
            },
        );

        let pending = Arc::clone(&self.pending);
        schedule_after(PURGE_CONFIRM_WINDOW, "purge-expiry", async move {
            if pending.remove(&id).is_some() {
                debug!(request = %id, "purge request expired unanswered");
            }
        });

        let buttons = vec![
            ReplyButton {
                custom_id: PurgeToken::new(id, PurgeChoice::Confirm).to_string(),
                label: "Confirm",
                style: ButtonStyle::Danger,
            },
            ReplyButton {
                custom_id: PurgeToken::new(id, PurgeChoice::Cancel).to_string(),
                label: "Cancel",
                style: ButtonStyle::Secondary,
            },
        ];
        Ok(CommandReply::private(format!(
            "⚠️ Delete the last {amount} messages in <#{channel}>? This cannot be undone."
        ))
        .with_buttons(buttons))
    }

    /// Handle a confirm/cancel press. Only the requester's presses count;
    /// anyone else's leaves the request waiting.
    pub async fn press(&self, raw: &str, actor: MemberId) -> Result<CommandReply, DomainError> {
        let token: PurgeToken = raw.parse()?;
        let expired = || {
            DomainError::not_found(
                NotFoundKind::Other("purge request".into()),
                "this request has expired",
            )
        };

        let request = *self.pending.get(&token.request).ok_or_else(expired)?;
        if request.requester != actor {
            return Err(DomainError::forbidden(
                "only the member who asked can answer this request",
            ));
        }
        // Whoever removes the entry owns the request; a double press finds
        // it gone.
        self.pending.remove(&token.request).ok_or_else(expired)?;

        match token.choice {
            PurgeChoice::Cancel => Ok(CommandReply::private("❎ Clear cancelled.")),
            PurgeChoice::Confirm => self.execute(request).await,
        }
    }

    async fn execute(&self, request: PendingPurge) -> Result<CommandReply, DomainError> {
        let recent = self
            .gateway
            .recent_messages(request.channel, request.amount)
            .await?;
        let targets = deletable(&recent, OffsetDateTime::now_utc());

        match targets.as_slice() {
            [] => {
                return Ok(CommandReply::private(
                    "ℹ️ Nothing to delete: no messages younger than 14 days.",
                ))
            }
            [single] => {
                self.gateway
                    .delete_message(request.channel, *single)
                    .await?
            }
            many => {
                self.gateway
                    .bulk_delete_messages(request.channel, many)
                    .await?
            }
        }

        let deleted = targets.len();
        info!(
            community = %request.community,
            channel = %request.channel,
            actor = %request.requester,
            deleted,
            skipped = recent.len() - deleted,
            "messages cleared"
        );
        self.audit
            .record(
                request.community,
                AuditEvent::ManualAction {
                    actor: request.requester,
                    action: format!("clear {deleted} messages in <#{}>", request.channel),
                    target: None,
                },
            )
            .await;
        Ok(CommandReply::private(format!("🧹 Deleted {deleted} messages.")))
    }
}
