//! Platform events forwarded by the relay.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::warn;

use crate::error::AppError;
use crate::services::audit::QuarantineReason;
use crate::services::chatter::ChatReply;
use crate::services::{IncomingMessage, JoinOutcome, MemberJoined};
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JoinOutcome> for JoinResponse {
    fn from(outcome: JoinOutcome) -> Self {
        let (label, error) = match outcome {
            JoinOutcome::Welcomed => ("welcomed", None),
            JoinOutcome::Ignored => ("ignored", None),
            JoinOutcome::Quarantined {
                reason: QuarantineReason::NewAccount,
            } => ("quarantined_new_account", None),
            JoinOutcome::Quarantined {
                reason: QuarantineReason::RaidDetected,
            } => ("quarantined_raid", None),
            JoinOutcome::Flagged {
                reason: QuarantineReason::NewAccount,
                error,
            } => ("flagged_new_account", Some(error)),
            JoinOutcome::Flagged {
                reason: QuarantineReason::RaidDetected,
                error,
            } => ("flagged_raid", Some(error)),
        };
        Self {
            outcome: label,
            error,
        }
    }
}

/// POST /api/events/member-joined
async fn member_joined(
    body: web::Json<MemberJoined>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let at = tokio::time::Instant::now().into_std();
    let outcome = app_state.members.on_member_joined(&body, at).await;
    Ok(HttpResponse::Ok().json(JoinResponse::from(outcome)))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: Option<ChatReply>,
}

/// POST /api/events/message
///
/// The reply, if any, is posted through the gateway and also returned so
/// the relay can tell what the bot said.
async fn message(
    body: web::Json<IncomingMessage>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let at = tokio::time::Instant::now().into_std();
    let reply = app_state.chatter.on_message(&body, at);

    if let Some(reply) = &reply {
        if let Err(e) = app_state
            .gateway
            .send_message(reply.channel_id, &reply.content)
            .await
        {
            warn!(channel = %reply.channel_id, error = %e, "chat reply not sent");
        }
    }
    Ok(HttpResponse::Ok().json(MessageResponse { reply }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/member-joined", web::post().to(member_joined))
        .route("/message", web::post().to(message));
}
