//! Slash commands forwarded by the relay. Each answers with a
//! [`CommandReply`] for the relay to post.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::{ChannelId, CommunityId, MemberId};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::services::{CommandReply, Requester};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommandInvocation {
    /// Absent when the command was used in a direct message.
    #[serde(default)]
    pub community_id: Option<CommunityId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub actor_id: MemberId,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub actor_is_admin: bool,
    #[serde(default)]
    pub target_id: Option<MemberId>,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl CommandInvocation {
    fn requester(&self) -> Requester {
        Requester {
            id: self.actor_id,
            name: self.actor_name.clone(),
        }
    }

    fn community(&self) -> Result<CommunityId, AppError> {
        self.community_id.ok_or_else(|| {
            AppError::bad_request(
                ErrorCode::BadRequest,
                "this command only works inside a server",
            )
        })
    }
}

fn reply(body: CommandReply) -> HttpResponse {
    HttpResponse::Ok().json(body)
}

/// POST /api/commands/serverinfo
async fn server_info(
    body: web::Json<CommandInvocation>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let community = body.community()?;
    let out = app_state
        .info
        .server_info(community, &body.requester())
        .await?;
    Ok(reply(out))
}

/// POST /api/commands/userinfo
async fn user_info(
    body: web::Json<CommandInvocation>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let community = body.community()?;
    let out = app_state
        .info
        .user_info(community, body.target_id, &body.requester())
        .await?;
    Ok(reply(out))
}

/// POST /api/commands/avatar
///
/// Works in direct messages too.
async fn avatar(
    body: web::Json<CommandInvocation>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let out = app_state
        .info
        .avatar(body.target_id, &body.requester())
        .await?;
    Ok(reply(out))
}

/// POST /api/commands/welcome-preview
async fn welcome_preview(
    body: web::Json<CommandInvocation>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let community = body.community()?;
    let out = app_state
        .info
        .welcome_preview(community, body.target_id, &body.requester())
        .await?;
    Ok(reply(out))
}

/// POST /api/commands/clear
///
/// Only parks the request; the confirm button does the deleting.
async fn clear(
    body: web::Json<CommandInvocation>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let community = body.community()?;
    let channel = body.channel_id.ok_or_else(|| {
        AppError::bad_request(ErrorCode::BadRequest, "channel_id is required to clear messages")
    })?;
    let out = app_state.purge.request(
        community,
        channel,
        body.actor_id,
        body.actor_is_admin,
        body.amount,
    )?;
    Ok(reply(out))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/serverinfo", web::post().to(server_info))
        .route("/userinfo", web::post().to(user_info))
        .route("/avatar", web::post().to(avatar))
        .route("/welcome-preview", web::post().to(welcome_preview))
        .route("/clear", web::post().to(clear));
}
