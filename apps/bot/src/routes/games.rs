//! Game-related HTTP routes.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::{
    ChannelId, CommunityId, Difficulty, GameMode, Invitee, MemberId, SessionId, SessionRequest,
};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::state::app_state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeParam {
    #[serde(alias = "pvp")]
    HumanVsHuman,
    #[serde(alias = "pve")]
    HumanVsComputer,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub community_id: Option<CommunityId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub initiator_id: MemberId,
    pub mode: ModeParam,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub invitee_id: Option<MemberId>,
    #[serde(default)]
    pub invitee_is_bot: bool,
}

impl From<CreateGameRequest> for SessionRequest {
    fn from(req: CreateGameRequest) -> Self {
        let mode = match req.mode {
            ModeParam::HumanVsHuman => GameMode::HumanVsHuman,
            ModeParam::HumanVsComputer => {
                GameMode::HumanVsComputer(req.difficulty.unwrap_or(Difficulty::Medium))
            }
        };
        SessionRequest {
            community: req.community_id,
            channel: req.channel_id,
            initiator: req.initiator_id,
            mode,
            invitee: req.invitee_id.map(|member| Invitee {
                member,
                is_bot: req.invitee_is_bot,
            }),
        }
    }
}

/// POST /api/games
async fn create_game(
    body: web::Json<CreateGameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let view = app_state.games.create_session(body.into_inner().into())?;
    Ok(HttpResponse::Created().json(view))
}

fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse().map_err(|_| {
        AppError::not_found(
            ErrorCode::SessionNotFound,
            format!("Game session {raw} not found or expired"),
        )
    })
}

/// GET /api/games/{session_id}
async fn get_game(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = parse_session_id(&path)?;
    Ok(HttpResponse::Ok().json(app_state.games.get(id)?))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_game))
        .route("/{session_id}", web::get().to(get_game));
}
