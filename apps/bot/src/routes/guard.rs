//! Moderator-facing guard routes.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{CommunityId, MemberId};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::services::guard::MemberGuardState;
use crate::services::AuditEvent;
use crate::state::app_state::AppState;

/// GET /api/guard/{community_id}/stats
async fn stats(
    path: web::Path<u64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let community = CommunityId(path.into_inner());
    Ok(HttpResponse::Ok().json(app_state.guard.stats(community)))
}

#[derive(Debug, Serialize)]
pub struct MemberCheck {
    #[serde(flatten)]
    pub state: MemberGuardState,
    pub has_role: bool,
}

/// GET /api/guard/{community_id}/members/{member_id}
///
/// `quarantined` reflects this process's marks; `has_role` asks the
/// platform, so a role left behind by a restart still shows up.
async fn member(
    path: web::Path<(u64, u64)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (community, member) = path.into_inner();
    let (community, member) = (CommunityId(community), MemberId(member));
    let state = app_state.guard.member_state(community, member);
    let has_role = app_state
        .guard
        .holds_quarantine_role(community, member)
        .await?;
    Ok(HttpResponse::Ok().json(MemberCheck { state, has_role }))
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub actor_id: MemberId,
    #[serde(default)]
    pub actor_can_manage_guild: bool,
}

#[derive(Debug, Serialize)]
struct ReleaseResponse {
    released: bool,
}

/// POST /api/guard/{community_id}/members/{member_id}/release
async fn release(
    path: web::Path<(u64, u64)>,
    body: web::Json<ReleaseRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (community, member) = path.into_inner();
    let (community, member) = (CommunityId(community), MemberId(member));

    if !body.actor_can_manage_guild {
        return Err(AppError::forbidden(
            ErrorCode::Forbidden,
            "releasing a quarantine requires the manage-server permission",
        ));
    }

    if !app_state.guard.release_manually(community, member).await? {
        return Err(AppError::not_found(
            ErrorCode::NotQuarantined,
            format!("member {member} is not quarantined"),
        ));
    }

    info!(community = %community, member = %member, actor = %body.actor_id, "quarantine released by moderator");
    app_state
        .audit
        .record(
            community,
            AuditEvent::ManualAction {
                actor: body.actor_id,
                action: "release_quarantine".to_string(),
                target: Some(member),
            },
        )
        .await;

    Ok(HttpResponse::Ok().json(ReleaseResponse { released: true }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{community_id}/stats", web::get().to(stats))
        .route("/{community_id}/members/{member_id}", web::get().to(member))
        .route(
            "/{community_id}/members/{member_id}/release",
            web::post().to(release),
        );
}
