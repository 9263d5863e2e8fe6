use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::{MemberId, PurgeToken};
use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ButtonPress {
    pub actor_id: MemberId,
    pub custom_id: String,
}

/// POST /api/interactions/button
///
/// Decodes the button token and runs the matching action on behalf of the
/// member who pressed it. Clear confirmations answer with a reply; game
/// tokens answer with the session view.
async fn button(
    body: web::Json<ButtonPress>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if PurgeToken::matches(&body.custom_id) {
        let reply = app_state
            .purge
            .press(&body.custom_id, body.actor_id)
            .await?;
        return Ok(HttpResponse::Ok().json(reply));
    }
    let view = app_state
        .games
        .handle_action(body.actor_id, &body.custom_id)?;
    Ok(HttpResponse::Ok().json(view))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/button", web::post().to(button));
}
