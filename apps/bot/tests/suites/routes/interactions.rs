use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, Error};
use serde_json::{json, Value};

use crate::common::{assert_problem, json_body};
use crate::support::app_builder::TestAppBuilder;

async fn invite<S>(app: &S) -> String
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "initiator_id": "1", "mode": "pvp", "invitee_id": "2" }))
        .to_request();
    let body = json_body(test::call_service(app, req).await, StatusCode::CREATED).await;
    body["session_id"].as_str().unwrap_or_default().to_string()
}

fn press(actor: u64, token: &str) -> Request {
    test::TestRequest::post()
        .uri("/api/interactions/button")
        .set_json(json!({ "actor_id": actor.to_string(), "custom_id": token }))
        .to_request()
}

async fn press_ok<S>(app: &S, actor: u64, token: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    json_body(test::call_service(app, press(actor, token)).await, StatusCode::OK).await
}

#[actix_web::test]
async fn accepted_invite_is_playable() {
    let (app, _, _) = TestAppBuilder::new().build().await;
    let id = invite(&app).await;

    let body = press_ok(&app, 2, &format!("ttt:{id}:accept")).await;
    assert_eq!(body["status"]["state"], "active");

    let body = press_ok(&app, 1, &format!("ttt:{id}:4")).await;
    assert_eq!(body["board"][4], "X");
    assert_eq!(body["to_move"], "O");

    let resp = test::call_service(&app, press(1, &format!("ttt:{id}:0"))).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "NOT_YOUR_TURN").await;

    let body = press_ok(&app, 2, &format!("ttt:{id}:0")).await;
    assert_eq!(body["board"][0], "O");
}

#[actix_web::test]
async fn moves_wait_for_acceptance() {
    let (app, _, _) = TestAppBuilder::new().build().await;
    let id = invite(&app).await;

    let resp = test::call_service(&app, press(1, &format!("ttt:{id}:4"))).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "INVITE_PENDING").await;
}

#[actix_web::test]
async fn only_the_invitee_may_accept() {
    let (app, _, _) = TestAppBuilder::new().build().await;
    let id = invite(&app).await;

    let resp = test::call_service(&app, press(3, &format!("ttt:{id}:accept"))).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[actix_web::test]
async fn declined_session_is_gone() {
    let (app, state, _) = TestAppBuilder::new().build().await;
    let id = invite(&app).await;

    let body = press_ok(&app, 2, &format!("ttt:{id}:decline")).await;
    assert_eq!(body["status"]["state"], "declined");
    assert_eq!(state.games.session_count(), 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{id}"))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "SESSION_NOT_FOUND",
    )
    .await;
}

#[actix_web::test]
async fn bad_tokens_and_cells_are_rejected() {
    let (app, _, _) = TestAppBuilder::new().build().await;
    let id = invite(&app).await;
    press_ok(&app, 2, &format!("ttt:{id}:accept")).await;

    let resp = test::call_service(&app, press(1, "hello")).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ACTION_TOKEN").await;

    let resp = test::call_service(&app, press(1, &format!("ttt:{id}:9"))).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "INVALID_CELL").await;
}

#[actix_web::test]
async fn winning_line_finishes_and_reset_starts_over() {
    let (app, _, _) = TestAppBuilder::new().build().await;
    let id = invite(&app).await;
    press_ok(&app, 2, &format!("ttt:{id}:accept")).await;

    for (actor, cell) in [(1, 0), (2, 3), (1, 1), (2, 4)] {
        press_ok(&app, actor, &format!("ttt:{id}:{cell}")).await;
    }
    let body = press_ok(&app, 1, &format!("ttt:{id}:2")).await;
    assert_eq!(body["status"]["state"], "finished");
    assert_eq!(body["status"]["verdict"]["result"], "win");
    assert_eq!(body["status"]["verdict"]["mark"], "X");
    assert_eq!(body["tally"]["x_wins"], 1);

    let resp = test::call_service(&app, press(2, &format!("ttt:{id}:5"))).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "SESSION_INACTIVE").await;

    let body = press_ok(&app, 2, &format!("ttt:{id}:reset")).await;
    assert_eq!(body["status"]["state"], "active");
    assert_eq!(body["to_move"], "X");
    assert_eq!(body["tally"]["x_wins"], 1);
}
