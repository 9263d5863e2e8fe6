use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use crate::common::{assert_problem, json_body};
use crate::support::app_builder::TestAppBuilder;
use crate::support::fixtures::TABLE_CHANNEL;

#[actix_web::test]
async fn create_against_computer() {
    let (app, state, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({
            "initiator_id": "1",
            "channel_id": TABLE_CHANNEL.to_string(),
            "mode": "pve",
            "difficulty": "hard",
        }))
        .to_request();
    let body = json_body(test::call_service(&app, req).await, StatusCode::CREATED).await;

    assert_eq!(body["mode"]["kind"], "human_vs_computer");
    assert_eq!(body["mode"]["difficulty"], "hard");
    assert_eq!(body["player_a"], "1");
    assert_eq!(body["player_b"]["kind"], "computer");
    assert_eq!(body["status"]["state"], "active");
    assert_eq!(body["to_move"], "X");
    assert_eq!(body["board"], json!([null, null, null, null, null, null, null, null, null]));
    assert_eq!(state.games.session_count(), 1);
}

#[actix_web::test]
async fn difficulty_defaults_to_medium() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "initiator_id": "1", "mode": "human_vs_computer" }))
        .to_request();
    let body = json_body(test::call_service(&app, req).await, StatusCode::CREATED).await;
    assert_eq!(body["mode"]["difficulty"], "medium");
}

#[actix_web::test]
async fn open_challenge_has_unclaimed_seat() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "initiator_id": "1", "mode": "pvp" }))
        .to_request();
    let body = json_body(test::call_service(&app, req).await, StatusCode::CREATED).await;
    assert_eq!(body["mode"]["kind"], "human_vs_human");
    assert_eq!(body["player_b"]["kind"], "unclaimed");
    assert_eq!(body["status"]["state"], "active");
}

#[actix_web::test]
async fn fetch_by_id() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "initiator_id": "1", "mode": "pvp", "invitee_id": "2" }))
        .to_request();
    let created = json_body(test::call_service(&app, req).await, StatusCode::CREATED).await;
    let id = created["session_id"].as_str().unwrap_or_default().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{id}"))
        .to_request();
    let body = json_body(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(body["session_id"], id);
    assert_eq!(body["status"]["state"], "pending_invite");
    assert_eq!(body["status"]["invitee"], "2");
}

#[actix_web::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::get().uri("/api/games/not-a-ulid").to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "SESSION_NOT_FOUND",
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/games/01ARZ3NDEKTSV4RRFFQ69G5FAV")
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "SESSION_NOT_FOUND",
    )
    .await;
}

#[actix_web::test]
async fn self_challenge_is_rejected() {
    let (app, state, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "initiator_id": "1", "mode": "pvp", "invitee_id": "1" }))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNPROCESSABLE_ENTITY,
        "SELF_CHALLENGE",
    )
    .await;
    assert_eq!(state.games.session_count(), 0);
}

#[actix_web::test]
async fn bots_cannot_be_challenged() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({
            "initiator_id": "1",
            "mode": "pvp",
            "invitee_id": "99",
            "invitee_is_bot": true,
        }))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNPROCESSABLE_ENTITY,
        "NON_HUMAN_OPPONENT",
    )
    .await;
}
