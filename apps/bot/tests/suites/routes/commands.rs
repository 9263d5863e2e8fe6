use actix_http::Request;
use actix_web::http::StatusCode;
use actix_web::test;
use cafebot::domain::{MemberId, MessageId};
use cafebot::gateway::{
    avatar_url, CommunityProfile, MemberProfile, MemoryGateway, Permissions, UserProfile,
};
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::common::{assert_problem, json_body};
use crate::support::app_builder::TestAppBuilder;
use crate::support::fixtures::{community, GUILD, LOG_CHANNEL, TABLE_CHANNEL};

const ADMIN: u64 = 42;

fn nelly() -> MemberProfile {
    MemberProfile {
        user: UserProfile {
            id: MemberId(7),
            username: "nelly".into(),
            display_name: Some("Nelly".into()),
            avatar_url: avatar_url(MemberId(7), Some("a_spin")),
            is_bot: false,
        },
        joined_at: None,
        roles: vec!["Barista".into(), "Regular".into()],
        permissions: Permissions::MODERATE_MEMBERS,
    }
}

fn gateway() -> MemoryGateway {
    MemoryGateway::new()
        .with_community(CommunityProfile {
            id: community(),
            name: "Café".into(),
            owner: MemberId(1),
            icon_url: None,
            member_count: Some(250),
            channel_count: 9,
            role_count: 4,
            verification_level: 1,
            locale: None,
        })
        .with_member(community(), nelly())
}

fn command(name: &str, body: Value) -> Request {
    test::TestRequest::post()
        .uri(&format!("/api/commands/{name}"))
        .set_json(body)
        .to_request()
}

#[actix_web::test]
async fn serverinfo_describes_the_community() {
    let (app, _, _) = TestAppBuilder::new().with_gateway(gateway()).build().await;
    let req = command(
        "serverinfo",
        json!({ "community_id": GUILD.to_string(), "actor_id": "7", "actor_name": "Nelly" }),
    );
    let body = json_body(test::call_service(&app, req).await, StatusCode::OK).await;
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("Name: Café"));
    assert!(content.contains("Members: 250"));
    assert!(content.contains("Verification: Low"));
    assert!(content.contains("_Requested by Nelly_"));
    assert_eq!(body["ephemeral"], false);
}

#[actix_web::test]
async fn server_commands_need_a_community() {
    let (app, _, _) = TestAppBuilder::new().with_gateway(gateway()).build().await;
    let req = command("serverinfo", json!({ "actor_id": "7" }));
    assert_problem(test::call_service(&app, req).await, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[actix_web::test]
async fn userinfo_defaults_to_the_requester() {
    let (app, _, _) = TestAppBuilder::new().with_gateway(gateway()).build().await;
    let req = command(
        "userinfo",
        json!({ "community_id": GUILD.to_string(), "actor_id": "7" }),
    );
    let body = json_body(test::call_service(&app, req).await, StatusCode::OK).await;
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("Name: Nelly (nelly)"));
    assert!(content.contains("Roles (2): Barista, Regular"));
    assert!(content.contains("Moderator"));
    assert!(content.contains("Joined: unknown"));
}

#[actix_web::test]
async fn userinfo_for_a_stranger_is_not_found() {
    let (app, _, _) = TestAppBuilder::new().with_gateway(gateway()).build().await;
    let req = command(
        "userinfo",
        json!({ "community_id": GUILD.to_string(), "actor_id": "7", "target_id": "8" }),
    );
    assert_problem(test::call_service(&app, req).await, StatusCode::NOT_FOUND, "MEMBER_NOT_FOUND").await;
}

#[actix_web::test]
async fn avatar_works_outside_a_community() {
    let (app, _, _) = TestAppBuilder::new().with_gateway(gateway()).build().await;
    let req = command("avatar", json!({ "actor_id": "3", "target_id": "7" }));
    let body = json_body(test::call_service(&app, req).await, StatusCode::OK).await;
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("/avatars/7/a_spin.gif"));
    assert!(content.contains("_Requested by <@3>_"));
}

#[actix_web::test]
async fn welcome_preview_is_private_and_matches_the_join_message() {
    let (app, _, _) = TestAppBuilder::new().with_gateway(gateway()).build().await;
    let req = command(
        "welcome-preview",
        json!({ "community_id": GUILD.to_string(), "actor_id": "7" }),
    );
    let body = json_body(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(body["ephemeral"], true);
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("Welcome, <@7>!"));
    assert!(content.contains("nelly"));
    assert!(content.contains("member #250"));
}

fn recent(hours: i64) -> MessageId {
    MessageId::minted_at(OffsetDateTime::now_utc() - time::Duration::hours(hours))
}

fn clear_request(admin: bool, amount: Value) -> Request {
    command(
        "clear",
        json!({
            "community_id": GUILD.to_string(),
            "channel_id": TABLE_CHANNEL.to_string(),
            "actor_id": ADMIN.to_string(),
            "actor_is_admin": admin,
            "amount": amount,
        }),
    )
}

fn press(actor: u64, token: &str) -> Request {
    test::TestRequest::post()
        .uri("/api/interactions/button")
        .set_json(json!({ "actor_id": actor.to_string(), "custom_id": token }))
        .to_request()
}

#[actix_web::test]
async fn clear_asks_then_deletes_on_confirm() {
    let history = [recent(3), recent(2), recent(1)];
    let (app, state, gateway) = TestAppBuilder::new()
        .with_gateway(gateway().with_history(TABLE_CHANNEL, &history))
        .build()
        .await;

    let asked = json_body(
        test::call_service(&app, clear_request(true, json!(2))).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(asked["ephemeral"], true);
    let confirm = asked["buttons"][0]["custom_id"].as_str().unwrap().to_string();
    assert!(confirm.ends_with(":confirm"));
    assert_eq!(state.purge.pending_count(), 1);

    let stranger = test::call_service(&app, press(ADMIN + 1, &confirm)).await;
    assert_problem(stranger, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let done = json_body(test::call_service(&app, press(ADMIN, &confirm)).await, StatusCode::OK).await;
    assert!(done["content"].as_str().unwrap().contains("Deleted 2 messages"));
    let mut deleted = gateway.deleted_messages();
    deleted.sort();
    assert_eq!(deleted, vec![history[1], history[2]]);
    assert!(gateway
        .messages_to(LOG_CHANNEL)
        .iter()
        .any(|m| m.contains(&format!("<@{ADMIN}> ran `clear 2 messages"))));

    let replay = test::call_service(&app, press(ADMIN, &confirm)).await;
    assert_problem(replay, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[actix_web::test]
async fn clear_is_for_admins_with_a_sane_amount() {
    let (app, _, gateway) = TestAppBuilder::new().with_gateway(gateway()).build().await;

    let resp = test::call_service(&app, clear_request(false, json!(5))).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let resp = test::call_service(&app, clear_request(true, json!(0))).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "INVALID_AMOUNT").await;

    let resp = test::call_service(&app, clear_request(true, json!(101))).await;
    assert_problem(resp, StatusCode::UNPROCESSABLE_ENTITY, "INVALID_AMOUNT").await;

    assert!(gateway.deleted_messages().is_empty());
}
