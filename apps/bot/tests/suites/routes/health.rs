use actix_web::http::StatusCode;
use actix_web::test;

use crate::common::json_body;
use crate::support::app_builder::TestAppBuilder;

#[actix_web::test]
async fn health_is_ok_and_traced() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let trace = resp
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    assert!(!trace.is_empty());

    let body = test::read_body(resp).await;
    assert_eq!(body, "ok");
}

#[actix_web::test]
async fn forwarded_trace_id_is_echoed() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-trace-id", "relay-abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-trace-id").unwrap(), "relay-abc-123");
}

#[actix_web::test]
async fn unusable_forwarded_trace_id_is_replaced() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-trace-id", "has spaces; and=junk"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let trace = resp.headers().get("x-trace-id").unwrap().to_str().unwrap();
    assert_ne!(trace, "has spaces; and=junk");
    assert_eq!(trace.len(), 36);
}

#[actix_web::test]
async fn status_reports_dry_run_and_sessions() {
    let (app, _, _) = TestAppBuilder::new().build().await;

    let req = test::TestRequest::get().uri("/health/status").to_request();
    let body = json_body(test::call_service(&app, req).await, StatusCode::OK).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["sessions"], 0);
}
