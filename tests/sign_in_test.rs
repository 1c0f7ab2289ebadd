// Integration tests for the code exchange and health routes
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use siwa_relay::issuance::SessionIssuer;
use siwa_relay::testing::mock::{ExchangeOutcome, MockCodeExchanger};
use siwa_relay::testing::{relay_app, TestFixtures};
use siwa_relay::settings::RelaySettings;
use std::sync::Arc;

async fn post_sign_in(
    settings: RelaySettings,
    exchanger: Arc<MockCodeExchanger>,
    query: &str,
) -> (StatusCode, Value) {
    let app = test::init_service(relay_app(settings, exchanger, Arc::new(SessionIssuer))).await;

    let req = test::TestRequest::post()
        .uri(&format!("/sign_in_with_apple{query}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn test_missing_code_is_rejected_without_calling_apple() {
    for query in ["", "?code=", "?useBundleId=true"] {
        let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
        let (status, body) =
            post_sign_in(TestFixtures::relay_settings(), exchanger.clone(), query).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query:?}");
        assert_eq!(body, json!({"error": "Authorization code required"}));
        assert_eq!(exchanger.call_count(), 0);
    }
}

#[actix_web::test]
async fn test_end_to_end_session_response() {
    let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", Some("a@b.com")));

    let before = Utc::now().timestamp_millis();
    let (status, body) =
        post_sign_in(TestFixtures::relay_settings(), exchanger.clone(), "?code=abc123").await;
    let after = Utc::now().timestamp_millis();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"], json!({"id": "u1", "email": "a@b.com", "name": null}));

    let session_id = body["sessionId"].as_str().unwrap();
    let ts: i64 = session_id
        .strip_prefix("session_")
        .and_then(|rest| rest.strip_suffix("_u1"))
        .and_then(|ts| ts.parse().ok())
        .expect("session_<millis>_u1");
    assert!(ts >= before && ts <= after);

    let calls = exchanger.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].code, "abc123");
}

#[actix_web::test]
async fn test_name_synthesized_from_query() {
    let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
    let (status, body) = post_sign_in(
        TestFixtures::relay_settings(),
        exchanger,
        "?code=abc123&firstName=Jane&lastName=Appleseed",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], json!({"id": "u1", "name": "Jane Appleseed"}));
}

#[actix_web::test]
async fn test_partial_name_is_null() {
    let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
    let (_, body) = post_sign_in(
        TestFixtures::relay_settings(),
        exchanger,
        "?code=abc123&firstName=Jane",
    )
    .await;

    assert_eq!(body["user"]["name"], Value::Null);
}

#[actix_web::test]
async fn test_client_identifier_selection() {
    let cases = [
        ("?code=c&useBundleId=true", "com.example.app"),
        ("?code=c", "com.example.service"),
        ("?code=c&useBundleId=false", "com.example.service"),
        ("?code=c&useBundleId=TRUE", "com.example.service"),
        ("?code=c&useBundleId=1", "com.example.service"),
    ];

    for (query, expected_client_id) in cases {
        let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
        let (status, _) =
            post_sign_in(TestFixtures::relay_settings(), exchanger.clone(), query).await;

        assert_eq!(status, StatusCode::OK, "query {query}");
        assert_eq!(exchanger.calls()[0].client_id, expected_client_id, "query {query}");
    }
}

#[actix_web::test]
async fn test_repeated_query_keys_use_first_value() {
    let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
    let (status, body) = post_sign_in(
        TestFixtures::relay_settings(),
        exchanger.clone(),
        "?code=abc&useBundleId=false&useBundleId=true&code=other",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let calls = exchanger.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].code, "abc");
    assert_eq!(calls[0].client_id, "com.example.service");
}

#[actix_web::test]
async fn test_repeated_empty_code_is_still_missing() {
    let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
    let (status, body) = post_sign_in(
        TestFixtures::relay_settings(),
        exchanger.clone(),
        "?code=&code=abc",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Authorization code required"}));
    assert_eq!(exchanger.call_count(), 0);
}

#[actix_web::test]
async fn test_missing_selected_identifier_fails_before_exchange() {
    let mut settings = TestFixtures::relay_settings();
    settings.apple.bundle_id = None;

    let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", None));
    let (status, body) =
        post_sign_in(settings, exchanger.clone(), "?code=abc123&useBundleId=true").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Authentication failed"}));
    assert_eq!(exchanger.call_count(), 0);
}

#[actix_web::test]
async fn test_invalid_grant_maps_to_expired() {
    let exchanger = Arc::new(MockCodeExchanger::invalid_grant());
    let (status, body) =
        post_sign_in(TestFixtures::relay_settings(), exchanger, "?code=stale").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Authorization code expired"}));
}

#[actix_web::test]
async fn test_other_failures_are_generic() {
    let outcomes = [
        ExchangeOutcome::Rejected {
            status: 400,
            body: r#"{"error":"invalid_client"}"#.to_string(),
        },
        ExchangeOutcome::Transport("connection reset".to_string()),
        ExchangeOutcome::NoIdToken,
        ExchangeOutcome::IdToken("not-a-jwt".to_string()),
    ];

    for outcome in outcomes {
        let exchanger = Arc::new(MockCodeExchanger::new(outcome.clone()));
        let (status, body) =
            post_sign_in(TestFixtures::relay_settings(), exchanger, "?code=abc123").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{outcome:?}");
        assert_eq!(body, json!({"error": "Authentication failed"}));
    }
}

#[actix_web::test]
async fn test_health_reports_current_time() {
    let app = test::init_service(relay_app(
        TestFixtures::relay_settings(),
        Arc::new(MockCodeExchanger::returning_identity("u1", None)),
        Arc::new(SessionIssuer),
    ))
    .await;

    let before = Utc::now().timestamp_millis();
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    let after = Utc::now().timestamp_millis();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "OK");

    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(timestamp.ends_with('Z'));
    assert_eq!(timestamp.len(), "2026-10-18T12:00:00.000Z".len());

    let parsed = DateTime::parse_from_rfc3339(timestamp).unwrap();
    assert!(parsed.timestamp_millis() >= before && parsed.timestamp_millis() <= after);
}
