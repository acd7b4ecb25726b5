use crate::helpers::{GENERAL_BOT_KEY, spawn_app, spawn_app_with};
use reqwest::Method;
use serde_json::{Value, json};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{basic_auth, method, path},
};

#[tokio::test]
async fn shield_counts_the_stream_subscribers() {
    // Arrange
    let app = spawn_app().await;
    app.mount_stream_id("general", 7, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/streams/7/members"))
        .and(basic_auth("bot@example.com", GENERAL_BOT_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "msg": "",
            "result": "success",
            "subscribers": [11, 12, 13],
        })))
        .expect(1)
        .mount(&app.zulip_server)
        .await;

    // Act
    let response = app.stream_subscribers_shield("general").await;

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "schemaVersion": 1,
            "label": "chat",
            "message": "3 in stream",
            "color": "g",
            "namedLogo": "zulip",
        })
    );
}

#[tokio::test]
async fn shield_does_not_need_a_github_token() {
    let app = spawn_app().await;
    app.mount_stream_id("empty", 8, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/streams/8/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "subscribers": [] })))
        .expect(1)
        .mount(&app.zulip_server)
        .await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.github_server)
        .await;

    let response = app.stream_subscribers_shield("empty").await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "0 in stream");
}

#[tokio::test]
async fn shield_only_accepts_get() {
    let app = spawn_app().await;
    app.forbid_upstream_calls().await;

    let response = app
        .request(Method::POST, "/stream_subscribers_shield")
        .query(&[("stream", "general")])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), 405);
    assert_eq!(response.text().await.unwrap(), "Must `GET`.");
}

#[tokio::test]
async fn shield_requires_a_stream() {
    let app = spawn_app().await;
    app.forbid_upstream_calls().await;

    let response = app.stream_subscribers_shield("").await;

    assert_eq!(response.status(), 400);
    assert_eq!(
        response.text().await.unwrap(),
        "Query string parameter `stream` missing or empty."
    );
}

#[tokio::test]
async fn shield_stops_when_the_stream_is_unknown() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/get_stream_id"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such stream"))
        .expect(1)
        .mount(&app.zulip_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/streams/7/members"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.zulip_server)
        .await;

    let response = app.stream_subscribers_shield("nope").await;

    assert_eq!(response.status(), 404);
    let body = response.text().await.unwrap();
    assert_eq!(
        body,
        format!(
            "{}/api/v1/get_stream_id?stream=nope\n\nno such stream",
            app.zulip_server.uri()
        )
    );
    assert!(!body.contains(GENERAL_BOT_KEY));
}

#[tokio::test]
async fn shield_passes_member_lookup_failures_through() {
    let app = spawn_app().await;
    app.mount_stream_id("general", 7, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/streams/7/members"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&app.zulip_server)
        .await;

    let response = app.stream_subscribers_shield("general").await;

    assert_eq!(response.status(), 401);
    let body = response.text().await.unwrap();
    assert!(body.ends_with("\n\nunauthorized"));
    assert!(!body.contains(GENERAL_BOT_KEY));
}

#[tokio::test]
async fn shield_needs_the_general_bot_email() {
    let app = spawn_app_with(|settings| settings.zulip.bots.general.email = None).await;
    app.forbid_upstream_calls().await;

    let response = app.stream_subscribers_shield("general").await;

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "`ZULIP_EMAIL` not set.");
}

#[tokio::test]
async fn shield_answers_405_even_when_the_body_is_not_text() {
    let app = spawn_app().await;
    app.forbid_upstream_calls().await;

    let response = app
        .request(Method::POST, "/stream_subscribers_shield")
        .query(&[("stream", "general")])
        .body(vec![0xff, 0xfe])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), 405);
    assert_eq!(response.text().await.unwrap(), "Must `GET`.");
}

#[tokio::test]
async fn shield_ignores_a_body_it_does_not_read() {
    let app = spawn_app().await;
    app.mount_stream_id("general", 7, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/streams/7/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "subscribers": [1] })))
        .expect(1)
        .mount(&app.zulip_server)
        .await;

    let response = app
        .request(Method::GET, "/stream_subscribers_shield")
        .query(&[("stream", "general")])
        .body(vec![0xff, 0xfe])
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "1 in stream");
}
