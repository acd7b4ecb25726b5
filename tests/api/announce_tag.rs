use crate::helpers::{GITHUB_TOKEN, TAG_BOT_KEY, spawn_app, spawn_app_with, zulip_success};
use reqwest::Method;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{basic_auth, method, path, query_param},
};

#[tokio::test]
async fn announce_tag_posts_a_release_link_into_the_project_stream() {
    // Arrange
    let app = spawn_app().await;
    app.mount_repository("foo", Some("Does foo things.")).await;
    app.mount_stream_id("project/foo", 42, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/messages"))
        .and(basic_auth("tag-bot@example.com", TAG_BOT_KEY))
        .and(query_param("type", "stream"))
        .and(query_param("to", "[42]"))
        .and(query_param("topic", "tag announcements"))
        .and(query_param(
            "content",
            "Tag pushed: [v1.2.3](https://github.com/Tamschi/foo/releases/tag/v1.2.3)",
        ))
        .respond_with(zulip_success())
        .expect(1)
        .mount(&app.zulip_server)
        .await;

    // Act
    let response = app.announce_tag("foo", "v1.2.3").await;

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Announced tag.");
}

#[tokio::test]
async fn announce_tag_rejects_other_methods_without_calling_upstream() {
    let app = spawn_app().await;
    app.forbid_upstream_calls().await;

    for verb in [Method::GET, Method::PUT, Method::DELETE] {
        let response = app
            .request(verb.clone(), "/announce_tag")
            .header("Authorization", GITHUB_TOKEN)
            .query(&[("project", "foo"), ("tag", "v1.2.3")])
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(response.status(), 405, "{verb} was accepted");
        assert_eq!(response.text().await.unwrap(), "Must `POST`.");
    }
}

#[tokio::test]
async fn announce_tag_returns_400_for_incomplete_requests() {
    let app = spawn_app().await;
    app.forbid_upstream_calls().await;

    let test_cases = [
        (
            None,
            vec![("project", "foo"), ("tag", "v1.2.3")],
            "`Authorization` header missing.",
        ),
        (
            Some(GITHUB_TOKEN),
            vec![("tag", "v1.2.3")],
            "Query string parameter `project` missing or empty.",
        ),
        (
            Some(GITHUB_TOKEN),
            vec![("project", "foo"), ("tag", "")],
            "Query string parameter `tag` missing or empty.",
        ),
    ];

    for (token, query, expected_message) in test_cases {
        let mut request = app
            .request(Method::POST, "/announce_tag")
            .query(&query);
        if let Some(token) = token {
            request = request.header("Authorization", token);
        }
        let response = request.send().await.expect("Failed to execute request.");

        assert_eq!(response.status(), 400);
        assert_eq!(response.text().await.unwrap(), expected_message);
    }
}

#[tokio::test]
async fn announce_tag_passes_github_failures_through() {
    for status in [401u16, 403, 404, 500] {
        // Arrange
        let app = spawn_app().await;
        Mock::given(method("GET"))
            .and(path("/repos/Tamschi/foo"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({ "message": "Nope" })),
            )
            .expect(1)
            .mount(&app.github_server)
            .await;
        Mock::given(wiremock::matchers::any())
            .respond_with(zulip_success())
            .expect(0)
            .mount(&app.zulip_server)
            .await;

        // Act
        let response = app.announce_tag("foo", "v1.2.3").await;

        // Assert
        assert_eq!(response.status(), status);
        assert_eq!(
            response.text().await.unwrap(),
            format!(
                "GET {}/repos/Tamschi/foo: {status} Nope",
                app.github_server.uri()
            )
        );
    }
}

#[tokio::test]
async fn announce_tag_stops_when_the_stream_is_unknown() {
    // Arrange
    let app = spawn_app().await;
    app.mount_repository("foo", None).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/get_stream_id"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"code":"BAD_REQUEST","msg":"Invalid stream name 'project/foo'","result":"error"}"#,
        ))
        .expect(1)
        .mount(&app.zulip_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages"))
        .respond_with(zulip_success())
        .expect(0)
        .mount(&app.zulip_server)
        .await;

    // Act
    let response = app.announce_tag("foo", "v1.2.3").await;

    // Assert
    assert_eq!(response.status(), 400);
    let body = response.text().await.unwrap();
    assert!(body.starts_with(&format!(
        "{}/api/v1/get_stream_id?stream=project%2Ffoo\n\n",
        app.zulip_server.uri()
    )));
    assert!(body.ends_with(r#""result":"error"}"#));
    assert!(!body.contains(TAG_BOT_KEY));
}

#[tokio::test]
async fn announce_tag_needs_its_bot_key() {
    let app = spawn_app_with(|settings| {
        settings.zulip.bots.tag_announcement.api_key = None;
    })
    .await;
    app.forbid_upstream_calls().await;

    let response = app.announce_tag("foo", "v1.2.3").await;

    assert_eq!(response.status(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "`TAG_ANNOUNCEMENT_BOT_ZULIP_API_KEY` not set."
    );
}

#[tokio::test]
async fn announce_tag_rejects_an_unusable_zulip_url_before_calling_github() {
    let app = spawn_app_with(|settings| {
        settings.zulip.api_url = Some("mailto:ops@example.com".to_string());
    })
    .await;
    app.forbid_upstream_calls().await;

    let response = app.announce_tag("foo", "v1").await;

    assert_eq!(response.status(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "`ZULIP_API_URL` must be an http(s) base URL, got mailto:ops@example.com"
    );
}
