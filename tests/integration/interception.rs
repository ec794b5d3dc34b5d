//! Integration tests for the authorization interceptor

use super::*;
use oauth2_token_client::{
    register, AuthorizationFailure, HttpMethod, HttpRequest, HttpTransport, OAuth2Error,
    OAuthEvent, Token, TOKEN_KEY,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::Mock;

async fn authenticated(server: &MockServer) -> Harness {
    let h = harness(server).await;
    h.service
        .vault()
        .set_token(Token::new("A", Some("R".to_string()), "bearer", None))
        .await
        .unwrap();
    h.service.intercept(&h.chain);
    h
}

fn get(server: &MockServer, resource: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, format!("{}{}", server.uri(), resource))
}

#[tokio::test]
async fn test_bearer_header_injected() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let response = h.transport.send(get(&server, "/users/me")).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_existing_authorization_header_wins() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Basic xyz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = get(&server, "/users/me").with_header("Authorization", "Basic xyz");
    let response = h.transport.send(request).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_invalid_grant_clears_token_and_emits() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;
    let mut events = h.service.subscribe();

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(error_response(
            400,
            json!({"error": {"message": "invalid_grant"}}),
        ))
        .mount(&server)
        .await;

    let error = h
        .transport
        .send(get(&server, "/users/me"))
        .await
        .unwrap_err();

    assert!(error.needs_reauth());
    assert_eq!(error.response().map(|r| r.status), Some(400));
    assert!(h.store.raw(TOKEN_KEY).is_none());
    assert_eq!(
        events.recv().await.unwrap(),
        OAuthEvent::Error(json!({"error": {"message": "invalid_grant"}}))
    );
}

#[tokio::test]
async fn test_invalid_token_keeps_token() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(error_response(401, json!({"error": "invalid_token"})))
        .mount(&server)
        .await;

    let result = h.transport.send(get(&server, "/users/me")).await;

    assert!(matches!(
        result,
        Err(OAuth2Error::Authorization(AuthorizationFailure::TokenRejected { .. }))
    ));
    assert!(h.service.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_bearer_challenge_rejects() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("WWW-Authenticate", r#"Bearer realm="example""#),
        )
        .mount(&server)
        .await;

    let error = h
        .transport
        .send(get(&server, "/users/me"))
        .await
        .unwrap_err();

    assert!(error.is_refreshable());
    assert!(h.store.raw(TOKEN_KEY).is_some());
}

#[tokio::test]
async fn test_unrelated_errors_pass_through() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;
    let errors = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = errors.clone();
    h.service.on_error(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(error_response(404, json!({"error": "not_found"})))
        .mount(&server)
        .await;

    let response = h.transport.send(get(&server, "/missing")).await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(errors.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(h.store.raw(TOKEN_KEY).is_some());
}

#[tokio::test]
async fn test_stop_intercepting_detaches_interceptor() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(h.service.stop_intercepting());
    assert!(h.chain.is_empty());
    h.transport.send(get(&server, "/users/me")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_register_handle_lifecycle() {
    let server = MockServer::start().await;
    let h = harness(&server).await;

    let handle = register(&h.chain, &h.service);
    assert!(handle.is_active());
    assert_eq!(h.chain.len(), 1);

    assert!(handle.unregister());
    assert!(h.chain.is_empty());
}

#[tokio::test]
async fn test_not_modified_passes_through() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(304).insert_header("etag", "\"v1\""))
        .expect(1)
        .mount(&server)
        .await;

    let response = h.transport.send(get(&server, "/users/me")).await.unwrap();
    assert_eq!(response.status, 304);
    assert_eq!(response.header("etag"), Some("\"v1\""));
}

#[tokio::test]
async fn test_bearer_challenge_among_several() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(
            ResponseTemplate::new(401)
                .append_header("WWW-Authenticate", r#"Basic realm="legacy""#)
                .append_header("WWW-Authenticate", r#"Bearer realm="example""#),
        )
        .mount(&server)
        .await;

    let error = h
        .transport
        .send(get(&server, "/users/me"))
        .await
        .unwrap_err();

    assert!(error.is_refreshable());
    assert!(h.store.raw(TOKEN_KEY).is_some());
}

#[tokio::test]
async fn test_lookalike_host_gets_no_token() {
    let server = MockServer::start().await;
    let h = authenticated(&server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // Same server, reached under a path that only shares a string prefix
    // with a base URL one segment deeper.
    let config = service_config()
        .base_url(format!("{}/v1", server.uri()))
        .client_id("test-client")
        .build()
        .unwrap();
    let scoped = TokenService::new(config, h.store.clone(), h.transport.clone());
    h.service.stop_intercepting();
    scoped.intercept(&h.chain);

    h.transport.send(get(&server, "/v1beta/users")).await.unwrap();
    h.transport.send(get(&server, "/v1/users")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[1]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer A")
    );
}
