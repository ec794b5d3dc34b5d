//! Integration tests for grant, refresh and revocation

use super::*;
use oauth2_token_client::{
    FormParams, MockHttpTransport, OAuth2Error, PasswordCredentials, RequestOptions, Token,
    TOKEN_KEY,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::Mock;

#[tokio::test]
async fn test_password_grant_round_trip() {
    let server = MockServer::start().await;
    let h = harness(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("client_secret=test-secret"))
        .respond_with(token_response("A", "R"))
        .expect(1)
        .mount(&server)
        .await;

    let token = h
        .service
        .get_access_token(
            PasswordCredentials::new("alice", "wonderland"),
            RequestOptions::new(),
        )
        .await
        .expect("grant succeeds");

    assert_eq!(
        token,
        Token::new("A", Some("R".to_string()), "bearer", Some(3600))
    );
    assert_eq!(h.service.vault().get_token().await.unwrap(), Some(token));
    assert!(h.service.is_authenticated().await.unwrap());
    assert_eq!(
        h.service.vault().authorization_header().await.unwrap().as_deref(),
        Some("Bearer A")
    );
}

#[tokio::test]
async fn test_grant_requests_never_carry_bearer_header() {
    let server = MockServer::start().await;
    let h = harness(&server).await;
    h.service.intercept(&h.chain);
    h.service
        .vault()
        .set_token(Token::new("old", Some("R".to_string()), "bearer", None))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response("A", "R2"))
        .expect(2)
        .mount(&server)
        .await;

    h.service
        .get_access_token(PasswordCredentials::new("alice", "pw"), RequestOptions::new())
        .await
        .unwrap();
    h.service
        .get_refresh_token(FormParams::new(), RequestOptions::new())
        .await
        .unwrap();

    for request in server.received_requests().await.unwrap() {
        assert!(request.headers.get("authorization").is_none());
    }
}

#[tokio::test]
async fn test_grant_failure_is_returned_unretried() {
    let server = MockServer::start().await;
    let h = harness(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(error_response(401, json!({"error": "invalid_client"})))
        .expect(1)
        .mount(&server)
        .await;

    let error = h
        .service
        .get_access_token(PasswordCredentials::new("alice", "pw"), RequestOptions::new())
        .await
        .unwrap_err();

    match error {
        OAuth2Error::Http { response } => {
            assert_eq!(response.status, 401);
            assert!(response.body.contains("invalid_client"));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    assert!(!h.service.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_refresh_replaces_stored_token() {
    let server = MockServer::start().await;
    let h = harness(&server).await;
    h.service
        .vault()
        .set_token(Token::new("A", Some("R".to_string()), "bearer", None))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R"))
        .respond_with(token_response("A2", "R2"))
        .expect(1)
        .mount(&server)
        .await;

    h.service
        .get_refresh_token(FormParams::new(), RequestOptions::new())
        .await
        .unwrap();

    let stored = h.service.vault().get_token().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "A2");
    assert_eq!(stored.refresh_token(), Some("R2"));
}

#[tokio::test]
async fn test_concurrent_refreshes_both_reach_server() {
    let server = MockServer::start().await;
    let h = harness(&server).await;
    h.service
        .vault()
        .set_token(Token::new("A", Some("R".to_string()), "bearer", None))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response("A2", "R2"))
        .expect(2)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(
        h.service
            .get_refresh_token(FormParams::new(), RequestOptions::new()),
        h.service
            .get_refresh_token(FormParams::new(), RequestOptions::new()),
    );
    first.unwrap();
    second.unwrap();

    for request in server.received_requests().await.unwrap() {
        let body = String::from_utf8_lossy(&request.body).to_string();
        assert!(body.contains("refresh_token=R&") || body.ends_with("refresh_token=R"));
    }
    assert_eq!(h.store.get_set_history().len(), 3);
}

#[tokio::test]
async fn test_revoke_clears_token_even_when_server_fails() {
    let server = MockServer::start().await;
    let h = harness(&server).await;
    h.service.intercept(&h.chain);
    h.service
        .vault()
        .set_token(Token::new("A", Some("R".to_string()), "bearer", None))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .and(header("authorization", "Bearer A"))
        .and(body_string_contains("token_type_hint=refresh_token"))
        .respond_with(error_response(503, json!({"error": "temporarily_unavailable"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = h
        .service
        .revoke_token(FormParams::new(), RequestOptions::new())
        .await;

    assert!(matches!(result, Err(OAuth2Error::Http { .. })));
    assert!(h.store.raw(TOKEN_KEY).is_none());
    assert!(!h.service.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_revoke_success_clears_token() {
    let server = MockServer::start().await;
    let h = harness(&server).await;
    h.service
        .vault()
        .set_token(Token::new("A", None, "bearer", None))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .and(body_string_contains("token=A"))
        .and(body_string_contains("token_type_hint=access_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    h.service
        .revoke_token(FormParams::new(), RequestOptions::new())
        .await
        .unwrap();

    assert!(h.service.vault().get_token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_scenario_with_trailing_slash_base_url() {
    init_tracing();

    let config = service_config()
        .base_url("http://api.example.com/")
        .client_id("app")
        .build()
        .unwrap();
    assert_eq!(config.base_url(), "http://api.example.com");
    assert_eq!(config.grant_url(), "http://api.example.com/oauth2/token");

    let transport = Arc::new(MockHttpTransport::new());
    transport.queue_json_response(
        200,
        &json!({
            "access_token": "A",
            "refresh_token": "R",
            "token_type": "bearer",
            "expires_in": 3600
        }),
    );
    let service = TokenService::new(config, Arc::new(MockTokenStore::new()), transport.clone());

    service
        .get_access_token(PasswordCredentials::new("user", "pw"), RequestOptions::new())
        .await
        .unwrap();

    assert!(service.is_authenticated().await.unwrap());
    assert_eq!(
        service.vault().authorization_header().await.unwrap().as_deref(),
        Some("Bearer A")
    );

    let request = transport.get_last_request().unwrap();
    assert_eq!(request.url, "http://api.example.com/oauth2/token");
}
