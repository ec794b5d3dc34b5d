//! Integration tests using WireMock
//!
//! These tests run the token service and the interceptor against a mock
//! authorization server over real HTTP.

mod interception;
mod token_lifecycle;

use std::sync::Arc;

use oauth2_token_client::{
    service_config, InterceptingTransport, InterceptorChain, MockTokenStore, ReqwestHttpTransport,
    TokenService,
};
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

/// Install a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Service wired to `server`, sharing one interceptor chain with its transport.
pub struct Harness {
    pub service: Arc<TokenService>,
    pub store: Arc<MockTokenStore>,
    pub chain: InterceptorChain,
    pub transport: Arc<InterceptingTransport<ReqwestHttpTransport>>,
}

pub async fn harness(server: &MockServer) -> Harness {
    init_tracing();

    let config = service_config()
        .base_url(format!("{}/", server.uri()))
        .client_id("test-client")
        .client_secret("test-secret")
        .build()
        .expect("valid config");

    let chain = InterceptorChain::new();
    let transport = Arc::new(InterceptingTransport::new(
        ReqwestHttpTransport::new().expect("http client"),
        chain.clone(),
    ));
    let store = Arc::new(MockTokenStore::new());
    let service = Arc::new(TokenService::new(config, store.clone(), transport.clone()));

    Harness {
        service,
        store,
        chain,
        transport,
    }
}

/// Helper to create a grant response template
pub fn token_response(access_token: &str, refresh_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "token_type": "bearer",
        "expires_in": 3600
    }))
}

/// Helper to create error response templates
pub fn error_response(status: u16, error_body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_body)
}
