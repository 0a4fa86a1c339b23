//! Test fixture wiring the full router against mocked external services.
//!
//! The authority mock stands in for the tenant's token endpoint, the
//! downstream mock for the resource APIs the gateway relays to. Inbound
//! tokens are minted with the HS256 verifier secret, so requests travel the
//! same verification path as production traffic.

use crate::config::GatewayConfig;
use crate::create_app;
use crate::state::AppState;
use axum::body::{Body, Bytes};
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::MockServer;

pub const TEST_HMAC_SECRET: &str = "fixture-hmac-secret";
pub const TEST_ISSUER: &str = "https://tests.example/issuer";
pub const TEST_AUDIENCE: &str = "api://obo-gateway-tests";

/// Complete test environment: the real router, a mock authority, and a mock
/// downstream API.
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration used to build the router
    pub config: GatewayConfig,
    /// Mock server standing in for the authority's token endpoint
    pub authority_mock: MockServer,
    /// Mock server standing in for downstream resource APIs
    pub downstream_mock: MockServer,
}

impl TestFixture {
    pub async fn new() -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let authority_mock = MockServer::start().await;
        let downstream_mock = MockServer::start().await;

        let config = GatewayConfig::for_test_with_mocks(&authority_mock, &downstream_mock);
        let state = AppState::for_testing(&config);
        let app = create_app(state).await;

        Self {
            app,
            config,
            authority_mock,
            downstream_mock,
        }
    }

    /// Mint a token signed with the fixture's verifier secret. Standard
    /// claims (`iss`, `aud`, `exp`) are filled in unless the caller set them
    /// explicitly, so expiry and issuer failures stay testable.
    pub fn mint_token(&self, claims: Value) -> String {
        let mut claims = match claims {
            Value::Object(map) => map,
            other => panic!("token claims must be a JSON object, got {other}"),
        };
        claims
            .entry("iss")
            .or_insert_with(|| json!(TEST_ISSUER));
        claims
            .entry("aud")
            .or_insert_with(|| json!(TEST_AUDIENCE));
        claims
            .entry("exp")
            .or_insert_with(|| json!(chrono::Utc::now().timestamp() + 600));

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_HMAC_SECRET.as_bytes()),
        )
        .expect("Failed to mint test token")
    }

    /// A delegated user token carrying the given group memberships
    pub fn user_token(&self, subject: &str, groups: &[&str]) -> String {
        self.mint_token(json!({
            "sub": subject,
            "groups": groups,
            "scp": "Gateway.Access",
        }))
    }

    /// An app-only token (client-credentials issuance, `appidacr == "1"`)
    pub fn app_token(&self, subject: &str) -> String {
        self.mint_token(json!({
            "sub": subject,
            "appidacr": "1",
            "roles": ["Gateway.Access.All"],
        }))
    }

    /// Send a GET request carrying the given bearer token
    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        self.get_with_raw_authorization(uri, &format!("Bearer {token}"))
            .await
    }

    /// Send a GET request with a raw Authorization header value
    pub async fn get_with_raw_authorization(
        &self,
        uri: impl AsRef<str>,
        authorization: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .header("Authorization", authorization)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Send a GET request without any Authorization header
    pub async fn get_without_token(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse { status, body }
    }
}

/// Captured response with assertion helpers
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            self.text()
        );
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `detail` field of an error body
    pub fn detail(&self) -> String {
        self.json_as::<Value>()
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response body as JSON")
    }
}
