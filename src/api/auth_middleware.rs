use crate::claims::InboundClaims;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::warn;

/// Validates the bearer token on every protected route and stores the
/// extracted [`InboundClaims`] in the request extensions. Handlers behind
/// this layer can rely on the claims being present and verified.
pub(super) async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let claim_map = match state.verifier.verify(&token).await {
        Ok(claims) => claims,
        Err(e) => {
            warn!("bearer token rejected: {e}");
            return ApiError::unauthorized("invalid bearer token").into_response();
        }
    };

    let claims = match InboundClaims::extract(&claim_map, &token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("token claims malformed: {e}");
            return ApiError::unauthorized("token is missing required claims").into_response();
        }
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}

fn bearer_token(request: &Request<Body>) -> Result<String, Response> {
    let header = match request.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header,
        None => {
            warn!("missing Authorization header");
            return Err(ApiError::unauthorized("missing Authorization header").into_response());
        }
    };

    match header.to_str() {
        Ok(value) if value.len() > 7 && value[..7].eq_ignore_ascii_case("bearer ") => {
            Ok(value[7..].to_string())
        }
        _ => {
            warn!("Authorization header is not a bearer token");
            Err(
                ApiError::unauthorized("Authorization header must use the Bearer scheme")
                    .into_response(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestFixture;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let fixture = TestFixture::new().await;
        let token = fixture.user_token("alice", &["g1"]);

        let response = fixture.get_with_token("/api/hello/local", &token).await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let fixture = TestFixture::new().await;

        let response = fixture.get_without_token("/api/hello/local").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.detail().contains("missing Authorization header"));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthorized() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .get_with_raw_authorization("/api/hello/local", "Basic dXNlcjpwYXNz")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.detail().contains("Bearer scheme"));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .get_with_token("/api/hello/local", "not-a-jwt")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.detail().contains("invalid bearer token"));
    }

    #[tokio::test]
    async fn test_token_without_subject_is_unauthorized() {
        let fixture = TestFixture::new().await;
        let token = fixture.mint_token(json!({ "groups": ["g1"] }));

        let response = fixture.get_with_token("/api/hello/local", &token).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.detail().contains("required claims"));
    }

    #[tokio::test]
    async fn test_health_route_needs_no_token() {
        let fixture = TestFixture::new().await;

        let response = fixture.get_without_token("/health").await;
        response.assert_status(StatusCode::OK);
    }
}
