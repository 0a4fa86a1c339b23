mod auth_middleware;
pub(crate) mod health;
pub(crate) mod hello;
pub(crate) mod reports;

use crate::api::auth_middleware::authentication_middleware;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::response::{IntoResponse, Response};
use axum::{middleware, Router};
use http::StatusCode;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(protected_routes(state))
}

/// Creates a router for routes that require a validated bearer token
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(hello::router())
        .merge(reports::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ))
}

/// GET the given downstream URL with the exchanged bearer token and relay
/// the response body with the upstream status code.
pub(crate) async fn relay_get(
    state: &AppState,
    url: &str,
    access_token: &str,
) -> Result<Response, ApiError> {
    let response = state
        .downstream_client
        .get(url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ApiError::gateway_timeout("timed out waiting for the downstream API")
            } else {
                ApiError::bad_gateway("failed to reach the downstream API")
            }
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|_| ApiError::bad_gateway("failed to read the downstream response"))?;

    Ok((
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
        body,
    )
        .into_response())
}
