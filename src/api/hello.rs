use crate::authz;
use crate::claims::InboundClaims;
use crate::errors::ApiError;
use crate::exchange::cached::acquire_on_behalf_of_cached;
use crate::openapi::HELLO_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use log::debug;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HelloParams {
    #[serde(default = "default_name")]
    name: String,
}

fn default_name() -> String {
    "world".to_string()
}

/// Greeting served locally, no token exchange involved
#[utoipa::path(
    get,
    path = "/api/hello/local",
    tag = HELLO_TAG,
    params(
        ("name" = Option<String>, Query, description = "Name to greet (default: world)")
    ),
    responses(
        (status = 200, description = "Greeting with the authenticated subject", body = String),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
async fn hello_local(
    Query(params): Query<HelloParams>,
    Extension(claims): Extension<InboundClaims>,
) -> String {
    format!("Hello {} (requested for {})", params.name, claims.subject)
}

/// Greeting relayed from the external hello API. The inbound token is
/// exchanged (OBO) for one scoped to the external API, which then receives
/// a bearer-authenticated GET.
#[utoipa::path(
    get,
    path = "/api/hello/external",
    tag = HELLO_TAG,
    params(
        ("name" = Option<String>, Query, description = "Name to greet (default: world)")
    ),
    responses(
        (status = 200, description = "Response body relayed from the external API", body = String),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 502, description = "Exchange or downstream call failed"),
        (status = 504, description = "Authority or downstream API timed out")
    )
)]
async fn hello_external(
    State(state): State<AppState>,
    Query(params): Query<HelloParams>,
    Extension(claims): Extension<InboundClaims>,
) -> Result<Response, ApiError> {
    let scope = &state.config.exchange.external_hello_scope;
    let result = acquire_on_behalf_of_cached(&state, &claims.raw_token, scope).await?;

    let url = format!(
        "{}?name={}",
        state.config.exchange.external_hello_url, params.name
    );
    super::relay_get(&state, &url, &result.access_token).await
}

/// Surface the group-membership policy decision directly
#[utoipa::path(
    get,
    path = "/api/hello/check-group",
    tag = HELLO_TAG,
    responses(
        (status = 200, description = "Caller is authorized", body = String),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not a member of the required group")
    )
)]
async fn hello_check_group(
    State(state): State<AppState>,
    Extension(claims): Extension<InboundClaims>,
) -> Result<Response, ApiError> {
    let decision = authz::authorize(&claims, &state.config.azure.required_group_id);
    debug!(
        "authorization decision for {}: allowed={} ({})",
        claims.subject, decision.allowed, decision.reason
    );

    if decision.allowed {
        Ok(format!("{}. Hello {}", decision.reason, claims.subject).into_response())
    } else {
        Err(ApiError::forbidden(decision.reason))
    }
}

/// Creates the hello API routes
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/hello/local", get(hello_local))
        .route("/api/hello/external", get(hello_external))
        .route("/api/hello/check-group", get(hello_check_group))
}
