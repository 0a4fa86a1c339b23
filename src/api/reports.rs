use crate::claims::InboundClaims;
use crate::errors::ApiError;
use crate::exchange::cached::acquire_on_behalf_of_cached;
use crate::openapi::REPORTS_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    response::Response,
    routing::get,
    Extension, Router,
};

/// List the caller's Power BI reports. The inbound token is exchanged (OBO)
/// for the Power BI scope, so the listing reflects the delegated user's own
/// workspace, not the gateway's.
#[utoipa::path(
    get,
    path = "/api/powerbi/reports",
    tag = REPORTS_TAG,
    responses(
        (status = 200, description = "Report listing relayed from the Power BI REST API", body = String),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 502, description = "Exchange or Power BI call failed"),
        (status = 504, description = "Authority or Power BI API timed out")
    )
)]
async fn list_reports(
    State(state): State<AppState>,
    Extension(claims): Extension<InboundClaims>,
) -> Result<Response, ApiError> {
    let scope = &state.config.exchange.powerbi_scope;
    let result = acquire_on_behalf_of_cached(&state, &claims.raw_token, scope).await?;

    let url = format!(
        "{}/v1.0/myorg/reports",
        state.config.exchange.powerbi_api_url.trim_end_matches('/')
    );
    super::relay_get(&state, &url, &result.access_token).await
}

/// Creates the Power BI report routes
pub(super) fn router() -> Router<AppState> {
    Router::new().route("/api/powerbi/reports", get(list_reports))
}
