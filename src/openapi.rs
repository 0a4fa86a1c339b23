use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const HELLO_TAG: &str = "Hello API";
pub(crate) const REPORTS_TAG: &str = "Reports API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = HELLO_TAG, description = "Greeting endpoints demonstrating the On-Behalf-Of exchange and group authorization"),
        (name = REPORTS_TAG, description = "Power BI report listing through the On-Behalf-Of exchange"),
    ),
    info(
        title = "OBO Gateway API",
        description = "Bearer-token gateway performing OAuth2 On-Behalf-Of exchanges and group-based authorization",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
