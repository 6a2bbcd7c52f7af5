//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the cancellation wizard endpoints, the health checks,
//! the error envelope schemas and the session cookie security scheme. Swagger
//! UI serves it in debug builds; `openapi-dump` prints it for tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::cancel::{
    AssignVariantRequestBody, AssignVariantResponseBody, DecideRequestBody, DecideResponseBody,
    StartCancellationResponseBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Signed session cookie carrying the acting user's id.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Cancellation flow API",
        description = "Subscription cancellation wizard with a retention downsell experiment."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::cancel::start_cancellation,
        crate::inbound::http::cancel::assign_variant,
        crate::inbound::http::cancel::decide_cancellation,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        AssignVariantRequestBody,
        AssignVariantResponseBody,
        DecideRequestBody,
        DecideResponseBody,
        StartCancellationResponseBody,
        ErrorSchema,
        ErrorCodeSchema,
    )),
    tags(
        (name = "cancel", description = "Subscription cancellation wizard"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
