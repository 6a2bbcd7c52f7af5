//! Cancellation wizard HTTP handlers.
//!
//! ```text
//! POST /api/v1/cancel/start
//! POST /api/v1/cancel/assign
//! POST /api/v1/cancel/decide
//! ```
//!
//! The acting user always comes from the session; request bodies only name
//! the subscription. Reason text is validated for length here and sanitised
//! by the domain, and it never appears in a response.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{
    AssignVariantResponse, DecideRequest, DecideResponse, StartCancellationResponse,
};
use crate::domain::{Error, MAX_REASON_CHARS};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_subscription_id, require};

const SUBSCRIPTION_ID: FieldName = FieldName::new("subscriptionId");
const ACCEPTED: FieldName = FieldName::new("accepted");

/// Request payload naming the subscription to assign a variant for.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignVariantRequestBody {
    #[schema(format = "uuid")]
    pub subscription_id: Option<String>,
}

/// Request payload carrying the user's final choice.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequestBody {
    #[schema(format = "uuid")]
    pub subscription_id: Option<String>,
    /// `true` keeps the subscription at the offered price.
    pub accepted: Option<bool>,
    /// Optional free-text reason, at most 500 characters.
    pub reason: Option<String>,
}

/// Response payload for opening the flow.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartCancellationResponseBody {
    #[schema(format = "uuid")]
    pub subscription_id: String,
    pub price_cents: u32,
    /// Previously assigned variant, `null` until assignment.
    #[schema(example = "B")]
    pub variant: Option<String>,
}

/// Response payload for a variant assignment.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignVariantResponseBody {
    #[schema(example = "B")]
    pub variant: String,
    pub price_cents: u32,
    pub offer_cents: u32,
}

/// Response payload for a decision.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponseBody {
    #[schema(example = "cancelled")]
    pub status: String,
}

impl From<StartCancellationResponse> for StartCancellationResponseBody {
    fn from(value: StartCancellationResponse) -> Self {
        Self {
            subscription_id: value.subscription_id.to_string(),
            price_cents: value.price.get(),
            variant: value.variant.map(|variant| variant.as_str().to_owned()),
        }
    }
}

impl From<AssignVariantResponse> for AssignVariantResponseBody {
    fn from(value: AssignVariantResponse) -> Self {
        Self {
            variant: value.variant.as_str().to_owned(),
            price_cents: value.price.get(),
            offer_cents: value.offer.get(),
        }
    }
}

impl From<DecideResponse> for DecideResponseBody {
    fn from(value: DecideResponse) -> Self {
        Self {
            status: value.status.as_str().to_owned(),
        }
    }
}

fn validate_reason(reason: Option<String>) -> Result<Option<String>, Error> {
    match reason {
        Some(text) if text.chars().count() > MAX_REASON_CHARS => {
            Err(Error::invalid_request(format!(
                "reason must be at most {MAX_REASON_CHARS} characters"
            ))
            .with_details(json!({
                "field": "reason",
                "code": "reason_too_long",
            })))
        }
        other => Ok(other),
    }
}

/// Open the cancellation flow on the caller's newest open subscription.
#[utoipa::path(
    post,
    path = "/api/v1/cancel/start",
    responses(
        (status = 200, description = "Flow opened", body = StartCancellationResponseBody),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Anti-forgery check failed", body = ErrorSchema),
        (status = 404, description = "No active subscription", body = ErrorSchema),
        (status = 409, description = "Concurrent update", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["cancel"],
    operation_id = "startCancellation",
    security(("SessionCookie" = []))
)]
#[post("/start")]
pub async fn start_cancellation(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StartCancellationResponseBody>> {
    let user_id = session.require_user_id()?;
    let response = state.cancel_flow.start(&user_id).await?;
    Ok(web::Json(response.into()))
}

/// Assign, or return the already assigned, pricing variant.
#[utoipa::path(
    post,
    path = "/api/v1/cancel/assign",
    request_body = AssignVariantRequestBody,
    responses(
        (status = 200, description = "Variant assigned", body = AssignVariantResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Anti-forgery check failed", body = ErrorSchema),
        (status = 404, description = "Subscription not found", body = ErrorSchema),
        (status = 409, description = "Subscription already cancelled", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["cancel"],
    operation_id = "assignVariant",
    security(("SessionCookie" = []))
)]
#[post("/assign")]
pub async fn assign_variant(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AssignVariantRequestBody>,
) -> ApiResult<web::Json<AssignVariantResponseBody>> {
    let user_id = session.require_user_id()?;
    let subscription_id =
        parse_subscription_id(payload.subscription_id.as_deref(), SUBSCRIPTION_ID)?;
    let response = state.cancel_flow.assign(&user_id, &subscription_id).await?;
    Ok(web::Json(response.into()))
}

/// Record the caller's decision and settle the subscription.
#[utoipa::path(
    post,
    path = "/api/v1/cancel/decide",
    request_body = DecideRequestBody,
    responses(
        (status = 200, description = "Decision recorded", body = DecideResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Anti-forgery check failed", body = ErrorSchema),
        (status = 404, description = "Subscription not found", body = ErrorSchema),
        (status = 409, description = "Subscription already cancelled", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["cancel"],
    operation_id = "decideCancellation",
    security(("SessionCookie" = []))
)]
#[post("/decide")]
pub async fn decide_cancellation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DecideRequestBody>,
) -> ApiResult<web::Json<DecideResponseBody>> {
    let user_id = session.require_user_id()?;
    let DecideRequestBody {
        subscription_id,
        accepted,
        reason,
    } = payload.into_inner();

    let request = DecideRequest {
        owner: user_id,
        subscription_id: parse_subscription_id(subscription_id.as_deref(), SUBSCRIPTION_ID)?,
        accepted: require(accepted, ACCEPTED)?,
        reason: validate_reason(reason)?,
    };
    let response = state.cancel_flow.decide(request).await?;
    Ok(web::Json(response.into()))
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
