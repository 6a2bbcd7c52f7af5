//! Tests for cancellation wizard HTTP handlers.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, test as actix_test, web};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{CancelFlowCommand, FixtureCancelFlowCommand, MockCancelFlowCommand};
use crate::domain::{Cents, DownsellVariant, SubscriptionId, SubscriptionStatus, UserId};
use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const SUBSCRIPTION: &str = "11111111-2222-4333-8444-555555555555";

#[fixture]
fn user() -> UserId {
    UserId::new(USER).expect("fixture user id")
}

async fn sign_in(session: SessionContext) -> ApiResult<HttpResponse> {
    let id = UserId::new(USER).expect("fixture user id");
    session.persist_user(&id)?;
    Ok(HttpResponse::Ok().finish())
}

fn test_app(
    command: Arc<dyn CancelFlowCommand>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(HttpState::new(command)))
        .wrap(test_session_middleware())
        .route("/sign-in", web::get().to(sign_in))
        .service(
            web::scope("/api/v1/cancel")
                .service(start_cancellation)
                .service(assign_variant)
                .service(decide_cancellation),
        )
}

async fn sign_in_cookie(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) -> Cookie<'static> {
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::get().uri("/sign-in").to_request(),
    )
    .await;
    session_cookie(&res)
}

async fn post_json(
    command: Arc<dyn CancelFlowCommand>,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(command)).await;
    let cookie = sign_in_cookie(&app).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(uri)
            .cookie(cookie)
            .set_json(body)
            .to_request(),
    )
    .await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

fn untouched() -> MockCancelFlowCommand {
    let mut mock = MockCancelFlowCommand::new();
    mock.expect_start().never();
    mock.expect_assign().never();
    mock.expect_decide().never();
    mock
}

#[actix_web::test]
async fn start_returns_camel_case_payload() {
    let app = actix_test::init_service(test_app(Arc::new(FixtureCancelFlowCommand))).await;
    let cookie = sign_in_cookie(&app).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/cancel/start")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["priceCents"], 2_500);
    assert!(body["variant"].is_null());
    assert!(body.get("subscriptionId").and_then(Value::as_str).is_some());
}

#[actix_web::test]
async fn start_requires_a_session() {
    let app = actix_test::init_service(test_app(Arc::new(untouched()))).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/cancel/start")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "unauthorized");
}

#[rstest]
#[actix_web::test]
async fn assign_forwards_session_user_and_subscription(user: UserId) {
    let mut mock = MockCancelFlowCommand::new();
    mock.expect_assign()
        .withf(move |owner, subscription| {
            *owner == user && subscription.to_string() == SUBSCRIPTION
        })
        .times(1)
        .returning(|_, _| {
            Ok(AssignVariantResponse {
                variant: DownsellVariant::B,
                price: Cents::new(2_500),
                offer: Cents::new(1_500),
            })
        });

    let (status, body) = post_json(
        Arc::new(mock),
        "/api/v1/cancel/assign",
        json!({ "subscriptionId": SUBSCRIPTION }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "variant": "B", "priceCents": 2_500, "offerCents": 1_500 })
    );
}

#[rstest]
#[case::missing(json!({}), "missing_field")]
#[case::malformed(json!({ "subscriptionId": "sub-123" }), "invalid_uuid")]
#[actix_web::test]
async fn assign_rejects_bad_subscription_ids(#[case] payload: Value, #[case] code: &str) {
    let (status, body) =
        post_json(Arc::new(untouched()), "/api/v1/cancel/assign", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "subscriptionId");
    assert_eq!(body["details"]["code"], code);
    assert!(!body.to_string().contains("sub-123"));
}

#[rstest]
#[case(Error::not_found("subscription not found"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("subscription is cancelled"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("store unavailable"), StatusCode::SERVICE_UNAVAILABLE)]
#[actix_web::test]
async fn assign_maps_domain_errors(#[case] error: Error, #[case] expected: StatusCode) {
    let mut mock = MockCancelFlowCommand::new();
    mock.expect_assign()
        .times(1)
        .returning(move |_, _| Err(error.clone()));

    let (status, _) = post_json(
        Arc::new(mock),
        "/api/v1/cancel/assign",
        json!({ "subscriptionId": SUBSCRIPTION }),
    )
    .await;

    assert_eq!(status, expected);
}

#[rstest]
#[actix_web::test]
async fn decide_forwards_reason_but_only_returns_status(user: UserId) {
    let mut mock = MockCancelFlowCommand::new();
    mock.expect_decide()
        .withf(move |request| {
            request.owner == user
                && !request.accepted
                && request.reason.as_deref() == Some("too expensive")
        })
        .times(1)
        .returning(|_| {
            Ok(DecideResponse {
                status: SubscriptionStatus::Cancelled,
            })
        });

    let (status, body) = post_json(
        Arc::new(mock),
        "/api/v1/cancel/decide",
        json!({
            "subscriptionId": SUBSCRIPTION,
            "accepted": false,
            "reason": "too expensive",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "cancelled" }));
}

#[actix_web::test]
async fn decide_requires_accepted() {
    let (status, body) = post_json(
        Arc::new(untouched()),
        "/api/v1/cancel/decide",
        json!({ "subscriptionId": SUBSCRIPTION }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "accepted");
    assert_eq!(body["details"]["code"], "missing_field");
}

#[actix_web::test]
async fn overlong_reason_is_rejected_without_echo() {
    let reason = "x".repeat(MAX_REASON_CHARS + 1);
    let (status, body) = post_json(
        Arc::new(untouched()),
        "/api/v1/cancel/decide",
        json!({
            "subscriptionId": SUBSCRIPTION,
            "accepted": false,
            "reason": reason,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "reason_too_long");
    assert!(!body.to_string().contains(&reason));
}

#[rstest]
#[case("x".repeat(MAX_REASON_CHARS))]
#[case("é".repeat(MAX_REASON_CHARS))]
fn reasons_at_the_limit_are_accepted(#[case] reason: String) {
    let validated = validate_reason(Some(reason.clone())).expect("within limit");
    assert_eq!(validated, Some(reason));
}

#[rstest]
fn response_bodies_use_wire_names() {
    let body = StartCancellationResponseBody::from(StartCancellationResponse {
        subscription_id: SubscriptionId::random(),
        price: Cents::new(2_500),
        status: SubscriptionStatus::PendingCancellation,
        variant: Some(DownsellVariant::A),
    });
    assert_eq!(body.variant.as_deref(), Some("A"));
    assert_eq!(body.price_cents, 2_500);
}
