//! Shared harness for end-to-end cancellation flow tests.
//!
//! Builds the production route layout over the in-memory store with a
//! scripted variant coin, and drives it through `actix_web::test`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, test, web};
use chrono::{TimeZone, Utc};
use mockable::DefaultClock;
use serde_json::Value;

use cancel_flow::Trace;
use cancel_flow::domain::ports::{CancelFlowCommand, VariantSource};
use cancel_flow::domain::{
    CancelFlowService, Cents, DownsellVariant, Error, Subscription, SubscriptionId, UserId,
};
use cancel_flow::inbound::http::cancel::{assign_variant, decide_cancellation, start_cancellation};
use cancel_flow::inbound::http::csrf::{CSRF_COOKIE, CSRF_HEADER, CsrfGuard};
use cancel_flow::inbound::http::error::json_error_handler;
use cancel_flow::inbound::http::session::SessionContext;
use cancel_flow::inbound::http::state::HttpState;
use cancel_flow::outbound::memory::MemoryStore;

pub const CSRF_TOKEN: &str = "6b1f0c8e-csrf-token";

/// Variant coin that always lands on the same side and counts its flips.
#[derive(Debug)]
pub struct ScriptedVariantSource {
    side: DownsellVariant,
    flips: AtomicUsize,
}

impl ScriptedVariantSource {
    pub fn new(side: DownsellVariant) -> Self {
        Self {
            side,
            flips: AtomicUsize::new(0),
        }
    }

    pub fn flips(&self) -> usize {
        self.flips.load(Ordering::SeqCst)
    }
}

impl VariantSource for ScriptedVariantSource {
    fn flip(&self) -> DownsellVariant {
        self.flips.fetch_add(1, Ordering::SeqCst);
        self.side
    }
}

/// Coin that alternates sides so a double assignment would be visible.
#[derive(Debug, Default)]
pub struct AlternatingVariantSource {
    flips: AtomicUsize,
}

impl AlternatingVariantSource {
    pub fn flips(&self) -> usize {
        self.flips.load(Ordering::SeqCst)
    }
}

impl VariantSource for AlternatingVariantSource {
    fn flip(&self) -> DownsellVariant {
        if self.flips.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            DownsellVariant::A
        } else {
            DownsellVariant::B
        }
    }
}

/// Store plus service under test.
pub struct Harness<V> {
    pub store: Arc<MemoryStore>,
    pub variants: Arc<V>,
    pub service: Arc<CancelFlowService<MemoryStore, MemoryStore, V>>,
}

impl<V: VariantSource + 'static> Harness<V> {
    pub fn new(variants: V) -> Self {
        let store = Arc::new(MemoryStore::new());
        let variants = Arc::new(variants);
        let service = Arc::new(CancelFlowService::new(
            store.clone(),
            store.clone(),
            variants.clone(),
            Arc::new(DefaultClock),
        ));
        Self {
            store,
            variants,
            service,
        }
    }

    /// Provision an active subscription created at `minute` past the hour.
    pub fn subscribe(&self, owner: &UserId, price: u32, minute: u32) -> SubscriptionId {
        let created = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, minute, 0)
            .single()
            .expect("valid fixture timestamp");
        let subscription = Subscription::new(owner.clone(), Cents::new(price), created);
        let id = subscription.id();
        self.store
            .put_subscription(subscription)
            .expect("memory store accepts subscription");
        id
    }

    pub fn subscription(&self, id: &SubscriptionId) -> Subscription {
        self.store
            .subscription(id)
            .expect("store readable")
            .expect("subscription exists")
    }

    pub fn command(&self) -> Arc<dyn CancelFlowCommand> {
        self.service.clone()
    }
}

async fn sign_in(session: SessionContext, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let user = UserId::new(path.into_inner())
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    session.persist_user(&user)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Application with the production route layout plus a sign-in helper.
pub fn app(
    command: Arc<dyn CancelFlowCommand>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();

    App::new()
        .app_data(web::Data::new(HttpState::new(command)))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(session)
                .route("/test/sign-in/{user}", web::post().to(sign_in))
                .service(
                    web::scope("/cancel")
                        .wrap(CsrfGuard)
                        .service(start_cancellation)
                        .service(assign_variant)
                        .service(decide_cancellation),
                ),
        )
}

/// Sign `user` in and return the session cookie.
pub async fn sign_in_as<S>(app: &S, user: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/test/sign-in/{user}"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT, "sign-in succeeds");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie issued")
        .into_owned()
}

/// POST to a cancellation route with the anti-forgery token attached.
pub async fn post<S>(
    app: &S,
    session: &Cookie<'static>,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = test::TestRequest::post()
        .uri(uri)
        .cookie(session.clone())
        .cookie(Cookie::new(CSRF_COOKIE, CSRF_TOKEN))
        .insert_header((CSRF_HEADER, CSRF_TOKEN));
    if let Some(body) = body {
        request = request.set_json(body);
    }
    let res = test::call_service(app, request.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON response body")
    };
    (status, body)
}
