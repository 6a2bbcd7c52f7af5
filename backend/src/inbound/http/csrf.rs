//! Anti-forgery guard for state-changing cancellation routes.
//!
//! A request passes when the `x-csrf-token` header is non-empty and equal to
//! the `csrf_token` cookie, and, if an `Origin` header is sent, its host
//! matches the `Host` header. Token minting happens elsewhere.

use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HOST, ORIGIN};
use actix_web::Error as ActixError;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::warn;
use url::Url;

use crate::domain::Error;

/// Header carrying the client's copy of the anti-forgery token.
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Cookie carrying the server-issued anti-forgery token.
pub const CSRF_COOKIE: &str = "csrf_token";

/// Reasons a request fails the guard. Logged, never returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingHeader,
    MissingCookie,
    TokenMismatch,
    OriginMismatch,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::MissingCookie => "missing_cookie",
            Self::TokenMismatch => "token_mismatch",
            Self::OriginMismatch => "origin_mismatch",
        }
    }
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Whether `origin` names the same host and port as the `Host` header.
///
/// The `Host` value is read under the origin's scheme so an explicit default
/// port (`:443` for https, `:80` for http) compares equal to an omitted one.
fn origin_matches_host(origin: &str, host: &str) -> bool {
    let Ok(origin) = Url::parse(origin) else {
        return false;
    };
    let Ok(host) = Url::parse(&format!("{}://{host}", origin.scheme())) else {
        return false;
    };
    let bare_authority = host.username().is_empty()
        && host.password().is_none()
        && host.path() == "/"
        && host.query().is_none()
        && host.fragment().is_none();

    bare_authority
        && origin.host_str().is_some()
        && origin.host_str() == host.host_str()
        && origin.port() == host.port()
}

fn check(req: &ServiceRequest) -> Result<(), Rejection> {
    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(Rejection::MissingHeader)?;
    let cookie = req.cookie(CSRF_COOKIE).ok_or(Rejection::MissingCookie)?;
    if !tokens_match(header.as_bytes(), cookie.value().as_bytes()) {
        return Err(Rejection::TokenMismatch);
    }

    if let Some(origin) = req.headers().get(ORIGIN) {
        let origin = origin.to_str().ok();
        let host = req.headers().get(HOST).and_then(|value| value.to_str().ok());
        match (origin, host) {
            (Some(origin), Some(host)) if origin_matches_host(origin, host) => {}
            _ => return Err(Rejection::OriginMismatch),
        }
    }
    Ok(())
}

/// Middleware factory for the anti-forgery guard.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use cancel_flow::inbound::http::csrf::CsrfGuard;
///
/// let app = App::new().service(web::scope("/cancel").wrap(CsrfGuard));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type InitError = ();
    type Transform = CsrfGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfGuardMiddleware { service }))
    }
}

/// Service wrapper produced by [`CsrfGuard`].
pub struct CsrfGuardMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CsrfGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Err(rejection) = check(&req) {
            warn!(reason = rejection.as_str(), path = req.path(), "anti-forgery check failed");
            let response = actix_web::ResponseError::error_response(&Error::forbidden(
                "anti-forgery check failed",
            ));
            let res = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
