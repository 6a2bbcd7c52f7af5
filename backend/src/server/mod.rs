//! Server construction and middleware wiring.

mod config;

pub use config::{AppConfig, BuildMode, ConfigError, SessionSettings, config_from_env};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};

use cancel_flow::Trace;
#[cfg(debug_assertions)]
use cancel_flow::doc::ApiDoc;
use cancel_flow::domain::CancelFlowService;
use cancel_flow::domain::ports::CancelFlowCommand;
use cancel_flow::inbound::http::cancel::{assign_variant, decide_cancellation, start_cancellation};
use cancel_flow::inbound::http::csrf::CsrfGuard;
use cancel_flow::inbound::http::error::json_error_handler;
use cancel_flow::inbound::http::health::{HealthState, live, ready};
use cancel_flow::inbound::http::state::HttpState;
use cancel_flow::outbound::memory::MemoryStore;
use cancel_flow::outbound::persistence::{
    DbPool, DieselCancellationRepository, DieselSubscriptionRepository, PoolConfig,
    run_pending_migrations,
};
use cancel_flow::outbound::variant_source::OsRngVariantSource;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Cap on JSON request bodies; the largest legitimate payload is a decision.
const JSON_LIMIT_BYTES: usize = 16 * 1024;

/// Build the cancellation service over PostgreSQL, applying migrations first.
async fn build_postgres_service(config: PoolConfig) -> std::io::Result<Arc<dyn CancelFlowCommand>> {
    let url = config.database_url().to_owned();
    tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .map_err(std::io::Error::other)?
        .map_err(std::io::Error::other)?;

    let pool = DbPool::new(config)
        .await
        .map_err(|error| std::io::Error::other(error.into_message()))?;
    info!("using PostgreSQL cancellation stores");

    Ok(Arc::new(CancelFlowService::new(
        Arc::new(DieselSubscriptionRepository::new(pool.clone())),
        Arc::new(DieselCancellationRepository::new(pool)),
        Arc::new(OsRngVariantSource),
        Arc::new(DefaultClock),
    )))
}

fn build_memory_service() -> Arc<dyn CancelFlowCommand> {
    warn!("DATABASE_URL not set; using in-memory stores (state is lost on restart)");
    let store = Arc::new(MemoryStore::new());
    Arc::new(CancelFlowService::new(
        store.clone(),
        store,
        Arc::new(OsRngVariantSource),
        Arc::new(DefaultClock),
    ))
}

/// Select the persistence backend named by the configuration.
///
/// # Errors
/// Fails when migrations cannot be applied or the pool cannot be built.
pub async fn build_cancel_flow(
    database: Option<PoolConfig>,
) -> std::io::Result<Arc<dyn CancelFlowCommand>> {
    match database {
        Some(config) => build_postgres_service(config).await,
        None => Ok(build_memory_service()),
    }
}

pub(crate) fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), session.key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(session.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(session.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let cancel = web::scope("/cancel")
        .wrap(CsrfGuard)
        .service(start_cancellation)
        .service(assign_variant)
        .service(decide_cancellation);

    let api = web::scope("/api/v1").wrap(session).service(cancel);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(
            web::JsonConfig::default()
                .limit(JSON_LIMIT_BYTES)
                .error_handler(json_error_handler),
        )
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    cancel_flow: Arc<dyn CancelFlowCommand>,
    config: AppConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(HttpState::new(cancel_flow));
    let AppConfig {
        bind_addr,
        database: _,
        session,
    } = config;

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone(), session.clone())
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "cancellation flow server listening");
    health_state.mark_ready();
    Ok(server)
}
