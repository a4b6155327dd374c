use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use common_auth::{AuthEngine, ROLE_ADMIN};
use common_observability::Metrics;
use common_web::{handler, mid, App, Error, ShutdownSignal};

use crate::check_handlers::{self, CheckState};
use crate::test_handlers;
use crate::user_handlers::UserHandlers;
use crate::users::UserStore;

const V1: &str = "/v1";

/// Everything the v1 routes depend on.
#[derive(Clone)]
pub struct ApiMuxConfig {
    pub shutdown: ShutdownSignal,
    pub metrics: Metrics,
    pub engine: Arc<AuthEngine>,
    pub users: Arc<dyn UserStore>,
    pub issuer: String,
    pub token_ttl: chrono::Duration,
}

/// Builds the application router with every v1 route behind the standard
/// middleware.
pub fn api_mux(cfg: ApiMuxConfig) -> Result<Router, Error> {
    let mut app = App::new(
        cfg.shutdown.clone(),
        cfg.metrics.clone(),
        vec![mid::panics(), mid::logger(), mid::errors(), mid::metrics()],
    );

    let authen = mid::authenticate(cfg.engine.clone());
    let admin = mid::authorize(ROLE_ADMIN);

    app.handle(Method::GET, V1, "/test", handler(test_handlers::test), Vec::new())?;
    app.handle(
        Method::GET,
        V1,
        "/testauth",
        handler(test_handlers::test_auth),
        vec![authen.clone(), admin.clone()],
    )?;

    let users = Arc::new(UserHandlers {
        store: cfg.users,
        engine: cfg.engine,
        issuer: cfg.issuer,
        token_ttl: cfg.token_ttl,
    });

    let h = users.clone();
    app.handle(
        Method::GET,
        V1,
        "/users/token",
        handler(move |req| h.clone().token(req)),
        Vec::new(),
    )?;

    let h = users.clone();
    app.handle(
        Method::POST,
        V1,
        "/users",
        handler(move |req| h.clone().create(req)),
        vec![authen.clone(), admin.clone()],
    )?;

    let h = users.clone();
    app.handle(
        Method::GET,
        V1,
        "/users/:id",
        handler(move |req| h.clone().query_by_id(req)),
        vec![authen.clone()],
    )?;

    let h = users;
    app.handle(
        Method::GET,
        V1,
        "/users/email/:email",
        handler(move |req| h.clone().query_by_email(req)),
        vec![authen, admin],
    )?;

    Ok(app.into_router())
}

/// Routes served on the debug port.
pub fn debug_mux(build: &str, metrics: Metrics) -> Router {
    let state = CheckState {
        build: Arc::from(build),
        metrics,
    };

    Router::new()
        .route("/debug/readiness", get(check_handlers::readiness))
        .route("/debug/liveness", get(check_handlers::liveness))
        .route("/debug/metrics", get(check_handlers::metrics))
        .with_state(state)
}
