use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;
use axum::routing::{on, MethodFilter};
use axum::Router;
use common_http_errors::internal_error_response;
use common_observability::Metrics;
use tracing::error;

use crate::context;
use crate::error::Error;
use crate::handler::{compose, Handler, Middleware};
use crate::shutdown::ShutdownSignal;

/// Entry point for the request pipeline. Every registered route gets its own
/// request context, runs inside the application-wide middleware, and escalates
/// any error that escapes the chain to a shutdown.
pub struct App {
    router: Router,
    shutdown: ShutdownSignal,
    metrics: Metrics,
    mw: Vec<Middleware>,
}

impl App {
    /// `mw` runs around every route, outermost first.
    pub fn new(shutdown: ShutdownSignal, metrics: Metrics, mw: Vec<Middleware>) -> Self {
        Self {
            router: Router::new(),
            shutdown,
            metrics,
            mw,
        }
    }

    /// Binds `handler` to `method` at `group + path`. Route middleware runs
    /// inside the application middleware.
    pub fn handle(
        &mut self,
        method: Method,
        group: &str,
        path: &str,
        handler: Handler,
        mw: Vec<Middleware>,
    ) -> Result<(), Error> {
        let handler = compose(&mw, handler);
        let handler = compose(&self.mw, handler);

        let filter = MethodFilter::try_from(method.clone())
            .map_err(|err| Error::Route(format!("{method} {path}: {err}")))?;

        let final_path = if group.is_empty() {
            path.to_string()
        } else {
            format!("{group}{path}")
        };

        let endpoint = Endpoint {
            handler,
            shutdown: self.shutdown.clone(),
            metrics: self.metrics.clone(),
        };
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&final_path, on(filter, move |req: Request| endpoint.clone().serve(req)));
        Ok(())
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

#[derive(Clone)]
struct Endpoint {
    handler: Handler,
    shutdown: ShutdownSignal,
    metrics: Metrics,
}

impl Endpoint {
    async fn serve(self, mut req: Request) -> Response {
        let values = context::begin(&mut req);
        req.extensions_mut().insert(self.metrics);

        match (self.handler)(req).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    Error::Panic { message, trace } => {
                        error!(trace_id = %values.trace_id, %message, %trace, "panic escaped the request pipeline");
                    }
                    other => {
                        error!(trace_id = %values.trace_id, error = %other, "error escaped the request pipeline");
                    }
                }
                self.shutdown.signal();
                internal_error_response()
            }
        }
    }
}
