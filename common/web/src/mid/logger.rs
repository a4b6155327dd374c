use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use tracing::info;

use crate::context;
use crate::handler::{from_fn, Handler, Middleware};

/// Logs the start and end of every request with its trace id.
pub fn logger() -> Middleware {
    from_fn(|req: Request, next: Handler| async move {
        let values = context::get(req.extensions())?;
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.to_string())
            .unwrap_or_default();

        info!(trace_id = %values.trace_id, %method, %path, %remote_addr, "request started");

        let result = next(req).await;

        info!(
            trace_id = %values.trace_id,
            %method,
            %path,
            %remote_addr,
            status_code = values.status().map(|status| status.as_u16()).unwrap_or_default(),
            since = ?values.elapsed(),
            "request completed"
        );

        result
    })
}
