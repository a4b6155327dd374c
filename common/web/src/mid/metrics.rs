use axum::extract::Request;

use crate::context;
use crate::handler::{from_fn, Handler, Middleware};

/// Counts requests and failures on the metrics handle carried by the request.
pub fn metrics() -> Middleware {
    from_fn(|req: Request, next: Handler| async move {
        let Some(metrics) = context::metrics(req.extensions()).cloned() else {
            return next(req).await;
        };

        metrics.add_requests();
        let _in_flight = metrics.in_flight();

        let result = next(req).await;
        if result.is_err() {
            metrics.add_errors();
        }
        result
    })
}
