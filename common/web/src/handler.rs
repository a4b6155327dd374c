use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Request;

use crate::error::HandlerResult;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A request handler inside the pipeline. The request's extensions carry the
/// per-request state; the returned response is what gets written back.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<HandlerResult> + Send + Sync>;

/// Wraps a handler with cross-cutting behaviour.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Boxes an async function into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |req: Request| -> BoxFuture<HandlerResult> { Box::pin(f(req)) })
}

/// Builds a [`Middleware`] from an async function that receives the request
/// and the next handler. The function decides whether `next` runs at all.
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Handler) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |next: Handler| -> Handler {
        let f = f.clone();
        handler(move |req| f(req, next.clone()))
    })
}

/// Wraps `handler` in `mw` so that `mw[0]` is the outermost layer: it sees the
/// request first and the response last.
pub fn compose(mw: &[Middleware], handler: Handler) -> Handler {
    mw.iter().rev().fold(handler, |next, layer| layer(next))
}
