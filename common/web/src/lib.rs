//! Request pipeline shared by the services: composable middleware over a
//! per-route handler, a per-request context, and the shutdown channel the
//! pipeline uses to escalate fatal errors.

pub mod app;
pub mod context;
pub mod error;
pub mod handler;
pub mod mid;
pub mod request;
pub mod respond;
pub mod shutdown;

pub use app::App;
pub use context::RequestContext;
pub use error::{Error, HandlerResult};
pub use handler::{compose, from_fn, handler, BoxFuture, Handler, Middleware};
pub use request::{decode, param};
pub use respond::respond;
pub use shutdown::{channel as shutdown_channel, ShutdownListener, ShutdownSignal};
