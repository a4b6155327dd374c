//! Middleware shared by every service. The usual application-wide order,
//! outermost first, is `panics`, `logger`, `errors`, `metrics`; `authenticate`
//! and `authorize` are attached per route.

mod auth;
mod errors;
mod logger;
mod metrics;
mod panics;

pub use auth::{authenticate, authorize};
pub use errors::errors;
pub use logger::logger;
pub use metrics::metrics;
pub use panics::{install_panic_hook, panics};
