pub mod app;
pub mod check_handlers;
pub mod config;
pub mod test_handlers;
pub mod user_handlers;
pub mod users;

pub use app::{api_mux, debug_mux, ApiMuxConfig};
