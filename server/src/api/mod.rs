//! HTTP surface: routes, handlers, extractors and shared state.

pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
