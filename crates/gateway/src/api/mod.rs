/// HTTP API for the gateway
///
/// REST routes for commands and queries plus the WebSocket realtime
/// channel, all sharing one explicitly constructed AppState.
pub mod routes;
pub mod types;
pub mod ws;

pub use routes::{create_router, AppState};
pub use types::*;
