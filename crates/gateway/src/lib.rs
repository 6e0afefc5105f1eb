//! Remote-control gateway for a local media player.
//!
//! A background monitor polls the player through a [`PlayerDriver`],
//! diffs consecutive snapshots into typed change events, and fans them
//! out to realtime subscribers; the REST surface drives the same driver
//! synchronously behind bearer-token / trusted-device auth.
//!
//! [`PlayerDriver`]: tunebridge_core::PlayerDriver

pub mod advertise;
pub mod api;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod devices;
pub mod error;
pub mod monitor;
pub mod server;

pub use advertise::ServiceAdvertiser;
pub use api::routes::{create_router, AppState};
pub use auth::AuthToken;
pub use broadcast::EventBroadcaster;
pub use config::Config;
pub use devices::{TrustedDevice, TrustedDeviceStore};
pub use error::GatewayError;
pub use monitor::MusicMonitor;
pub use server::GatewayServer;
