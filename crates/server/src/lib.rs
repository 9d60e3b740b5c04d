//! Yield server
//!
//! Serves live protocol yields over HTTP and streams per-cycle updates to
//! WebSocket subscribers.

pub mod dto;
pub mod errors;
pub mod routes;
pub mod server;
pub mod service;
pub mod ws;

pub use errors::ApiError;
pub use routes::api_router;
pub use server::{ServerConfig, YieldServer, YieldServerBuilder};
pub use service::YieldService;
