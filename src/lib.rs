//! Coordination server for a multi-terminal agent workflow.
//!
//! Serves static agent metadata, keyword task routing and a vision/LLM
//! pass-through behind an authenticating, rate-limiting gateway.

pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
