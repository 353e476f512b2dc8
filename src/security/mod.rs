//! Security subsystem: the request gateway.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (trusted-hop X-Forwarded-For, normalization)
//!     → limits.rs (declared body size)
//!     → rate_limit.rs (general tier; /health exempt)
//!     → rate_limit.rs (API tier, /api only)
//!     → auth.rs (API key, /api only)
//!     → route handler
//!
//! Every decision:
//!     → events.rs (structured security event)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Generic error bodies; detail goes to the security log only
//! - No trust in client input beyond the configured proxy depth

pub mod auth;
pub mod client_ip;
pub mod events;
pub mod limits;
pub mod rate_limit;

pub use auth::Credential;
pub use client_ip::ClientIp;
pub use events::{MemorySink, SecurityEvent, SecurityEventKind, SecurityLog, SecuritySink};
pub use rate_limit::{RateLimiter, Tier};
