//! Agent metadata and task routing.
//!
//! Both are static tables evaluated in memory; nothing here performs I/O.

pub mod catalog;
pub mod selection;

pub use catalog::{AgentCatalog, AgentProfile, EXECUTION_ORDER};
pub use selection::{select_agents, Selection};
