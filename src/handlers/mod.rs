pub mod health;
pub mod mcp;
pub mod rest;

pub use health::health_handler;
pub use mcp::mcp_handler;
pub use rest::{engine_handler, engines_index_handler, tool_handler};
