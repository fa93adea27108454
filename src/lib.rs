//! Serpgate - authenticated MCP gateway for SerpApi search
//!
//! This library exposes the gateway's components, enabling integration tests
//! and embedding the router in other applications.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod search;
pub mod server;
pub mod state;
pub mod telemetry;

// Re-export key types for convenience
pub use auth::{resolve_credential, Credential, CredentialSource, RequestContext};
pub use catalog::{EngineCatalog, EngineDescriptor, EngineIndex};
pub use config::Config;
pub use error::{AppError, Result, UpstreamError};
pub use search::{SearchClient, SerpApiClient, ToolOutput, UpstreamRequest};
pub use server::{build_app, ToolKind, ToolRegistry};
pub use state::AppState;
