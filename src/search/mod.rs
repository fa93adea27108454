//! The `search` tool and its upstream collaborators.

pub mod client;
pub mod dispatcher;
pub mod normalize;

pub use client::{SearchClient, SerpApiClient, UpstreamRequest};
pub use dispatcher::{dispatch_search, search_tool, ResponseMode, SearchArgs, ToolOutput};
pub use normalize::{http_status, normalize_error};
