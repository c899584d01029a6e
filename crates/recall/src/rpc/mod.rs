//! Transport layer
//!
//! JSON-RPC 2.0 protocol types and the MCP request router, served over
//! HTTP or stdio. Both transports share one router so behavior is
//! identical regardless of how the client connects.

pub mod http;
pub mod protocol;
pub mod router;
pub mod stdio;

pub use http::RpcServer;
pub use router::McpRouter;
