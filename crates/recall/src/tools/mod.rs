//! Tool dispatch layer
//!
//! The six memory tools exposed over the transport, each a thin
//! orchestration over the shared memory engine handle with defensive
//! normalization of the engine's heterogeneous responses.

pub mod dispatcher;

pub use dispatcher::{DEFAULT_IDENTITY, ToolDispatcher, UnknownTool, names};
