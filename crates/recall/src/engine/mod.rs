//! Memory engine interface and client
//!
//! The engine owns storage, embeddings, and graph extraction; this module
//! defines the narrow interface the rest of the crate consumes and the REST
//! client that implements it against the external engine service.

pub mod provider;
pub mod rest;
pub mod types;

pub use provider::MemoryEngine;
pub use rest::RestEngine;
pub use types::{EngineError, EngineResponse, MemoryRecord, Message, RelationRecord};
