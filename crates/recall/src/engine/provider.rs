//! Memory engine trait
//!
//! Abstracts the external memory service behind the narrow interface the
//! tool dispatcher consumes.

use async_trait::async_trait;

use crate::engine::types::{EngineResponse, Message, Result};

/// Interface to the external memory engine
///
/// One handle is constructed at process start and shared for the process
/// lifetime. Implementations are responsible for their own internal
/// synchronization; callers never lock around individual operations.
#[async_trait]
pub trait MemoryEngine: Send + Sync {
    /// Store a conversation for fact extraction under the given identity
    async fn add(&self, messages: &[Message], identity: &str) -> Result<()>;

    /// Fetch every memory stored under the identity
    async fn get_all(&self, identity: &str) -> Result<EngineResponse>;

    /// Semantic search over the identity's memories
    async fn search(&self, query: &str, identity: &str, limit: u32) -> Result<EngineResponse>;

    /// Delete a single memory by id
    async fn delete(&self, memory_id: &str, identity: &str) -> Result<()>;

    /// Replace a memory's content by id
    async fn update(&self, memory_id: &str, new_content: &str, identity: &str) -> Result<()>;

    /// Engine name for logging
    fn name(&self) -> &'static str;
}
