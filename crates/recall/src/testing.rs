//! Test utilities for recall - shared engine stubs
//!
//! Provides an in-memory stand-in for the memory engine so dispatcher
//! and transport wiring can be exercised without a live engine process.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::engine::{EngineError, EngineResponse, MemoryEngine, Message};
use crate::tools::ToolDispatcher;

/// Engine stand-in that answers every read with a fixed response and
/// accepts every write.
#[derive(Debug, Clone)]
pub struct StubEngine {
    response: EngineResponse,
}

impl StubEngine {
    pub fn new(response: EngineResponse) -> Self {
        Self { response }
    }

    /// Stub holding a single memory in the structured result shape.
    pub fn with_sample_memory() -> Self {
        Self::new(EngineResponse::Structured {
            results: vec![json!({
                "id": "mem-1",
                "memory": "likes black coffee",
                "created_at": "2025-01-01T00:00:00Z",
            })],
            relations: None,
        })
    }
}

#[async_trait]
impl MemoryEngine for StubEngine {
    async fn add(&self, _messages: &[Message], _identity: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn get_all(&self, _identity: &str) -> Result<EngineResponse, EngineError> {
        Ok(self.response.clone())
    }

    async fn search(
        &self,
        _query: &str,
        _identity: &str,
        _limit: u32,
    ) -> Result<EngineResponse, EngineError> {
        Ok(self.response.clone())
    }

    async fn delete(&self, _memory_id: &str, _identity: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn update(
        &self,
        _memory_id: &str,
        _new_content: &str,
        _identity: &str,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Dispatcher wired to a stub engine holding one sample memory.
pub fn stub_dispatcher() -> Arc<ToolDispatcher> {
    Arc::new(ToolDispatcher::new(Arc::new(StubEngine::with_sample_memory())))
}
