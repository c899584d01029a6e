//! Recall - MCP memory server backed by an external memory engine
//!
//! This crate exposes long-term memory to LLM agents over the Model
//! Context Protocol. Storage, embeddings, and graph extraction live in
//! an external engine service; Recall resolves its backend configuration,
//! pushes it to the engine at startup, and serves the memory tools over
//! HTTP or stdio.

pub mod config;
pub mod engine;
pub mod error;
pub mod rpc;
pub mod testing;
pub mod tools;

pub use error::RecallError;
