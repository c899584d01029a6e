//! Memory engine wire types
//!
//! Response shapes vary across engine versions and providers: newer engines
//! wrap results in a mapping, older ones return bare lists, and graph-aware
//! engines attach a relations list with inconsistent field names. The types
//! here model that variance explicitly instead of duck-typing around it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single chat message handed to the engine for fact extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role ("user", "assistant", ...)
    pub role: String,
    /// Message content
    pub content: String,
}

impl Message {
    /// Create a user-role message
    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// A stored memory as projected for list responses
///
/// Every field is optional; fields the engine did not supply serialize as
/// null so the projected shape stays stable for callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Memory id
    pub id: Option<String>,
    /// Memory content
    pub memory: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

impl MemoryRecord {
    /// Project a raw result entry down to the list-view fields
    pub fn project(entry: &Value) -> Self {
        Self {
            id: string_field(entry, "id"),
            memory: string_field(entry, "memory"),
            created_at: string_field(entry, "created_at"),
            updated_at: string_field(entry, "updated_at"),
        }
    }
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A directed labeled edge from the engine's graph extraction
///
/// Engine versions disagree on field names: the label may arrive as
/// `relationship` or `relation`, the edge target as `destination` or
/// `target`. The accessors apply those fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Edge source entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Relationship label (newer engines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Relationship label (older engines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Edge target entity (newer engines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Edge target entity (older engines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl RelationRecord {
    /// Relationship label, falling back from `relationship` to `relation`
    pub fn label(&self) -> Option<&str> {
        self.relationship.as_deref().or(self.relation.as_deref())
    }

    /// Edge target, falling back from `destination` to `target`
    pub fn target_node(&self) -> Option<&str> {
        self.destination.as_deref().or(self.target.as_deref())
    }
}

/// Engine response envelope
///
/// Either the structured mapping (a `results` list, optionally accompanied
/// by graph `relations`) or any other shape, passed through uninterpreted.
/// Decoding never fails on an unknown shape: it lands in `Raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineResponse {
    /// Mapping with a `results` list
    Structured {
        /// Result entries, left uninterpreted until an operation projects them
        results: Vec<Value>,
        /// Graph relations, when the engine has a graph store attached
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relations: Option<Vec<RelationRecord>>,
    },
    /// Anything else
    Raw(Value),
}

/// Memory engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Engine rejected the backend configuration at startup
    #[error("Configuration rejected: {0}")]
    ConfigRejected(String),
    /// Transport-level failure reaching the engine
    #[error("Request failed: {0}")]
    Request(String),
    /// Engine returned a non-success status
    #[error("Engine returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },
    /// Engine response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
