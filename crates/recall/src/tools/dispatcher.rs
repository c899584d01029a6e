//! Tool dispatcher
//!
//! Maps tool names to memory operations and converts every outcome into
//! result text. Engine failures never escape as errors: each operation
//! reports them as a descriptive string so callers always receive an
//! answer they can show verbatim.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use crate::engine::{EngineError, EngineResponse, MemoryEngine, MemoryRecord, Message, RelationRecord};

/// Identity scope used when no override is configured
pub const DEFAULT_IDENTITY: &str = "user";

/// Result limit applied when a search call does not specify one
const DEFAULT_SEARCH_LIMIT: u32 = 3;

/// Result limit for the search backing a relationship lookup
const RELATIONSHIP_SEARCH_LIMIT: u32 = 10;

/// Longest stretch of caller content echoed back in confirmations
const ECHO_LIMIT: usize = 100;

/// Note attached when a relationship lookup answers from memory text
const FALLBACK_NOTE: &str = "No structured relationships found, showing related memories instead";

/// Fixed tool names registered with the transport
pub mod names {
    pub const SAVE_MEMORY: &str = "save_memory";
    pub const GET_ALL_MEMORIES: &str = "get_all_memories";
    pub const SEARCH_MEMORIES: &str = "search_memories";
    pub const DELETE_MEMORY: &str = "delete_memory";
    pub const UPDATE_MEMORY: &str = "update_memory";
    pub const FIND_RELATIONSHIPS: &str = "find_relationships";
}

/// Returned when a call names a tool that does not exist
#[derive(Debug, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

/// Dispatches tool calls to the memory engine behind it.
///
/// Every memory flows through a single identity scope. The dispatcher
/// holds the engine as a shared trait object so transports can clone it
/// freely across connections.
pub struct ToolDispatcher {
    engine: Arc<dyn MemoryEngine>,
    identity: String,
}

#[derive(Debug, Deserialize)]
struct SaveArgs {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: u32,
}

fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Deserialize)]
struct DeleteArgs {
    memory_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    memory_id: String,
    new_content: String,
}

#[derive(Debug, Deserialize)]
struct EntityArgs {
    entity: String,
}

impl ToolDispatcher {
    pub fn new(engine: Arc<dyn MemoryEngine>) -> Self {
        Self {
            engine,
            identity: DEFAULT_IDENTITY.to_string(),
        }
    }

    /// Replaces the identity scope all operations run under.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Invokes a tool by name with raw JSON arguments.
    ///
    /// Argument violations and engine failures are folded into the
    /// returned string. The only error is a call naming a tool that
    /// does not exist.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> Result<String, UnknownTool> {
        match name {
            names::SAVE_MEMORY => Ok(self.tool_save_memory(arguments).await),
            names::GET_ALL_MEMORIES => Ok(self.tool_get_all_memories().await),
            names::SEARCH_MEMORIES => Ok(self.tool_search_memories(arguments).await),
            names::DELETE_MEMORY => Ok(self.tool_delete_memory(arguments).await),
            names::UPDATE_MEMORY => Ok(self.tool_update_memory(arguments).await),
            names::FIND_RELATIONSHIPS => Ok(self.tool_find_relationships(arguments).await),
            other => Err(UnknownTool(other.to_string())),
        }
    }

    async fn tool_save_memory(&self, arguments: Value) -> String {
        let args: SaveArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error saving memory: {e}"),
        };
        if args.text.is_empty() {
            return "Error saving memory: text must not be empty".to_string();
        }
        self.save_memory(&args.text)
            .await
            .unwrap_or_else(|e| format!("Error saving memory: {e}"))
    }

    async fn tool_get_all_memories(&self) -> String {
        self.get_all_memories()
            .await
            .unwrap_or_else(|e| format!("Error retrieving memories: {e}"))
    }

    async fn tool_search_memories(&self, arguments: Value) -> String {
        let args: SearchArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error searching memories: {e}"),
        };
        self.search_memories(&args.query, args.limit)
            .await
            .unwrap_or_else(|e| format!("Error searching memories: {e}"))
    }

    async fn tool_delete_memory(&self, arguments: Value) -> String {
        let args: DeleteArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error deleting memory: {e}"),
        };
        self.delete_memory(&args.memory_id)
            .await
            .unwrap_or_else(|e| format!("Error deleting memory {}: {e}", args.memory_id))
    }

    async fn tool_update_memory(&self, arguments: Value) -> String {
        let args: UpdateArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error updating memory: {e}"),
        };
        self.update_memory(&args.memory_id, &args.new_content)
            .await
            .unwrap_or_else(|e| format!("Error updating memory {}: {e}", args.memory_id))
    }

    async fn tool_find_relationships(&self, arguments: Value) -> String {
        let args: EntityArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error finding relationships: {e}"),
        };
        self.find_relationships(&args.entity)
            .await
            .unwrap_or_else(|e| format!("Error finding relationships for {}: {e}", args.entity))
    }

    /// Stores `text` as a new memory under the identity scope.
    pub async fn save_memory(&self, text: &str) -> Result<String, EngineError> {
        let messages = [Message::user(text.to_string())];
        self.engine.add(&messages, &self.identity).await?;
        Ok(format!("Successfully saved memory: {}", truncate_echo(text)))
    }

    /// Lists every stored memory, projected to the list-view fields.
    ///
    /// Responses without the structured results shape pass through
    /// unchanged so older engines stay readable.
    pub async fn get_all_memories(&self) -> Result<String, EngineError> {
        let response = self.engine.get_all(&self.identity).await?;
        let value = match response {
            EngineResponse::Structured { results, .. } => {
                let projected: Vec<MemoryRecord> = results.iter().map(MemoryRecord::project).collect();
                to_value(&projected)?
            }
            EngineResponse::Raw(raw) => raw,
        };
        to_pretty(&value)
    }

    /// Searches stored memories, flattening structured results down to
    /// their memory text.
    pub async fn search_memories(&self, query: &str, limit: u32) -> Result<String, EngineError> {
        let response = self.engine.search(query, &self.identity, limit).await?;
        let value = match response {
            EngineResponse::Structured { results, .. } => {
                let flattened: Vec<&str> = results
                    .iter()
                    .filter_map(|entry| entry.get("memory").and_then(Value::as_str))
                    .collect();
                to_value(&flattened)?
            }
            EngineResponse::Raw(raw) => raw,
        };
        to_pretty(&value)
    }

    /// Deletes the memory with the given id.
    pub async fn delete_memory(&self, memory_id: &str) -> Result<String, EngineError> {
        self.engine.delete(memory_id, &self.identity).await?;
        Ok(format!("Successfully deleted memory with ID: {memory_id}"))
    }

    /// Replaces the content of an existing memory.
    pub async fn update_memory(&self, memory_id: &str, new_content: &str) -> Result<String, EngineError> {
        self.engine.update(memory_id, new_content, &self.identity).await?;
        Ok(format!(
            "Successfully updated memory {} with: {}",
            memory_id,
            truncate_echo(new_content)
        ))
    }

    /// Looks up graph relationships involving an entity.
    ///
    /// Prefers relation triples returned alongside search results. When
    /// none involve the entity, falls back to scanning memory text for
    /// mentions; an empty fallback is still a valid answer.
    pub async fn find_relationships(&self, entity: &str) -> Result<String, EngineError> {
        let response = self
            .engine
            .search(entity, &self.identity, RELATIONSHIP_SEARCH_LIMIT)
            .await?;

        let relationships = match &response {
            EngineResponse::Structured {
                relations: Some(relations),
                ..
            } => matching_relationships(relations, entity),
            _ => Vec::new(),
        };

        let value = if relationships.is_empty() {
            json!({
                "entity": entity,
                "related_memories": mentioning_memories(&response, entity),
                "note": FALLBACK_NOTE,
            })
        } else {
            json!({
                "entity": entity,
                "relationships": relationships,
                "count": relationships.len(),
            })
        };

        to_pretty(&value)
    }
}

/// Echoes at most the first `ECHO_LIMIT` characters of caller content.
fn truncate_echo(text: &str) -> String {
    if text.chars().count() > ECHO_LIMIT {
        let prefix: String = text.chars().take(ECHO_LIMIT).collect();
        format!("{prefix}...")
    } else {
        text.to_string()
    }
}

/// Keeps relations where the normalized entity token appears in either
/// endpoint, case-insensitively. Graph nodes use underscores where the
/// caller writes spaces.
fn matching_relationships(relations: &[RelationRecord], entity: &str) -> Vec<Value> {
    let entity_token = entity.to_lowercase().replace(' ', "_");

    relations
        .iter()
        .filter_map(|relation| {
            let source = relation.source.as_deref().unwrap_or("");
            let target = relation.target_node().unwrap_or("");
            let involved = source.to_lowercase().contains(&entity_token)
                || target.to_lowercase().contains(&entity_token);

            involved.then(|| {
                json!({
                    "source": source,
                    "relationship": relation.label().unwrap_or(""),
                    "target": target,
                })
            })
        })
        .collect()
}

/// Scans result entries for memory text mentioning the entity.
fn mentioning_memories(response: &EngineResponse, entity: &str) -> Vec<String> {
    let entity_lower = entity.to_lowercase();

    let entries: &[Value] = match response {
        EngineResponse::Structured { results, .. } => results,
        EngineResponse::Raw(raw) => match raw.as_array() {
            Some(entries) => entries,
            None => return Vec::new(),
        },
    };

    entries
        .iter()
        .filter_map(|entry| entry.get("memory").and_then(Value::as_str))
        .filter(|text| text.to_lowercase().contains(&entity_lower))
        .map(str::to_string)
        .collect()
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("invalid arguments: {e}"))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value).map_err(|e| EngineError::InvalidResponse(e.to_string()))
}

fn to_pretty(value: &Value) -> Result<String, EngineError> {
    serde_json::to_string_pretty(value).map_err(|e| EngineError::InvalidResponse(e.to_string()))
}
