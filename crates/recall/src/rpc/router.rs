//! MCP request router
//!
//! One router serves both transports. Lifecycle methods are answered
//! inline; tool calls go through the dispatcher, which always produces
//! result text. Tool failures therefore stay in-band: the only call
//! flagged with `isError` is one naming a tool that does not exist.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::tools::{ToolDispatcher, names};

use super::protocol::{JsonRpcId, JsonRpcRequest, JsonRpcResponse, error_codes, methods};

/// Protocol revision answered when the client does not name one.
const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Routes JSON-RPC requests to lifecycle handlers and the tool dispatcher.
pub struct McpRouter {
    dispatcher: Arc<ToolDispatcher>,
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl McpRouter {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Handles one raw line of input. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("failed to parse request: {e}");
                return Some(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handles a decoded request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        // Requests without an id are notifications and get no reply.
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };
        let id = Some(id);

        debug!(method = %request.method, "handling request");

        let response = match request.method.as_str() {
            methods::INITIALIZE => self.initialize(id, request.params),
            methods::PING => JsonRpcResponse::success(id, json!({})),
            methods::TOOLS_LIST => JsonRpcResponse::success(id, tool_definitions()),
            methods::TOOLS_CALL => self.tools_call(id, request.params).await,
            other => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };

        Some(response)
    }

    fn initialize(&self, id: Option<JsonRpcId>, params: Option<Value>) -> JsonRpcResponse {
        let protocol_version = params
            .as_ref()
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(MCP_PROTOCOL_VERSION);

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": protocol_version,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    async fn tools_call(&self, id: Option<JsonRpcId>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolsCallParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                );
            }
        };

        match self.dispatcher.dispatch(&params.name, params.arguments).await {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{"type": "text", "text": text}],
                    "isError": false,
                }),
            ),
            Err(unknown) => {
                warn!("{unknown}");
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{"type": "text", "text": unknown.to_string()}],
                        "isError": true,
                    }),
                )
            }
        }
    }
}

/// Tool definitions advertised through tools/list.
fn tool_definitions() -> Value {
    json!({
        "tools": [
            {
                "name": names::SAVE_MEMORY,
                "description": "Store a piece of information in long-term memory for later recall.",
                "inputSchema": {
                    "type": "object",
                    "required": ["text"],
                    "properties": {
                        "text": {"type": "string"}
                    }
                }
            },
            {
                "name": names::GET_ALL_MEMORIES,
                "description": "Retrieve every stored memory, for loading complete context.",
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            },
            {
                "name": names::SEARCH_MEMORIES,
                "description": "Search stored memories semantically and return the most relevant entries.",
                "inputSchema": {
                    "type": "object",
                    "required": ["query"],
                    "properties": {
                        "query": {"type": "string"},
                        "limit": {"type": "integer"}
                    }
                }
            },
            {
                "name": names::DELETE_MEMORY,
                "description": "Delete a specific memory by its id.",
                "inputSchema": {
                    "type": "object",
                    "required": ["memory_id"],
                    "properties": {
                        "memory_id": {"type": "string"}
                    }
                }
            },
            {
                "name": names::UPDATE_MEMORY,
                "description": "Replace the content of an existing memory.",
                "inputSchema": {
                    "type": "object",
                    "required": ["memory_id", "new_content"],
                    "properties": {
                        "memory_id": {"type": "string"},
                        "new_content": {"type": "string"}
                    }
                }
            },
            {
                "name": names::FIND_RELATIONSHIPS,
                "description": "Find graph relationships involving an entity, with a fallback to related memory text.",
                "inputSchema": {
                    "type": "object",
                    "required": ["entity"],
                    "properties": {
                        "entity": {"type": "string"}
                    }
                }
            }
        ]
    })
}
