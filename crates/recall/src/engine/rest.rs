//! REST client for the memory engine service
//!
//! Speaks the engine's HTTP API: a configuration push at startup, then the
//! five memory operations. Non-success statuses surface as [`EngineError`]
//! with the response body attached; response bodies decode into the
//! [`EngineResponse`] envelope and never fail on unrecognized shapes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::config::BackendConfig;
use crate::engine::provider::MemoryEngine;
use crate::engine::types::{EngineError, EngineResponse, Message, Result};

/// Request timeout for engine calls
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for a memory engine service
#[derive(Debug, Clone)]
pub struct RestEngine {
    client: Client,
    base_url: String,
}

/// Body for `POST /memories`
#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    messages: &'a [Message],
    user_id: &'a str,
}

/// Body for `POST /search`
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    user_id: &'a str,
    limit: u32,
}

/// Body for `PUT /memories/{id}`
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    text: &'a str,
}

impl RestEngine {
    /// Create a client for the engine service at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            EngineError::ConfigRejected(format!("Invalid engine URL '{base_url}': {e}"))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| EngineError::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Push the backend configuration to the engine
    ///
    /// Called once at startup. A rejection or unreachable engine here is
    /// fatal for the process; the engine cannot serve calls unconfigured.
    pub async fn configure(&self, config: &BackendConfig) -> Result<()> {
        let url = self.endpoint("configure");
        debug!("Configuring memory engine at {url}");

        let response = self
            .client
            .post(&url)
            .json(config)
            .send()
            .await
            .map_err(|e| EngineError::ConfigRejected(format!("Engine unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(EngineError::ConfigRejected(format!(
                "engine returned {status}: {body}"
            )));
        }

        info!("Memory engine configured");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn memory_endpoint(&self, memory_id: &str) -> String {
        self.endpoint(&format!("memories/{}", urlencoding::encode(memory_id)))
    }
}

#[async_trait]
impl MemoryEngine for RestEngine {
    async fn add(&self, messages: &[Message], identity: &str) -> Result<()> {
        let request = AddRequest {
            messages,
            user_id: identity,
        };

        let response = self
            .client
            .post(self.endpoint("memories"))
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        expect_success(response).await?;
        Ok(())
    }

    async fn get_all(&self, identity: &str) -> Result<EngineResponse> {
        let response = self
            .client
            .get(self.endpoint("memories"))
            .query(&[("user_id", identity)])
            .send()
            .await
            .map_err(request_error)?;

        decode_response(response).await
    }

    async fn search(&self, query: &str, identity: &str, limit: u32) -> Result<EngineResponse> {
        let request = SearchRequest {
            query,
            user_id: identity,
            limit,
        };

        let response = self
            .client
            .post(self.endpoint("search"))
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        decode_response(response).await
    }

    async fn delete(&self, memory_id: &str, identity: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.memory_endpoint(memory_id))
            .query(&[("user_id", identity)])
            .send()
            .await
            .map_err(request_error)?;

        expect_success(response).await?;
        Ok(())
    }

    async fn update(&self, memory_id: &str, new_content: &str, identity: &str) -> Result<()> {
        let request = UpdateRequest { text: new_content };

        let response = self
            .client
            .put(self.memory_endpoint(memory_id))
            .query(&[("user_id", identity)])
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        expect_success(response).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

fn request_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Request(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        EngineError::Request(format!("Failed to connect to engine: {e}"))
    } else {
        EngineError::Request(format!("Request failed: {e}"))
    }
}

async fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(EngineError::Status {
            status: status.as_u16(),
            body: read_body(response).await,
        })
    }
}

async fn decode_response(response: Response) -> Result<EngineResponse> {
    let response = expect_success(response).await?;
    response
        .json::<EngineResponse>()
        .await
        .map_err(|e| EngineError::InvalidResponse(e.to_string()))
}

async fn read_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, resolve};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> BackendConfig {
        resolve(&Settings::from_pairs([
            ("LLM_PROVIDER", "openai-compatible"),
            ("LLM_MODEL", "gpt-4o-mini"),
        ]))
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_url() {
        let result = RestEngine::new("not a url");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid engine URL"));
    }

    #[tokio::test]
    async fn test_configure_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/configure"))
            .and(body_partial_json(json!({
                "llm": {"provider": "openai-compatible"},
                "vector_store": {"provider": "relational-backed"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let result = engine.configure(&test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_configure_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/configure"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unknown provider"))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let err = engine.configure(&test_config()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("unknown provider"));
    }

    #[tokio::test]
    async fn test_add_posts_messages() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/memories"))
            .and(body_partial_json(json!({
                "user_id": "user",
                "messages": [{"role": "user", "content": "Sarah works at Google"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let messages = vec![Message::user("Sarah works at Google".to_string())];
        assert!(engine.add(&messages, "user").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_all_decodes_structured_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/memories"))
            .and(query_param("user_id", "user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": "mem-1", "memory": "note one"},
                    {"id": "mem-2", "memory": "note two"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let response = engine.get_all("user").await.unwrap();

        match response {
            EngineResponse::Structured { results, .. } => assert_eq!(results.len(), 2),
            EngineResponse::Raw(_) => panic!("Expected structured response"),
        }
    }

    #[tokio::test]
    async fn test_search_decodes_relations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(json!({
                "query": "sarah",
                "user_id": "user",
                "limit": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"memory": "Sarah works at Google"}],
                "relations": [
                    {"source": "sarah_chen", "relationship": "works_at", "destination": "google"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let response = engine.search("sarah", "user", 10).await.unwrap();

        match response {
            EngineResponse::Structured { relations, .. } => {
                let relations = relations.expect("relations should be present");
                assert_eq!(relations[0].label(), Some("works_at"));
            }
            EngineResponse::Raw(_) => panic!("Expected structured response"),
        }
    }

    #[tokio::test]
    async fn test_search_raw_passthrough() {
        let mock_server = MockServer::start().await;

        // Legacy engines return a bare list instead of the results mapping
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"memory": "legacy"}])),
            )
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let response = engine.search("anything", "user", 3).await.unwrap();
        assert!(matches!(response, EngineResponse::Raw(_)));
    }

    #[tokio::test]
    async fn test_delete_targets_memory_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/memories/mem-123"))
            .and(query_param("user_id", "user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        assert!(engine.delete("mem-123", "user").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_sends_new_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/memories/mem-123"))
            .and(body_partial_json(json!({"text": "updated content"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        assert!(engine.update("mem-123", "updated content", "user").await.is_ok());
    }

    #[tokio::test]
    async fn test_error_includes_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/memories"))
            .respond_with(ResponseTemplate::new(500).set_body_string("index corrupted"))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let err = engine.get_all("user").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("index corrupted"));
    }

    #[tokio::test]
    async fn test_invalid_body_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/memories"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let engine = RestEngine::new(&mock_server.uri()).unwrap();
        let err = engine.get_all("user").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidResponse(_)));
    }
}
