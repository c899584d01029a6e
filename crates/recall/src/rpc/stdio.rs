//! Stdio transport for the MCP server
//!
//! Newline-delimited JSON-RPC over stdin/stdout, the framing desktop
//! MCP clients speak. Logging goes to stderr so stdout stays clean.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::error::{RecallError, Result};

use super::router::McpRouter;

/// Reads requests from stdin until EOF, writing responses to stdout.
pub async fn serve(router: Arc<McpRouter>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    info!("Listening on stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = router.handle_line(&line).await else {
            continue;
        };

        let payload = serde_json::to_string(&response)
            .map_err(|e| RecallError::Serialization(e.to_string()))?;

        // Clients expect exactly one JSON document per line.
        stdout.write_all(payload.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("Stdin closed, shutting down");
    Ok(())
}
