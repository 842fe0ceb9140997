//! HTTP client for the agent runtime
//!
//! Runs a query by POSTing to the runtime's `/run` endpoint and decoding its
//! response body as newline-delimited JSON, one event per line. Events are
//! decoded incrementally so dropping the stream early aborts the transfer.

use super::{AgentEvent, AgentRunner, EventStream, SessionIdentity};
use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::debug;

/// Agent runtime client speaking newline-delimited JSON events
#[derive(Clone)]
pub struct HttpAgentRunner {
    /// HTTP client
    client: Client,
    /// Configuration
    config: RunnerConfig,
}

/// Body of a run request against the runtime
#[derive(Serialize)]
struct RunRequest<'a> {
    app_name: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_service_uri: Option<&'a str>,
}

impl HttpAgentRunner {
    /// Create a new runtime client
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!(
                "Bearer {}",
                config.api_key.expose_secret()
            ))
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpAgentRunner { client, config })
    }
}

#[async_trait]
impl AgentRunner for HttpAgentRunner {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(&self, session: &SessionIdentity, query: &str) -> Result<EventStream> {
        let url = self
            .config
            .base_url
            .join("run")
            .map_err(|e| Error::Config(format!("Invalid runtime URL: {}", e)))?;

        let body = RunRequest {
            app_name: &self.config.app_name,
            user_id: &session.user_id,
            session_id: &session.session_id,
            query,
            session_service_uri: self.config.session_service_uri.as_deref(),
        };

        debug!(user_id = %session.user_id, session_id = %session.session_id, "Dispatching run request");

        let response = self.client.post(url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Runner(format!(
                "runtime returned {}: {}",
                status,
                detail.trim()
            )));
        }

        Ok(decode_events(response.bytes_stream()))
    }
}

/// Decode a byte stream into events, one JSON document per line.
///
/// Lines may be split across arbitrary chunk boundaries; bytes are buffered
/// until a newline completes a line. Blank lines are tolerated. A trailing
/// unterminated line is decoded after the body ends.
fn decode_events<S>(mut body: S) -> EventStream
where
    S: futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Send + Unpin + 'static,
{
    Box::pin(try_stream! {
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Error::Http)?;
            buf.extend_from_slice(&chunk);

            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if let Some(event) = decode_line(&line[..line.len() - 1])? {
                    yield event;
                }
            }
        }
        if let Some(event) = decode_line(&buf)? {
            yield event;
        }
    })
}

/// Decode a single event line, skipping blank lines
fn decode_line(line: &[u8]) -> Result<Option<AgentEvent>> {
    let text = std::str::from_utf8(line)
        .map_err(|e| Error::Runner(format!("malformed event: {}", e)))?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(text)
        .map_err(|e| Error::Runner(format!("malformed event: {}", e)))?;
    Ok(Some(event))
}
