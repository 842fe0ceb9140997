//! Agent runner seam
//!
//! The gateway never runs the agent itself; it hands a (session identity,
//! query) pair to an [`AgentRunner`] and consumes the resulting event stream.
//! The stream is lazy, finite, and non-restartable: the gateway pulls events
//! in order until it sees the first final response, then drops the rest.

mod http;

pub use http::HttpAgentRunner;

use crate::Result;
use async_trait::async_trait;
use axum::Router;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// The (user id, session id) pair scoping conversational state in the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Opaque user identifier
    pub user_id: String,
    /// Opaque session identifier
    pub session_id: String,
}

impl SessionIdentity {
    /// Create a fixed identity from configured constants
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        SessionIdentity {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Create a fresh identity under the given user id
    pub fn ephemeral(user_id: impl Into<String>) -> Self {
        SessionIdentity {
            user_id: user_id.into(),
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
        }
    }
}

/// Text payload carried by a final response event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Response text
    pub content: String,
}

/// One item in the runtime's event stream.
///
/// The gateway only acts on the discriminator and, for `final_response`, the
/// message content. The other known variants exist so progress can be
/// narrated in logs; anything unrecognized decodes as [`AgentEvent::Other`]
/// and is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Conclusive answer; later events are ignored
    FinalResponse {
        /// Message carrying the answer text
        message: EventMessage,
    },
    /// Agent is planning its next step
    Thinking,
    /// Tool execution started
    ToolStarted {
        /// Name of the tool being invoked
        tool_name: String,
    },
    /// Tool execution completed
    ToolCompleted {
        /// Name of the tool that ran
        tool_name: String,
        /// Whether the tool call succeeded
        success: bool,
    },
    /// Any event kind the gateway does not recognize
    #[serde(other)]
    Other,
}

impl AgentEvent {
    /// The answer text if this is a final response event
    pub fn final_text(&self) -> Option<&str> {
        match self {
            AgentEvent::FinalResponse { message } => Some(&message.content),
            _ => None,
        }
    }
}

/// Lazy sequence of agent events; safe to drop before exhaustion
pub type EventStream = BoxStream<'static, Result<AgentEvent>>;

/// Interface to the external agent runtime
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Get the runner name
    fn name(&self) -> &str;

    /// Run a query under a session identity, yielding the runtime's events
    async fn run(&self, session: &SessionIdentity, query: &str) -> Result<EventStream>;

    /// Auxiliary routes the runner wants mounted alongside the gateway's own.
    /// Only consulted in auto route mode.
    fn aux_router(&self) -> Option<Router> {
        None
    }
}

/// Consume events in order until the first final response.
///
/// Returns the final response text, or `None` if the stream exhausts without
/// one. The remainder of the stream is dropped unconsumed, which aborts any
/// underlying transfer.
pub async fn first_final_text(mut events: EventStream) -> Result<Option<String>> {
    while let Some(event) = events.next().await {
        let event = event?;
        if let Some(text) = event.final_text() {
            info!("Final response received ({} bytes)", text.len());
            return Ok(Some(text.to_string()));
        }
        debug!(?event, "Skipping non-final event");
    }
    warn!("Event stream exhausted without a final response");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn final_event(text: &str) -> AgentEvent {
        AgentEvent::FinalResponse {
            message: EventMessage {
                content: text.to_string(),
            },
        }
    }

    #[test]
    fn test_event_decoding() {
        let event: AgentEvent = serde_json::from_str(
            r#"{"type":"final_response","message":{"content":"It is sunny in Paris."}}"#,
        )
        .unwrap();
        assert_eq!(event.final_text(), Some("It is sunny in Paris."));

        let event: AgentEvent =
            serde_json::from_str(r#"{"type":"tool_started","tool_name":"get_weather"}"#).unwrap();
        assert_eq!(event.final_text(), None);
    }

    #[test]
    fn test_unknown_event_kind_is_opaque() {
        let event: AgentEvent =
            serde_json::from_str(r#"{"type":"token_usage"}"#).unwrap();
        assert!(matches!(event, AgentEvent::Other));
        assert_eq!(event.final_text(), None);
    }

    #[test]
    fn test_ephemeral_identities_are_distinct() {
        let a = SessionIdentity::ephemeral("user");
        let b = SessionIdentity::ephemeral("user");
        assert_eq!(a.user_id, b.user_id);
        assert_ne!(a.session_id, b.session_id);
    }

    #[tokio::test]
    async fn test_first_final_text_takes_first_final() {
        let events = vec![
            Ok(AgentEvent::Thinking),
            Ok(final_event("first")),
            Ok(final_event("second")),
        ];
        let text = first_final_text(stream::iter(events).boxed()).await.unwrap();
        assert_eq!(text.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_first_final_text_stops_pulling_after_final() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let events = vec![
            Ok(AgentEvent::Thinking),
            Ok(final_event("answer")),
            Ok(AgentEvent::Thinking),
            Ok(final_event("never reached")),
        ];
        let stream = stream::iter(events)
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .boxed();

        let text = first_final_text(stream).await.unwrap();
        assert_eq!(text.as_deref(), Some("answer"));
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_final_text_empty_stream() {
        let text = first_final_text(stream::iter(vec![]).boxed()).await.unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_first_final_text_no_final_event() {
        let events = vec![Ok(AgentEvent::Thinking), Ok(AgentEvent::Other)];
        let text = first_final_text(stream::iter(events).boxed()).await.unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_first_final_text_propagates_stream_error() {
        let events = vec![
            Ok(AgentEvent::Thinking),
            Err(crate::Error::Runner("timeout".into())),
            Ok(final_event("unreachable")),
        ];
        let err = first_final_text(stream::iter(events).boxed())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Runner(_)));
    }
}
