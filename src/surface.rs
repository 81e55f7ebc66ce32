//! Chat surface capability: the external target that renders messages.

use crate::state::OutputHandle;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// How a message should be rendered by the surface.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A regular, completed chat message.
    Message,
    /// A provisional message still being revealed (typing indicator class).
    InProgress,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    Streaming,
    Final,
}

/// Channel metadata attached by the progressive-reveal variant. Surfaces for
/// channels that stream replies forward this verbatim; edit-in-place
/// channels never see it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub state: ProgressState,
    pub sequence: u32,
    pub stream_id: String,
}

/// One outbound create or update payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OutgoingMessage {
    pub text: String,
    /// Spoken rendition for voice-capable surfaces, when the message is
    /// ready to be read aloud.
    pub speak: Option<String>,
    pub kind: MessageKind,
    pub stream_info: Option<StreamInfo>,
}

impl OutgoingMessage {
    /// A plain completed message spoken as written.
    pub fn text_message(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            speak: Some(text.clone()),
            text,
            kind: MessageKind::Message,
            stream_info: None,
        }
    }
}

/// Capability for placing and editing messages on a chat surface. The engine
/// never retries: failures propagate to the session caller untouched.
#[async_trait::async_trait]
pub trait ChatSurface: Send + Sync {
    async fn create(&self, message: OutgoingMessage) -> anyhow::Result<OutputHandle>;

    async fn update(
        &self,
        handle: &OutputHandle,
        message: OutgoingMessage,
    ) -> anyhow::Result<OutputHandle>;
}

/// What an [`InMemorySurface`] recorded for one surface call.
#[derive(Debug, Clone)]
pub struct SurfaceCall {
    pub op: SurfaceOp,
    pub handle_id: String,
    pub message: OutgoingMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    Create,
    Update,
}

/// Recording surface used by tests and demos. Every call is logged in order;
/// handles are minted per create. Progressive messages adopt the stream id
/// minted by the sink variant as their handle id.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn record(&self, op: SurfaceOp, handle: &OutputHandle, message: OutgoingMessage) {
        self.lock_calls().push(SurfaceCall {
            op,
            handle_id: handle.id().to_string(),
            message,
        });
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<SurfaceCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ChatSurface for InMemorySurface {
    async fn create(&self, message: OutgoingMessage) -> anyhow::Result<OutputHandle> {
        let handle = match &message.stream_info {
            Some(info) => OutputHandle::new(info.stream_id.clone(), message.text.clone()),
            None => OutputHandle::minted(message.text.clone()),
        };
        self.record(SurfaceOp::Create, &handle, message);
        Ok(handle)
    }

    async fn update(
        &self,
        handle: &OutputHandle,
        message: OutgoingMessage,
    ) -> anyhow::Result<OutputHandle> {
        handle.set_text(message.text.clone());
        self.record(SurfaceOp::Update, handle, message);
        Ok(handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_update_shares_the_handle() {
        let surface = InMemorySurface::new();
        let handle = surface
            .create(OutgoingMessage::text_message("hello"))
            .await
            .unwrap();
        let updated = surface
            .update(&handle, OutgoingMessage::text_message("hello world"))
            .await
            .unwrap();

        assert!(handle.same_as(&updated));
        assert_eq!(handle.text(), "hello world");

        let calls = surface.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op, SurfaceOp::Create);
        assert_eq!(calls[1].op, SurfaceOp::Update);
        assert_eq!(calls[0].handle_id, calls[1].handle_id);
    }

    #[test]
    fn text_message_speaks_its_own_text() {
        let message = OutgoingMessage::text_message("read me");
        assert_eq!(message.speak.as_deref(), Some("read me"));
        assert_eq!(message.kind, MessageKind::Message);
        assert!(message.stream_info.is_none());
    }
}
