//! Sink variants: channel-specific rendering strategies.
//!
//! Chat channels differ in how they accept a reply that is still growing.
//! Some let the bot edit one message in place; others expect a stream of
//! typing-style updates closed out by a final message. The variant is picked
//! once per session from the channel id, before any fragment is consumed.

use crate::error::{PacingError, PacingResult};
use crate::state::{DispatchState, OutputHandle};
use crate::surface::{
    ChatSurface, MessageKind, OutgoingMessage, ProgressState, StreamInfo,
};
use tracing::debug;
use uuid::Uuid;

/// Closed set of rendering strategies. Adding a channel means adding a
/// variant here and covering it in every match below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// One logical message for the whole session, edited as text grows.
    EditInPlace,
    /// A provisional in-progress message updated with stream metadata, then
    /// finalized.
    ProgressiveReveal,
}

impl SinkKind {
    /// Maps an external channel identifier to its rendering strategy.
    /// Unknown channels fail here, before any fragment is consumed.
    pub fn for_channel(channel: &str) -> PacingResult<Self> {
        match channel {
            "msteams" => Ok(Self::EditInPlace),
            "webchat" => Ok(Self::ProgressiveReveal),
            other => Err(PacingError::UnsupportedChannel {
                channel: other.to_string(),
            }),
        }
    }
}

/// Per-session renderer state for the chosen variant.
pub(crate) enum SinkRenderer<'a> {
    EditInPlace {
        surface: &'a dyn ChatSurface,
        handle: Option<OutputHandle>,
    },
    ProgressiveReveal {
        surface: &'a dyn ChatSurface,
        stream: Option<(OutputHandle, String)>,
    },
}

impl<'a> SinkRenderer<'a> {
    pub(crate) fn new(kind: SinkKind, surface: &'a dyn ChatSurface) -> Self {
        match kind {
            SinkKind::EditInPlace => Self::EditInPlace {
                surface,
                handle: None,
            },
            SinkKind::ProgressiveReveal => Self::ProgressiveReveal {
                surface,
                stream: None,
            },
        }
    }

    /// Creates or updates the surface message for this cycle and returns the
    /// handle involved.
    pub(crate) async fn create_or_update(
        &mut self,
        state: &DispatchState,
    ) -> anyhow::Result<OutputHandle> {
        match self {
            Self::EditInPlace { surface, handle } => {
                render_edit_in_place(*surface, handle, state).await
            }
            Self::ProgressiveReveal { surface, stream } => {
                render_progressive_reveal(*surface, stream, state).await
            }
        }
    }
}

async fn render_edit_in_place(
    surface: &dyn ChatSurface,
    remembered: &mut Option<OutputHandle>,
    state: &DispatchState,
) -> anyhow::Result<OutputHandle> {
    let message = OutgoingMessage::text_message(state.text.clone());

    let handle = match remembered {
        None => {
            debug!(iteration = state.iteration, "creating edit-in-place message");
            surface.create(message).await?
        }
        Some(handle) => {
            debug!(
                iteration = state.iteration,
                handle = handle.id(),
                "updating edit-in-place message"
            );
            surface.update(handle, message).await?
        }
    };

    *remembered = Some(handle.clone());
    Ok(handle)
}

async fn render_progressive_reveal(
    surface: &dyn ChatSurface,
    stream: &mut Option<(OutputHandle, String)>,
    state: &DispatchState,
) -> anyhow::Result<OutputHandle> {
    // Whole reply in one cycle: a plain message, no progress indicator.
    if state.is_single() {
        debug!("single-cycle reply, sending plain message");
        return surface
            .create(OutgoingMessage::text_message(state.text.clone()))
            .await;
    }

    match stream {
        None => {
            // First of several: open the stream under a freshly minted id
            // that every later update will reference.
            let stream_id = Uuid::new_v4().to_string();
            debug!(stream_id = %stream_id, "opening progressive stream");
            let handle = surface
                .create(OutgoingMessage {
                    text: state.text.clone(),
                    speak: None,
                    kind: MessageKind::InProgress,
                    stream_info: Some(StreamInfo {
                        state: ProgressState::Streaming,
                        sequence: state.iteration,
                        stream_id: stream_id.clone(),
                    }),
                })
                .await?;
            *stream = Some((handle.clone(), stream_id));
            Ok(handle)
        }
        Some((handle, stream_id)) => {
            let message = if state.is_last {
                // Final update: speak the full text and switch to a
                // completed message.
                OutgoingMessage {
                    text: state.text.clone(),
                    speak: Some(state.text.clone()),
                    kind: MessageKind::Message,
                    stream_info: Some(StreamInfo {
                        state: ProgressState::Final,
                        sequence: state.iteration,
                        stream_id: stream_id.clone(),
                    }),
                }
            } else {
                OutgoingMessage {
                    text: state.text.clone(),
                    speak: None,
                    kind: MessageKind::InProgress,
                    stream_info: Some(StreamInfo {
                        state: ProgressState::Streaming,
                        sequence: state.iteration,
                        stream_id: stream_id.clone(),
                    }),
                }
            };
            debug!(
                stream_id = %stream_id,
                sequence = state.iteration,
                last = state.is_last,
                "advancing progressive stream"
            );
            surface.update(handle, message).await
        }
    }
}
