//! One streaming session: ingest and dispatch run side by side until the
//! source is exhausted and everything has been flushed to the surface.

use crate::dispatch::PacedDispatcher;
use crate::error::{PacingError, PacingResult};
use crate::ingest::ingest;
use crate::options::PacingOptions;
use crate::queue::FragmentQueue;
use crate::sink::{SinkKind, SinkRenderer};
use crate::surface::ChatSurface;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Streams a growing reply to one chat surface.
///
/// The sink variant is resolved once, up front, from the channel id; an
/// unknown channel fails before a single fragment is consumed. Sessions are
/// strictly sequential: callers must not overlap [`send`](Self::send) calls
/// on the same surface, or the surface output will interleave.
pub struct StreamingSession<'a> {
    surface: &'a dyn ChatSurface,
    kind: SinkKind,
    options: PacingOptions,
}

impl<'a> StreamingSession<'a> {
    pub fn new(surface: &'a dyn ChatSurface, kind: SinkKind, options: PacingOptions) -> Self {
        Self {
            surface,
            kind,
            options,
        }
    }

    /// Resolves the sink variant for an external channel identifier.
    pub fn for_channel(
        surface: &'a dyn ChatSurface,
        channel: &str,
        options: PacingOptions,
    ) -> PacingResult<Self> {
        Ok(Self::new(surface, SinkKind::for_channel(channel)?, options))
    }

    /// Consumes the fragment source and paces it onto the surface, returning
    /// the fully aggregated text once both activities have finished.
    ///
    /// The two activities share one cancellation signal: cancelling `cancel`
    /// aborts both promptly, and a dispatcher failure (sink error) cancels
    /// the ingestor so it is never left running against a dead session.
    /// Outputs already placed on the surface are never retracted.
    #[instrument(skip_all, fields(kind = ?self.kind))]
    pub async fn send<S>(&self, fragments: S, cancel: &CancellationToken) -> PacingResult<String>
    where
        S: Stream<Item = anyhow::Result<String>>,
    {
        let cancel = cancel.child_token();
        let queue = FragmentQueue::new();
        let mut renderer = SinkRenderer::new(self.kind, self.surface);
        let dispatcher = PacedDispatcher::new(self.options.clone());

        let ingest_activity = ingest(&queue, fragments, &cancel);
        let dispatch_activity = async {
            let result = dispatcher.run(&queue, &mut renderer, &cancel).await;
            if result.is_err() {
                // The dispatcher cannot halt the ingestor directly; the
                // shared token is the only stop signal it has.
                cancel.cancel();
            }
            result
        };

        let (ingest_result, dispatch_result) = tokio::join!(ingest_activity, dispatch_activity);

        let outcome = resolve(ingest_result, dispatch_result);
        if let Ok(text) = &outcome {
            info!(len = text.len(), "streaming session complete");
        }
        outcome
    }
}

/// Picks the error the caller should see once both activities have joined.
/// A root-cause error always out-ranks a secondary `Cancelled` that it
/// triggered on the other activity.
fn resolve(ingest: PacingResult<()>, dispatch: PacingResult<String>) -> PacingResult<String> {
    match (ingest, dispatch) {
        (Ok(()), Ok(text)) => Ok(text),
        (Err(PacingError::Cancelled), Err(dispatch_err)) => Err(dispatch_err),
        (Err(ingest_err), Err(_)) => Err(ingest_err),
        (Err(ingest_err), Ok(_)) => Err(ingest_err),
        (Ok(()), Err(dispatch_err)) => Err(dispatch_err),
    }
}
