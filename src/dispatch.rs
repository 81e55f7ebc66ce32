//! The paced dispatch loop: drains the queue on a timed cadence and drives
//! the sink variant.
//!
//! The loop never waits on the queue becoming non-empty; every wait is a
//! plain timed sleep. Draining is bounded to what is queued at the instant
//! of the drain, which keeps one cycle's work predictable under a fast
//! producer and decouples the dispatch cadence from the arrival rate
//! entirely. The producer is never slowed down.

use crate::error::{PacingError, PacingResult};
use crate::options::PacingOptions;
use crate::queue::FragmentQueue;
use crate::sink::SinkRenderer;
use crate::state::{DispatchState, OutputHandle};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub(crate) struct PacedDispatcher {
    options: PacingOptions,
}

impl PacedDispatcher {
    pub(crate) fn new(options: PacingOptions) -> Self {
        Self { options }
    }

    /// Runs dispatch cycles until the queue is complete, then returns the
    /// full aggregated text (empty if the source produced nothing).
    pub(crate) async fn run(
        &self,
        queue: &FragmentQueue,
        renderer: &mut SinkRenderer<'_>,
        cancel: &CancellationToken,
    ) -> PacingResult<String> {
        let mut aggregate = String::new();
        let mut sent: Vec<OutputHandle> = Vec::new();
        let mut iteration: u32 = 1;
        let mut is_first = true;

        if !self.options.initial_delay.is_zero() {
            pause(self.options.initial_delay, cancel).await?;
        }

        while !queue.is_complete() {
            if cancel.is_cancelled() {
                return Err(PacingError::Cancelled);
            }

            let drained = queue.drain_current();
            if drained.is_empty() {
                trace!("nothing queued this cycle");
                self.idle(cancel).await?;
                continue;
            }

            for fragment in &drained {
                aggregate.push_str(fragment);
            }
            if aggregate.is_empty() {
                // Only empty-string fragments have arrived; nothing to show.
                self.idle(cancel).await?;
                continue;
            }

            // Completion is decided here, right after the drain, and not
            // re-checked after the surface call. A fragment racing into this
            // window may make the final marker appear one cycle early; the
            // ordering is kept deliberately since changing it would change
            // observable output timing.
            let is_last = queue.is_complete();

            let send_started = Instant::now();
            let state = DispatchState {
                text: aggregate.clone(),
                is_first,
                is_last,
                iteration,
                sent: sent.clone(),
            };
            debug!(
                iteration,
                drained = drained.len(),
                aggregate_len = aggregate.len(),
                is_first,
                is_last,
                "dispatching cycle"
            );

            let handle = tokio::select! {
                _ = cancel.cancelled() => return Err(PacingError::Cancelled),
                result = renderer.create_or_update(&state) => {
                    result.map_err(|source| PacingError::Sink { source })?
                }
            };

            match sent.last() {
                Some(last) if last.same_as(&handle) => {}
                _ => sent.push(handle),
            }
            iteration += 1;
            is_first = false;

            // Pace against the time the send itself took, so slow surfaces
            // do not accumulate extra delay on top of their own latency.
            let remaining = self
                .options
                .cycle_delay
                .saturating_sub(send_started.elapsed());
            if !remaining.is_zero() {
                pause(remaining, cancel).await?;
            }
        }

        debug!(
            iterations = iteration - 1,
            total_len = aggregate.len(),
            "dispatch complete"
        );
        Ok(aggregate)
    }

    /// Wait applied when a cycle found nothing to show. With the delay set
    /// to zero this still yields once, so the ingestor sharing the task is
    /// never starved by an empty-queue spin.
    async fn idle(&self, cancel: &CancellationToken) -> PacingResult<()> {
        if self.options.no_fragment_delay.is_zero() {
            tokio::task::yield_now().await;
            Ok(())
        } else {
            pause(self.options.no_fragment_delay, cancel).await
        }
    }
}

/// Timed sleep that aborts with `Cancelled` as soon as the token fires.
async fn pause(delay: Duration, cancel: &CancellationToken) -> PacingResult<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(PacingError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkKind;
    use crate::surface::InMemorySurface;

    fn immediate_dispatcher() -> PacedDispatcher {
        PacedDispatcher::new(PacingOptions::immediate())
    }

    #[tokio::test]
    async fn empty_closed_queue_yields_empty_text_and_no_calls() {
        let queue = FragmentQueue::new();
        queue.close();
        let surface = InMemorySurface::new();
        let mut renderer = SinkRenderer::new(SinkKind::EditInPlace, &surface);

        let text = immediate_dispatcher()
            .run(&queue, &mut renderer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "");
        assert_eq!(surface.call_count(), 0);
    }

    #[tokio::test]
    async fn preloaded_queue_aggregates_in_order() {
        let queue = FragmentQueue::new();
        for fragment in ["Hel", "lo, ", "world!"] {
            queue.push(fragment.to_string());
        }
        queue.close();
        let surface = InMemorySurface::new();
        let mut renderer = SinkRenderer::new(SinkKind::EditInPlace, &surface);

        let text = immediate_dispatcher()
            .run(&queue, &mut renderer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "Hello, world!");
        // Everything was already queued, so one drain catches it all.
        assert_eq!(surface.call_count(), 1);
        let call = &surface.calls()[0];
        assert_eq!(call.message.text, "Hello, world!");
    }

    #[tokio::test]
    async fn empty_string_fragments_never_reach_the_sink() {
        let queue = FragmentQueue::new();
        queue.push(String::new());
        queue.push(String::new());
        queue.close();
        let surface = InMemorySurface::new();
        let mut renderer = SinkRenderer::new(SinkKind::EditInPlace, &surface);

        let text = immediate_dispatcher()
            .run(&queue, &mut renderer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "");
        assert_eq!(surface.call_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_any_send() {
        let queue = FragmentQueue::new();
        queue.push("pending".to_string());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let surface = InMemorySurface::new();
        let mut renderer = SinkRenderer::new(SinkKind::EditInPlace, &surface);

        let result = immediate_dispatcher()
            .run(&queue, &mut renderer, &cancel)
            .await;

        assert!(matches!(result, Err(PacingError::Cancelled)));
        assert_eq!(surface.call_count(), 0);
    }

    #[tokio::test]
    async fn failing_surface_propagates_as_sink_error() {
        struct FailingSurface;

        #[async_trait::async_trait]
        impl crate::surface::ChatSurface for FailingSurface {
            async fn create(
                &self,
                _message: crate::surface::OutgoingMessage,
            ) -> anyhow::Result<OutputHandle> {
                Err(anyhow::anyhow!("surface rejected the message"))
            }

            async fn update(
                &self,
                _handle: &OutputHandle,
                _message: crate::surface::OutgoingMessage,
            ) -> anyhow::Result<OutputHandle> {
                Err(anyhow::anyhow!("surface rejected the update"))
            }
        }

        let queue = FragmentQueue::new();
        queue.push("text".to_string());
        queue.close();
        let surface = FailingSurface;
        let mut renderer = SinkRenderer::new(SinkKind::EditInPlace, &surface);

        let result = immediate_dispatcher()
            .run(&queue, &mut renderer, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(PacingError::Sink { .. })));
    }
}
