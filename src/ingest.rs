//! Drains the fragment source into the hand-off queue.

use crate::error::{PacingError, PacingResult};
use crate::queue::FragmentQueue;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Closes the queue when dropped, so every exit path out of [`ingest`]
/// (normal end, source error, cancellation, panic unwind) leaves the
/// dispatcher with a closing signal instead of an eternal wait.
struct CloseOnDrop<'a>(&'a FragmentQueue);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Reads the fragment source until exhaustion, pushing each fragment onto
/// the queue in arrival order. Cancellation stops the read immediately; the
/// queue is closed regardless of how this function returns.
pub async fn ingest<S>(
    queue: &FragmentQueue,
    fragments: S,
    cancel: &CancellationToken,
) -> PacingResult<()>
where
    S: Stream<Item = anyhow::Result<String>>,
{
    let _closer = CloseOnDrop(queue);
    tokio::pin!(fragments);

    let mut count: u64 = 0;
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Err(PacingError::Cancelled),
            next = fragments.next() => next,
        };

        match next {
            Some(Ok(fragment)) => {
                count += 1;
                queue.push(fragment);
            }
            Some(Err(source)) => {
                warn!(fragments = count, error = %source, "fragment source failed");
                return Err(PacingError::Source { source });
            }
            None => {
                debug!(fragments = count, "fragment source exhausted");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::stream;

    #[tokio::test]
    async fn pushes_all_fragments_then_closes() {
        let queue = FragmentQueue::new();
        let source = stream::iter(vec![Ok("a".to_string()), Ok("b".to_string())]);

        ingest(&queue, source, &CancellationToken::new())
            .await
            .unwrap();

        assert!(queue.is_closed());
        assert_eq!(queue.drain_current(), vec!["a", "b"]);
        assert!(queue.is_complete());
    }

    #[tokio::test]
    async fn source_error_still_closes_the_queue() {
        let queue = FragmentQueue::new();
        let source = stream::iter(vec![
            Ok("kept".to_string()),
            Err(anyhow!("connection reset")),
            Ok("never read".to_string()),
        ]);

        let result = ingest(&queue, source, &CancellationToken::new()).await;

        assert!(matches!(result, Err(PacingError::Source { .. })));
        assert!(queue.is_closed());
        assert_eq!(queue.drain_current(), vec!["kept"]);
    }

    #[tokio::test]
    async fn cancellation_stops_reading_but_closes() {
        let queue = FragmentQueue::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // A pending stream would block forever without the cancel branch.
        let source = stream::pending::<anyhow::Result<String>>();

        let result = ingest(&queue, source, &cancel).await;

        assert!(matches!(result, Err(PacingError::Cancelled)));
        assert!(queue.is_closed());
    }
}
