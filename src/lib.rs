//! Paced delivery of streaming text to rate-limited chat surfaces.
//!
//! A generative text source produces fragments at an irregular, often high
//! rate; chat surfaces accept edits at a limited one. `botstream` sits in
//! between: an ingestor drains the source into a hand-off queue while a
//! paced dispatcher batches whatever has arrived each cycle and issues a
//! bounded number of create/update calls, rendered per channel either by
//! editing one message in place or by progressively revealing a stream.
//!
//! ```no_run
//! use botstream::{PacingOptions, StreamingSession};
//! use botstream::surface::InMemorySurface;
//! use futures::stream;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let surface = InMemorySurface::new();
//! let session = StreamingSession::for_channel(&surface, "webchat", PacingOptions::default())?;
//!
//! let tokens = stream::iter(vec![Ok("Hel".into()), Ok("lo!".into())]);
//! let full_text = session.send(tokens, &CancellationToken::new()).await?;
//! assert_eq!(full_text, "Hello!");
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod ingest;

pub mod error;
pub mod options;
pub mod queue;
pub mod sink;
pub mod state;
pub mod surface;

mod session;

pub use error::{PacingError, PacingResult};
pub use options::PacingOptions;
pub use session::StreamingSession;
pub use sink::SinkKind;
pub use state::{DispatchState, OutputHandle};
