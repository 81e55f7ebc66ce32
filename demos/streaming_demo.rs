//! Simulates a token stream from a generative model and paces it onto an
//! in-memory chat surface, printing every call the surface receives.
//!
//! ```sh
//! cargo run --example streaming_demo
//! ```

use botstream::surface::InMemorySurface;
use botstream::{PacingOptions, StreamingSession};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let reply = "Streaming replies feel alive: the surface shows text the moment it exists, \
                 instead of a spinner followed by a wall of words.";
    let tokens: Vec<String> = reply
        .split_inclusive(' ')
        .map(|t| t.to_string())
        .collect();

    // Tokens arrive every 40 ms; the surface is only updated every 300 ms.
    let source = stream::iter(tokens).then(|t| async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        Ok(t)
    });

    let options = PacingOptions::default()
        .with_initial_delay(Duration::from_millis(200))
        .with_no_fragment_delay(Duration::from_millis(10))
        .with_cycle_delay(Duration::from_millis(300));

    let surface = InMemorySurface::new();
    let session = StreamingSession::for_channel(&surface, "webchat", options)?;

    let full_text = session.send(source, &CancellationToken::new()).await?;

    for (i, call) in surface.calls().iter().enumerate() {
        let progress = call
            .message
            .stream_info
            .as_ref()
            .map(|info| format!(" [{:?} #{}]", info.state, info.sequence))
            .unwrap_or_default();
        println!("{:>2}. {:?}{} {:?}", i + 1, call.op, progress, call.message.text);
    }
    println!("\nfull reply ({} chars): {full_text}", full_text.len());

    Ok(())
}
