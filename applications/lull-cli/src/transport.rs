//! Cast output for the demo binary
//!
//! Drains the `ChannelTransport` queue and writes one line per control
//! message, `<namespace> <payload>`, so a receiver can be fed from a pipe.
//! A failed write fails the channel that sent the message.

use lull_playback::OutboundMessage;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawn the writer task; it ends when every transport handle is dropped
pub fn spawn_writer<W>(mut outbound: mpsc::Receiver<OutboundMessage>, mut out: W) -> JoinHandle<W>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        let mut written = 0usize;
        while let Some(message) = outbound.recv().await {
            if let Err(e) = writeln!(out, "{} {}", message.namespace, message.payload) {
                warn!(sound_id = %message.receipt.sound_id(), error = %e, "Failed to write cast message");
                message.receipt.failed(e.to_string());
                continue;
            }
            written += 1;
        }
        let _ = out.flush();
        debug!(written, "Cast writer finished");
        out
    })
}
