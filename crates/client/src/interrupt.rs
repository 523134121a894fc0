//! Ctrl-C handling around synchronous commands.
//!
//! Commands run to completion on the runtime thread, so the interrupt cannot
//! preempt them. Instead the handler is installed up front: a Ctrl-C that
//! arrives while a command runs is held by the runtime rather than killing
//! the process, and is picked up once the command returns.

use std::future::Future;
use std::io;
use std::pin::Pin;

type SignalFuture = Pin<Box<dyn Future<Output = io::Result<()>>>>;

pub struct Interrupt {
    signal: Option<SignalFuture>,
    received: bool,
}

impl Interrupt {
    /// Install the Ctrl-C handler.
    pub async fn arm() -> Self {
        Self::watch(tokio::signal::ctrl_c()).await
    }

    async fn watch(signal: impl Future<Output = io::Result<()>> + 'static) -> Self {
        let mut interrupt = Self {
            signal: Some(Box::pin(signal)),
            received: false,
        };
        // The first poll is what registers the handler.
        interrupt.poll_signal().await;
        interrupt
    }

    /// True once a Ctrl-C has been received. Never blocks.
    pub async fn received(&mut self) -> bool {
        self.poll_signal().await;
        self.received
    }

    async fn poll_signal(&mut self) {
        let Some(signal) = self.signal.as_mut() else {
            return;
        };

        let outcome = tokio::select! {
            biased;
            result = signal => Some(result),
            _ = std::future::ready(()) => None,
        };

        match outcome {
            Some(Ok(())) => {
                self.received = true;
                self.signal = None;
            }
            Some(Err(e)) => {
                tracing::warn!("Ctrl-C handler unavailable: {}", e);
                self.signal = None;
            }
            None => {}
        }
    }
}
