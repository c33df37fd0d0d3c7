//! Signal bus between the client and the auth / notification layers.
//!
//! The client only emits; whoever owns the session or the UI subscribes.

use tokio::sync::broadcast;

/// Cross-cutting events raised by `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSignal {
    /// The server rejected the stored token (HTTP 401).
    LogoutRequested { message: String },
    /// A call failed and the caller did not ask for silence.
    DisplayError { message: String },
}

impl ClientSignal {
    pub fn name(&self) -> &'static str {
        match self {
            ClientSignal::LogoutRequested { .. } => "logout",
            ClientSignal::DisplayError { .. } => "error",
        }
    }
}

/// Fire-and-forget publisher. Implementations must not block.
pub trait SignalBus: Send + Sync {
    fn emit(&self, signal: ClientSignal);
}

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSignals;

impl SignalBus for NoopSignals {
    fn emit(&self, _signal: ClientSignal) {}
}

/// Broadcasts signals to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSignals {
    tx: broadcast::Sender<ClientSignal>,
}

impl BroadcastSignals {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientSignal> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSignals {
    fn default() -> Self {
        Self::new(64)
    }
}

impl SignalBus for BroadcastSignals {
    fn emit(&self, signal: ClientSignal) {
        tracing::debug!(signal = signal.name(), "Emitting client signal");
        // No subscribers is fine.
        let _ = self.tx.send(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let bus = BroadcastSignals::default();
        let mut rx = bus.subscribe();
        bus.emit(ClientSignal::DisplayError {
            message: "boom".into(),
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            ClientSignal::DisplayError {
                message: "boom".into()
            }
        );
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        BroadcastSignals::new(0).emit(ClientSignal::LogoutRequested {
            message: "expired".into(),
        });
    }
}
