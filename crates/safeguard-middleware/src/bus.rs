//! Headless broadcast bus for the supervisor's transition log.
//!
//! Uses a [`tokio::sync::broadcast`] channel under the hood so that every
//! subscriber receives every [`DiagnosticEvent`] and no slow subscriber can
//! block the supervisor.  A subscriber that falls behind loses the oldest
//! events (`Lagged`) rather than stalling the publisher.

use safeguard_types::{DiagnosticEvent, SafetyError};
use tokio::sync::broadcast;
use tracing::warn;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Shared diagnostic bus. Clone it cheaply – all clones share the same
/// underlying broadcast channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<DiagnosticEvent>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of receivers that were handed the event, or
    /// [`SafetyError::Channel`] when nobody is listening.
    pub fn publish(&self, event: DiagnosticEvent) -> Result<usize, SafetyError> {
        self.sender
            .send(event)
            .map_err(|e| SafetyError::Channel(format!("diagnostic bus send error: {e}")))
    }

    /// Subscribe to every event.
    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.sender.subscribe()
    }

    /// Subscribe and return a [`SourceSubscriber`] filtered to events whose
    /// `source` starts with `prefix`.
    pub fn subscribe_source(&self, prefix: impl Into<String>) -> SourceSubscriber {
        SourceSubscriber {
            prefix: prefix.into(),
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A subscriber that only delivers events whose `source` field starts with the
/// given prefix.
pub struct SourceSubscriber {
    prefix: String,
    receiver: broadcast::Receiver<DiagnosticEvent>,
}

impl SourceSubscriber {
    /// Wait for the next event that matches this subscriber's prefix.
    ///
    /// Returns `None` when the bus is closed and no further events will arrive.
    pub async fn recv(&mut self) -> Option<DiagnosticEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.source.starts_with(&self.prefix) => {
                    return Some(event);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(prefix = %self.prefix, lagged_by = n, "SourceSubscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
