//! [`ChannelSink`] – forwards commands over a bounded Tokio channel.
//!
//! The receiving end is owned by whatever task actually publishes to the
//! robot (a ROS 2 `/cmd_vel` publisher, the CLI's stdout writer, …).  The
//! supervisor side uses `try_send`, so a full or closed channel surfaces as
//! [`SafetyError::CommandSinkUnavailable`] instead of stalling the loop.

use safeguard_types::{Command, SafetyError};
use tokio::sync::mpsc;

use crate::sink::CommandSink;

/// Non-blocking [`CommandSink`] over a bounded `mpsc` channel.
///
/// # Example
///
/// ```
/// use safeguard_hal::{ChannelSink, CommandSink};
/// use safeguard_types::Command;
///
/// let (mut sink, mut rx) = ChannelSink::new("cmd_vel", 8);
/// sink.send(Command::stop()).unwrap();
/// assert_eq!(rx.try_recv().unwrap(), Command::stop());
/// ```
pub struct ChannelSink {
    id: String,
    sender: mpsc::Sender<Command>,
}

impl ChannelSink {
    /// Create a sink and the receiver its commands arrive on.
    ///
    /// `capacity` must be at least 1.
    pub fn new(id: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<Command>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: id.into(),
                sender,
            },
            receiver,
        )
    }
}

impl CommandSink for ChannelSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&mut self, command: Command) -> Result<(), SafetyError> {
        self.sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                SafetyError::CommandSinkUnavailable(format!("{}: channel full", self.id))
            }
            mpsc::error::TrySendError::Closed(_) => {
                SafetyError::CommandSinkUnavailable(format!("{}: receiver closed", self.id))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_emission_order() {
        let (mut sink, mut rx) = ChannelSink::new("cmd_vel", 4);
        sink.send(Command::stop()).unwrap();
        sink.send(Command::rotate(0.5)).unwrap();
        sink.send(Command::stop()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Command::stop());
        assert_eq!(rx.try_recv().unwrap(), Command::rotate(0.5));
        assert_eq!(rx.try_recv().unwrap(), Command::stop());
    }

    #[test]
    fn full_channel_is_unavailable() {
        let (mut sink, _rx) = ChannelSink::new("cmd_vel", 1);
        sink.send(Command::stop()).unwrap();
        let err = sink.send(Command::stop()).unwrap_err();
        assert!(matches!(err, SafetyError::CommandSinkUnavailable(ref m) if m.contains("full")));
    }

    #[test]
    fn closed_channel_is_unavailable() {
        let (mut sink, rx) = ChannelSink::new("cmd_vel", 1);
        drop(rx);
        let err = sink.send(Command::stop()).unwrap_err();
        assert!(matches!(err, SafetyError::CommandSinkUnavailable(ref m) if m.contains("closed")));
    }

    #[test]
    fn recovers_after_receiver_drains() {
        let (mut sink, mut rx) = ChannelSink::new("cmd_vel", 1);
        sink.send(Command::stop()).unwrap();
        assert!(sink.send(Command::rotate(0.5)).is_err());
        rx.try_recv().unwrap();
        assert!(sink.send(Command::rotate(0.5)).is_ok());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (mut sink, mut rx) = ChannelSink::new("cmd_vel", 0);
        sink.send(Command::stop()).unwrap();
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn async_receiver_sees_commands() {
        let (mut sink, mut rx) = ChannelSink::new("cmd_vel", 2);
        sink.send(Command::rotate(0.5)).unwrap();
        assert_eq!(rx.recv().await, Some(Command::rotate(0.5)));
    }
}
