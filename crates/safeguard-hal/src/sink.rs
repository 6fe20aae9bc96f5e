//! Generic `CommandSink` trait for anything that can move the base.
//!
//! Drivers implement this trait and are handed to the supervisor at
//! construction.  The supervisor only ever talks to the trait, so the
//! transport (ROS 2 `/cmd_vel`, a serial link, a simulator) can be swapped
//! without touching the state machine.

use safeguard_types::{Command, SafetyError};

/// An outbound velocity-command channel.
///
/// # Contract
///
/// * `send` must not block.  When the command cannot be accepted right now
///   it returns [`SafetyError::CommandSinkUnavailable`] and the caller moves
///   on; the next evaluation tick produces a fresh command.
/// * Commands that are accepted are delivered in the order they were sent.
pub trait CommandSink: Send {
    /// Stable identifier for this sink, e.g. `"cmd_vel"`.
    fn id(&self) -> &str;

    /// Hand `command` to the actuator.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::CommandSinkUnavailable`] if the command cannot
    /// be accepted without waiting.
    fn send(&mut self, command: Command) -> Result<(), SafetyError>;
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn send(&mut self, command: Command) -> Result<(), SafetyError> {
        (**self).send(command)
    }
}
