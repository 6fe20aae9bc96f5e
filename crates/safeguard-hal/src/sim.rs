//! In-process simulated drive base for CI testing without physical hardware.
//!
//! [`SimDriveBase`] records every command it accepts.  A shared
//! [`SimDriveHandle`] lets a test inspect the recording and inject outages
//! while the sink itself is owned by the supervisor.
//!
//! # Example
//!
//! ```rust
//! use safeguard_hal::{CommandSink, SimDriveBase};
//! use safeguard_types::Command;
//!
//! let (mut base, handle) = SimDriveBase::new("sim_base");
//! base.send(Command::rotate(0.5)).expect("sim drive must succeed");
//!
//! handle.set_available(false);
//! assert!(base.send(Command::stop()).is_err());
//! assert_eq!(handle.commands(), vec![Command::rotate(0.5)]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use safeguard_types::{Command, SafetyError};
use tracing::debug;

use crate::sink::CommandSink;

// ────────────────────────────────────────────────────────────────────────────
// Shared state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct SimState {
    available: bool,
    commands: Vec<Command>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    // A poisoned lock only means a test panicked mid-update.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// SimDriveBase
// ────────────────────────────────────────────────────────────────────────────

/// A simulated differential-drive base.  Succeeds unless an outage has been
/// injected through its [`SimDriveHandle`].
pub struct SimDriveBase {
    id: String,
    state: Arc<Mutex<SimState>>,
}

impl SimDriveBase {
    /// Create a base and the handle used to observe it.
    pub fn new(id: impl Into<String>) -> (Self, SimDriveHandle) {
        let state = Arc::new(Mutex::new(SimState {
            available: true,
            commands: Vec::new(),
        }));
        (
            Self {
                id: id.into(),
                state: Arc::clone(&state),
            },
            SimDriveHandle { state },
        )
    }
}

impl CommandSink for SimDriveBase {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&mut self, command: Command) -> Result<(), SafetyError> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(SafetyError::CommandSinkUnavailable(format!(
                "{}: simulated outage",
                self.id
            )));
        }
        state.commands.push(command);
        debug!(
            sink = %self.id,
            linear = command.linear_velocity,
            angular = command.angular_velocity,
            "sim drive accepted command"
        );
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimDriveHandle
// ────────────────────────────────────────────────────────────────────────────

/// Observer / fault-injection handle for a [`SimDriveBase`].
#[derive(Clone)]
pub struct SimDriveHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimDriveHandle {
    /// Every command accepted so far, in delivery order.
    pub fn commands(&self) -> Vec<Command> {
        lock(&self.state).commands.clone()
    }

    /// Most recently accepted command.
    pub fn last_command(&self) -> Option<Command> {
        lock(&self.state).commands.last().copied()
    }

    /// Simulate the actuator link going down (`false`) or recovering.
    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }
}
