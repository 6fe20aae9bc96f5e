//! `safeguard-hal` – The Actuator Boundary
//!
//! The supervisor never talks to motor controllers directly.  It hands every
//! [`Command`][safeguard_types::Command] to a [`CommandSink`], and drivers
//! implement that trait.
//!
//! # Modules
//!
//! - [`sink`] – the [`CommandSink`] trait.
//! - [`channel`] – [`ChannelSink`]: forwards commands over a bounded Tokio
//!   channel to whatever task owns the real `/cmd_vel` publisher.
//! - [`sim`] – [`SimDriveBase`]: an in-process drive base that records
//!   commands, for tests and headless runs.

pub mod channel;
pub mod sim;
pub mod sink;

pub use channel::ChannelSink;
pub use sim::{SimDriveBase, SimDriveHandle};
pub use sink::CommandSink;
