//! `safeguard-middleware` – The Plumbing
//!
//! Moves data between the sensor intake, the supervisor, and external
//! observers without caring about its meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless broadcast bus carrying the supervisor's
//!   [`DiagnosticEvent`][safeguard_types::DiagnosticEvent] stream (the
//!   transition log).
//! - [`slots`] – Latest-sample slots: one overwrite-only cell per sensor
//!   stream, built on Tokio `watch` channels.

pub mod bus;
pub mod slots;

pub use bus::{EventBus, SourceSubscriber};
pub use slots::{LatestSlot, SampleSlots, SlotReader};
