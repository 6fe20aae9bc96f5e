//! `safeguard-runtime` – The Supervisor
//!
//! The reactive part of SafeGuard: it holds the state machine, reads the
//! latest samples, and drives the base.
//!
//! # Modules
//!
//! - [`supervisor`] – [`SafetySupervisor`][supervisor::SafetySupervisor]:
//!   the priority state machine (`IDLE` → `MONITOR_BATTERY_COLLISION` ⇄
//!   `ROTATE_BASE`).  Each evaluation tick classifies the latest samples
//!   through the [`HazardEvaluator`][safeguard_kernel::HazardEvaluator],
//!   transitions, hands exactly one command to the
//!   [`CommandSink`][safeguard_hal::CommandSink], and publishes the
//!   transition log on the [`EventBus`][safeguard_middleware::EventBus].
//!   [`SafetySupervisor::run`][supervisor::SafetySupervisor::run] drives
//!   ticks from sample arrival and a timer until shutdown.
//! - [`intake`] – [`SensorIntake`][intake::SensorIntake]: the sensor
//!   callback surface.  Validates each sample and overwrites the latest
//!   slot of its stream; malformed samples are logged and discarded.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod intake;
pub mod supervisor;
pub mod telemetry;

pub use intake::SensorIntake;
pub use supervisor::{SafetySupervisor, SupervisorConfig, TickReport};
pub use telemetry::{init_tracing, TracerProviderGuard};
