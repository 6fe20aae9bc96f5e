//! [`SafetySupervisor`] – the reactive safety state machine.
//!
//! Holds the current [`SupervisorState`] and turns the latest sensor samples
//! into exactly one velocity [`Command`] per evaluation tick.
//!
//! # Transition table
//!
//! | Current | Trigger | Next | Command |
//! |---|---|---|---|
//! | `Idle` | [`activate`][SafetySupervisor::activate] | `Monitoring` | none |
//! | `Idle` | tick | `Idle` | none |
//! | `Monitoring` | `Collision` | `Monitoring` | stop |
//! | `Monitoring` | `LowBattery` | `Rotating` | rotate |
//! | `Monitoring` | `Normal` | `Monitoring` | stop |
//! | `Rotating` | any | `Monitoring` | stop |
//! | any | [`halt`][SafetySupervisor::halt] | `Stopped` | stop |
//! | `Stopped` | tick | `Stopped` | stop |
//!
//! The command always belongs to the state being entered, so the recovery
//! rotation is issued exactly once: on the tick that enters `Rotating`.
//! Simultaneous hazards are resolved by the
//! [`HazardEvaluator`] (collision first), never by table order.
//!
//! # Tick
//!
//! 1. **Read** – copy the latest battery and scan samples.  Never waits.
//! 2. **Classify** – [`HazardEvaluator::classify`].
//! 3. **Transition** – apply the table above.
//! 4. **Act** – hand one command to the [`CommandSink`].  An unavailable
//!    sink is logged and the loop moves on; the next tick retries with a
//!    fresh command.
//! 5. **Log** – publish the classification, transition and command outcome
//!    on the [`EventBus`].
//!
//! # Example
//!
//! ```rust
//! use safeguard_hal::SimDriveBase;
//! use safeguard_middleware::{EventBus, SampleSlots};
//! use safeguard_runtime::{SafetySupervisor, SensorIntake, SupervisorConfig};
//! use safeguard_types::{Command, SupervisorState};
//!
//! let slots = SampleSlots::new();
//! let bus = EventBus::default();
//! let (base, handle) = SimDriveBase::new("sim_base");
//! let mut supervisor =
//!     SafetySupervisor::new(SupervisorConfig::default(), &slots, Box::new(base), bus.clone());
//! let intake = SensorIntake::new(slots, bus);
//!
//! supervisor.activate();
//! intake.submit_battery(20.0).unwrap();
//!
//! let report = supervisor.tick();
//! assert_eq!(report.to, SupervisorState::Rotating);
//! assert_eq!(handle.last_command(), Some(Command::rotate(0.5)));
//! ```

use std::time::Duration;

use safeguard_hal::CommandSink;
use safeguard_kernel::HazardEvaluator;
use safeguard_middleware::{EventBus, SampleSlots, SlotReader};
use safeguard_types::{
    BatteryLevel, Command, DiagnosticEvent, DiagnosticKind, HazardClassification, ProximityScan,
    SafetyConfig, SafetyError, SupervisorState,
};
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const SOURCE: &str = "safeguard-runtime::supervisor";

/// Default period of timer-driven evaluation ticks.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`SafetySupervisor`].
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    /// Hazard thresholds and rotation speed.
    pub safety: SafetyConfig,
    /// Period of the evaluation timer used by [`SafetySupervisor::run`].
    /// Sample arrivals trigger additional ticks in between.
    pub tick_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            safety: SafetyConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TickReport
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one evaluation tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub from: SupervisorState,
    pub to: SupervisorState,
    /// `None` when no classification was made (`Idle`, `halt`).
    pub classification: Option<HazardClassification>,
    /// The command produced for the new state, if any.
    pub command: Option<Command>,
    /// Whether the sink accepted `command`.
    pub delivered: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// SafetySupervisor
// ─────────────────────────────────────────────────────────────────────────────

/// The safety state machine.
///
/// Owns its state exclusively.  Shared collaborators (sample slots, command
/// sink, diagnostic bus) are handed in at construction.
pub struct SafetySupervisor {
    config: SupervisorConfig,
    evaluator: HazardEvaluator,
    state: SupervisorState,
    battery: SlotReader<BatteryLevel>,
    proximity: SlotReader<ProximityScan>,
    sink: Box<dyn CommandSink>,
    bus: EventBus,
    /// Previous verdict, used only to log hazard edges instead of every tick.
    last_classification: Option<HazardClassification>,
}

impl SafetySupervisor {
    /// Build a supervisor in the `Idle` state.
    pub fn new(
        config: SupervisorConfig,
        slots: &SampleSlots,
        sink: Box<dyn CommandSink>,
        bus: EventBus,
    ) -> Self {
        let evaluator = HazardEvaluator::new(&config.safety);
        Self {
            config,
            evaluator,
            state: SupervisorState::Idle,
            battery: slots.battery.reader(),
            proximity: slots.proximity.reader(),
            sink,
            bus,
            last_classification: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Activation / shutdown
    // -------------------------------------------------------------------------

    /// Apply the one-shot activation signal: `Idle` → `Monitoring`.
    ///
    /// Emits no command.  Returns `false` (and changes nothing) when the
    /// supervisor has already left `Idle`.
    pub fn activate(&mut self) -> bool {
        if self.state != SupervisorState::Idle {
            warn!(state = %self.state, "activation ignored; supervisor already active");
            return false;
        }
        self.enter(SupervisorState::Monitoring, None);
        info!("safety supervisor activated");
        true
    }

    /// Enter the terminal `Stopped` state and emit a final stop.
    pub fn halt(&mut self) -> TickReport {
        let from = self.state;
        self.enter(SupervisorState::Stopped, None);
        let command = Command::stop();
        let delivered = self.emit(command);
        info!(from = %from, delivered, "safety supervisor halted");
        TickReport {
            from,
            to: SupervisorState::Stopped,
            classification: None,
            command: Some(command),
            delivered,
        }
    }

    // -------------------------------------------------------------------------
    // Evaluation tick
    // -------------------------------------------------------------------------

    /// Run one evaluation tick.
    pub fn tick(&mut self) -> TickReport {
        let from = self.state;

        let classification = match from {
            SupervisorState::Idle => {
                debug!("tick while idle; waiting for activation");
                return TickReport {
                    from,
                    to: from,
                    classification: None,
                    command: None,
                    delivered: false,
                };
            }
            SupervisorState::Stopped => None,
            SupervisorState::Monitoring | SupervisorState::Rotating => Some(self.classify()),
        };

        let to = match classification {
            Some(c) => Self::next_state(from, c),
            None => from,
        };
        self.enter(to, classification);

        let command = self.command_for(to);
        let delivered = match command {
            Some(cmd) => self.emit(cmd),
            None => false,
        };

        TickReport {
            from,
            to,
            classification,
            command,
            delivered,
        }
    }

    /// Pure transition function for classification-driven ticks.
    pub fn next_state(
        from: SupervisorState,
        classification: HazardClassification,
    ) -> SupervisorState {
        match (from, classification) {
            (SupervisorState::Monitoring, HazardClassification::LowBattery) => {
                SupervisorState::Rotating
            }
            (SupervisorState::Monitoring, _) => SupervisorState::Monitoring,
            (SupervisorState::Rotating, _) => SupervisorState::Monitoring,
            (SupervisorState::Idle, _) => SupervisorState::Idle,
            (SupervisorState::Stopped, _) => SupervisorState::Stopped,
        }
    }

    /// The command that belongs to `state`.
    fn command_for(&self, state: SupervisorState) -> Option<Command> {
        match state {
            SupervisorState::Idle => None,
            SupervisorState::Monitoring | SupervisorState::Stopped => Some(Command::stop()),
            SupervisorState::Rotating => Some(Command::rotate(
                self.config.safety.rotation_angular_velocity,
            )),
        }
    }

    // -------------------------------------------------------------------------
    // Async loop
    // -------------------------------------------------------------------------

    /// Drive ticks until `shutdown` turns `true` (or its sender is dropped),
    /// then [`halt`][Self::halt] and hand the supervisor back.
    ///
    /// A tick runs whenever either sample slot is written and on every
    /// `tick_interval`.  Missed timer ticks are skipped, not bunched.  If a
    /// slot's writers all go away its branch is disabled and the timer keeps
    /// the loop alive.
    ///
    /// `activation`, when given, is the operator's one-shot activation
    /// trigger; firing it calls [`activate`][Self::activate].  Pass `None`
    /// when the supervisor was activated before the loop started.
    pub async fn run(
        mut self,
        mut activation: Option<oneshot::Receiver<()>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let period = self.config.tick_interval.max(MIN_TICK_INTERVAL);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut battery_open = true;
        let mut proximity_open = true;

        info!(
            tick_interval_ms = period.as_millis() as u64,
            "safety supervisor loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                res = async {
                    match activation.as_mut() {
                        Some(rx) => rx.await,
                        None => std::future::pending().await,
                    }
                }, if activation.is_some() => {
                    activation = None;
                    match res {
                        Ok(()) => {
                            self.activate();
                        }
                        Err(_) => warn!("activation trigger dropped before firing"),
                    }
                    continue;
                }
                res = self.battery.changed(), if battery_open => {
                    if let Err(e) = res {
                        warn!(error = %e, "battery stream closed; continuing on timer");
                        battery_open = false;
                        continue;
                    }
                }
                res = self.proximity.changed(), if proximity_open => {
                    if let Err(e) = res {
                        warn!(error = %e, "proximity stream closed; continuing on timer");
                        proximity_open = false;
                        continue;
                    }
                }
                _ = interval.tick() => {}
            }

            self.tick();
        }

        self.halt();
        self
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    fn classify(&mut self) -> HazardClassification {
        let battery = self.battery.latest_and_mark_seen();
        let scan = self.proximity.latest_and_mark_seen();
        let classification = self.evaluator.classify(battery.as_ref(), scan.as_ref());

        if self.last_classification != Some(classification) {
            match classification {
                HazardClassification::Collision => warn!(
                    min_range = ?scan.as_ref().and_then(HazardEvaluator::min_range),
                    threshold = self.evaluator.collision_threshold(),
                    "collision detected; holding base"
                ),
                HazardClassification::LowBattery => warn!(
                    percent = ?battery.as_ref().map(|b| b.percent),
                    threshold = self.evaluator.battery_threshold(),
                    "low battery detected"
                ),
                HazardClassification::Normal => info!("no hazard"),
            }
        }
        self.last_classification = Some(classification);

        self.publish(DiagnosticKind::Classified { classification });
        classification
    }

    /// Record and log a transition (self-transitions included).
    fn enter(&mut self, to: SupervisorState, classification: Option<HazardClassification>) {
        let from = self.state;
        self.state = to;
        if from != to {
            info!(from = %from, to = %to, classification = ?classification, "state transition");
        } else {
            debug!(state = %to, classification = ?classification, "self-transition");
        }
        self.publish(DiagnosticKind::Transition { from, to });
    }

    /// Hand `command` to the sink.  Returns whether it was accepted.
    fn emit(&mut self, command: Command) -> bool {
        match self.sink.send(command) {
            Ok(()) => {
                debug!(
                    sink = self.sink.id(),
                    linear = command.linear_velocity,
                    angular = command.angular_velocity,
                    "command issued"
                );
                self.publish(DiagnosticKind::CommandIssued(command));
                true
            }
            Err(e) => {
                warn!(sink = self.sink.id(), error = %e, "command not delivered; retrying next tick");
                let reason = match e {
                    SafetyError::CommandSinkUnavailable(msg) => msg,
                    other => other.to_string(),
                };
                self.publish(DiagnosticKind::CommandDropped { command, reason });
                false
            }
        }
    }

    fn publish(&self, kind: DiagnosticKind) {
        // Best-effort publish – no subscribers is not an error.
        let _ = self.bus.publish(DiagnosticEvent::new(SOURCE, kind));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
