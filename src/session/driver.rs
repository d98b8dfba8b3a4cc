//! Event loop that turns the session's timers into calls on the controller.
//!
//! Host commands, frame pump ticks and the hand-off deadline are
//! multiplexed in one `select!` loop on a single task, so controller
//! transitions never overlap. Commands are polled first: a stop or reset
//! that is already queued wins over a tick or hand-off that is due at the
//! same moment.

use super::controller::{SessionController, SessionSnapshot};
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Requests a host can make of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// The screen became visible: reset, then start streaming.
    Activate,
    /// Manual "start recognition" action.
    StartRecognition,
    /// Release the camera and cancel both timers.
    Stop,
    /// Stop and restore the screen's initial look.
    Reset,
    /// Reset and end the event loop.
    Shutdown,
}

/// The driver has exited and no longer accepts commands.
#[derive(Debug, Error)]
#[error("session driver has shut down")]
pub struct DriverClosed;

/// Cloneable handle for steering a running [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queues a command. Never blocks, so it is safe from signal handlers and host callbacks.
    pub fn send(&self, command: SessionCommand) -> Result<(), DriverClosed> {
        self.commands.send(command).map_err(|_| DriverClosed)
    }

    /// Queues [`SessionCommand::Activate`].
    pub fn activate(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::Activate)
    }

    /// Queues [`SessionCommand::StartRecognition`].
    pub fn start_recognition(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::StartRecognition)
    }

    /// Queues [`SessionCommand::Stop`].
    pub fn stop(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::Stop)
    }

    /// Queues [`SessionCommand::Reset`].
    pub fn reset(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::Reset)
    }

    /// Queues [`SessionCommand::Shutdown`].
    pub fn shutdown(&self) -> Result<(), DriverClosed> {
        self.send(SessionCommand::Shutdown)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified after every handled event.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Runs a [`SessionController`] against real (or paused) tokio time.
pub struct SessionDriver {
    controller: SessionController,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl SessionDriver {
    /// Wraps an idle controller. Nothing happens until the driver runs and a command arrives.
    pub fn new(controller: SessionController) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let driver = Self {
            controller,
            commands: command_rx,
            snapshots: snapshot_tx,
            metrics: None,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (driver, handle)
    }

    /// Mirrors the session's counters into `registry` after every event.
    pub fn with_metrics(mut self, registry: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Runs until [`SessionCommand::Shutdown`] or until every handle is dropped.
    ///
    /// The session is reset on the way out, and the controller is handed back.
    pub async fn run(self) -> SessionController {
        let SessionDriver {
            mut controller,
            mut commands,
            snapshots,
            metrics,
        } = self;

        let publish = |controller: &SessionController| {
            snapshots.send_replace(controller.snapshot());
            if let Some(registry) = &metrics {
                registry.update(&MetricsSnapshot::from_controller(controller));
            }
        };

        let period = controller.pump_interval();
        let mut pump = time::interval_at(Instant::now() + period, period);
        pump.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pump_generation = controller.pump_generation();

        tracing::debug!(period_ms = period.as_millis() as u64, "Session driver started");
        publish(&controller);

        loop {
            if controller.pump_generation() != pump_generation {
                pump_generation = controller.pump_generation();
                pump.reset();
            }
            let pump_armed = controller.pump_armed();
            let handoff_at = controller.handoff_deadline();
            let handoff_armed = handoff_at.is_some();
            let deadline = handoff_at.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                command = commands.recv() => {
                    match command {
                        Some(SessionCommand::Activate) => controller.activate(),
                        Some(SessionCommand::StartRecognition) => controller.start_recognition(),
                        Some(SessionCommand::Stop) => controller.stop(),
                        Some(SessionCommand::Reset) => controller.reset(),
                        Some(SessionCommand::Shutdown) | None => break,
                    }
                }
                _ = time::sleep_until(deadline), if handoff_armed => {
                    controller.complete_handoff();
                }
                _ = pump.tick(), if pump_armed => {
                    controller.tick();
                }
            }

            publish(&controller);
        }

        controller.reset();
        publish(&controller);
        tracing::debug!("Session driver stopped");
        controller
    }
}
