//! Metrics collection and registry.

use crate::session::{Phase, SessionController, SessionStats};
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed inside prometheus.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for metrics update.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Current session phase.
    pub phase: Phase,
    /// Whether the capture source holds an open stream.
    pub source_open: bool,
    /// Running totals of the session.
    pub stats: SessionStats,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            source_open: false,
            stats: SessionStats::default(),
        }
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of a controller.
    pub fn from_controller(controller: &SessionController) -> Self {
        Self {
            phase: controller.phase(),
            source_open: controller.source_open(),
            stats: controller.stats().clone(),
        }
    }
}

/// Prometheus metrics registry for the authorization gate.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    session_phase: IntGauge,
    source_open: IntGauge,
    fps: Gauge,

    // Frame metrics
    frames_processed: IntCounter,
    read_failures: IntCounter,
    open_failures: IntCounter,

    // Authorization metrics
    authorizations: IntCounter,
    handoffs: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all gate metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_phase = IntGauge::new(
            "face_gate_session_phase",
            "Current session phase (0=idle, 1=streaming, 2=authorized, 3=handing off)",
        )?;
        let source_open = IntGauge::new(
            "face_gate_source_open",
            "Whether the capture source holds an open stream (1=open, 0=closed)",
        )?;
        let fps = Gauge::new("face_gate_fps", "Frame rate at the last processed frame")?;

        let frames_processed = IntCounter::new(
            "face_gate_frames_processed_total",
            "Total frames classified and displayed",
        )?;
        let read_failures = IntCounter::new(
            "face_gate_read_failures_total",
            "Total failed frame reads",
        )?;
        let open_failures = IntCounter::new(
            "face_gate_open_failures_total",
            "Total failed attempts to open the camera",
        )?;

        let authorizations = IntCounter::new(
            "face_gate_authorizations_total",
            "Total successful authorizations",
        )?;
        let handoffs = IntCounter::new(
            "face_gate_handoffs_total",
            "Total hand-offs to the successor screen",
        )?;

        registry.register(Box::new(session_phase.clone()))?;
        registry.register(Box::new(source_open.clone()))?;
        registry.register(Box::new(fps.clone()))?;
        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(read_failures.clone()))?;
        registry.register(Box::new(open_failures.clone()))?;
        registry.register(Box::new(authorizations.clone()))?;
        registry.register(Box::new(handoffs.clone()))?;

        Ok(Self {
            registry,
            session_phase,
            source_open,
            fps,
            frames_processed,
            read_failures,
            open_failures,
            authorizations,
            handoffs,
        })
    }

    /// Updates all metrics from a snapshot of session state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.session_phase.set(snapshot.phase.code());
        self.source_open.set(i64::from(snapshot.source_open));
        self.fps.set(snapshot.stats.last_fps);

        // Counters only move forward, by the difference from what was last seen
        advance(&self.frames_processed, snapshot.stats.frames_processed);
        advance(&self.read_failures, snapshot.stats.read_failures);
        advance(&self.open_failures, snapshot.stats.open_failures);
        advance(&self.authorizations, snapshot.stats.authorizations);
        advance(&self.handoffs, snapshot.stats.handoffs);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
