//! Prometheus metrics exporter for the authorization gate.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `face_gate_session_phase` - Current phase (0=idle, 1=streaming, 2=authorized, 3=handing off)
//! - `face_gate_source_open` - Whether the camera stream is open
//! - `face_gate_fps` - Frame rate at the last processed frame
//!
//! ## Frame Metrics
//! - `face_gate_frames_processed_total` - Frames classified and displayed
//! - `face_gate_read_failures_total` - Failed frame reads
//! - `face_gate_open_failures_total` - Failed camera opens
//!
//! ## Authorization Metrics
//! - `face_gate_authorizations_total` - Successful authorizations
//! - `face_gate_handoffs_total` - Hand-offs to the successor screen
//!
//! The registry is always available; the HTTP endpoint (`/metrics` and a
//! session-aware `/health`) needs the `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, ServerError};
