//! Camera input and frame handling.
//!
//! This module provides the capture source abstraction the session
//! controller pulls frames from, the frame type passed through the
//! recognition pipeline, and the gate's configuration.

mod camera;
mod config;
mod frame;
#[cfg(feature = "rtsp")]
mod gst;
mod stream;

pub use camera::{CaptureError, CaptureSource, SyntheticSource, STUB_OFFLINE_URI, STUB_SCHEME};
pub use config::{
    CameraConfig, ConfigError, FileConfig, FpsConfig, MetricsConfig, SessionConfig,
};
pub use frame::{Frame, Overlay};
#[cfg(feature = "rtsp")]
pub use gst::GstSource;
pub use stream::StreamSource;
