//! Capture source abstraction.
//!
//! This module provides a trait-based abstraction over live video streams,
//! allowing network cameras, local devices and synthetic sources to be
//! swapped behind the session controller.

use super::Frame;
use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The stream could not be opened.
    #[error("unable to access stream {uri}: {reason}")]
    SourceUnavailable {
        /// Address that was tried.
        uri: String,
        /// Backend's explanation.
        reason: String,
    },
    /// An open stream failed to deliver a frame.
    #[error("failed to read frame: {0}")]
    ReadFailure(String),
    /// A read was attempted with no stream open.
    #[error("capture source is not open")]
    NotOpen,
}

impl CaptureError {
    pub(crate) fn unavailable(uri: &str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}

/// Trait for capture source implementations.
///
/// A source holds at most one open stream at a time. The session controller
/// owns its source exclusively and never reads from it while closed.
pub trait CaptureSource: Send {
    /// Connects to the stream at `uri`. A no-op if already open.
    fn open(&mut self, uri: &str) -> Result<(), CaptureError>;

    /// Blocks until the next frame is decoded or the stream fails.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Checks if the source currently holds an open stream.
    fn is_open(&self) -> bool;

    /// Releases the stream. Safe to call when already closed.
    fn close(&mut self);

    /// Address of the open stream, if any.
    fn uri(&self) -> Option<&str>;
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn open(&mut self, uri: &str) -> Result<(), CaptureError> {
        (**self).open(uri)
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        (**self).read_frame()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn uri(&self) -> Option<&str> {
        (**self).uri()
    }
}

/// URI scheme served by [`SyntheticSource`].
pub const STUB_SCHEME: &str = "stub://";

/// Address that [`SyntheticSource`] always refuses, standing in for an unreachable camera.
pub const STUB_OFFLINE_URI: &str = "stub://offline";

/// Synthetic source that generates deterministic RGB frames.
///
/// Accepts `stub://` addresses only. [`STUB_OFFLINE_URI`] refuses to open,
/// and an optional frame limit makes the stream end after that many frames.
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    uri: Option<String>,
    sequence: u64,
    frame_limit: Option<u64>,
    opens: u64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::with_dimensions(64, 48)
    }
}

impl SyntheticSource {
    /// Creates a closed 320x240 source with no frame limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source producing frames of the given size.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            uri: None,
            sequence: 0,
            frame_limit: None,
            opens: 0,
        }
    }

    /// Ends the stream after `limit` frames; later reads fail.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Number of frames delivered since the last open.
    pub fn frames_delivered(&self) -> u64 {
        self.sequence
    }

    /// Number of times a stream was actually established.
    pub fn open_count(&self) -> u64 {
        self.opens
    }
}

impl CaptureSource for SyntheticSource {
    fn open(&mut self, uri: &str) -> Result<(), CaptureError> {
        if self.uri.is_some() {
            return Ok(());
        }
        if !uri.starts_with(STUB_SCHEME) {
            return Err(CaptureError::unavailable(uri, "synthetic source only serves stub:// addresses"));
        }
        if uri == STUB_OFFLINE_URI {
            return Err(CaptureError::unavailable(uri, "connection refused"));
        }

        self.uri = Some(uri.to_string());
        self.sequence = 0;
        self.opens += 1;
        tracing::info!(uri, "SyntheticSource opened");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.uri.is_none() {
            return Err(CaptureError::NotOpen);
        }
        if self.frame_limit.is_some_and(|limit| self.sequence >= limit) {
            return Err(CaptureError::ReadFailure("end of stream".into()));
        }

        let byte_count = rgb_len(self.width, self.height);
        let pixels: Vec<u8> = (0..byte_count)
            .map(|i| ((i as u64 + self.sequence) % 256) as u8)
            .collect();

        self.sequence += 1;
        Ok(Frame::new(pixels, self.width, self.height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.uri.is_some()
    }

    fn close(&mut self) {
        if self.uri.take().is_some() {
            tracing::info!("SyntheticSource closed");
        }
    }

    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

fn rgb_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(3)
}
