//! Capture source selected by the stream address scheme.

use super::{CameraConfig, CaptureError, CaptureSource, Frame, SyntheticSource, STUB_SCHEME};
use std::time::Duration;

/// Capture source that picks a backend when it is opened.
///
/// `stub://` is always served by [`SyntheticSource`]. Network (`rtsp://`,
/// `rtsps://`) and local (`device://N`) cameras need the `rtsp` feature;
/// without it, opening them fails with [`CaptureError::SourceUnavailable`].
pub struct StreamSource {
    read_timeout: Duration,
    connect_timeout: Duration,
    backend: Option<Backend>,
}

enum Backend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "rtsp")]
    Gst(super::GstSource),
}

impl StreamSource {
    /// Creates a closed source.
    ///
    /// Where the backend supports it, opening gives up after
    /// `connect_timeout` and each read after `read_timeout`.
    pub fn new(read_timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            read_timeout,
            connect_timeout,
            backend: None,
        }
    }

    /// Creates a closed source with the timeouts of a camera configuration.
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.read_timeout(), config.connect_timeout())
    }

    fn backend_for(&self, uri: &str) -> Result<Backend, CaptureError> {
        if uri.starts_with(STUB_SCHEME) {
            return Ok(Backend::Synthetic(SyntheticSource::new()));
        }

        #[cfg(feature = "rtsp")]
        {
            if super::GstSource::supports(uri) {
                return Ok(Backend::Gst(super::GstSource::new(
                    self.read_timeout,
                    self.connect_timeout,
                )));
            }
            Err(CaptureError::unavailable(uri, "unsupported stream address"))
        }
        #[cfg(not(feature = "rtsp"))]
        {
            let _ = (self.read_timeout, self.connect_timeout);
            Err(CaptureError::unavailable(
                uri,
                "camera streams require the rtsp feature",
            ))
        }
    }

    fn source(&self) -> Option<&dyn CaptureSource> {
        match self.backend.as_ref()? {
            Backend::Synthetic(source) => Some(source as &dyn CaptureSource),
            #[cfg(feature = "rtsp")]
            Backend::Gst(source) => Some(source as &dyn CaptureSource),
        }
    }

    fn source_mut(&mut self) -> Option<&mut dyn CaptureSource> {
        match self.backend.as_mut()? {
            Backend::Synthetic(source) => Some(source as &mut dyn CaptureSource),
            #[cfg(feature = "rtsp")]
            Backend::Gst(source) => Some(source as &mut dyn CaptureSource),
        }
    }
}

impl CaptureSource for StreamSource {
    fn open(&mut self, uri: &str) -> Result<(), CaptureError> {
        if self.is_open() {
            return Ok(());
        }

        let mut backend = self.backend_for(uri)?;
        match &mut backend {
            Backend::Synthetic(source) => source.open(uri)?,
            #[cfg(feature = "rtsp")]
            Backend::Gst(source) => source.open(uri)?,
        }
        self.backend = Some(backend);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.source_mut()
            .ok_or(CaptureError::NotOpen)?
            .read_frame()
    }

    fn is_open(&self) -> bool {
        self.source().is_some_and(|s| s.is_open())
    }

    fn close(&mut self) {
        if let Some(source) = self.source_mut() {
            source.close();
        }
        self.backend = None;
    }

    fn uri(&self) -> Option<&str> {
        self.source()?.uri()
    }
}
