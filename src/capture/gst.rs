//! GStreamer-backed capture for network cameras and local devices.
//!
//! `rtsp://` and `rtsps://` addresses are decoded through
//! `rtspsrc ! decodebin`, `device://N` through `v4l2src device=/dev/videoN`.
//! Both end in an RGB appsink that keeps only the newest buffer, so a slow
//! consumer sees the latest frame instead of a growing backlog.
//!
//! The stream address is set as the `location` property of `rtspsrc` after
//! the pipeline is built and never becomes part of the launch description.

use super::{CaptureError, CaptureSource, Frame};
use gstreamer::prelude::*;
use std::time::Duration;

/// Capture source driving a GStreamer pipeline.
pub struct GstSource {
    read_timeout: Duration,
    connect_timeout: Duration,
    stream: Option<GstStream>,
    sequence: u64,
}

struct GstStream {
    uri: String,
    pipeline: gstreamer::Pipeline,
    appsink: gstreamer_app::AppSink,
}

impl GstSource {
    /// Creates a closed source.
    ///
    /// `open` fails if the pipeline has not started playing within
    /// `connect_timeout`; each read gives up after `read_timeout`.
    pub fn new(read_timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            read_timeout,
            connect_timeout,
            stream: None,
            sequence: 0,
        }
    }

    /// Returns true if this backend understands the address.
    pub fn supports(uri: &str) -> bool {
        Input::classify(uri).is_some()
    }
}

fn clock_time(duration: Duration) -> gstreamer::ClockTime {
    gstreamer::ClockTime::from_mseconds(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Name of the `rtspsrc` element inside the pipeline.
const RTSP_ELEMENT: &str = "camera";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Rtsp,
    Device(u32),
}

impl Input {
    fn classify(uri: &str) -> Option<Self> {
        if uri.starts_with("rtsp://") || uri.starts_with("rtsps://") {
            return Some(Input::Rtsp);
        }
        let index = uri.strip_prefix("device://")?.parse::<u32>().ok()?;
        Some(Input::Device(index))
    }

    fn pipeline_description(self) -> String {
        const SINK: &str = "videoconvert ! video/x-raw,format=RGB ! \
                            appsink name=appsink sync=false max-buffers=1 drop=true";

        match self {
            Input::Rtsp => format!("rtspsrc name={RTSP_ELEMENT} latency=0 ! decodebin ! {SINK}"),
            Input::Device(index) => format!("v4l2src device=/dev/video{index} ! {SINK}"),
        }
    }
}

/// Decides whether a pipeline that was asked to play has actually started.
///
/// A change still in progress after the connect timeout means the camera
/// never answered, which counts as unreachable.
fn settle_outcome(
    change: Result<gstreamer::StateChangeSuccess, gstreamer::StateChangeError>,
    current: gstreamer::State,
) -> Result<(), String> {
    match change {
        Err(_) => Err("pipeline refused to start".to_string()),
        Ok(gstreamer::StateChangeSuccess::Async) => {
            Err("no response from camera before connect timeout".to_string())
        }
        Ok(_) if matches!(current, gstreamer::State::Paused | gstreamer::State::Playing) => Ok(()),
        Ok(_) => Err(format!("pipeline stuck in {current:?}")),
    }
}

fn build_stream(uri: &str) -> Result<GstStream, CaptureError> {
    gstreamer::init().map_err(|e| CaptureError::unavailable(uri, e.to_string()))?;

    let input = Input::classify(uri)
        .ok_or_else(|| CaptureError::unavailable(uri, "unsupported stream address"))?;

    let pipeline = gstreamer::parse::launch(&input.pipeline_description())
        .map_err(|e| CaptureError::unavailable(uri, format!("build pipeline: {e}")))?
        .downcast::<gstreamer::Pipeline>()
        .map_err(|_| CaptureError::unavailable(uri, "pipeline is not a Pipeline"))?;

    let appsink = pipeline
        .by_name("appsink")
        .ok_or_else(|| CaptureError::unavailable(uri, "appsink element missing from pipeline"))?
        .downcast::<gstreamer_app::AppSink>()
        .map_err(|_| CaptureError::unavailable(uri, "appsink element has unexpected type"))?;

    if input == Input::Rtsp {
        pipeline
            .by_name(RTSP_ELEMENT)
            .ok_or_else(|| CaptureError::unavailable(uri, "rtspsrc element missing from pipeline"))?
            .set_property("location", uri);
    }

    let caps = gstreamer::Caps::builder("video/x-raw")
        .field("format", "RGB")
        .build();
    appsink.set_caps(Some(&caps));

    Ok(GstStream {
        uri: uri.to_string(),
        pipeline,
        appsink,
    })
}

impl CaptureSource for GstSource {
    fn open(&mut self, uri: &str) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = build_stream(uri)?;
        let started = stream
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CaptureError::unavailable(uri, format!("start pipeline: {e}")));
        if let Err(e) = started {
            let _ = stream.pipeline.set_state(gstreamer::State::Null);
            return Err(e);
        }

        // Wait for the connection to settle so an unreachable camera fails here, not on read.
        let (change, current, _) = stream.pipeline.state(clock_time(self.connect_timeout));
        let settled = match stream.pending_error() {
            Some(reason) => Err(reason),
            None => settle_outcome(change, current),
        };
        if let Err(reason) = settled {
            let _ = stream.pipeline.set_state(gstreamer::State::Null);
            return Err(CaptureError::unavailable(uri, reason));
        }

        tracing::info!(uri, "GStreamer source opened");
        self.sequence = 0;
        self.stream = Some(stream);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let timeout = clock_time(self.read_timeout);
        let stream = self.stream.as_ref().ok_or(CaptureError::NotOpen)?;

        if let Some(reason) = stream.pending_error() {
            return Err(CaptureError::ReadFailure(reason));
        }

        let sample = stream
            .appsink
            .try_pull_sample(timeout)
            .ok_or_else(|| CaptureError::ReadFailure("stream stalled".into()))?;

        let (pixels, width, height) = sample_to_pixels(&sample)?;
        self.sequence += 1;
        Ok(Frame::new(pixels, width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pipeline.set_state(gstreamer::State::Null) {
                tracing::warn!(uri = %stream.uri, error = %e, "Failed to stop pipeline");
            }
            tracing::info!(uri = %stream.uri, "GStreamer source closed");
        }
    }

    fn uri(&self) -> Option<&str> {
        self.stream.as_ref().map(|s| s.uri.as_str())
    }
}

impl Drop for GstSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl GstStream {
    /// Drains the bus and reports the first error or end-of-stream.
    fn pending_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        while let Some(message) = bus.pop() {
            use gstreamer::MessageView;
            match message.view() {
                MessageView::Error(err) => {
                    return Some(format!(
                        "gstreamer error from {:?}: {}",
                        err.src().map(|s| s.path_string()),
                        err.error()
                    ));
                }
                MessageView::Eos(..) => return Some("end of stream".to_string()),
                _ => {}
            }
        }
        None
    }
}

fn sample_to_pixels(sample: &gstreamer::Sample) -> Result<(Vec<u8>, u32, u32), CaptureError> {
    let read_failure = |what: &str| CaptureError::ReadFailure(what.to_string());

    let buffer = sample.buffer().ok_or_else(|| read_failure("sample missing buffer"))?;
    let caps = sample.caps().ok_or_else(|| read_failure("sample missing caps"))?;
    let info = gstreamer_video::VideoInfo::from_caps(caps)
        .map_err(|e| CaptureError::ReadFailure(format!("parse caps: {e}")))?;

    let width = info.width();
    let height = info.height();
    let row_bytes = (width as usize) * 3;
    let stride = info.stride()[0] as usize;

    let map = buffer
        .map_readable()
        .map_err(|e| CaptureError::ReadFailure(format!("map buffer: {e}")))?;
    let data = map.as_slice();

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .ok_or_else(|| read_failure("buffer row is out of bounds"))?,
        );
    }

    Ok((pixels, width, height))
}
