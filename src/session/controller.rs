//! The authorization session controller.
//!
//! Every transition is a synchronous method that runs to completion, so a
//! caller dispatching timer events one at a time can never observe a half
//! applied transition. The async [`SessionDriver`](super::SessionDriver)
//! is the usual caller.

use super::host::{HostContext, LogView, ScreenHost, SessionView, Status, STREAM_PLACEHOLDER};
use super::state::{Phase, SessionState};
use crate::capture::{CaptureError, CaptureSource, Frame, SessionConfig};
use crate::recognition::{
    Classifier, FpsEstimator, Identity, OverlayRenderer, PassthroughRenderer, RollingFps,
    FPS_TEXT_OFFSET,
};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Vertical position of the FPS readout, in pixels from the top.
const FPS_TEXT_TOP: u32 = 30;

/// What a single frame pump tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not streaming; nothing was read.
    Skipped,
    /// A frame was classified and displayed without authorizing anyone.
    Displayed,
    /// The read failed; the pump keeps running.
    ReadFailed,
    /// Too many reads failed in a row; the stream was released.
    StreamLost,
    /// The frame authorized this identity; the hand-off is armed.
    Authorized(Identity),
}

/// Running totals for one controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Frames classified and shown.
    pub frames_processed: u64,
    /// Reads that returned an error, including ones that ended the stream.
    pub read_failures: u64,
    /// Failed attempts to open the camera.
    pub open_failures: u64,
    /// Frames that authorized someone.
    pub authorizations: u64,
    /// Completed switches to the successor screen.
    pub handoffs: u64,
    /// FPS readout of the last shown frame.
    pub last_fps: f64,
}

/// Point-in-time summary published to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Last identity recognized by this screen.
    pub identity: Identity,
    /// Status line as shown.
    pub status: Status,
    /// Running totals.
    pub stats: SessionStats,
}

/// Owns the capture source and drives one authorization screen.
pub struct SessionController {
    config: SessionConfig,
    uri: String,
    source: Box<dyn CaptureSource>,
    classifier: Box<dyn Classifier>,
    renderer: Box<dyn OverlayRenderer>,
    fps: Box<dyn FpsEstimator>,
    view: Box<dyn SessionView>,
    host: Box<dyn ScreenHost>,
    context: HostContext,
    state: SessionState,
    identity: Identity,
    status: Status,
    stats: SessionStats,
    pump_generation: u64,
}

impl SessionController {
    /// Creates an idle controller.
    ///
    /// Frames are rendered with [`PassthroughRenderer`], timed with a
    /// default [`RollingFps`] and shown on a [`LogView`] until replaced
    /// with the `with_*` methods.
    pub fn new(
        uri: impl Into<String>,
        config: SessionConfig,
        source: impl CaptureSource + 'static,
        classifier: impl Classifier + 'static,
        context: HostContext,
        host: impl ScreenHost + 'static,
    ) -> Self {
        Self {
            config,
            uri: uri.into(),
            source: Box::new(source),
            classifier: Box::new(classifier),
            renderer: Box::new(PassthroughRenderer),
            fps: Box::new(RollingFps::default()),
            view: Box::new(LogView::new()),
            host: Box::new(host),
            context,
            state: SessionState::Idle,
            identity: Identity::unknown(),
            status: Status::WaitingForAuthorization,
            stats: SessionStats::default(),
            pump_generation: 0,
        }
    }

    /// Replaces the overlay renderer.
    pub fn with_renderer(mut self, renderer: impl OverlayRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replaces the FPS estimator.
    pub fn with_fps(mut self, fps: impl FpsEstimator + 'static) -> Self {
        self.fps = Box::new(fps);
        self
    }

    /// Replaces the view frames and status are shown on.
    pub fn with_view(mut self, view: impl SessionView + 'static) -> Self {
        self.view = Box::new(view);
        self
    }

    /// Current state, including timer anchors.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current phase without state data.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Last identity recognized by this screen.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Status line as last shown.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Running totals.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Context shared with the host.
    pub fn context(&self) -> &HostContext {
        &self.context
    }

    /// True while the capture source holds an open stream.
    pub fn source_open(&self) -> bool {
        self.source.is_open()
    }

    /// True while the frame pump should be ticking.
    pub fn pump_armed(&self) -> bool {
        self.state.pump_armed()
    }

    /// Period between pump ticks.
    pub fn pump_interval(&self) -> Duration {
        self.config.pump_interval()
    }

    /// Bumped every time the pump is (re)armed, so a scheduler knows to restart its period.
    pub fn pump_generation(&self) -> u64 {
        self.pump_generation
    }

    /// When the hand-off is due, if one is armed.
    pub fn handoff_deadline(&self) -> Option<Instant> {
        self.state.handoff_deadline(self.config.handoff_delay())
    }

    /// Summary for observers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            identity: self.identity.clone(),
            status: self.status.clone(),
            stats: self.stats.clone(),
        }
    }

    /// The screen became visible: start over and begin streaming.
    pub fn activate(&mut self) {
        self.reset();
        self.start_recognition();
    }

    /// Opens the camera and arms the frame pump.
    ///
    /// Ignored while a hand-off is pending. If the camera cannot be opened
    /// the status says so and the session stays idle.
    pub fn start_recognition(&mut self) {
        if !self.state.can_start() {
            debug!(phase = ?self.phase(), "Start ignored while hand-off is pending");
            return;
        }

        if let Err(e) = self.source.open(&self.uri) {
            warn!(uri = %self.uri, error = %e, "Unable to access camera");
            self.stats.open_failures += 1;
            self.source.close();
            self.state = SessionState::Idle;
            self.set_status(Status::CameraUnavailable);
            return;
        }

        if !self.state.pump_armed() {
            info!(uri = %self.uri, "Recognition started");
            self.state = SessionState::streaming();
            self.set_status(Status::WaitingForAuthorization);
        }
        self.pump_generation = self.pump_generation.wrapping_add(1);
    }

    /// Runs one frame pump step.
    pub fn tick(&mut self) -> TickOutcome {
        let SessionState::Streaming {
            consecutive_failures,
        } = self.state
        else {
            return TickOutcome::Skipped;
        };

        let frame = match self.read_frame() {
            Ok(frame) => frame,
            Err(e) => return self.on_read_failure(consecutive_failures.saturating_add(1), e),
        };
        self.state = SessionState::streaming();

        let classification = self.classifier.process_frame(frame);
        let mut shown = self.renderer.draw_results(classification.frame);

        let fps = self.fps.current_fps();
        self.stats.last_fps = fps;
        shown.put_text(
            format!("FPS: {fps:.1}"),
            shown.width().saturating_sub(FPS_TEXT_OFFSET),
            FPS_TEXT_TOP,
        );

        self.view.show_frame(&shown);
        self.stats.frames_processed += 1;
        let sequence = shown.sequence();
        debug!(sequence, fps, "Frame processed");

        if classification.authorized {
            self.authorize(classification.identity.clone());
            return TickOutcome::Authorized(classification.identity);
        }
        TickOutcome::Displayed
    }

    /// Fires the hand-off: switch screens, then start over.
    ///
    /// Returns false, without side effects, unless a hand-off is armed.
    pub fn complete_handoff(&mut self) -> bool {
        let identity = match &self.state {
            SessionState::Authorized { identity, .. } => identity.clone(),
            _ => return false,
        };
        self.state = SessionState::HandingOff;

        info!(identity = %identity, "Handing off to successor screen");
        self.stats.handoffs += 1;
        self.host.switch_to_successor();
        self.reset();
        true
    }

    /// Releases the camera and disarms both timers. Leaves the screen as is.
    pub fn stop(&mut self) {
        self.source.close();
        if self.state != SessionState::Idle {
            info!(phase = ?self.phase(), "Session stopped");
        }
        self.state = SessionState::Idle;
    }

    /// Stops the session and restores the screen to its initial look.
    pub fn reset(&mut self) {
        self.stop();
        self.set_status(Status::WaitingForAuthorization);
        self.view.show_placeholder(STREAM_PLACEHOLDER);
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.source.is_open() {
            return Err(CaptureError::NotOpen);
        }
        self.source.read_frame()
    }

    fn on_read_failure(&mut self, consecutive_failures: u32, error: CaptureError) -> TickOutcome {
        self.stats.read_failures += 1;
        let limit = self.config.max_consecutive_read_failures;

        if limit > 0 && consecutive_failures >= limit {
            warn!(
                consecutive_failures,
                error = %error,
                "Giving up on camera stream"
            );
            self.stop();
            self.set_status(Status::StreamLost);
            return TickOutcome::StreamLost;
        }

        warn!(consecutive_failures, error = %error, "Failed to read frame");
        self.state = SessionState::Streaming {
            consecutive_failures,
        };
        self.set_status(Status::ReadFailed);
        TickOutcome::ReadFailed
    }

    fn authorize(&mut self, identity: Identity) {
        self.identity = identity.clone();
        self.context.record(identity.clone());
        self.source.close();
        self.stats.authorizations += 1;
        info!(
            identity = %identity,
            delay_ms = self.config.handoff_delay_ms,
            "Authorization granted"
        );
        self.state = SessionState::Authorized {
            identity: identity.clone(),
            since: Instant::now(),
        };
        self.set_status(Status::Authorized(identity));
    }

    fn set_status(&mut self, status: Status) {
        if self.status != status {
            self.view.set_status(&status);
        }
        self.status = status;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.source.close();
    }
}
