//! Scripted collaborators shared by the session tests.

#![allow(dead_code)]

use face_gate::capture::{CaptureError, CaptureSource, Frame, SessionConfig};
use face_gate::recognition::{Classification, Classifier, FpsEstimator, Identity};
use face_gate::session::{HostContext, SessionController, SessionView, Status};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the scripted source does on one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    Frame,
    Fail,
}

#[derive(Debug, Default)]
pub struct SourceLog {
    pub open: bool,
    pub opens: usize,
    pub closes: usize,
    pub reads: usize,
    pub reads_while_closed: usize,
}

/// Capture source whose reads follow a script, then succeed forever.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pub log: Arc<Mutex<SourceLog>>,
    script: Arc<Mutex<VecDeque<Read>>>,
    refuse_open: bool,
    uri: Option<String>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            refuse_open: true,
            ..Self::default()
        }
    }

    pub fn with_script(reads: impl IntoIterator<Item = Read>) -> Self {
        let source = Self::default();
        source.script.lock().unwrap().extend(reads);
        source
    }

    pub fn is_open_now(&self) -> bool {
        self.log.lock().unwrap().open
    }

    pub fn reads(&self) -> usize {
        self.log.lock().unwrap().reads
    }
}

impl CaptureSource for ScriptedSource {
    fn open(&mut self, uri: &str) -> Result<(), CaptureError> {
        let mut log = self.log.lock().unwrap();
        if log.open {
            return Ok(());
        }
        if self.refuse_open {
            return Err(CaptureError::SourceUnavailable {
                uri: uri.to_string(),
                reason: "connection refused".into(),
            });
        }
        log.open = true;
        log.opens += 1;
        self.uri = Some(uri.to_string());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut log = self.log.lock().unwrap();
        if !log.open {
            log.reads_while_closed += 1;
            return Err(CaptureError::NotOpen);
        }
        log.reads += 1;
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Read::Frame);
        match step {
            Read::Frame => Ok(Frame::new(vec![0u8; 320 * 240 * 3], 320, 240, log.reads as u64)),
            Read::Fail => Err(CaptureError::ReadFailure("decoder error".into())),
        }
    }

    fn is_open(&self) -> bool {
        self.log.lock().unwrap().open
    }

    fn close(&mut self) {
        let mut log = self.log.lock().unwrap();
        if log.open {
            log.closes += 1;
        }
        log.open = false;
        self.uri = None;
    }

    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

/// Classifier that authorizes `identity` on the listed frame numbers (1-based).
pub struct ScriptedClassifier {
    identity: Identity,
    authorize_on: Vec<u64>,
    seen: u64,
}

impl ScriptedClassifier {
    pub fn authorizing_on(identity: &str, frames: &[u64]) -> Self {
        Self {
            identity: Identity::new(identity),
            authorize_on: frames.to_vec(),
            seen: 0,
        }
    }

    pub fn never() -> Self {
        Self::authorizing_on("nobody", &[])
    }
}

impl Classifier for ScriptedClassifier {
    fn process_frame(&mut self, frame: Frame) -> Classification {
        self.seen += 1;
        if self.authorize_on.contains(&self.seen) {
            Classification::authorized(frame, self.identity.clone())
        } else {
            Classification::rejected(frame)
        }
    }
}

/// Estimator that always reports the same rate.
pub struct ConstFps(pub f64);

impl FpsEstimator for ConstFps {
    fn current_fps(&mut self) -> f64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct ViewLog {
    pub frames: Vec<Frame>,
    pub placeholders: Vec<String>,
    pub statuses: Vec<Status>,
}

/// View that records everything it is asked to show.
#[derive(Clone, Default)]
pub struct RecordingView {
    pub log: Arc<Mutex<ViewLog>>,
}

impl RecordingView {
    pub fn frames_shown(&self) -> usize {
        self.log.lock().unwrap().frames.len()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.log.lock().unwrap().frames.last().cloned()
    }
}

impl SessionView for RecordingView {
    fn show_frame(&mut self, frame: &Frame) {
        self.log.lock().unwrap().frames.push(frame.clone());
    }

    fn show_placeholder(&mut self, text: &str) {
        self.log.lock().unwrap().placeholders.push(text.to_string());
    }

    fn set_status(&mut self, status: &Status) {
        self.log.lock().unwrap().statuses.push(status.clone());
    }
}

/// Counts host screen switches.
#[derive(Clone, Default)]
pub struct SwitchCounter(pub Arc<AtomicUsize>);

impl SwitchCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn host(&self) -> impl FnMut() + Send + 'static {
        let counter = Arc::clone(&self.0);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Everything a test needs to observe one controller.
pub struct Harness {
    pub controller: SessionController,
    pub source: ScriptedSource,
    pub view: RecordingView,
    pub switches: SwitchCounter,
    pub context: HostContext,
}

pub fn harness(source: ScriptedSource, classifier: ScriptedClassifier) -> Harness {
    harness_with_config(source, classifier, SessionConfig::default())
}

pub fn harness_with_config(
    source: ScriptedSource,
    classifier: ScriptedClassifier,
    config: SessionConfig,
) -> Harness {
    let view = RecordingView::default();
    let switches = SwitchCounter::default();
    let context = HostContext::new();

    let controller = SessionController::new(
        "rtsp://camera.test:554/stream2",
        config,
        source.clone(),
        classifier,
        context.clone(),
        switches.host(),
    )
    .with_fps(ConstFps(25.0))
    .with_view(view.clone());

    Harness {
        controller,
        source,
        view,
        switches,
        context,
    }
}
