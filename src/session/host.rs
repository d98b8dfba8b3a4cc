//! Seams between the session and the application hosting it.

use crate::capture::Frame;
use crate::recognition::Identity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// User-visible status line of the authorization screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "identity")]
pub enum Status {
    /// Initial text, also restored by every reset.
    WaitingForAuthorization,
    /// The camera could not be opened.
    CameraUnavailable,
    /// The last read failed; the pump keeps trying.
    ReadFailed,
    /// Reads kept failing and the stream was released.
    StreamLost,
    /// The named user was let through.
    Authorized(Identity),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::WaitingForAuthorization => f.write_str("Waiting for authorization..."),
            Status::CameraUnavailable => f.write_str("Error: Unable to access camera."),
            Status::ReadFailed => f.write_str("Error: Failed to read frame."),
            Status::StreamLost => f.write_str("Error: Camera stream lost."),
            Status::Authorized(identity) => {
                write!(f, "Authorization done for {identity}.... Redirecting...")
            }
        }
    }
}

/// Text shown in place of video while no stream is displayed.
pub const STREAM_PLACEHOLDER: &str = "Face Recognition Stream";

/// The screen surface the session draws on.
pub trait SessionView: Send {
    /// Replaces the video area with a display-ready frame.
    fn show_frame(&mut self, frame: &Frame);

    /// Replaces the video area with placeholder text.
    fn show_placeholder(&mut self, text: &str);

    /// Replaces the status line.
    fn set_status(&mut self, status: &Status);
}

/// View that reports through `tracing` instead of drawing.
#[derive(Debug, Default)]
pub struct LogView {
    frames_shown: u64,
}

impl LogView {
    /// Creates a view that has shown nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames passed to [`SessionView::show_frame`] so far.
    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl SessionView for LogView {
    fn show_frame(&mut self, frame: &Frame) {
        self.frames_shown += 1;
        tracing::trace!(
            sequence = frame.sequence(),
            overlays = frame.overlays().len(),
            "Frame displayed"
        );
    }

    fn show_placeholder(&mut self, text: &str) {
        tracing::debug!(text, "Placeholder displayed");
    }

    fn set_status(&mut self, status: &Status) {
        tracing::info!(status = %status, "Status changed");
    }
}

/// The application that owns the authorization screen.
pub trait ScreenHost: Send {
    /// Switches the visible screen to the one following authorization.
    fn switch_to_successor(&mut self);
}

impl<F> ScreenHost for F
where
    F: FnMut() + Send,
{
    fn switch_to_successor(&mut self) {
        self()
    }
}

/// One successful authorization as published to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRecord {
    /// Who was let through.
    pub identity: Identity,
    /// Wall-clock time of the authorizing frame.
    pub authorized_at: DateTime<Utc>,
}

/// Shared record of who the gate last let through.
///
/// Cloned into the session at construction and into whatever screen reads
/// the user afterwards. Only the session writes it, once per authorization,
/// and the write completes before the host is asked to switch screens.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    inner: Arc<RwLock<Option<AuthorizationRecord>>>,
}

impl HostContext {
    /// Creates a context with no authorization recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last authorized user, or [`Identity::unknown`].
    pub fn current_user(&self) -> Identity {
        self.last_authorization()
            .map(|record| record.identity)
            .unwrap_or_default()
    }

    /// The full record of the last authorization, if any.
    pub fn last_authorization(&self) -> Option<AuthorizationRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn record(&self, identity: Identity) {
        let record = AuthorizationRecord {
            identity,
            authorized_at: Utc::now(),
        };
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(record);
    }
}
