//! Face Gate Library
//!
//! The camera-driven authorization screen of a desktop application: frames
//! are pulled from a network camera, checked by an external face classifier,
//! and once a known face is recognized the application is handed off to the
//! next screen after a short grace period.
//!
//! # Architecture
//!
//! ```text
//! capture → recognition (classify → render → fps) → view
//!                 ↓
//!        session (state machine, frame pump, hand-off timer) → host
//! ```
//!
//! # Design Principles
//!
//! - **One owner**: the session controller owns the capture source and
//!   releases it on every path out of streaming
//! - **Timers follow state**: the frame pump runs only while streaming,
//!   the hand-off only while authorized
//! - **Errors become status text**: nothing from the camera reaches the host
//!   as an error
//!
//! # Example
//!
//! ```no_run
//! use face_gate::{
//!     capture::{SessionConfig, SyntheticSource},
//!     recognition::FixedClassifier,
//!     session::{HostContext, SessionController, SessionDriver},
//! };
//!
//! # async fn demo() {
//! let context = HostContext::new();
//! let controller = SessionController::new(
//!     "stub://camera",
//!     SessionConfig::default(),
//!     SyntheticSource::new(),
//!     FixedClassifier::authorizing("Alice", 10),
//!     context.clone(),
//!     || println!("switching screens"),
//! );
//!
//! let (driver, handle) = SessionDriver::new(controller);
//! let session = tokio::spawn(driver.run());
//!
//! // The screen became visible.
//! handle.activate().unwrap();
//! # let _ = session.await;
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod metrics;
pub mod recognition;
pub mod session;

// Re-export commonly used types at crate root
pub use capture::{CaptureError, CaptureSource, FileConfig, Frame, StreamSource, SyntheticSource};
pub use recognition::{Classification, Classifier, Identity, OverlayRenderer, RollingFps};
pub use session::{
    HostContext, ScreenHost, SessionCommand, SessionController, SessionDriver, SessionHandle,
    SessionState, SessionView, Status,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
