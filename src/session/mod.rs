//! The authorization session.
//!
//! A session streams frames from its capture source through the classifier
//! until someone is authorized, shows the result for a grace period, and
//! then asks the host to move on to the next screen.
//!
//! ```text
//!            activate / start             authorized frame
//!   Idle ─────────────────────▶ Streaming ─────────────────▶ Authorized
//!    ▲                            │  ▲ tick                      │
//!    │         stop / reset       │  └──┘                        │ hand-off delay
//!    ├────────────────────────────┘                              ▼
//!    └──────────────────── reset ◀── host switch ◀──────── HandingOff
//! ```

mod controller;
mod driver;
mod host;
mod state;

pub use controller::{SessionController, SessionSnapshot, SessionStats, TickOutcome};
pub use driver::{DriverClosed, SessionCommand, SessionDriver, SessionHandle};
pub use host::{
    AuthorizationRecord, HostContext, LogView, ScreenHost, SessionView, Status,
    STREAM_PLACEHOLDER,
};
pub use state::{Phase, SessionState};
