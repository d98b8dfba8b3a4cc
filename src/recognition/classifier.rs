//! Classifier contract and a fixed-outcome implementation.

use crate::capture::{Frame, Overlay};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the person a classifier recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Label used before anyone has been recognized.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Wraps a recognized label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The placeholder identity, `"Unknown"`.
    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    /// The label as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the placeholder identity.
    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Outcome of classifying one frame.
#[derive(Debug, Clone)]
pub struct Classification {
    /// The frame, possibly annotated by the classifier.
    pub frame: Frame,
    /// Whether the recognized face belongs to an authorized user.
    pub authorized: bool,
    /// Recognized identity, or [`Identity::unknown`].
    pub identity: Identity,
}

impl Classification {
    /// A classification that recognized nobody.
    pub fn rejected(frame: Frame) -> Self {
        Self {
            frame,
            authorized: false,
            identity: Identity::unknown(),
        }
    }

    /// A classification that authorized `identity`.
    pub fn authorized(frame: Frame, identity: Identity) -> Self {
        Self {
            frame,
            authorized: true,
            identity,
        }
    }
}

/// Face classifier consulted once per frame.
///
/// Implementations take the frame by value and must not keep it past the call.
pub trait Classifier: Send {
    /// Classifies one frame and hands it back, possibly annotated.
    fn process_frame(&mut self, frame: Frame) -> Classification;
}

impl<F> Classifier for F
where
    F: FnMut(Frame) -> Classification + Send,
{
    fn process_frame(&mut self, frame: Frame) -> Classification {
        self(frame)
    }
}

/// Classifier that authorizes a fixed identity once it has seen enough frames.
///
/// Stands in for a real recognizer in demos and benchmarks. Each accepted
/// frame gets a labelled box covering its centre quarter.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    identity: Identity,
    authorize_after: Option<u64>,
    seen: u64,
}

impl FixedClassifier {
    /// Authorizes `identity` on the `after`-th frame (counting from 1).
    pub fn authorizing(identity: impl Into<Identity>, after: u64) -> Self {
        Self {
            identity: identity.into(),
            authorize_after: Some(after.max(1)),
            seen: 0,
        }
    }

    /// Never authorizes anyone.
    pub fn rejecting() -> Self {
        Self {
            identity: Identity::unknown(),
            authorize_after: None,
            seen: 0,
        }
    }

    /// Frames classified so far.
    pub fn frames_seen(&self) -> u64 {
        self.seen
    }
}

impl Classifier for FixedClassifier {
    fn process_frame(&mut self, mut frame: Frame) -> Classification {
        self.seen += 1;

        let Some(after) = self.authorize_after else {
            return Classification::rejected(frame);
        };
        if self.seen < after {
            return Classification::rejected(frame);
        }

        frame.push_overlay(Overlay::Box {
            x: frame.width() / 4,
            y: frame.height() / 4,
            width: frame.width() / 2,
            height: frame.height() / 2,
            label: self.identity.to_string(),
        });
        Classification::authorized(frame, self.identity.clone())
    }
}
