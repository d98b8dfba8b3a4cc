//! Interfaces to the recognition pipeline.
//!
//! The gate treats face recognition as an opaque classifier: every frame
//! goes in, and a processed frame, an authorization flag and an identity
//! label come out. Rendering of detection results and frame-rate
//! estimation sit behind traits of their own so hosts can plug in their
//! toolkit's implementations.

mod classifier;
mod fps;
mod render;

pub use classifier::{Classification, Classifier, FixedClassifier, Identity};
pub use fps::{FpsEstimator, RollingFps};
pub use render::{OverlayRenderer, PassthroughRenderer, FPS_TEXT_OFFSET};
