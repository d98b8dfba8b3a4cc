//! Overlay rendering of classification results.

use crate::capture::Frame;

/// Distance of the FPS readout from the right edge of the frame, in pixels.
pub const FPS_TEXT_OFFSET: u32 = 150;

/// Turns a classified frame into the frame shown to the user.
pub trait OverlayRenderer: Send {
    /// Draws the classifier's findings onto the frame.
    fn draw_results(&mut self, frame: Frame) -> Frame;
}

impl<F> OverlayRenderer for F
where
    F: FnMut(Frame) -> Frame + Send,
{
    fn draw_results(&mut self, frame: Frame) -> Frame {
        self(frame)
    }
}

/// Renderer that leaves drawing to the view: overlays already attached by
/// the classifier are passed through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRenderer;

impl OverlayRenderer for PassthroughRenderer {
    fn draw_results(&mut self, frame: Frame) -> Frame {
        frame
    }
}
