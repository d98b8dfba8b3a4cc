//! Frame type representing a decoded image with metadata and overlays.

use std::time::Instant;

/// A drawing instruction attached to a frame for the view to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Text anchored at a pixel position (baseline-left).
    Text {
        /// The text to draw.
        text: String,
        /// Horizontal position in pixels.
        x: u32,
        /// Vertical position in pixels.
        y: u32,
    },
    /// A labelled rectangle, typically around a detected face.
    Box {
        /// Left edge in pixels.
        x: u32,
        /// Top edge in pixels.
        y: u32,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Label drawn next to the rectangle.
        label: String,
    },
}

/// A single decoded frame from the capture source.
///
/// Frames are transient: the source hands one to the classifier for a
/// single tick and it is dropped once the view has displayed it.
#[derive(Clone)]
pub struct Frame {
    /// Interleaved pixel data (`channels` bytes per pixel).
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Bytes per pixel (1 for grayscale, 3 for RGB).
    channels: u8,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number assigned by the source.
    sequence: u64,
    /// Overlays attached by the classifier or renderer.
    overlays: Vec<Overlay>,
}

impl Frame {
    /// Creates a new RGB frame.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self::with_channels(pixels, width, height, 3, sequence)
    }

    /// Creates a new frame with an explicit channel count.
    pub fn with_channels(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        sequence: u64,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            channels,
            timestamp: Instant::now(),
            sequence,
            overlays: Vec::new(),
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of bytes per pixel.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * self.channels as usize
    }

    /// Returns the overlays attached so far, in drawing order.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Attaches an overlay to be drawn on top of the pixels.
    pub fn push_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    /// Attaches a text overlay at the given position.
    pub fn put_text(&mut self, text: impl Into<String>, x: u32, y: u32) {
        self.push_overlay(Overlay::Text {
            text: text.into(),
            x,
            y,
        });
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .field("overlays", &self.overlays.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 640 * 480 * 3];
        let frame = Frame::new(pixels, 640, 480, 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
        assert!(frame.overlays().is_empty());
    }

    #[test]
    fn test_frame_invalid_size() {
        let frame = Frame::new(vec![0u8; 640 * 480], 640, 480, 1);
        assert!(!frame.is_valid());

        let gray = Frame::with_channels(vec![0u8; 640 * 480], 640, 480, 1, 1);
        assert!(gray.is_valid());
    }

    #[test]
    fn test_put_text_keeps_order() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 1);
        frame.put_text("first", 0, 0);
        frame.put_text("second", 1, 1);

        assert_eq!(
            frame.overlays(),
            &[
                Overlay::Text {
                    text: "first".into(),
                    x: 0,
                    y: 0
                },
                Overlay::Text {
                    text: "second".into(),
                    x: 1,
                    y: 1
                },
            ]
        );
    }
}
