#![forbid(unsafe_code)]

//! The frame-paint collaborator boundary.
//!
//! The engine computes geometry and state flags; everything that touches
//! pixels (background, border, text fitting, fonts, colors) lives behind
//! [`FramePainter`]. The canvas type is an associated type so the same
//! engine can drive a raster surface, a recording surface in tests, or
//! whatever the host toolkit provides.

use ember_core::{FrameRenderFlags, FrameSpan, RectF};

/// Draws single frames and knows how tall a frame row is.
///
/// `row_height` depends on font metrics, so it is queried once per paint
/// pass and reused for every row of that pass.
pub trait FramePainter<T> {
    /// The surface frames are drawn onto.
    type Canvas: ?Sized;

    /// Height in pixels of one frame row on this canvas.
    fn row_height(&self, canvas: &Self::Canvas) -> f64;

    /// Draw one frame.
    ///
    /// `frame_rect` is the frame's full rectangle in canvas space;
    /// `clipped_rect` is the part of it inside the viewport, which is the
    /// only region that needs painting. `flags` carries the derived view
    /// state (hover, highlight, selection, clipping) for this frame.
    fn paint_frame(
        &mut self,
        canvas: &mut Self::Canvas,
        frame_rect: RectF,
        span: &FrameSpan<T>,
        clipped_rect: RectF,
        flags: FrameRenderFlags,
    );
}
