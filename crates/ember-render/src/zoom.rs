#![forbid(unsafe_code)]

//! Zoom target calculation.
//!
//! A zoom is expressed as a new canvas dimension plus a view offset; the
//! host scroll container applies both. The math here is deliberately pure
//! so that zoom-in followed by reset is reversible to within integer
//! rounding, no matter how many cycles are chained.

use ember_core::RectF;

/// Display orientation: whether depth grows downward from the top
/// (icicle) or upward from the bottom (flame). Pure display flag; layout
/// is identical in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphMode {
    #[default]
    Flame,
    Icicle,
}

/// Destination canvas size and view offset for a zoom transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    /// New full canvas width in pixels.
    pub width: f64,
    /// New full canvas height in pixels.
    pub height: f64,
    /// New horizontal view offset.
    pub offset_x: f64,
    /// New vertical view offset.
    pub offset_y: f64,
}

/// Scale factor that makes a frame of normalized width `span_width` fill
/// the viewport:
///
/// ```text
///                view_width
/// factor = ------------------------
///          canvas_width * span_width
/// ```
#[inline]
#[must_use]
pub fn scale_factor(view_width: f64, canvas_width: f64, span_width: f64) -> f64 {
    view_width / (canvas_width * span_width)
}

/// Target that brings the given span to full viewport width.
///
/// Up to `context_rows` ancestor rows are kept visible above the frame so
/// the user retains stack context. `row_height` is the current row height;
/// it does not scale with zoom.
#[must_use]
pub fn zoom_target_for_span(
    bounds: RectF,
    view_rect: RectF,
    span_start_x: f64,
    span_width: f64,
    depth: u32,
    row_height: f64,
    context_rows: u32,
) -> ZoomTarget {
    let factor = scale_factor(view_rect.width, bounds.width, span_width);
    let context_depth = depth.saturating_sub(context_rows);
    let new_width = bounds.width * factor;

    ZoomTarget {
        width: new_width,
        height: bounds.height * factor,
        offset_x: span_start_x * new_width,
        offset_y: row_height * f64::from(context_depth),
    }
}

/// Target that restores the 1:1 view.
///
/// The canvas shrinks back to the viewport width with the height the
/// graph needs at that width. Flame mode (root at the bottom) anchors the
/// origin; icicle mode (root at the top) anchors the opposite edge.
#[must_use]
pub fn reset_zoom_target(
    view_rect: RectF,
    full_height: f64,
    visible_height: f64,
    mode: GraphMode,
) -> ZoomTarget {
    let offset_y = match mode {
        GraphMode::Flame => 0.0,
        GraphMode::Icicle => -(full_height - view_rect.height),
    };

    ZoomTarget {
        width: view_rect.width,
        height: visible_height,
        offset_x: 0.0,
        offset_y,
    }
}
