#![forbid(unsafe_code)]

//! The flame-graph render engine.
//!
//! Owns the paint collaborator and the interaction state, and is the one
//! place where normalized model space is converted to canvas pixels. The
//! hit tester and the paint pass share [`span_rect`], so painting and
//! hit-testing can never disagree about where a frame lives.
//!
//! The engine is stateless with respect to layout: geometry is recomputed
//! per call from the current bounds, which is what makes zooming a pure
//! change of bounds.

use crate::interaction::InteractionState;
use crate::paint::FramePainter;
use crate::zoom::{self, GraphMode, ZoomTarget};
use ember_core::{FrameGraphModel, FrameId, FrameRenderFlags, FrameSpan, PointF, RectF};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Pixel rectangles that must be repainted after a state transition.
pub type DirtyRects = SmallVec<[RectF; 8]>;

/// Padding reserved around the root frame. The root is never width-culled,
/// so it is the only frame that carries padding.
const INTERNAL_PADDING: f64 = 2.0;

// =========================================================================
// Configuration
// =========================================================================

/// Engine tunables, validated at assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum on-screen width in pixels for a frame to be rendered and
    /// hit-testable. Frames below this are culled (except the root).
    pub frame_width_visibility_threshold: f64,
    /// Whether hovering a frame also marks its equal-payload siblings.
    /// When off, the hover set is just the hovered frame.
    pub show_hovered_siblings: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_width_visibility_threshold: 2.0,
            show_hovered_siblings: true,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.frame_width_visibility_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }
        Ok(())
    }
}

/// Rejected engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The visibility threshold must be a finite, positive pixel count.
    InvalidThreshold { value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreshold { value } => {
                write!(
                    f,
                    "frame width visibility threshold must be finite and positive, got {value}"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// =========================================================================
// Shared layout math
// =========================================================================

/// Pixel rectangle of a span for the given full graph width and row
/// height.
///
/// Both edges are floored independently, so adjacent spans keep adjacent
/// pixel edges at any zoom level.
#[inline]
#[must_use]
pub fn span_rect<T>(span: &FrameSpan<T>, graph_width: f64, row_height: f64) -> RectF {
    let x = (graph_width * span.start_x).floor();
    let width = (graph_width * span.end_x).floor() - x;
    RectF::new(x, row_height * f64::from(span.depth), width, row_height)
}

/// Maximum depth among spans wide enough to render at least `threshold_px`
/// at the given canvas width.
///
/// Bounds the canvas height to rows that would show at least a sliver,
/// instead of allocating height for rows that are entirely sub-pixel.
#[must_use]
pub fn visible_depth<T>(spans: &[FrameSpan<T>], canvas_width: f64, threshold_px: f64) -> u32 {
    spans
        .iter()
        .filter(|span| canvas_width * span.width() >= threshold_px)
        .map(|span| span.depth)
        .max()
        .unwrap_or(0)
}

// =========================================================================
// Engine
// =========================================================================

/// Layout, hit-testing, zoom, and interaction tracking for one graph.
pub struct RenderEngine<T, P: FramePainter<T>> {
    painter: P,
    config: EngineConfig,
    model: Arc<FrameGraphModel<T>>,
    visible_depth: u32,
    interaction: InteractionState,
}

impl<T, P: FramePainter<T>> RenderEngine<T, P> {
    /// Create an engine with default configuration and an empty model.
    pub fn new(painter: P) -> Self {
        Self {
            painter,
            config: EngineConfig::default(),
            model: Arc::new(FrameGraphModel::empty()),
            visible_depth: 0,
            interaction: InteractionState::new(),
        }
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(painter: P, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self::new(painter);
        engine.config = config;
        Ok(engine)
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn painter_mut(&mut self) -> &mut P {
        &mut self.painter
    }

    /// Install a new model, dropping all transient interaction state.
    ///
    /// Models are validated at construction, so assignment is infallible.
    pub fn set_model(&mut self, model: Arc<FrameGraphModel<T>>) {
        self.visible_depth = model.max_depth();
        self.model = model;
        self.interaction.reset();
    }

    /// Drop all data, leaving an empty graph.
    pub fn clear(&mut self) {
        self.set_model(Arc::new(FrameGraphModel::empty()));
    }

    #[must_use]
    pub fn model(&self) -> &Arc<FrameGraphModel<T>> {
        &self.model
    }

    /// Depth of the deepest frame that survived width culling at the last
    /// height computation.
    #[must_use]
    pub fn visible_depth(&self) -> u32 {
        self.visible_depth
    }

    /// Row height the painter reports for this canvas.
    #[must_use]
    pub fn row_height(&self, canvas: &P::Canvas) -> f64 {
        self.painter.row_height(canvas)
    }

    /// Canvas height needed to show every non-culled row at `canvas_width`.
    ///
    /// Recomputes the visible depth for the given width; zooming in makes
    /// previously sub-pixel frames visible, which can deepen the graph.
    pub fn visible_height(&mut self, canvas: &P::Canvas, canvas_width: f64) -> f64 {
        if canvas_width <= 0.0 {
            return 0.0;
        }
        self.visible_depth = visible_depth(
            self.model.spans(),
            canvas_width,
            self.config.frame_width_visibility_threshold,
        )
        .min(self.model.max_depth());

        f64::from(self.visible_depth) * self.painter.row_height(canvas)
    }

    /// Minimap height at the fixed 1px-per-row scale.
    #[must_use]
    pub fn minimap_height(&self) -> u32 {
        self.visible_depth
    }

    // ---------------------------------------------------------------------
    // Painting
    // ---------------------------------------------------------------------

    /// Paint the subset of the graph that intersects `view_rect`, assuming
    /// the whole graph is laid out within `bounds`.
    ///
    /// Frames narrower than the visibility threshold are skipped entirely
    /// (except the root, which is always painted with its padding).
    pub fn paint(&mut self, canvas: &mut P::Canvas, bounds: RectF, view_rect: RectF) {
        let row_height = self.painter.row_height(canvas);
        if bounds.width <= 0.0 || row_height <= 0.0 {
            return;
        }
        let model = Arc::clone(&self.model);
        let spans = model.spans();
        if spans.is_empty() {
            return;
        }
        let graph_width = bounds.width;
        let threshold = self.config.frame_width_visibility_threshold;
        let selected_range = self.selected_range();

        #[cfg(feature = "tracing")]
        let mut painted = 0usize;

        // Root first: padded, never culled, never highlighted.
        {
            let root = &spans[0];
            let x = (graph_width * root.start_x).floor() + INTERNAL_PADDING;
            let width = (graph_width * root.end_x).floor() - x - INTERNAL_PADDING;
            let rect = RectF::new(x, row_height * f64::from(root.depth), width, row_height);
            if let Some(clipped) = view_rect.intersection_opt(&rect) {
                let flags = FrameRenderFlags::compose(
                    false,
                    false,
                    false,
                    self.interaction.hovered() == Some(FrameId(0)),
                    false,
                    self.interaction.selected().is_some(),
                    self.interaction.selected() == Some(FrameId(0)),
                    rect.x < clipped.x,
                );
                self.painter.paint_frame(canvas, rect, root, clipped, flags);
                #[cfg(feature = "tracing")]
                {
                    painted += 1;
                }
            }
        }

        for (index, span) in spans.iter().enumerate().skip(1) {
            let x = (graph_width * span.start_x).floor();
            let width = (graph_width * span.end_x).floor() - x;
            if width < threshold {
                continue;
            }
            let rect = RectF::new(x, row_height * f64::from(span.depth), width, row_height);
            let Some(clipped) = view_rect.intersection_opt(&rect) else {
                continue;
            };

            let id = FrameId(index);
            let flags = FrameRenderFlags::compose(
                false,
                self.interaction.highlighting_active(),
                self.interaction.is_highlighted(id),
                self.interaction.hovered() == Some(id),
                self.interaction.is_hovered_sibling(id),
                self.interaction.selected().is_some(),
                selected_range
                    .is_some_and(|(depth, start, end)| {
                        span.depth >= depth && span.start_x >= start && span.end_x <= end
                    }),
                rect.x < clipped.x,
            );
            self.painter.paint_frame(canvas, rect, span, clipped, flags);
            #[cfg(feature = "tracing")]
            {
                painted += 1;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(painted, total = spans.len(), "paint pass");
    }

    fn selected_range(&self) -> Option<(u32, f64, f64)> {
        let selected = self.interaction.selected()?;
        let span = self.model.get(selected)?;
        Some((span.depth, span.start_x, span.end_x))
    }

    // ---------------------------------------------------------------------
    // Geometry queries
    // ---------------------------------------------------------------------

    /// Rectangle of a known frame within `bounds`.
    #[must_use]
    pub fn frame_rect(&self, canvas: &P::Canvas, bounds: RectF, frame: FrameId) -> Option<RectF> {
        let row_height = self.painter.row_height(canvas);
        self.model
            .get(frame)
            .map(|span| span_rect(span, bounds.width, row_height))
    }

    /// Frame occupying a pixel point, if any.
    ///
    /// Degenerate input (zero-width bounds, point outside every row, a
    /// culled sub-pixel frame) yields `None`, never an error.
    #[must_use]
    pub fn frame_at(&self, canvas: &P::Canvas, bounds: RectF, point: PointF) -> Option<FrameId> {
        let row_height = self.painter.row_height(canvas);
        if bounds.width <= 0.0 || row_height <= 0.0 || point.y < 0.0 {
            return None;
        }
        let depth = (point.y / row_height).floor();
        if depth > f64::from(u32::MAX) {
            return None;
        }
        let depth = depth as u32;
        let x_norm = point.x / bounds.width;
        let threshold_norm = self.config.frame_width_visibility_threshold / bounds.width;

        // Spans at one depth are ordered and non-overlapping, so the first
        // match is the only match.
        self.model
            .spans()
            .iter()
            .position(|span| {
                span.depth == depth
                    && span.start_x <= x_norm
                    && x_norm <= span.end_x
                    && span.width() > threshold_norm
            })
            .map(FrameId)
    }

    // ---------------------------------------------------------------------
    // Zoom
    // ---------------------------------------------------------------------

    /// Zoom target that brings `frame` to full viewport width, keeping up
    /// to `context_rows` ancestor rows above it.
    ///
    /// Returns `None` for an unknown frame or a zero-width frame (which
    /// has no finite zoom factor).
    #[must_use]
    pub fn zoom_target_for_frame(
        &self,
        canvas: &P::Canvas,
        bounds: RectF,
        view_rect: RectF,
        frame: FrameId,
        context_rows: u32,
    ) -> Option<ZoomTarget> {
        let span = self.model.get(frame)?;
        if span.width() <= 0.0 {
            return None;
        }
        let row_height = self.painter.row_height(canvas);
        Some(zoom::zoom_target_for_span(
            bounds,
            view_rect,
            span.start_x,
            span.width(),
            span.depth,
            row_height,
            context_rows,
        ))
    }

    /// Find the frame at `point` and compute its zoom target. As in a
    /// double-click zoom, the frame also becomes the selected frame.
    pub fn zoom_target_for_frame_at(
        &mut self,
        canvas: &P::Canvas,
        bounds: RectF,
        view_rect: RectF,
        point: PointF,
        context_rows: u32,
    ) -> Option<ZoomTarget> {
        let frame = self.frame_at(canvas, bounds, point)?;
        self.interaction.force_select(frame);
        self.zoom_target_for_frame(canvas, bounds, view_rect, frame, context_rows)
    }

    /// Target restoring the 1:1 view for the current viewport width.
    pub fn reset_zoom_target(
        &mut self,
        canvas: &P::Canvas,
        bounds: RectF,
        view_rect: RectF,
        mode: GraphMode,
    ) -> ZoomTarget {
        let new_height = self.visible_height(canvas, view_rect.width);
        zoom::reset_zoom_target(view_rect, bounds.height, new_height, mode)
    }

    // ---------------------------------------------------------------------
    // Interaction
    // ---------------------------------------------------------------------

    /// Hover a frame, returning the rectangles that became dirty (the old
    /// sibling set plus the new one).
    pub fn set_hover(&mut self, canvas: &P::Canvas, bounds: RectF, frame: FrameId) -> DirtyRects {
        if self.model.get(frame).is_none() {
            return DirtyRects::new();
        }
        let siblings = if self.config.show_hovered_siblings {
            self.model.siblings_of(frame)
        } else {
            vec![frame]
        };
        let transition = self.interaction.set_hover(frame, siblings);
        self.rects_for_ids(canvas, bounds, transition.affected_ids())
    }

    /// Clear the hover, returning the rectangles of the previous sibling
    /// set.
    pub fn clear_hover(&mut self, canvas: &P::Canvas, bounds: RectF) -> DirtyRects {
        let previous = self.interaction.clear_hover();
        self.rects_for_ids(canvas, bounds, previous)
    }

    /// Toggle selection of the frame at a point. Returns the frame and
    /// its rectangle when a frame was hit.
    pub fn toggle_selection_at(
        &mut self,
        canvas: &P::Canvas,
        bounds: RectF,
        point: PointF,
    ) -> Option<(FrameId, RectF)> {
        let frame = self.frame_at(canvas, bounds, point)?;
        self.interaction.toggle_selection(frame);
        let rect = self.frame_rect(canvas, bounds, frame)?;
        Some((frame, rect))
    }

    /// Toggle selection of a known frame. Returns whether it is selected
    /// afterwards. Unknown frames are ignored.
    pub fn toggle_selection(&mut self, frame: FrameId) -> bool {
        if self.model.get(frame).is_none() {
            return false;
        }
        self.interaction.toggle_selection(frame)
    }

    /// Replace the highlighted set wholesale (empty clears).
    pub fn set_highlight(&mut self, frames: HashSet<FrameId>, search_text: impl Into<String>) {
        self.interaction.set_highlight(frames, search_text);
    }

    #[must_use]
    pub fn hovered(&self) -> Option<FrameId> {
        self.interaction.hovered()
    }

    #[must_use]
    pub fn selected(&self) -> Option<FrameId> {
        self.interaction.selected()
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Dirty rectangles for a set of frame ids, excluding frames that are
    /// currently culled (their pixels never change, so repainting them
    /// would be wasted work).
    fn rects_for_ids(
        &self,
        canvas: &P::Canvas,
        bounds: RectF,
        ids: impl IntoIterator<Item = FrameId>,
    ) -> DirtyRects {
        let row_height = self.painter.row_height(canvas);
        let threshold = self.config.frame_width_visibility_threshold;
        let mut rects = DirtyRects::new();
        for id in ids {
            let Some(span) = self.model.get(id) else {
                continue;
            };
            let rect = span_rect(span, bounds.width, row_height);
            if span.depth > 0 && rect.width < threshold {
                continue;
            }
            rects.push(rect);
        }
        rects
    }
}

impl<T, P: FramePainter<T>> fmt::Debug for RenderEngine<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngine")
            .field("config", &self.config)
            .field("spans", &self.model.len())
            .field("visible_depth", &self.visible_depth)
            .finish_non_exhaustive()
    }
}
