#![forbid(unsafe_code)]

//! The graph view facade.
//!
//! [`GraphView`] ties the render engine, the viewport, and the minimap
//! together behind the surface a host toolkit talks to: feed it pointer
//! positions and a scrollable viewport, get back dirty regions, zoom
//! transitions, and minimap scroll offsets. The view never owns pixels or
//! scrollbars; both stay behind traits so the same facade drives any
//! embedding.

use crate::minimap::{MinimapColorSource, MinimapConfig, MinimapGenerator, MinimapImage};
use ember_core::{FrameGraphModel, FrameId, PointF, RectF};
use ember_render::{DirtyRects, FramePainter, GraphMode, RenderEngine, ZoomTarget};
use std::collections::HashSet;
use std::sync::Arc;

/// The scrollable surface the graph canvas lives in.
///
/// Implemented by the host toolkit's scroll container. All rectangles are
/// in canvas space: `view_rect` is the currently visible window into
/// `canvas_bounds`.
pub trait Viewport {
    /// Visible region of the canvas.
    fn view_rect(&self) -> RectF;

    /// Full canvas rectangle at the current zoom level.
    fn canvas_bounds(&self) -> RectF;

    /// Resize the canvas and move the view offset in one step.
    fn apply_zoom(&mut self, target: ZoomTarget);

    /// Move the view offset without changing the canvas size.
    fn scroll_to(&mut self, offset: PointF);
}

/// Override hook for zoom transitions (e.g. an animated zoom).
///
/// Returning `false` declines the transition and the view falls back to
/// [`Viewport::apply_zoom`].
pub trait ZoomAction {
    fn zoom(&self, viewport: &mut dyn Viewport, target: ZoomTarget) -> bool;
}

/// View-level configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Flame (root at the bottom) or icicle (root at the top).
    pub mode: GraphMode,
    /// Whether the minimap is shown and regenerated.
    pub show_minimap: bool,
    /// Ancestor rows kept visible above a zoomed frame.
    pub zoom_context_rows: u32,
    /// Minimap placement and scroll mapping.
    pub minimap: MinimapConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            mode: GraphMode::Flame,
            show_minimap: true,
            zoom_context_rows: 2,
            minimap: MinimapConfig::default(),
        }
    }
}

/// Engine, minimap, and zoom dispatch for one graph component.
pub struct GraphView<T, P: FramePainter<T>> {
    engine: RenderEngine<T, P>,
    config: ViewConfig,
    minimap: MinimapGenerator<T>,
    zoom_action: Option<Box<dyn ZoomAction>>,
}

impl<T, P> GraphView<T, P>
where
    T: Send + Sync + 'static,
    P: FramePainter<T>,
{
    pub fn new(painter: P, minimap_colors: Arc<dyn MinimapColorSource<T>>) -> Self {
        Self::with_config(painter, minimap_colors, ViewConfig::default())
    }

    pub fn with_config(
        painter: P,
        minimap_colors: Arc<dyn MinimapColorSource<T>>,
        config: ViewConfig,
    ) -> Self {
        Self {
            engine: RenderEngine::new(painter),
            config,
            minimap: MinimapGenerator::new(minimap_colors),
            zoom_action: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ViewConfig) {
        self.config = config;
    }

    #[must_use]
    pub fn engine(&self) -> &RenderEngine<T, P> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RenderEngine<T, P> {
        &mut self.engine
    }

    /// Install a custom zoom transition; `None` restores the plain jump.
    pub fn set_zoom_action(&mut self, action: Option<Box<dyn ZoomAction>>) {
        self.zoom_action = action;
    }

    /// Install a new model. Interaction state resets and the stale
    /// minimap is dropped until the next render request.
    pub fn set_model(&mut self, model: Arc<FrameGraphModel<T>>) {
        self.engine.set_model(model);
        self.minimap.clear();
    }

    pub fn clear(&mut self) {
        self.engine.clear();
        self.minimap.clear();
    }

    #[must_use]
    pub fn model(&self) -> &Arc<FrameGraphModel<T>> {
        self.engine.model()
    }

    /// Paint the visible part of the graph through the engine's painter.
    pub fn paint(&mut self, canvas: &mut P::Canvas, viewport: &dyn Viewport) {
        self.engine
            .paint(canvas, viewport.canvas_bounds(), viewport.view_rect());
    }

    /// Paint the whole graph into an offscreen canvas laid out at
    /// `graph_width` pixels, viewport-free (e.g. to export a full-graph
    /// raster). Returns the bounds the graph was laid out in.
    pub fn paint_full(&mut self, canvas: &mut P::Canvas, graph_width: f64) -> RectF {
        let row_height = self.engine.row_height(canvas);
        let rows = f64::from(self.engine.model().max_depth()) + 1.0;
        let bounds = RectF::from_size(graph_width, rows * row_height);
        self.engine.paint(canvas, bounds, bounds);
        bounds
    }

    /// Frame under a canvas-space point, if any.
    #[must_use]
    pub fn frame_at(
        &self,
        canvas: &P::Canvas,
        viewport: &dyn Viewport,
        point: PointF,
    ) -> Option<FrameId> {
        self.engine.frame_at(canvas, viewport.canvas_bounds(), point)
    }

    /// Rectangle of a known frame at the current zoom level.
    #[must_use]
    pub fn frame_rect(
        &self,
        canvas: &P::Canvas,
        viewport: &dyn Viewport,
        frame: FrameId,
    ) -> Option<RectF> {
        self.engine
            .frame_rect(canvas, viewport.canvas_bounds(), frame)
    }

    // ---------------------------------------------------------------------
    // Pointer interaction
    // ---------------------------------------------------------------------

    /// Track a pointer move: hovers the frame under `point`, or clears the
    /// hover when the pointer is over empty space or the minimap. Returns
    /// the rectangles that need repainting.
    pub fn hover_at(
        &mut self,
        canvas: &P::Canvas,
        viewport: &dyn Viewport,
        point: PointF,
    ) -> DirtyRects {
        let bounds = viewport.canvas_bounds();
        let over_minimap =
            self.config.show_minimap && self.config.minimap.contains(viewport.view_rect(), point);
        match self.engine.frame_at(canvas, bounds, point) {
            Some(frame) if !over_minimap => self.engine.set_hover(canvas, bounds, frame),
            _ => self.engine.clear_hover(canvas, bounds),
        }
    }

    /// Pointer left the component.
    pub fn pointer_exited(&mut self, canvas: &P::Canvas, viewport: &dyn Viewport) -> DirtyRects {
        self.engine.clear_hover(canvas, viewport.canvas_bounds())
    }

    /// Single click: toggle selection of the frame under `point`.
    pub fn click_at(
        &mut self,
        canvas: &P::Canvas,
        viewport: &dyn Viewport,
        point: PointF,
    ) -> Option<(FrameId, RectF)> {
        self.engine
            .toggle_selection_at(canvas, viewport.canvas_bounds(), point)
    }

    /// Replace the highlighted frame set (from an external search).
    pub fn set_highlight(&mut self, frames: HashSet<FrameId>, search_text: impl Into<String>) {
        self.engine.set_highlight(frames, search_text);
    }

    // ---------------------------------------------------------------------
    // Zoom
    // ---------------------------------------------------------------------

    /// Double click: zoom the frame under `point` to full width. Returns
    /// whether a frame was hit and the transition dispatched.
    pub fn zoom_at(
        &mut self,
        canvas: &P::Canvas,
        viewport: &mut dyn Viewport,
        point: PointF,
    ) -> bool {
        let Some(target) = self.engine.zoom_target_for_frame_at(
            canvas,
            viewport.canvas_bounds(),
            viewport.view_rect(),
            point,
            self.config.zoom_context_rows,
        ) else {
            return false;
        };
        self.dispatch_zoom(viewport, target);
        true
    }

    /// Programmatic zoom to a known frame.
    pub fn zoom_to_frame(
        &mut self,
        canvas: &P::Canvas,
        viewport: &mut dyn Viewport,
        frame: FrameId,
    ) -> bool {
        let Some(target) = self.engine.zoom_target_for_frame(
            canvas,
            viewport.canvas_bounds(),
            viewport.view_rect(),
            frame,
            self.config.zoom_context_rows,
        ) else {
            return false;
        };
        self.dispatch_zoom(viewport, target);
        true
    }

    /// Restore the 1:1 view for the current viewport width.
    pub fn reset_zoom(&mut self, canvas: &P::Canvas, viewport: &mut dyn Viewport) {
        let target = self.engine.reset_zoom_target(
            canvas,
            viewport.canvas_bounds(),
            viewport.view_rect(),
            self.config.mode,
        );
        self.dispatch_zoom(viewport, target);
    }

    fn dispatch_zoom(&mut self, viewport: &mut dyn Viewport, target: ZoomTarget) {
        if let Some(action) = &self.zoom_action
            && action.zoom(viewport, target)
        {
            return;
        }
        viewport.apply_zoom(target);
    }

    // ---------------------------------------------------------------------
    // Minimap
    // ---------------------------------------------------------------------

    /// Kick off a background minimap render for the current model.
    ///
    /// The raster height is the engine's visible depth at the current
    /// canvas width, one pixel per row. Zooming in can deepen the visible
    /// graph, so hosts re-request after zoom transitions to pick up rows
    /// that just became visible. A graph that is only a root row produces
    /// nothing.
    pub fn request_minimap(&self) {
        if !self.config.show_minimap {
            return;
        }
        let width = self.config.minimap.bounds.width as u32;
        let height = self.engine.minimap_height();
        self.minimap
            .request_render(Arc::clone(self.model()), width, height);
    }

    /// Most recently completed minimap image.
    #[must_use]
    pub fn minimap_image(&self) -> Option<Arc<MinimapImage>> {
        self.minimap.image()
    }

    #[must_use]
    pub fn minimap(&self) -> &MinimapGenerator<T> {
        &self.minimap
    }

    /// Handle a press or drag on the minimap: scroll the viewport so the
    /// clicked region comes into view. Returns whether the point was on
    /// the minimap.
    pub fn minimap_scroll(&self, viewport: &mut dyn Viewport, point: PointF) -> bool {
        if !self.config.show_minimap {
            return false;
        }
        let bounds = viewport.canvas_bounds();
        let Some(offset) = self.config.minimap.scroll_offset(
            viewport.view_rect(),
            (bounds.width, bounds.height),
            point,
        ) else {
            return false;
        };
        viewport.scroll_to(offset);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{FrameRenderFlags, FrameSpan};

    struct RowPainter;

    impl FramePainter<&'static str> for RowPainter {
        type Canvas = Vec<RectF>;

        fn row_height(&self, _canvas: &Self::Canvas) -> f64 {
            16.0
        }

        fn paint_frame(
            &mut self,
            canvas: &mut Self::Canvas,
            frame_rect: RectF,
            _span: &FrameSpan<&'static str>,
            _clipped_rect: RectF,
            _flags: FrameRenderFlags,
        ) {
            canvas.push(frame_rect);
        }
    }

    /// Scroll container stand-in that records what was applied to it.
    struct TestViewport {
        view: RectF,
        canvas: RectF,
        zooms: Vec<ZoomTarget>,
        scrolls: Vec<PointF>,
    }

    impl TestViewport {
        fn new(width: f64, height: f64) -> Self {
            Self {
                view: RectF::from_size(width, height),
                canvas: RectF::from_size(width, height),
                zooms: Vec::new(),
                scrolls: Vec::new(),
            }
        }
    }

    impl Viewport for TestViewport {
        fn view_rect(&self) -> RectF {
            self.view
        }

        fn canvas_bounds(&self) -> RectF {
            self.canvas
        }

        fn apply_zoom(&mut self, target: ZoomTarget) {
            self.canvas = RectF::from_size(target.width, target.height);
            self.view.x = target.offset_x;
            self.view.y = target.offset_y;
            self.zooms.push(target);
        }

        fn scroll_to(&mut self, offset: PointF) {
            self.view.x = offset.x;
            self.view.y = offset.y;
            self.scrolls.push(offset);
        }
    }

    fn view() -> GraphView<&'static str, RowPainter> {
        let mut view = GraphView::new(RowPainter, Arc::new(|_: &&'static str, _: u32| 0xFFu32));
        view.set_model(Arc::new(
            FrameGraphModel::with_default_equality(
                "view",
                vec![
                    FrameSpan::new("root", 0.0, 1.0, 0),
                    FrameSpan::new("a", 0.0, 0.5, 1),
                    FrameSpan::new("b", 0.5, 1.0, 1),
                    FrameSpan::new("c", 0.5, 0.75, 2),
                ],
            )
            .unwrap(),
        ));
        view
    }

    #[test]
    fn hover_then_miss_clears() {
        let mut view = view();
        let viewport = TestViewport::new(1000.0, 600.0);
        let canvas = Vec::new();

        let dirty = view.hover_at(&canvas, &viewport, PointF::new(100.0, 17.0));
        assert_eq!(dirty.len(), 1);
        assert_eq!(view.engine().hovered(), Some(FrameId(1)));

        // empty space at depth 2 to the left of "c"
        let dirty = view.hover_at(&canvas, &viewport, PointF::new(100.0, 33.0));
        assert_eq!(dirty.len(), 1);
        assert_eq!(view.engine().hovered(), None);
    }

    #[test]
    fn double_click_zooms_and_selects() {
        let mut view = view();
        let mut viewport = TestViewport::new(1000.0, 600.0);
        let canvas = Vec::new();

        assert!(view.zoom_at(&canvas, &mut viewport, PointF::new(600.0, 17.0)));
        assert_eq!(viewport.zooms.len(), 1);
        assert_eq!(viewport.canvas.width, 2000.0);
        assert_eq!(viewport.view.x, 1000.0);
        assert_eq!(view.engine().selected(), Some(FrameId(2)));

        // empty space dispatches nothing
        assert!(!view.zoom_at(&canvas, &mut viewport, PointF::new(100.0, 33.0)));
        assert_eq!(viewport.zooms.len(), 1);
    }

    #[test]
    fn zoom_action_overrides_and_declines() {
        struct Swallow;
        impl ZoomAction for Swallow {
            fn zoom(&self, _viewport: &mut dyn Viewport, _target: ZoomTarget) -> bool {
                true
            }
        }
        struct Decline;
        impl ZoomAction for Decline {
            fn zoom(&self, _viewport: &mut dyn Viewport, _target: ZoomTarget) -> bool {
                false
            }
        }

        let mut view = view();
        let mut viewport = TestViewport::new(1000.0, 600.0);
        let canvas = Vec::new();

        view.set_zoom_action(Some(Box::new(Swallow)));
        assert!(view.zoom_to_frame(&canvas, &mut viewport, FrameId(1)));
        assert!(viewport.zooms.is_empty());

        view.set_zoom_action(Some(Box::new(Decline)));
        assert!(view.zoom_to_frame(&canvas, &mut viewport, FrameId(1)));
        assert_eq!(viewport.zooms.len(), 1);
    }

    #[test]
    fn reset_zoom_restores_viewport_width() {
        let mut view = view();
        let mut viewport = TestViewport::new(1000.0, 600.0);
        let canvas = Vec::new();

        view.zoom_to_frame(&canvas, &mut viewport, FrameId(3));
        assert!(viewport.canvas.width > 1000.0);

        view.reset_zoom(&canvas, &mut viewport);
        assert_eq!(viewport.canvas.width, 1000.0);
        assert_eq!(viewport.view.x, 0.0);
    }

    #[test]
    fn minimap_renders_and_scrolls() {
        let mut view = view();
        let mut viewport = TestViewport::new(1000.0, 600.0);

        view.request_minimap();
        view.minimap().wait_for_render();
        let image = view.minimap_image().unwrap();
        assert_eq!(image.width(), 200);
        assert_eq!(image.height(), 2);

        // a press inside the minimap scrolls, one outside does not
        let config = view.config().minimap.clone();
        let screen = config.screen_rect(viewport.view_rect());
        let inside = PointF::new(screen.x + 15.0, screen.y + 15.0);
        assert!(view.minimap_scroll(&mut viewport, inside));
        assert_eq!(viewport.scrolls.len(), 1);
        assert!(!view.minimap_scroll(&mut viewport, PointF::new(900.0, 10.0)));
    }

    #[test]
    fn hiding_the_minimap_disables_requests_and_scrolling() {
        let mut view = view();
        let mut viewport = TestViewport::new(1000.0, 600.0);
        view.set_config(ViewConfig {
            show_minimap: false,
            ..ViewConfig::default()
        });

        view.request_minimap();
        view.minimap().wait_for_render();
        assert!(view.minimap_image().is_none());

        let screen = view.config().minimap.screen_rect(viewport.view_rect());
        let inside = PointF::new(screen.x + 15.0, screen.y + 15.0);
        assert!(!view.minimap_scroll(&mut viewport, inside));
    }

    #[test]
    fn new_model_drops_the_stale_minimap() {
        let mut view = view();
        view.request_minimap();
        view.minimap().wait_for_render();
        assert!(view.minimap_image().is_some());

        view.set_model(Arc::new(
            FrameGraphModel::with_default_equality(
                "next",
                vec![FrameSpan::new("root", 0.0, 1.0, 0)],
            )
            .unwrap(),
        ));
        assert!(view.minimap_image().is_none());

        // a root-only graph never produces an image
        view.request_minimap();
        view.minimap().wait_for_render();
        assert!(view.minimap_image().is_none());
    }

    #[test]
    fn minimap_height_tracks_canvas_visible_depth() {
        let mut view = GraphView::new(RowPainter, Arc::new(|_: &&'static str, _: u32| 0xFFu32));
        // the depth-2 and depth-3 frames are narrower than 1% of the graph,
        // so they would be culled at the minimap's own raster width
        view.set_model(Arc::new(
            FrameGraphModel::with_default_equality(
                "narrow",
                vec![
                    FrameSpan::new("root", 0.0, 1.0, 0),
                    FrameSpan::new("a", 0.0, 0.5, 1),
                    FrameSpan::new("b", 0.0, 0.02, 2),
                    FrameSpan::new("c", 0.0, 0.008, 3),
                ],
            )
            .unwrap(),
        ));
        let canvas = Vec::new();

        // at the 1000px canvas every frame clears the 2px threshold
        view.engine_mut().visible_height(&canvas, 1000.0);
        assert_eq!(view.engine().minimap_height(), 3);

        view.request_minimap();
        view.minimap().wait_for_render();
        let image = view.minimap_image().unwrap();
        assert_eq!(image.height(), 3);
        // the narrow depth-2 frame keeps its row in the raster
        assert!(image.pixel(0, 2).is_some_and(|px| px != 0));
    }

    #[test]
    fn paint_full_lays_out_every_row_viewport_free() {
        let mut view = view();
        let mut canvas = Vec::new();

        let bounds = view.paint_full(&mut canvas, 1000.0);
        assert_eq!(bounds, RectF::from_size(1000.0, 3.0 * 16.0));
        assert_eq!(canvas.len(), 4);
    }

    #[test]
    fn paint_goes_through_the_viewport() {
        let mut view = view();
        let viewport = TestViewport::new(1000.0, 600.0);
        let mut canvas = Vec::new();
        view.paint(&mut canvas, &viewport);
        assert_eq!(canvas.len(), 4);
    }
}
