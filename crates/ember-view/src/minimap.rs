#![forbid(unsafe_code)]

//! Asynchronous minimap generation.
//!
//! The minimap is a shrunken rendition of the whole graph at one pixel per
//! depth row, with no width culling. Rendering walks the full span list,
//! so it runs on a background thread; the completed image lands in a
//! single-slot mailbox ([`arc_swap::ArcSwapOption`]) that the paint path
//! reads wait-free. Requests are never cancelled: overlapping renders race
//! and the last one to complete wins, which is harmless because every
//! render of the same model produces the same image.

use arc_swap::ArcSwapOption;
use ember_core::{FrameGraphModel, PointF, RectF};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Packed `0xAARRGGBB` color, the raster format of [`MinimapImage`].
pub type Argb = u32;

/// Picks the fill color for one frame in the minimap.
///
/// No view flags apply here: the minimap shows neither hover nor
/// highlight, so the color depends only on the frame payload and depth.
pub trait MinimapColorSource<T>: Send + Sync {
    fn frame_color(&self, node: &T, depth: u32) -> Argb;
}

impl<T, F> MinimapColorSource<T> for F
where
    F: Fn(&T, u32) -> Argb + Send + Sync,
{
    fn frame_color(&self, node: &T, depth: u32) -> Argb {
        self(node, depth)
    }
}

/// A completed minimap render: `width * height` packed ARGB pixels in
/// row-major order, one row per depth level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimapImage {
    width: u32,
    height: u32,
    pixels: Vec<Argb>,
}

impl MinimapImage {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[Argb] {
        &self.pixels
    }

    /// Pixel at (x, y), or `None` outside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }
}

/// Placement of the minimap within the viewport and the scroll math for
/// clicks landing on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapConfig {
    /// Minimap rectangle, positioned relative to the viewport: `x` from
    /// the left edge, `y` up from the bottom edge.
    pub bounds: RectF,
    /// Padding between the minimap raster and its frame decoration.
    pub inset: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            bounds: RectF::new(50.0, 50.0, 200.0, 100.0),
            inset: 10.0,
        }
    }
}

impl MinimapConfig {
    /// On-screen rectangle of the minimap (raster plus inset) for the
    /// current viewport, anchored to the viewport's bottom-left corner.
    #[must_use]
    pub fn screen_rect(&self, view_rect: RectF) -> RectF {
        RectF::new(
            view_rect.x + self.bounds.x,
            view_rect.y + view_rect.height - self.bounds.height - self.bounds.y,
            self.bounds.width + 2.0 * self.inset,
            self.bounds.height + 2.0 * self.inset,
        )
    }

    /// Whether a viewport-space point lands on the minimap.
    #[must_use]
    pub fn contains(&self, view_rect: RectF, point: PointF) -> bool {
        self.screen_rect(view_rect).contains(point)
    }

    /// Canvas scroll offset for a click at `point` on the minimap.
    ///
    /// The inverse of the minimap's shrink: a minimap-local position maps
    /// back to full-canvas coordinates, then the viewport extent is
    /// subtracted so the clicked region ends up in view. Returns `None`
    /// when the point is outside the minimap or the canvas is degenerate.
    #[must_use]
    pub fn scroll_offset(
        &self,
        view_rect: RectF,
        canvas_size: (f64, f64),
        point: PointF,
    ) -> Option<PointF> {
        if !self.contains(view_rect, point) {
            return None;
        }
        let (canvas_width, canvas_height) = canvas_size;
        if canvas_width <= 0.0 || canvas_height <= 0.0 {
            return None;
        }
        let scale_x = self.bounds.width / canvas_width;
        let scale_y = self.bounds.height / canvas_height;

        let local_x = point.x - (view_rect.x + self.bounds.x);
        let local_y =
            point.y - (view_rect.y + view_rect.height - self.bounds.height - self.bounds.y);

        Some(PointF::new(
            local_x / scale_x - view_rect.width,
            local_y / scale_y - view_rect.height,
        ))
    }
}

/// Background minimap renderer with a last-write-wins result slot.
///
/// `request_render` spawns a thread per request and returns immediately;
/// `image` reads the most recently completed render. A failed render (a
/// panicking color source) leaves the previous image in place and logs.
pub struct MinimapGenerator<T> {
    colors: Arc<dyn MinimapColorSource<T>>,
    slot: Arc<ArcSwapOption<MinimapImage>>,
    generation: Arc<AtomicU64>,
    last_worker: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl<T: Send + Sync + 'static> MinimapGenerator<T> {
    pub fn new(colors: Arc<dyn MinimapColorSource<T>>) -> Self {
        Self {
            colors,
            slot: Arc::new(ArcSwapOption::const_empty()),
            generation: Arc::new(AtomicU64::new(0)),
            last_worker: Mutex::new(None),
        }
    }

    /// Most recently completed image, if any render has finished.
    #[must_use]
    pub fn image(&self) -> Option<Arc<MinimapImage>> {
        self.slot.load_full()
    }

    /// Drop the current image (model cleared).
    pub fn clear(&self) {
        self.slot.store(None);
    }

    /// Render `model` into a `width x height` raster on a background
    /// thread. A height of one or less carries no information beyond the
    /// root row, so the request is dropped.
    pub fn request_render(&self, model: Arc<FrameGraphModel<T>>, width: u32, height: u32) {
        if width == 0 || height <= 1 {
            return;
        }
        let colors = Arc::clone(&self.colors);
        let slot = Arc::clone(&self.slot);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        let handle = std::thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                render_minimap(&model, &*colors, width, height)
            }));
            match result {
                Ok(image) => {
                    tracing::debug!(generation, width, height, "minimap render complete");
                    slot.store(Some(Arc::new(image)));
                }
                Err(_) => {
                    tracing::warn!(generation, "minimap render panicked, keeping previous image");
                }
            }
        });

        if let Ok(mut worker) = self.last_worker.lock() {
            *worker = Some(handle);
        }
    }

    /// Block until the most recently spawned render finishes. Test and
    /// shutdown helper; the paint path never waits.
    pub fn wait_for_render(&self) {
        let handle = match self.last_worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl<T> std::fmt::Debug for MinimapGenerator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinimapGenerator")
            .field("has_image", &self.slot.load().is_some())
            .finish_non_exhaustive()
    }
}

/// Rasterize every span at one pixel per row. No culling: even sub-pixel
/// frames contribute, since rounding their edges to the same column still
/// marks that column occupied.
fn render_minimap<T>(
    model: &FrameGraphModel<T>,
    colors: &dyn MinimapColorSource<T>,
    width: u32,
    height: u32,
) -> MinimapImage {
    let mut pixels = vec![0u32; width as usize * height as usize];
    let w = f64::from(width);

    for span in model.spans() {
        if span.depth >= height {
            continue;
        }
        let x0 = ((w * span.start_x).floor() as usize).min(width as usize - 1);
        let x1 = ((w * span.end_x).ceil() as usize).clamp(x0 + 1, width as usize);
        let row = span.depth as usize * width as usize;
        let color = colors.frame_color(&span.node, span.depth);
        pixels[row + x0..row + x1].fill(color);
    }

    MinimapImage {
        width,
        height,
        pixels,
    }
}
