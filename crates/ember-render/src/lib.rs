#![forbid(unsafe_code)]

//! Render engine for Emberview flame/icicle graphs.
//!
//! Converts a validated [`ember_core::FrameGraphModel`] into pixel
//! geometry, culls sub-pixel frames, hit-tests pointer positions, computes
//! zoom transitions, and tracks hover/selection/highlight state. Drawing
//! actual pixels is delegated to the [`paint::FramePainter`] collaborator;
//! this crate only decides *where* frames are and *which* state bits apply
//! to each.

pub mod engine;
pub mod interaction;
pub mod paint;
pub mod zoom;

pub use engine::{ConfigError, DirtyRects, EngineConfig, RenderEngine, span_rect, visible_depth};
pub use interaction::{HoverTransition, InteractionState};
pub use paint::FramePainter;
pub use zoom::{GraphMode, ZoomTarget};
