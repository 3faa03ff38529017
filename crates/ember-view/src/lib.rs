#![forbid(unsafe_code)]

//! View layer for Emberview flame/icicle graphs.
//!
//! Wraps an [`ember_render::RenderEngine`] with the pieces a host toolkit
//! needs around it: a [`view::Viewport`] abstraction over the scroll
//! container, zoom dispatch with an override hook, and asynchronous
//! minimap generation with wait-free reads of the completed image.

pub mod minimap;
pub mod view;

pub use minimap::{Argb, MinimapColorSource, MinimapConfig, MinimapGenerator, MinimapImage};
pub use view::{GraphView, ViewConfig, Viewport, ZoomAction};
