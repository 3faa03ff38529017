#![forbid(unsafe_code)]

//! Core data types for Emberview flame/icicle graphs.
//!
//! This crate is pure data: floating-point geometry primitives, the
//! flattened frame-interval model with its validation rules, and the
//! per-frame render-flag bitset handed to paint collaborators. It has no
//! opinion about how frames are drawn or which toolkit hosts the graph.

pub mod flags;
pub mod geometry;
pub mod model;

pub use flags::FrameRenderFlags;
pub use geometry::{PointF, RectF};
pub use model::{FrameEquality, FrameGraphModel, FrameId, FrameSpan, ModelError};
