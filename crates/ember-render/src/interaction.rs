#![forbid(unsafe_code)]

//! Transient interaction state: hover, selection, highlight.
//!
//! Three independent pieces of view-only state, each with its own
//! transition rules. None of them touch the model; they are consumed as
//! [`ember_core::FrameRenderFlags`] during painting. The whole tracker
//! resets when the model is replaced.
//!
//! This module works purely over [`FrameId`]s; mapping the affected ids to
//! dirty pixel rectangles is the engine's job, since only the engine knows
//! the current bounds and row height.

use ember_core::FrameId;
use std::collections::HashSet;

/// Ids whose rectangles must be repainted after a hover transition.
#[derive(Debug, Clone, Default)]
pub struct HoverTransition {
    /// Sibling set of the previously hovered frame (empty if none).
    pub previous: Vec<FrameId>,
    /// Sibling set of the newly hovered frame (empty on clear).
    pub current: Vec<FrameId>,
}

impl HoverTransition {
    /// All affected ids, deduplicated.
    #[must_use]
    pub fn affected_ids(&self) -> Vec<FrameId> {
        let mut ids: Vec<FrameId> = self
            .previous
            .iter()
            .chain(self.current.iter())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Hover, selection, and highlight state for one graph.
#[derive(Debug, Default)]
pub struct InteractionState {
    hovered: Option<FrameId>,
    hovered_siblings: HashSet<FrameId>,
    selected: Option<FrameId>,
    highlighted: HashSet<FrameId>,
    search_text: String,
}

impl InteractionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hover a frame, replacing any previous hover.
    ///
    /// `siblings` is the precomputed sibling set (it must contain the
    /// frame itself). The returned transition lists both the old and new
    /// sibling sets so the caller can repaint exactly those frames.
    pub fn set_hover(&mut self, frame: FrameId, siblings: Vec<FrameId>) -> HoverTransition {
        let previous: Vec<FrameId> = self.hovered_siblings.drain().collect();
        self.hovered = Some(frame);
        self.hovered_siblings = siblings.iter().copied().collect();
        HoverTransition {
            previous,
            current: siblings,
        }
    }

    /// Clear the hover, reporting the sibling set that needs repainting.
    pub fn clear_hover(&mut self) -> Vec<FrameId> {
        self.hovered = None;
        self.hovered_siblings.drain().collect()
    }

    /// Toggle selection of a frame: selecting an unselected frame selects
    /// it, re-selecting the currently selected frame (by id) clears it.
    /// Returns whether the frame is selected afterwards.
    pub fn toggle_selection(&mut self, frame: FrameId) -> bool {
        if self.selected == Some(frame) {
            self.selected = None;
            false
        } else {
            self.selected = Some(frame);
            true
        }
    }

    /// Select a frame unconditionally (zoom-to-frame selects rather than
    /// toggles).
    pub fn force_select(&mut self, frame: FrameId) {
        self.selected = Some(frame);
    }

    /// Replace the highlighted set wholesale. An empty set clears
    /// highlighting. No sibling expansion is performed; the caller
    /// supplies the exact frames (e.g. from a search run elsewhere).
    pub fn set_highlight(&mut self, frames: HashSet<FrameId>, search_text: impl Into<String>) {
        self.highlighted = frames;
        self.search_text = search_text.into();
    }

    /// Drop all transient state (model replacement).
    pub fn reset(&mut self) {
        self.hovered = None;
        self.hovered_siblings.clear();
        self.selected = None;
        self.highlighted.clear();
        self.search_text.clear();
    }

    #[must_use]
    pub fn hovered(&self) -> Option<FrameId> {
        self.hovered
    }

    #[must_use]
    pub fn is_hovered_sibling(&self, frame: FrameId) -> bool {
        self.hovered_siblings.contains(&frame)
    }

    #[must_use]
    pub fn selected(&self) -> Option<FrameId> {
        self.selected
    }

    #[must_use]
    pub fn highlighting_active(&self) -> bool {
        !self.highlighted.is_empty()
    }

    #[must_use]
    pub fn is_highlighted(&self, frame: FrameId) -> bool {
        self.highlighted.contains(&frame)
    }

    /// Text the current highlight set was produced from.
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }
}
