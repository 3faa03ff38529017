#![forbid(unsafe_code)]

//! Per-frame rendering flags.
//!
//! These are derived from transient view state on every paint pass and
//! handed to the paint collaborator; nothing here is stored per frame.

use bitflags::bitflags;

bitflags! {
    /// State bits passed to the frame painter for a single frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameRenderFlags: u8 {
        /// The frame is being painted into the minimap (1px rows, no text).
        const MINIMAP_MODE = 0b0000_0001;
        /// A highlight set is active somewhere in the graph.
        const HIGHLIGHTING = 0b0000_0010;
        /// This frame is part of the active highlight set.
        const HIGHLIGHTED = 0b0000_0100;
        /// The pointer is over this frame.
        const HOVERED = 0b0000_1000;
        /// This frame's payload equals the hovered frame's payload.
        const HOVERED_SIBLING = 0b0001_0000;
        /// A frame is selected somewhere in the graph.
        const SELECTION_ACTIVE = 0b0010_0000;
        /// This frame is the selected frame or one of its descendants.
        const SELECTED_OR_DESCENDANT = 0b0100_0000;
        /// The frame's left edge is scrolled out of the viewport.
        const LEFT_CLIPPED = 0b1000_0000;
    }
}

impl FrameRenderFlags {
    /// Compose the flag set for one frame from its derived state bits.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn compose(
        minimap_mode: bool,
        highlighting: bool,
        highlighted: bool,
        hovered: bool,
        hovered_sibling: bool,
        selection_active: bool,
        selected_or_descendant: bool,
        left_clipped: bool,
    ) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::MINIMAP_MODE, minimap_mode);
        flags.set(Self::HIGHLIGHTING, highlighting);
        flags.set(Self::HIGHLIGHTED, highlighted);
        flags.set(Self::HOVERED, hovered);
        flags.set(Self::HOVERED_SIBLING, hovered_sibling);
        flags.set(Self::SELECTION_ACTIVE, selection_active);
        flags.set(Self::SELECTED_OR_DESCENDANT, selected_or_descendant);
        flags.set(Self::LEFT_CLIPPED, left_clipped);
        flags
    }
}
