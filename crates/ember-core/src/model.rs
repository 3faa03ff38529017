#![forbid(unsafe_code)]

//! Flattened frame-interval model.
//!
//! A flame graph's raw data is a weighted call-stack tree, but walking a
//! tree during painting is too slow. The tree is pre-flattened (depth-first,
//! root first) into a list of [`FrameSpan`]s whose horizontal extents are
//! normalized to the root's full width. The model is immutable once
//! assigned; callers replace it wholesale, which invalidates all transient
//! view state.
//!
//! The node payload `T` is opaque to the engine: it is never inspected
//! beyond the caller-supplied equality predicate used to find "the same
//! logical frame elsewhere in the tree" (e.g. recursive calls).

use std::fmt;
use std::sync::Arc;

/// Slack tolerated in containment/overlap checks, since normalized extents
/// are usually produced by cumulative floating-point sums.
const COORD_EPSILON: f64 = 1e-9;

/// Identifies a frame by its index in the model's span list.
///
/// Identity (selection toggling) compares ids; sibling relationships go
/// through the model's equality predicate instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Index into [`FrameGraphModel::spans`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One stack frame flattened to a horizontal interval.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpan<T> {
    /// Caller-owned node payload; never inspected by the engine.
    pub node: T,
    /// Left extent, normalized to the root's full width.
    pub start_x: f64,
    /// Right extent, normalized to the root's full width.
    pub end_x: f64,
    /// Stack row, 0 = root.
    pub depth: u32,
}

impl<T> FrameSpan<T> {
    /// Create a new span.
    pub const fn new(node: T, start_x: f64, end_x: f64, depth: u32) -> Self {
        Self {
            node,
            start_x,
            end_x,
            depth,
        }
    }

    /// Normalized width of the span.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.end_x - self.start_x
    }
}

/// Predicate deciding whether two node payloads are "the same logical
/// frame" (used for hover sibling detection).
pub type FrameEquality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Errors rejected at model-assignment time.
///
/// Layout never validates; a model that constructs successfully is safe to
/// lay out with no further checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A coordinate is NaN or infinite.
    NonFiniteCoordinate { index: usize },
    /// `start_x > end_x`.
    InvertedRange { index: usize },
    /// An extent falls outside [0, 1].
    OutOfUnitRange { index: usize },
    /// The first span must be the root (depth 0).
    RootNotFirst,
    /// The root span must cover [0, 1].
    RootNotFullWidth { start_x: f64, end_x: f64 },
    /// More than one span has depth 0.
    MultipleRoots { index: usize },
    /// Depth increases by more than one over the previous span; the list
    /// is required to be a depth-first pre-order flattening.
    DepthJump { index: usize, depth: u32 },
    /// A span overlaps the previous span at the same depth.
    SiblingOverlap { index: usize },
    /// A span's range escapes its parent's range.
    ChildOutsideParent { index: usize },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteCoordinate { index } => {
                write!(f, "span {index} has a non-finite coordinate")
            }
            Self::InvertedRange { index } => {
                write!(f, "span {index} has start_x > end_x")
            }
            Self::OutOfUnitRange { index } => {
                write!(f, "span {index} extends outside the [0, 1] range")
            }
            Self::RootNotFirst => write!(f, "first span must be the depth-0 root"),
            Self::RootNotFullWidth { start_x, end_x } => {
                write!(f, "root span must cover [0, 1], got [{start_x}, {end_x}]")
            }
            Self::MultipleRoots { index } => {
                write!(f, "span {index} is a second depth-0 root")
            }
            Self::DepthJump { index, depth } => write!(
                f,
                "span {index} jumps to depth {depth}; list must be a pre-order flattening"
            ),
            Self::SiblingOverlap { index } => {
                write!(f, "span {index} overlaps its predecessor at the same depth")
            }
            Self::ChildOutsideParent { index } => {
                write!(f, "span {index} escapes its parent's range")
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// The flattened interval list plus metadata.
///
/// Replaced wholesale on update; there is no incremental diff.
pub struct FrameGraphModel<T> {
    title: String,
    description: Option<String>,
    spans: Vec<FrameSpan<T>>,
    equality: FrameEquality<T>,
    max_depth: u32,
}

impl<T> FrameGraphModel<T> {
    /// Create a model from a pre-order flattened span list.
    ///
    /// Validates the interval invariants (root shape, sibling overlap,
    /// parent containment) and rejects bad input here rather than failing
    /// silently during layout. An empty span list is a valid, empty model.
    pub fn new(
        title: impl Into<String>,
        equality: FrameEquality<T>,
        spans: Vec<FrameSpan<T>>,
    ) -> Result<Self, ModelError> {
        validate_spans(&spans)?;
        let max_depth = spans.iter().map(|s| s.depth).max().unwrap_or(0);
        Ok(Self {
            title: title.into(),
            description: None,
            spans,
            equality,
            max_depth,
        })
    }

    /// Create an empty model that renders nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            description: None,
            spans: Vec::new(),
            equality: Arc::new(|_, _| false),
            max_depth: 0,
        }
    }

    /// Attach a description (e.g. for a root-frame tooltip).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Graph title, shown in the root frame.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Optional descriptive text.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// All spans, root first.
    #[must_use]
    pub fn spans(&self) -> &[FrameSpan<T>] {
        &self.spans
    }

    /// Span for an id, if the id is in range.
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&FrameSpan<T>> {
        self.spans.get(id.index())
    }

    /// Number of spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the model has no spans at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Maximum depth present in the model.
    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Apply the sibling-equality predicate to two spans' payloads.
    #[must_use]
    pub fn nodes_equal(&self, a: &FrameSpan<T>, b: &FrameSpan<T>) -> bool {
        (self.equality)(&a.node, &b.node)
    }

    /// All frames whose payload equals the given frame's payload.
    ///
    /// The result always contains `id` itself, even under a non-reflexive
    /// predicate. Returns an empty list for an out-of-range id.
    #[must_use]
    pub fn siblings_of(&self, id: FrameId) -> Vec<FrameId> {
        let Some(target) = self.get(id) else {
            return Vec::new();
        };
        let mut siblings: Vec<FrameId> = self
            .spans
            .iter()
            .enumerate()
            .filter(|(_, span)| (self.equality)(&span.node, &target.node))
            .map(|(i, _)| FrameId(i))
            .collect();
        if !siblings.contains(&id) {
            siblings.push(id);
        }
        siblings
    }
}

impl<T: PartialEq + 'static> FrameGraphModel<T> {
    /// Create a model whose sibling equality is the payload's `PartialEq`.
    pub fn with_default_equality(
        title: impl Into<String>,
        spans: Vec<FrameSpan<T>>,
    ) -> Result<Self, ModelError> {
        Self::new(title, Arc::new(|a: &T, b: &T| a == b), spans)
    }
}

impl<T: fmt::Debug> fmt::Debug for FrameGraphModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameGraphModel")
            .field("title", &self.title)
            .field("spans", &self.spans.len())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Single O(n) pass over a pre-order flattening: tracks the ancestor range
/// stack for containment and the last end seen per depth for sibling
/// overlap.
fn validate_spans<T>(spans: &[FrameSpan<T>]) -> Result<(), ModelError> {
    if spans.is_empty() {
        return Ok(());
    }

    // Ancestor ranges, indexed by depth.
    let mut stack: Vec<(f64, f64)> = Vec::new();
    // Rightmost end seen so far, per depth.
    let mut last_end: Vec<f64> = Vec::new();

    for (index, span) in spans.iter().enumerate() {
        if !span.start_x.is_finite() || !span.end_x.is_finite() {
            return Err(ModelError::NonFiniteCoordinate { index });
        }
        if span.start_x > span.end_x {
            return Err(ModelError::InvertedRange { index });
        }
        if span.start_x < -COORD_EPSILON || span.end_x > 1.0 + COORD_EPSILON {
            return Err(ModelError::OutOfUnitRange { index });
        }

        let depth = span.depth as usize;
        if index == 0 {
            if depth != 0 {
                return Err(ModelError::RootNotFirst);
            }
            if span.start_x != 0.0 || span.end_x != 1.0 {
                return Err(ModelError::RootNotFullWidth {
                    start_x: span.start_x,
                    end_x: span.end_x,
                });
            }
        } else {
            if depth == 0 {
                return Err(ModelError::MultipleRoots { index });
            }
            if depth > stack.len() {
                return Err(ModelError::DepthJump {
                    index,
                    depth: span.depth,
                });
            }
        }

        // Unwind to this span's parent.
        stack.truncate(depth);
        if let Some(&(parent_start, parent_end)) = stack.last()
            && (span.start_x < parent_start - COORD_EPSILON
                || span.end_x > parent_end + COORD_EPSILON)
        {
            return Err(ModelError::ChildOutsideParent { index });
        }

        if let Some(&prev_end) = last_end.get(depth)
            && span.start_x < prev_end - COORD_EPSILON
        {
            return Err(ModelError::SiblingOverlap { index });
        }
        if last_end.len() <= depth {
            last_end.resize(depth + 1, f64::NEG_INFINITY);
        }
        last_end[depth] = span.end_x;

        stack.push((span.start_x, span.end_x));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(name: &'static str, start: f64, end: f64, depth: u32) -> FrameSpan<&'static str> {
        FrameSpan::new(name, start, end, depth)
    }

    fn model(spans: Vec<FrameSpan<&'static str>>) -> Result<FrameGraphModel<&'static str>, ModelError> {
        FrameGraphModel::with_default_equality("test", spans)
    }

    #[test]
    fn valid_model_accepted() {
        let m = model(vec![
            span("root", 0.0, 1.0, 0),
            span("a", 0.0, 0.5, 1),
            span("b", 0.5, 1.0, 1),
            span("a", 0.5, 0.75, 2),
        ])
        .unwrap();
        assert_eq!(m.len(), 4);
        assert_eq!(m.max_depth(), 2);
    }

    #[test]
    fn empty_model_is_valid() {
        let m = FrameGraphModel::<&'static str>::empty();
        assert!(m.is_empty());
        assert_eq!(m.max_depth(), 0);
        let constructed = model(vec![]).unwrap();
        assert!(constructed.is_empty());
    }

    #[test]
    fn rejects_missing_root() {
        assert_eq!(
            model(vec![span("a", 0.0, 0.5, 1)]).unwrap_err(),
            ModelError::RootNotFirst
        );
    }

    #[test]
    fn rejects_partial_root() {
        assert!(matches!(
            model(vec![span("root", 0.0, 0.9, 0)]).unwrap_err(),
            ModelError::RootNotFullWidth { .. }
        ));
    }

    #[test]
    fn rejects_second_root() {
        assert_eq!(
            model(vec![span("root", 0.0, 1.0, 0), span("r2", 0.0, 1.0, 0)]).unwrap_err(),
            ModelError::MultipleRoots { index: 1 }
        );
    }

    #[test]
    fn rejects_inverted_range() {
        assert_eq!(
            model(vec![span("root", 0.0, 1.0, 0), span("a", 0.6, 0.4, 1)]).unwrap_err(),
            ModelError::InvertedRange { index: 1 }
        );
    }

    #[test]
    fn rejects_sibling_overlap() {
        assert_eq!(
            model(vec![
                span("root", 0.0, 1.0, 0),
                span("a", 0.0, 0.6, 1),
                span("b", 0.5, 1.0, 1),
            ])
            .unwrap_err(),
            ModelError::SiblingOverlap { index: 2 }
        );
    }

    #[test]
    fn touching_siblings_are_fine() {
        assert!(
            model(vec![
                span("root", 0.0, 1.0, 0),
                span("a", 0.0, 0.5, 1),
                span("b", 0.5, 1.0, 1),
            ])
            .is_ok()
        );
    }

    #[test]
    fn rejects_child_escaping_parent() {
        assert_eq!(
            model(vec![
                span("root", 0.0, 1.0, 0),
                span("a", 0.0, 0.4, 1),
                span("deep", 0.3, 0.6, 2),
            ])
            .unwrap_err(),
            ModelError::ChildOutsideParent { index: 2 }
        );
    }

    #[test]
    fn rejects_depth_jump() {
        assert_eq!(
            model(vec![span("root", 0.0, 1.0, 0), span("a", 0.0, 0.5, 2)]).unwrap_err(),
            ModelError::DepthJump { index: 1, depth: 2 }
        );
    }

    #[test]
    fn rejects_non_finite() {
        assert_eq!(
            model(vec![span("root", 0.0, 1.0, 0), span("a", 0.0, f64::NAN, 1)]).unwrap_err(),
            ModelError::NonFiniteCoordinate { index: 1 }
        );
    }

    #[test]
    fn siblings_include_self_and_recursive_twins() {
        let m = model(vec![
            span("root", 0.0, 1.0, 0),
            span("f", 0.0, 0.5, 1),
            span("g", 0.5, 1.0, 1),
            span("f", 0.5, 0.9, 2),
        ])
        .unwrap();
        let siblings = m.siblings_of(FrameId(1));
        assert!(siblings.contains(&FrameId(1)));
        assert!(siblings.contains(&FrameId(3)));
        assert!(!siblings.contains(&FrameId(2)));
    }

    #[test]
    fn siblings_include_self_under_never_equal_predicate() {
        let m = FrameGraphModel::new(
            "t",
            Arc::new(|_: &&str, _: &&str| false),
            vec![span("root", 0.0, 1.0, 0), span("a", 0.0, 0.5, 1)],
        )
        .unwrap();
        assert_eq!(m.siblings_of(FrameId(1)), vec![FrameId(1)]);
    }

    #[test]
    fn display_messages_name_the_span() {
        let err = model(vec![
            span("root", 0.0, 1.0, 0),
            span("a", 0.0, 0.6, 1),
            span("b", 0.5, 1.0, 1),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("span 2"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any tiling of [0, 1] at sorted cut points is a valid
            /// sibling row.
            #[test]
            fn tiled_siblings_validate(
                cuts in proptest::collection::vec(0.01f64..0.99, 1..24),
            ) {
                let mut cuts = cuts;
                cuts.sort_by(f64::total_cmp);
                cuts.dedup();

                let mut spans = vec![FrameSpan::new(0usize, 0.0, 1.0, 0)];
                let mut start = 0.0;
                for (i, &cut) in cuts.iter().enumerate() {
                    spans.push(FrameSpan::new(i + 1, start, cut, 1));
                    start = cut;
                }
                spans.push(FrameSpan::new(cuts.len() + 1, start, 1.0, 1));
                let expected = spans.len();

                let model = FrameGraphModel::with_default_equality("tiled", spans).unwrap();
                prop_assert_eq!(model.len(), expected);
                prop_assert_eq!(model.max_depth(), 1);
            }

            /// Nested chains stay within their ancestors and validate at
            /// any depth.
            #[test]
            fn nested_chains_validate(
                cuts in proptest::collection::vec(0.1f64..0.9, 1..32),
            ) {
                let mut spans = vec![FrameSpan::new(0usize, 0.0, 1.0, 0)];
                let mut end = 1.0;
                for (depth, cut) in cuts.iter().enumerate() {
                    end *= cut;
                    spans.push(FrameSpan::new(depth + 1, 0.0, end, depth as u32 + 1));
                }
                let deepest = cuts.len() as u32;

                let model = FrameGraphModel::with_default_equality("chain", spans).unwrap();
                prop_assert_eq!(model.max_depth(), deepest);
            }

            /// A sibling reaching back into its predecessor is always
            /// rejected, wherever the overlap falls.
            #[test]
            fn overlapping_siblings_rejected(
                split in 0.2f64..0.8,
                reach in 0.01f64..0.15,
            ) {
                let overlap_start = (split - reach).max(0.0);
                let spans = vec![
                    FrameSpan::new(0usize, 0.0, 1.0, 0),
                    FrameSpan::new(1usize, 0.0, split, 1),
                    FrameSpan::new(2usize, overlap_start, 1.0, 1),
                ];
                let err = FrameGraphModel::with_default_equality("overlap", spans).unwrap_err();
                prop_assert_eq!(err, ModelError::SiblingOverlap { index: 2 });
            }
        }
    }
}
