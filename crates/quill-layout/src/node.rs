//! Candidate layout values.
//!
//! A [`LayoutNode`] is one fully specified shape for an element: its extent,
//! its badness and where each of its slots is placed relative to its anchor.
//! Nodes are immutable once built; children are shared behind `Arc`, so
//! attaching a child never copies its subtree.

use std::ops::Range;
use std::sync::Arc;

use quill_core::{ElementId, Extent, SlotId};
use smallvec::SmallVec;

/// One candidate shape of an element.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    element: Option<ElementId>,
    width: i32,
    height: i32,
    anchor: i32,
    badness: f64,
    placements: SmallVec<[Placement; 4]>,
}

/// Where a slot ended up inside its parent's candidate.
#[derive(Debug, Clone)]
pub struct Placement {
    pub slot: SlotId,
    /// The child's chosen shape, or `None` for an empty slot
    pub child: Option<SubLayout>,
    /// Extent occupied by the slot (the configured footprint when empty)
    pub footprint: Extent,
    /// Offset of the slot's left edge from the parent's left edge
    pub x: i32,
    /// Offset of the slot's anchor line from the parent's anchor line
    pub y: i32,
}

impl LayoutNode {
    /// A childless node with a measured extent.
    pub fn leaf(element: Option<ElementId>, extent: Extent) -> Self {
        Self {
            element,
            width: extent.width.max(1),
            height: extent.height,
            anchor: extent.anchor,
            badness: 0.0,
            placements: SmallVec::new(),
        }
    }

    /// An empty composite, grown by [`attach`](Self::attach) and friends.
    pub fn composite(element: Option<ElementId>) -> Self {
        Self {
            element,
            width: 0,
            height: 0,
            anchor: 0,
            badness: 0.0,
            placements: SmallVec::new(),
        }
    }

    /// Place a child's shape in `slot`.
    pub fn attach(mut self, slot: SlotId, child: &SubLayout, x: i32, y: i32) -> Self {
        let node = child.node();
        self.absorb(node.extent(), x, y);
        self.badness += node.badness;
        self.placements.push(Placement {
            slot,
            child: Some(child.clone()),
            footprint: node.extent(),
            x,
            y,
        });
        self
    }

    /// Reserve `footprint` for an empty slot so it stays addressable.
    pub fn attach_empty(mut self, slot: SlotId, footprint: Extent, x: i32, y: i32) -> Self {
        self.absorb(footprint, x, y);
        self.placements.push(Placement {
            slot,
            child: None,
            footprint,
            x,
            y,
        });
        self
    }

    /// Splice a sibling's placements into this node, shifted by `(x, y)`.
    ///
    /// The sibling's own element (if any) does not survive the merge.
    pub fn merge(mut self, sibling: &LayoutNode, x: i32, y: i32) -> Self {
        self.absorb(sibling.extent(), x, y);
        self.badness += sibling.badness;
        self.placements
            .extend(sibling.placements.iter().map(|p| Placement {
                x: p.x + x,
                y: p.y + y,
                ..p.clone()
            }));
        self
    }

    /// Grow the bounds to cover a box that is drawn by this element itself.
    pub fn cover(mut self, extent: Extent, x: i32, y: i32) -> Self {
        self.absorb(extent, x, y);
        self
    }

    /// Add badness to this candidate.
    pub fn with_badness(mut self, extra: f64) -> Self {
        self.badness += extra.max(0.0);
        self
    }

    fn absorb(&mut self, extent: Extent, x: i32, y: i32) {
        let above = self.anchor.max(extent.anchor - y);
        let below = (self.height - self.anchor).max(y + extent.height - extent.anchor);
        self.height = above + below;
        self.anchor = above;
        self.width = self.width.max(x + extent.width);
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Distance from the top edge to the anchor line.
    pub fn anchor(&self) -> i32 {
        self.anchor
    }

    pub fn badness(&self) -> f64 {
        self.badness
    }

    pub fn extent(&self) -> Extent {
        Extent {
            width: self.width,
            height: self.height,
            anchor: self.anchor,
        }
    }

    pub fn area(&self) -> i64 {
        self.extent().area()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Placement of `slot`, if this node has one.
    pub fn placement(&self, slot: SlotId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.slot == slot)
    }

    /// Weak dominance: no worse in width, height and badness.
    pub fn dominates(&self, other: &LayoutNode) -> bool {
        self.width <= other.width && self.height <= other.height && self.badness <= other.badness
    }
}

/// A wrapped sequence: its node plus how items were split into rows.
#[derive(Debug, Clone)]
pub struct SequenceLayoutData {
    pub node: LayoutNode,
    pub rows: Vec<RowSpan>,
}

/// One row of a wrapped sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpan {
    /// Item indices on this row
    pub items: Range<usize>,
    pub width: i32,
    pub height: i32,
    /// Offset of the row's anchor line from the sequence anchor line
    pub y: i32,
}

/// A child shape: either a plain node or a wrapped sequence.
#[derive(Debug, Clone)]
pub enum SubLayout {
    Simple(Arc<LayoutNode>),
    Sequence(Arc<SequenceLayoutData>),
}

impl SubLayout {
    pub fn node(&self) -> &LayoutNode {
        match self {
            SubLayout::Simple(node) => node,
            SubLayout::Sequence(data) => &data.node,
        }
    }

    /// Row structure, for sequence shapes.
    pub fn rows(&self) -> Option<&[RowSpan]> {
        match self {
            SubLayout::Simple(_) => None,
            SubLayout::Sequence(data) => Some(&data.rows),
        }
    }

    /// Number of rows (1 for simple shapes).
    pub fn row_count(&self) -> usize {
        self.rows().map_or(1, |rows| rows.len())
    }
}

impl From<LayoutNode> for SubLayout {
    fn from(node: LayoutNode) -> Self {
        SubLayout::Simple(Arc::new(node))
    }
}

impl From<SequenceLayoutData> for SubLayout {
    fn from(data: SequenceLayoutData) -> Self {
        SubLayout::Sequence(Arc::new(data))
    }
}

/// The alternatives computed for one element during a layout pass.
///
/// Never empty.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    candidates: Vec<SubLayout>,
    choice_points: usize,
}

impl CandidateSet {
    /// Build a set from alternatives; `None` if there are none.
    pub fn new(candidates: Vec<SubLayout>, choice_points: usize) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            candidates,
            choice_points,
        })
    }

    /// A set with exactly one alternative.
    pub fn single(candidate: SubLayout, choice_points: usize) -> Self {
        Self {
            candidates: vec![candidate],
            choice_points,
        }
    }

    pub fn candidates(&self) -> &[SubLayout] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of choice points in the subtree this set was computed for.
    pub fn choice_points(&self) -> usize {
        self.choice_points
    }

    /// Smallest width any alternative reaches.
    pub fn min_width(&self) -> i32 {
        self.candidates
            .iter()
            .map(|c| c.node().width())
            .min()
            .unwrap_or(0)
    }
}

/// Receiver of the committed geometry.
pub trait ApplyLayout {
    /// Called once per element of the chosen layout, top-down. `(x, y)` is
    /// the position of the element's left edge on its anchor line.
    fn apply_layout(&mut self, element: ElementId, x: i32, y: i32, layout: &LayoutNode);

    /// Called for every empty slot, with the same coordinate convention.
    fn apply_empty_slot(
        &mut self,
        _owner: Option<ElementId>,
        _slot: SlotId,
        _x: i32,
        _y: i32,
        _footprint: Extent,
    ) {
    }
}

/// Commit a chosen layout with its anchor point at `(x, y)`.
pub fn instantiate<A: ApplyLayout + ?Sized>(layout: &LayoutNode, x: i32, y: i32, sink: &mut A) {
    instantiate_within(layout, None, x, y, sink);
}

fn instantiate_within<A: ApplyLayout + ?Sized>(
    layout: &LayoutNode,
    owner: Option<ElementId>,
    x: i32,
    y: i32,
    sink: &mut A,
) {
    if let Some(element) = layout.element {
        sink.apply_layout(element, x, y, layout);
    }
    let owner = layout.element.or(owner);

    for placement in &layout.placements {
        let (px, py) = (x + placement.x, y + placement.y);
        match &placement.child {
            Some(child) => instantiate_within(child.node(), owner, px, py, sink),
            None => sink.apply_empty_slot(owner, placement.slot, px, py, placement.footprint),
        }
    }
}
