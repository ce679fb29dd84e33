//! Incremental search for single-row packings.
//!
//! For a fixed start index, [`RowFrontierSearch`] grows partial rows item by
//! item as the margin (maximum row width) increases. Every way of appending
//! the next item is a branch in a min-heap keyed by the width the row would
//! reach; advancing to a new margin pops exactly the branches that now fit.
//! Branches are never re-evaluated, so widening the margin only costs the
//! newly reachable work.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use quill_core::{Extent, LayoutError};
use smallvec::SmallVec;

use crate::node::{CandidateSet, SubLayout};

/// One entry of an ordered sequence.
#[derive(Debug, Clone)]
pub enum SequenceItem {
    Present(CandidateSet),
    /// A hole in the tree, laid out as an empty slot
    Missing,
}

impl SequenceItem {
    pub(crate) fn shape_count(&self) -> usize {
        match self {
            SequenceItem::Present(set) => set.len(),
            SequenceItem::Missing => 1,
        }
    }

    pub(crate) fn shape(&self, index: usize, empty: Extent) -> (Extent, f64) {
        match self {
            SequenceItem::Present(set) => {
                let node = set.candidates()[index].node();
                (node.extent(), node.badness())
            }
            SequenceItem::Missing => (empty, 0.0),
        }
    }

    pub(crate) fn candidate(&self, index: usize) -> Option<&SubLayout> {
        match self {
            SequenceItem::Present(set) => set.candidates().get(index),
            SequenceItem::Missing => None,
        }
    }

    /// Narrowest shape this item can take.
    pub fn min_width(&self, empty: Extent) -> i32 {
        match self {
            SequenceItem::Present(set) => set.min_width(),
            SequenceItem::Missing => empty.width,
        }
    }

    pub(crate) fn choice_points(&self) -> usize {
        match self {
            SequenceItem::Present(set) => set.choice_points(),
            SequenceItem::Missing => 0,
        }
    }
}

/// A (possibly partial) single row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    /// Index of the first item on the row
    pub start: usize,
    /// One past the last item on the row
    pub end: usize,
    /// Width including the leading indent and gaps
    pub width: i32,
    pub above: i32,
    pub below: i32,
    pub badness: f64,
    /// Chosen shape index for each item, in order
    pub shapes: SmallVec<[usize; 8]>,
}

impl RowLayout {
    pub fn height(&self) -> i32 {
        self.above + self.below
    }

    pub fn item_count(&self) -> usize {
        self.end - self.start
    }

    /// No taller, no worse, and covering at least as many items.
    fn dominates(&self, other: &RowLayout) -> bool {
        self.height() <= other.height()
            && self.badness <= other.badness
            && self.item_count() >= other.item_count()
    }
}

/// Heap entry. Ordered by width key only (smallest first); `seq` keeps
/// equal keys in push order.
#[derive(Debug)]
struct Branch {
    key: i32,
    seq: u64,
    parent: Option<usize>,
    shape: usize,
}

impl PartialEq for Branch {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl Eq for Branch {}

impl PartialOrd for Branch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Branch {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap.
        other.key.cmp(&self.key).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Frontier search for rows beginning at one start index.
#[derive(Debug)]
pub struct RowFrontierSearch<'a> {
    items: &'a [SequenceItem],
    start: usize,
    gap: i32,
    empty: Extent,
    heap: BinaryHeap<Branch>,
    rows: Vec<RowLayout>,
    alive: Vec<bool>,
    frontier: Vec<usize>,
    seq: u64,
    margin: Option<i32>,
}

impl<'a> RowFrontierSearch<'a> {
    /// Start a search for rows beginning at `start`, offset by `lead`.
    pub fn new(
        items: &'a [SequenceItem],
        start: usize,
        lead: i32,
        gap: i32,
        empty: Extent,
    ) -> Self {
        let mut search = Self {
            items,
            start,
            gap,
            empty,
            heap: BinaryHeap::new(),
            rows: Vec::new(),
            alive: Vec::new(),
            frontier: Vec::new(),
            seq: 0,
            margin: None,
        };
        if let Some(item) = items.get(start) {
            for shape in 0..item.shape_count() {
                let (extent, _) = item.shape(shape, empty);
                search.push(lead + extent.width, None, shape);
            }
        }
        search
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Margin the search was last advanced to.
    pub fn margin(&self) -> Option<i32> {
        self.margin
    }

    fn push(&mut self, key: i32, parent: Option<usize>, shape: usize) {
        self.heap.push(Branch {
            key,
            seq: self.seq,
            parent,
            shape,
        });
        self.seq += 1;
    }

    /// Take every branch that fits within `margin`.
    ///
    /// Margins must not decrease between calls.
    pub fn advance(&mut self, margin: i32) -> Result<(), LayoutError> {
        if let Some(current) = self.margin {
            if margin < current {
                return Err(LayoutError::MarginRegression {
                    requested: margin,
                    current,
                });
            }
        }
        self.margin = Some(margin);

        while self.heap.peek().is_some_and(|b| b.key <= margin) {
            let Some(branch) = self.heap.pop() else { break };
            if branch.parent.is_some_and(|p| !self.alive[p]) {
                continue;
            }
            let row = self.extend(&branch);
            self.insert(row);
        }
        self.discard_dead_branches();
        Ok(())
    }

    fn extend(&self, branch: &Branch) -> RowLayout {
        let (above, below, badness, index, mut shapes) = match branch.parent {
            Some(p) => {
                let parent = &self.rows[p];
                (parent.above, parent.below, parent.badness, parent.end, parent.shapes.clone())
            }
            None => (0, 0, 0.0, self.start, SmallVec::new()),
        };
        let (extent, item_badness) = self.items[index].shape(branch.shape, self.empty);
        shapes.push(branch.shape);

        RowLayout {
            start: self.start,
            end: index + 1,
            width: branch.key,
            above: above.max(extent.above()),
            below: below.max(extent.below()),
            badness: badness + item_badness,
            shapes,
        }
    }

    fn insert(&mut self, row: RowLayout) {
        if self
            .frontier
            .iter()
            .any(|&i| self.rows[i].dominates(&row))
        {
            return;
        }

        let rows = &self.rows;
        let alive = &mut self.alive;
        self.frontier.retain(|&i| {
            let keep = !row.dominates(&rows[i]);
            if !keep {
                alive[i] = false;
            }
            keep
        });

        let id = self.rows.len();
        let (end, width) = (row.end, row.width);
        self.rows.push(row);
        self.alive.push(true);
        self.frontier.push(id);

        if let Some(next) = self.items.get(end) {
            for shape in 0..next.shape_count() {
                let (extent, _) = next.shape(shape, self.empty);
                self.push(width + self.gap + extent.width, Some(id), shape);
            }
        }
    }

    fn discard_dead_branches(&mut self) {
        while self
            .heap
            .peek()
            .is_some_and(|b| b.parent.is_some_and(|p| !self.alive[p]))
        {
            self.heap.pop();
        }
    }

    /// Non-dominated rows found so far, each a legal row ending.
    pub fn rows(&self) -> impl Iterator<Item = &RowLayout> + '_ {
        self.frontier.iter().map(move |&i| &self.rows[i])
    }

    /// Smallest margin above the current one at which the rows can change.
    pub fn next_breakpoint(&self) -> Option<i32> {
        self.heap.peek().map(|b| b.key)
    }
}
