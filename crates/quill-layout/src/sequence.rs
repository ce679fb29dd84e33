//! Multi-row layout of ordered sequences.
//!
//! A sequence is packed into rows at a series of increasing margins. At each
//! margin, rows found by the per-start-index frontier searches are chained
//! into complete multi-row packings; the margin then jumps straight to the
//! next width at which any of the involved searches can change.

use std::rc::Rc;

use quill_core::{ElementId, LayoutError, LayoutOptions, SlotId};
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace, warn};

use crate::node::{CandidateSet, LayoutNode, RowSpan, SequenceLayoutData, SubLayout};
use crate::reduce::{prune_dominated, reduce};
use crate::row_search::{RowFrontierSearch, RowLayout, SequenceItem};
use crate::stats::LayoutStats;

/// A complete packing of a sequence (or of its tail) into rows.
#[derive(Debug, Clone)]
pub struct RowStack {
    pub rows: Vec<RowLayout>,
    pub width: i32,
    pub height: i32,
    pub badness: f64,
}

impl RowStack {
    fn single(row: RowLayout) -> Self {
        Self {
            width: row.width,
            height: row.height(),
            badness: row.badness,
            rows: vec![row],
        }
    }

    fn stacked(row: &RowLayout, tail: &RowStack, row_gap: i32) -> Self {
        let mut rows = Vec::with_capacity(tail.rows.len() + 1);
        rows.push(row.clone());
        rows.extend(tail.rows.iter().cloned());
        Self {
            rows,
            width: row.width.max(tail.width),
            height: row.height() + row_gap + tail.height,
            badness: row.badness + tail.badness,
        }
    }

    fn dominates(&self, other: &RowStack) -> bool {
        self.height <= other.height
            && self.badness <= other.badness
            && self.rows.len() <= other.rows.len()
    }
}

type Packings = Rc<Vec<RowStack>>;

/// Drives row searches for one sequence across increasing margins.
pub struct SequenceLayouter<'a> {
    items: &'a [SequenceItem],
    options: &'a LayoutOptions,
    searches: Vec<Option<RowFrontierSearch<'a>>>,
    touched: Vec<usize>,
    margin: Option<i32>,
}

impl<'a> SequenceLayouter<'a> {
    pub fn new(items: &'a [SequenceItem], options: &'a LayoutOptions) -> Self {
        Self {
            items,
            options,
            searches: (0..items.len()).map(|_| None).collect(),
            touched: Vec::new(),
            margin: None,
        }
    }

    fn lead(&self, start: usize) -> i32 {
        if start == 0 {
            0
        } else {
            self.options.continuation_indent
        }
    }

    /// Narrowest margin at which the whole sequence can be packed: every
    /// item alone on its row, continuation rows indented.
    pub fn min_margin(&self) -> i32 {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| self.lead(i) + item.min_width(self.options.empty_slot))
            .max()
            .unwrap_or(0)
    }

    /// Every non-dominated packing that fits within `margin`.
    ///
    /// Empty below [`min_margin`](Self::min_margin). Margins must not
    /// decrease between calls.
    pub fn pack(&mut self, margin: i32) -> Result<Vec<RowStack>, LayoutError> {
        if let Some(current) = self.margin {
            if margin < current {
                return Err(LayoutError::MarginRegression {
                    requested: margin,
                    current,
                });
            }
        }
        self.margin = Some(margin);
        self.touched.clear();

        if self.items.is_empty() || margin < self.min_margin() {
            return Ok(Vec::new());
        }

        let mut memo = FxHashMap::default();
        let packings = self.pack_from(0, margin, &mut memo)?;
        Ok(packings.as_ref().clone())
    }

    fn pack_from(
        &mut self,
        start: usize,
        margin: i32,
        memo: &mut FxHashMap<usize, Packings>,
    ) -> Result<Packings, LayoutError> {
        if let Some(hit) = memo.get(&start) {
            return Ok(Rc::clone(hit));
        }

        let rows: Vec<RowLayout> = {
            let lead = self.lead(start);
            let options = self.options;
            let items = self.items;
            let search = self.searches[start].get_or_insert_with(|| {
                RowFrontierSearch::new(items, start, lead, options.item_gap, options.empty_slot)
            });
            search.advance(margin)?;
            search.rows().cloned().collect()
        };
        self.touched.push(start);

        let mut packings: Vec<RowStack> = Vec::new();
        for row in rows {
            if row.end == self.items.len() {
                insert_packing(&mut packings, RowStack::single(row));
                continue;
            }
            let tails = self.pack_from(row.end, margin, memo)?;
            for tail in tails.iter() {
                insert_packing(
                    &mut packings,
                    RowStack::stacked(&row, tail, self.options.row_gap),
                );
            }
        }

        let packings = Rc::new(packings);
        memo.insert(start, Rc::clone(&packings));
        Ok(packings)
    }

    /// Smallest margin above the last packed one at which the result can
    /// change, considering the searches that margin reached.
    pub fn next_margin(&self) -> Option<i32> {
        self.touched
            .iter()
            .filter_map(|&start| self.searches[start].as_ref()?.next_breakpoint())
            .min()
    }

    /// Turn a packing into a candidate node owned by `element`.
    pub fn build(&self, stack: &RowStack, element: Option<ElementId>) -> SubLayout {
        let options = self.options;
        let mut node = LayoutNode::composite(element);
        let mut spans = Vec::with_capacity(stack.rows.len());
        let first_above = stack.rows.first().map_or(0, |r| r.above);
        let mut top = 0;
        let mut present = false;

        for row in &stack.rows {
            let y = top + row.above - first_above;
            let mut x = self.lead(row.start);
            for (k, &shape) in row.shapes.iter().enumerate() {
                let index = row.start + k;
                let slot = SlotId::item(index);
                match self.items[index].candidate(shape) {
                    Some(child) => {
                        node = node.attach(slot, child, x, y);
                        x += child.node().width();
                        present = true;
                    }
                    None => {
                        node = node.attach_empty(slot, options.empty_slot, x, y);
                        x += options.empty_slot.width;
                    }
                }
                x += options.item_gap;
            }
            spans.push(RowSpan {
                items: row.start..row.end,
                width: row.width,
                height: row.height(),
                y,
            });
            top += row.height() + options.row_gap;
        }

        // Sequences of nothing but empty slots keep zero badness.
        if present {
            let penalty = shape_penalty(node.width(), node.height(), options);
            node = node.with_badness(penalty);
        }
        SequenceLayoutData { node, rows: spans }.into()
    }
}

/// Squareness penalty for sequence blocks:
/// `coefficient * (max(1, 4 * height / width) - 1) ^ exponent`.
///
/// Zero for blocks at least four times as wide as they are tall.
pub fn shape_penalty(width: i32, height: i32, options: &LayoutOptions) -> f64 {
    let ratio = (height as f64 * 4.0 / width.max(1) as f64).max(1.0);
    options.shape_penalty * (ratio - 1.0).powf(options.shape_penalty_exponent)
}

fn insert_packing(packings: &mut Vec<RowStack>, stack: RowStack) {
    if packings.iter().any(|p| p.dominates(&stack)) {
        return;
    }
    packings.retain(|p| !stack.dominates(p));
    packings.push(stack);
}

/// Candidate layouts for a whole sequence owned by `element`.
///
/// An empty sequence yields a single empty-slot placeholder in item slot 0.
pub fn layout_sequence(
    items: &[SequenceItem],
    element: Option<ElementId>,
    options: &LayoutOptions,
    stats: &mut LayoutStats,
) -> Result<CandidateSet, LayoutError> {
    let choice_points =
        items.len() + items.iter().map(SequenceItem::choice_points).sum::<usize>();
    if items.is_empty() {
        return Ok(CandidateSet::single(
            placeholder(element, options),
            choice_points,
        ));
    }

    let _span = debug_span!("layout_sequence", items = items.len()).entered();
    let mut layouter = SequenceLayouter::new(items, options);
    let mut margin = layouter.min_margin();
    let mut pool: Vec<SubLayout> = Vec::new();
    let mut steps = 0;

    loop {
        steps += 1;
        stats.margin_steps += 1;
        let packings = layouter.pack(margin)?;
        trace!(margin, packings = packings.len(), "packed sequence");
        pool.extend(packings.iter().map(|stack| layouter.build(stack, element)));
        pool = prune_dominated(pool);

        match layouter.next_margin() {
            None => break,
            Some(_) if steps >= options.max_margin_steps => {
                stats.margin_step_limit_hits += 1;
                debug!(margin, steps, "margin step limit reached");
                break;
            }
            Some(next) => margin = next,
        }
    }

    if pool.is_empty() {
        warn!(items = items.len(), "sequence produced no packing");
        pool.push(placeholder(element, options));
    }

    let reduced = reduce(pool, choice_points, &options.budget, stats);
    Ok(CandidateSet::new(reduced, choice_points)
        .unwrap_or_else(|| CandidateSet::single(placeholder(element, options), choice_points)))
}

fn placeholder(element: Option<ElementId>, options: &LayoutOptions) -> SubLayout {
    let node =
        LayoutNode::composite(element).attach_empty(SlotId::item(0), options.empty_slot, 0, 0);
    SequenceLayoutData {
        node,
        rows: vec![RowSpan {
            items: 0..0,
            width: options.empty_slot.width,
            height: options.empty_slot.height,
            y: 0,
        }],
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Extent;

    fn item(width: i32, height: i32, anchor: i32) -> SequenceItem {
        let leaf = LayoutNode::leaf(None, Extent::new(width, height, anchor));
        SequenceItem::Present(CandidateSet::single(leaf.into(), 0))
    }

    fn options() -> LayoutOptions {
        LayoutOptions::default()
            .with_item_gap(2)
            .with_continuation_indent(0)
    }

    #[test]
    fn test_min_margin_is_widest_item() {
        let items = vec![item(10, 10, 5), item(40, 10, 5), item(10, 10, 5)];
        let options = options();
        let layouter = SequenceLayouter::new(&items, &options);
        assert_eq!(layouter.min_margin(), 40);

        let indented = options.clone().with_continuation_indent(35);
        let layouter = SequenceLayouter::new(&items, &indented);
        assert_eq!(layouter.min_margin(), 75);
    }

    #[test]
    fn test_pack_follows_breakpoints() {
        let items = vec![item(10, 10, 5), item(40, 10, 5), item(10, 10, 5)];
        let options = options();
        let mut layouter = SequenceLayouter::new(&items, &options);

        assert!(layouter.pack(39).unwrap().is_empty());

        let stacks = layouter.pack(40).unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].rows.len(), 3);
        assert_eq!(layouter.next_margin(), Some(52));

        let stacks = layouter.pack(52).unwrap();
        assert_eq!(stacks.len(), 1);
        let ends: Vec<usize> = stacks[0].rows.iter().map(|r| r.end).collect();
        assert_eq!(ends, vec![2, 3]);
        assert_eq!(layouter.next_margin(), Some(64));

        let stacks = layouter.pack(64).unwrap();
        assert_eq!(stacks[0].rows.len(), 1);
        assert_eq!(layouter.next_margin(), None);

        assert!(matches!(
            layouter.pack(10),
            Err(LayoutError::MarginRegression { .. })
        ));
    }

    #[test]
    fn test_build_offsets_rows() {
        let items = vec![item(10, 10, 8), item(40, 20, 10)];
        let options = options().with_continuation_indent(4).with_row_gap(1);
        let mut layouter = SequenceLayouter::new(&items, &options);
        let stacks = layouter.pack(44).unwrap();
        assert_eq!(stacks.len(), 1);

        let built = layouter.build(&stacks[0], None);
        let node = built.node();
        // First row: 8 above, 2 below. Second row: 10 above, 10 below.
        assert_eq!(node.anchor(), 8);
        assert_eq!(node.height(), 10 + 1 + 20);
        assert_eq!(node.width(), 44);

        let second = node.placement(SlotId::item(1)).unwrap();
        assert_eq!((second.x, second.y), (4, 2 + 1 + 10));
        assert_eq!(built.row_count(), 2);
    }

    #[test]
    fn test_shape_penalty() {
        let options = LayoutOptions::default();
        assert_eq!(shape_penalty(40, 10, &options), 0.0);
        assert!((shape_penalty(40, 30, &options) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_tall_item_is_penalised() {
        let items = vec![item(10, 40, 20)];
        let options = options();
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, None, &options, &mut stats).unwrap();
        assert_eq!(set.len(), 1);
        let node = set.candidates()[0].node();
        assert_eq!(set.candidates()[0].row_count(), 1);
        // (4 * 40 / 10 - 1)^2
        assert!((node.badness() - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_items_stay_unpenalised() {
        let items = vec![SequenceItem::Missing, SequenceItem::Missing];
        let options = options();
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, None, &options, &mut stats).unwrap();
        assert!(set.candidates().iter().all(|c| c.node().badness() == 0.0));
    }

    #[test]
    fn test_empty_sequence_placeholder() {
        let options = options();
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&[], Some(ElementId(3)), &options, &mut stats).unwrap();
        assert_eq!(set.len(), 1);
        let node = set.candidates()[0].node();
        assert_eq!(node.extent(), options.empty_slot);
        assert!(node.placement(SlotId::item(0)).unwrap().child.is_none());
    }

    #[test]
    fn test_step_limit_is_counted() {
        let items: Vec<SequenceItem> = (0..6).map(|_| item(10, 10, 5)).collect();
        let mut options = options();
        options.max_margin_steps = 2;
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, None, &options, &mut stats).unwrap();
        assert!(!set.is_empty());
        assert_eq!(stats.margin_step_limit_hits, 1);
        assert!(stats.degraded());
    }
}
