//! Layout computation over the element tree.
//!
//! Candidate sets are computed bottom-up: tokens are measured, sequences are
//! packed into rows, and composite elements combine their children's
//! alternatives. The root then picks one candidate, which is committed to
//! the tree in a single top-down pass.

use indexmap::IndexMap;
use quill_core::{ElementId, Extent, LayoutError, LayoutOptions, SlotId};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, debug_span, warn};

use crate::combine::combinations;
use crate::measure::Measure;
use crate::node::{instantiate, CandidateSet, LayoutNode, SubLayout};
use crate::reduce::reduce;
use crate::row_search::SequenceItem;
use crate::sequence::layout_sequence;
use crate::stats::LayoutStats;
use crate::tree::{ElementKind, ElementTree};

/// State of one layout pass.
pub struct LayoutContext<'a> {
    options: &'a LayoutOptions,
    measure: &'a dyn Measure,
    stats: LayoutStats,
    memo: IndexMap<ElementId, CandidateSet>,
    visiting: FxHashSet<ElementId>,
    /// Parent each child element was consumed by
    owners: FxHashMap<ElementId, ElementId>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(options: &'a LayoutOptions, measure: &'a dyn Measure) -> Self {
        Self {
            options,
            measure,
            stats: LayoutStats::default(),
            memo: IndexMap::new(),
            visiting: FxHashSet::default(),
            owners: FxHashMap::default(),
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        self.options
    }

    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut LayoutStats {
        &mut self.stats
    }

    /// Candidate set computed for `id` during this pass, if any.
    pub fn computed(&self, id: ElementId) -> Option<&CandidateSet> {
        self.memo.get(&id)
    }
}

/// Result of [`compute_layout`].
#[derive(Debug, Clone)]
pub struct LayoutReport {
    /// The committed root layout
    pub layout: SubLayout,
    /// Number of alternatives the root offered
    pub candidates: usize,
    pub stats: LayoutStats,
}

/// Compute, choose and commit the layout of the tree below `root`.
///
/// The chosen layout is committed with its top-left corner at the origin.
pub fn compute_layout(
    tree: &mut ElementTree,
    root: ElementId,
    measure: &dyn Measure,
    options: &LayoutOptions,
) -> Result<LayoutReport, LayoutError> {
    options.validate()?;
    let _span = debug_span!("compute_layout", %root).entered();

    let mut ctx = LayoutContext::new(options, measure);
    let set = calc_layouts(tree, root, &mut ctx)?;
    let layout = select_layout(&set, options.viewport_width, &mut ctx.stats);

    let node = layout.node();
    debug!(
        width = node.width(),
        height = node.height(),
        badness = node.badness(),
        candidates = set.len(),
        "committing layout"
    );

    tree.clear_placements();
    instantiate(node, 0, node.anchor(), tree);

    Ok(LayoutReport {
        candidates: set.len(),
        layout,
        stats: ctx.stats,
    })
}

/// Candidate layouts for the element `id`, computing its subtree first.
///
/// Results are memoised in the context for the rest of the pass. An element
/// may appear under only one parent per pass. A failed call leaves the
/// context as it was, so it can be retried once the tree is fixed.
pub fn calc_layouts(
    tree: &ElementTree,
    id: ElementId,
    ctx: &mut LayoutContext,
) -> Result<CandidateSet, LayoutError> {
    if let Some(set) = ctx.memo.get(&id) {
        return Ok(set.clone());
    }
    if !ctx.visiting.insert(id) {
        return Err(LayoutError::CycleDetected { element: id });
    }

    let result = element_layouts(tree, id, ctx);
    ctx.visiting.remove(&id);
    match result {
        Ok(set) => {
            ctx.memo.insert(id, set.clone());
            Ok(set)
        }
        Err(err) => {
            ctx.owners.retain(|_, owner| *owner != id);
            Err(err)
        }
    }
}

fn element_layouts(
    tree: &ElementTree,
    id: ElementId,
    ctx: &mut LayoutContext,
) -> Result<CandidateSet, LayoutError> {
    let element = tree.get(id).ok_or(LayoutError::UnknownElement { id })?;

    Ok(match &element.kind {
        ElementKind::Token { text } => {
            let extent = ctx.measure.measure(text);
            CandidateSet::single(LayoutNode::leaf(Some(id), extent).into(), 0)
        }
        ElementKind::List { items } => {
            let items = sequence_items(tree, id, items, ctx)?;
            layout_sequence(&items, Some(id), ctx.options, &mut ctx.stats)?
        }
        ElementKind::Call { callee, args } => {
            let callee = child_layouts(tree, id, *callee, ctx)?;
            let items = sequence_items(tree, id, args, ctx)?;
            let args = layout_sequence(&items, None, ctx.options, &mut ctx.stats)?;
            layout_call(id, callee, args, ctx)
        }
        ElementKind::Binary {
            left,
            operator,
            right,
        } => {
            let children = [
                child_layouts(tree, id, *left, ctx)?,
                child_layouts(tree, id, *operator, ctx)?,
                child_layouts(tree, id, *right, ctx)?,
            ];
            layout_binary(id, children, ctx)
        }
    })
}

fn child_layouts(
    tree: &ElementTree,
    parent: ElementId,
    child: Option<ElementId>,
    ctx: &mut LayoutContext,
) -> Result<Option<CandidateSet>, LayoutError> {
    let Some(child) = child else {
        return Ok(None);
    };
    if let Some(&owner) = ctx.owners.get(&child) {
        return Err(LayoutError::SharedElement {
            element: child,
            owner,
        });
    }
    ctx.owners.insert(child, parent);
    calc_layouts(tree, child, ctx).map(Some)
}

fn sequence_items(
    tree: &ElementTree,
    parent: ElementId,
    children: &[Option<ElementId>],
    ctx: &mut LayoutContext,
) -> Result<Vec<SequenceItem>, LayoutError> {
    children
        .iter()
        .map(|&child| {
            Ok(match child_layouts(tree, parent, child, ctx)? {
                Some(set) => SequenceItem::Present(set),
                None => SequenceItem::Missing,
            })
        })
        .collect()
}

/// Every combination of the present children's alternatives, aligned with
/// `children` (`None` where the slot is empty).
fn child_combinations(
    children: &[Option<&CandidateSet>],
    ctx: &mut LayoutContext,
) -> Vec<Vec<Option<SubLayout>>> {
    let lists = children
        .iter()
        .flatten()
        .map(|set| set.candidates().to_vec())
        .collect();

    combinations(lists, ctx.options.combination_budget, &mut ctx.stats)
        .map(|tuple| {
            let mut picked = tuple.into_iter();
            children
                .iter()
                .map(|child| child.and_then(|_| picked.next()))
                .collect()
        })
        .collect()
}

fn extent_of(child: Option<&SubLayout>, options: &LayoutOptions) -> Extent {
    child.map_or(options.empty_slot, |c| c.node().extent())
}

fn place(
    node: LayoutNode,
    slot: SlotId,
    child: Option<&SubLayout>,
    x: i32,
    y: i32,
    options: &LayoutOptions,
) -> LayoutNode {
    match child {
        Some(child) => node.attach(slot, child, x, y),
        None => node.attach_empty(slot, options.empty_slot, x, y),
    }
}

fn layout_call(
    id: ElementId,
    callee: Option<CandidateSet>,
    args: CandidateSet,
    ctx: &mut LayoutContext,
) -> CandidateSet {
    let options = ctx.options;
    let choice_points =
        1 + args.choice_points() + callee.as_ref().map_or(0, CandidateSet::choice_points);
    let bracket = Extent::new(options.bracket_width, 0, 0);

    let mut pool = Vec::new();
    for combo in child_combinations(&[callee.as_ref(), Some(&args)], ctx) {
        let head = combo[0].as_ref();
        let Some(seq) = combo[1].as_ref() else { continue };
        let (head_extent, seq_node) = (extent_of(head, options), seq.node());
        // The closing bracket follows the last row of the arguments.
        let (close_x, close_y) = match seq.rows().and_then(|rows| rows.last()) {
            Some(row) => (row.width, row.y),
            None => (seq_node.width(), 0),
        };

        // Arguments continue on the callee's line, right after the bracket.
        let args_x = head_extent.width + options.bracket_width;
        let hanging = place(LayoutNode::composite(Some(id)), SlotId::Callee, head, 0, 0, options)
            .merge(seq_node, args_x, 0)
            .cover(bracket, args_x + close_x, close_y);
        pool.push(hanging.into());

        // Arguments start on the next line, indented.
        let args_y = head_extent.below() + options.row_gap + seq_node.anchor();
        let indent = options.continuation_indent;
        let broken = place(LayoutNode::composite(Some(id)), SlotId::Callee, head, 0, 0, options)
            .cover(bracket, head_extent.width, 0)
            .merge(seq_node, indent, args_y)
            .cover(bracket, indent + close_x, args_y + close_y)
            .with_badness(options.break_badness);
        pool.push(broken.into());
    }

    finish(pool, choice_points, ctx)
}

fn layout_binary(
    id: ElementId,
    children: [Option<CandidateSet>; 3],
    ctx: &mut LayoutContext,
) -> CandidateSet {
    let options = ctx.options;
    let choice_points = 1 + children
        .iter()
        .flatten()
        .map(CandidateSet::choice_points)
        .sum::<usize>();
    let refs = [children[0].as_ref(), children[1].as_ref(), children[2].as_ref()];

    let mut pool = Vec::new();
    for combo in child_combinations(&refs, ctx) {
        let (left, operator, right) = (combo[0].as_ref(), combo[1].as_ref(), combo[2].as_ref());
        let (l, o, r) = (
            extent_of(left, options),
            extent_of(operator, options),
            extent_of(right, options),
        );
        let operator_x = l.width + options.item_gap;
        let head = place(LayoutNode::composite(Some(id)), SlotId::Left, left, 0, 0, options);
        let head = place(head, SlotId::Operator, operator, operator_x, 0, options);

        let inline_x = operator_x + o.width + options.item_gap;
        let inline = place(head.clone(), SlotId::Right, right, inline_x, 0, options);
        pool.push(inline.into());

        // Break after the operator.
        let right_y = l.below().max(o.below()) + options.row_gap + r.above();
        let broken = place(
            head,
            SlotId::Right,
            right,
            options.continuation_indent,
            right_y,
            options,
        )
        .with_badness(options.break_badness);
        pool.push(broken.into());
    }

    finish(pool, choice_points, ctx)
}

fn finish(pool: Vec<SubLayout>, choice_points: usize, ctx: &mut LayoutContext) -> CandidateSet {
    let fallback = pool.first().cloned();
    let reduced = reduce(pool, choice_points, &ctx.options.budget, &mut ctx.stats);
    match CandidateSet::new(reduced, choice_points) {
        Some(set) => set,
        None => {
            // Combination lists are never empty, so neither is the pool.
            warn!("composite element produced no candidates");
            let node = fallback.unwrap_or_else(|| {
                LayoutNode::leaf(None, ctx.options.empty_slot).into()
            });
            CandidateSet::single(node, choice_points)
        }
    }
}

/// Pick the root candidate for a viewport `max_width` wide.
///
/// Among candidates that fit (or the narrowest ones, if none fit) the
/// lowest badness wins, then the lowest height, then the lowest width. A tie
/// that survives all of that means the set was not properly reduced; it is
/// counted as a convergence fault and the first remaining candidate is used.
pub fn select_layout(set: &CandidateSet, max_width: i32, stats: &mut LayoutStats) -> SubLayout {
    let candidates = set.candidates();
    let mut pool: Vec<&SubLayout> = candidates
        .iter()
        .filter(|c| c.node().width() <= max_width)
        .collect();
    if pool.is_empty() {
        let narrowest = set.min_width();
        pool = candidates
            .iter()
            .filter(|c| c.node().width() == narrowest)
            .collect();
    }

    let best_badness = pool
        .iter()
        .map(|c| c.node().badness())
        .fold(f64::INFINITY, f64::min);
    pool.retain(|c| c.node().badness() == best_badness);
    let best_height = pool.iter().map(|c| c.node().height()).min().unwrap_or(0);
    pool.retain(|c| c.node().height() == best_height);
    let best_width = pool.iter().map(|c| c.node().width()).min().unwrap_or(0);
    pool.retain(|c| c.node().width() == best_width);

    if pool.len() > 1 {
        stats.convergence_faults += 1;
        warn!(
            remaining = pool.len(),
            width = best_width,
            height = best_height,
            badness = best_badness,
            "root selection did not converge"
        );
    }

    match pool.first() {
        Some(chosen) => (*chosen).clone(),
        None => candidates
            .iter()
            .min_by(|a, b| a.node().badness().total_cmp(&b.node().badness()))
            .cloned()
            .unwrap_or_else(|| candidates[0].clone()),
    }
}
