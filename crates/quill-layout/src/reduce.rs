//! Candidate set reduction.
//!
//! Keeps candidate sets small without losing useful diversity: first every
//! dominated alternative is dropped, then, if the set is still larger than
//! the budget for its subtree, the alternatives are ranked by badness plus an
//! area penalty and only the best are kept.

use std::cmp::Ordering;

use quill_core::CandidateBudget;
use tracing::trace;

use crate::node::SubLayout;
use crate::stats::LayoutStats;

/// Drop every candidate that another kept candidate weakly dominates on
/// width, height and badness. Exact duplicates keep their first occurrence.
pub fn prune_dominated(mut candidates: Vec<SubLayout>) -> Vec<SubLayout> {
    candidates.sort_by(|a, b| {
        let (a, b) = (a.node(), b.node());
        a.width()
            .cmp(&b.width())
            .then(a.height().cmp(&b.height()))
            .then(a.badness().total_cmp(&b.badness()))
    });

    // Sorted lexicographically, so a dominator always precedes what it dominates.
    let mut kept: Vec<SubLayout> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !kept.iter().any(|k| k.node().dominates(candidate.node())) {
            kept.push(candidate);
        }
    }
    kept
}

/// Keep the `limit` best candidates by
/// `badness + max_badness * min(1, (area - min_area) / min_area)`.
///
/// With room for two or more, the minimum-badness and minimum-area
/// candidates are always among the survivors, and with room for three the
/// narrowest one is too. Input order is preserved.
pub fn rank_and_truncate(candidates: Vec<SubLayout>, limit: usize) -> Vec<SubLayout> {
    let limit = limit.max(1);
    if candidates.len() <= limit {
        return candidates;
    }

    let min_area = candidates
        .iter()
        .map(|c| c.node().area())
        .min()
        .unwrap_or(1)
        .max(1) as f64;
    let max_badness = candidates
        .iter()
        .map(|c| c.node().badness())
        .fold(0.0_f64, f64::max);

    let scores: Vec<f64> = candidates
        .iter()
        .map(|c| {
            let node = c.node();
            let excess = (node.area() as f64 - min_area) / min_area;
            node.badness() + max_badness * excess.min(1.0)
        })
        .collect();

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .total_cmp(&scores[b])
            .then(candidates[a].node().area().cmp(&candidates[b].node().area()))
    });

    let mut keep = vec![false; candidates.len()];
    let mut kept = 0;
    if limit >= 2 {
        let extremes = [
            index_of_min(&candidates, |a, b| {
                a.badness().total_cmp(&b.badness()).then(a.area().cmp(&b.area()))
            }),
            index_of_min(&candidates, |a, b| {
                a.area().cmp(&b.area()).then(a.badness().total_cmp(&b.badness()))
            }),
            index_of_min(&candidates, |a, b| {
                a.width().cmp(&b.width()).then(a.badness().total_cmp(&b.badness()))
            }),
        ];
        for index in extremes {
            if kept < limit && !keep[index] {
                keep[index] = true;
                kept += 1;
            }
        }
    }
    for &index in &order {
        if kept >= limit {
            break;
        }
        if !keep[index] {
            keep[index] = true;
            kept += 1;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect()
}

fn index_of_min(
    candidates: &[SubLayout],
    cmp: impl Fn(&crate::node::LayoutNode, &crate::node::LayoutNode) -> Ordering,
) -> usize {
    (0..candidates.len())
        .min_by(|&a, &b| cmp(candidates[a].node(), candidates[b].node()))
        .unwrap_or(0)
}

/// Full reduction: dominance filter, then the size budget for a subtree with
/// `choice_points` descendant choice points.
pub fn reduce(
    candidates: Vec<SubLayout>,
    choice_points: usize,
    budget: &CandidateBudget,
    stats: &mut LayoutStats,
) -> Vec<SubLayout> {
    let before = candidates.len();
    let pruned = prune_dominated(candidates);
    stats.reductions += 1;
    stats.pruned += before - pruned.len();

    let limit = budget.limit(choice_points);
    if pruned.len() <= limit {
        return pruned;
    }

    stats.budget_exhaustions += 1;
    trace!(
        candidates = pruned.len(),
        limit,
        choice_points,
        "candidate set over budget"
    );
    rank_and_truncate(pruned, limit)
}
