//! Bounded Cartesian product over independent candidate lists.

use std::cmp::Reverse;

use tracing::debug;

use crate::node::SubLayout;
use crate::reduce::rank_and_truncate;
use crate::stats::LayoutStats;

/// Iterator over every combination of one candidate per list.
///
/// Yields tuples in odometer order, last list varying fastest.
#[derive(Debug, Clone)]
pub struct Combinations {
    lists: Vec<Vec<SubLayout>>,
    cursor: Vec<usize>,
    exhausted: bool,
}

impl Combinations {
    fn new(lists: Vec<Vec<SubLayout>>) -> Self {
        let exhausted = lists.iter().any(|list| list.is_empty());
        let cursor = vec![0; lists.len()];
        Self {
            lists,
            cursor,
            exhausted,
        }
    }

    /// The (possibly reduced) lists being combined.
    pub fn lists(&self) -> &[Vec<SubLayout>] {
        &self.lists
    }

    /// Number of tuples the full iteration yields.
    pub fn total(&self) -> usize {
        product(self.lists.iter().map(Vec::len))
    }
}

impl Iterator for Combinations {
    type Item = Vec<SubLayout>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let tuple = self
            .cursor
            .iter()
            .zip(&self.lists)
            .map(|(&i, list)| list[i].clone())
            .collect();

        // Advance the odometer.
        self.exhausted = true;
        for pos in (0..self.cursor.len()).rev() {
            self.cursor[pos] += 1;
            if self.cursor[pos] < self.lists[pos].len() {
                self.exhausted = false;
                break;
            }
            self.cursor[pos] = 0;
        }

        Some(tuple)
    }
}

fn product(lens: impl Iterator<Item = usize>) -> usize {
    lens.fold(1usize, |acc, len| acc.saturating_mul(len))
}

/// Combine candidate lists, yielding at most `budget` tuples when given.
///
/// Over budget, every list starts with a quota of one; quotas are raised one
/// at a time for the list with the best marginal benefit (its smallest area
/// divided by its current quota, larger lists winning ties) as long as the
/// projected product stays within budget. Lists are then cut to their quota
/// with the candidate ranking. Every list keeps at least one candidate.
pub fn combinations(
    lists: Vec<Vec<SubLayout>>,
    budget: Option<usize>,
    stats: &mut LayoutStats,
) -> Combinations {
    let full = product(lists.iter().map(Vec::len));
    let budget = match budget {
        Some(budget) if full > budget.max(1) => budget.max(1),
        _ => return Combinations::new(lists),
    };

    let min_areas: Vec<i64> = lists
        .iter()
        .map(|list| list.iter().map(|c| c.node().area()).min().unwrap_or(0))
        .collect();
    let mut order: Vec<usize> = (0..lists.len()).collect();
    order.sort_by_key(|&i| Reverse(min_areas[i]));

    let mut quotas = vec![1usize; lists.len()];
    let mut projected = 1usize;
    loop {
        let mut best: Option<(usize, f64)> = None;
        for &i in &order {
            if quotas[i] >= lists[i].len() {
                continue;
            }
            let grown = projected / quotas[i] * (quotas[i] + 1);
            if grown > budget {
                continue;
            }
            let benefit = min_areas[i].max(1) as f64 / quotas[i] as f64;
            if best.map_or(true, |(_, b)| benefit > b) {
                best = Some((i, benefit));
            }
        }
        match best {
            Some((i, _)) => {
                projected = projected / quotas[i] * (quotas[i] + 1);
                quotas[i] += 1;
            }
            None => break,
        }
    }

    stats.budget_exhaustions += 1;
    debug!(full, budget, projected, ?quotas, "combination budget exhausted");

    let reduced = lists
        .into_iter()
        .zip(quotas)
        .map(|(list, quota)| rank_and_truncate(list, quota))
        .collect();
    Combinations::new(reduced)
}
