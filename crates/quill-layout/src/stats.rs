//! Counters describing one layout pass.

/// Statistics gathered while computing layouts.
///
/// Budget exhaustion and convergence faults degrade quality without failing
/// the pass; these counters are how they become observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// Candidate sets passed through the reducer
    pub reductions: usize,
    /// Candidates removed by dominance pruning
    pub pruned: usize,
    /// Candidate sets or combination lists cut down to a size budget
    pub budget_exhaustions: usize,
    /// Margins visited by sequence searches
    pub margin_steps: usize,
    /// Sequence searches stopped by the margin step limit
    pub margin_step_limit_hits: usize,
    /// Root selections that did not converge to a single candidate
    pub convergence_faults: usize,
}

impl LayoutStats {
    /// True if any step had to trade quality for bounded work.
    pub fn degraded(&self) -> bool {
        self.budget_exhaustions > 0 || self.margin_step_limit_hits > 0
    }
}
