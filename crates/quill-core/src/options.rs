//! Layout configuration.

use crate::errors::LayoutError;
use crate::types::Extent;

/// Table deciding how many alternatives a candidate set may keep.
///
/// The limit grows with the number of choice points below the node: a
/// lookup table for tiny subtrees, a flat cap for small ones, a slow linear
/// ramp for medium ones and a hard cap for everything larger.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateBudget {
    /// Limits for choice-point counts 0 through 5
    pub small: [usize; 6],
    /// Limit for counts up to `flat_until`
    pub flat: usize,
    pub flat_until: usize,
    /// Counts up to `ramp_until` get `flat + count / ramp_divisor`
    pub ramp_divisor: usize,
    pub ramp_until: usize,
    /// Limit for everything above `ramp_until`
    pub cap: usize,
}

impl Default for CandidateBudget {
    fn default() -> Self {
        Self {
            small: [1, 2, 3, 3, 4, 5],
            flat: 5,
            flat_until: 19,
            ramp_divisor: 20,
            ramp_until: 300,
            cap: 20,
        }
    }
}

impl CandidateBudget {
    /// Maximum number of candidates kept for a subtree with `choice_points`
    /// descendant choice points. Never below 1.
    pub fn limit(&self, choice_points: usize) -> usize {
        let limit = if choice_points < self.small.len() {
            self.small[choice_points]
        } else if choice_points <= self.flat_until {
            self.flat
        } else if choice_points <= self.ramp_until {
            self.flat + choice_points / self.ramp_divisor.max(1)
        } else {
            self.cap
        };
        limit.max(1)
    }
}

/// Options for layout computation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutOptions {
    /// Width available to the root element
    pub viewport_width: i32,
    /// Horizontal gap between adjacent items of a row
    pub item_gap: i32,
    /// Vertical gap between wrapped rows
    pub row_gap: i32,
    /// Indentation of rows after the first, and of broken operands
    pub continuation_indent: i32,
    /// Width of an opening or closing bracket
    pub bracket_width: i32,
    /// Footprint of an empty slot; must be at least 1x1
    pub empty_slot: Extent,
    /// Badness added when a call or binary expression breaks onto a new line
    pub break_badness: f64,
    /// Coefficient of the squareness penalty applied to wrapped sequences
    pub shape_penalty: f64,
    /// Exponent of the squareness penalty
    pub shape_penalty_exponent: f64,
    /// Upper bound on combined child alternatives per node
    pub combination_budget: Option<usize>,
    /// Upper bound on margin steps per sequence
    pub max_margin_steps: usize,
    /// Candidate set size table
    pub budget: CandidateBudget,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            viewport_width: 800,
            item_gap: 8,
            row_gap: 0,
            continuation_indent: 16,
            bracket_width: 8,
            empty_slot: Extent::new(8, 16, 12),
            break_badness: 1.0,
            shape_penalty: 1.0,
            shape_penalty_exponent: 2.0,
            combination_budget: Some(64),
            max_margin_steps: 512,
            budget: CandidateBudget::default(),
        }
    }
}

impl LayoutOptions {
    /// Set the viewport width.
    pub fn with_viewport_width(mut self, width: i32) -> Self {
        self.viewport_width = width;
        self
    }

    /// Set the gap between items of a row.
    pub fn with_item_gap(mut self, gap: i32) -> Self {
        self.item_gap = gap;
        self
    }

    /// Set the gap between rows.
    pub fn with_row_gap(mut self, gap: i32) -> Self {
        self.row_gap = gap;
        self
    }

    /// Set the continuation indent.
    pub fn with_continuation_indent(mut self, indent: i32) -> Self {
        self.continuation_indent = indent;
        self
    }

    /// Set the bracket width.
    pub fn with_bracket_width(mut self, width: i32) -> Self {
        self.bracket_width = width;
        self
    }

    /// Set the empty slot footprint.
    pub fn with_empty_slot(mut self, extent: Extent) -> Self {
        self.empty_slot = extent;
        self
    }

    /// Set the combination budget (`None` enumerates every combination).
    pub fn with_combination_budget(mut self, budget: Option<usize>) -> Self {
        self.combination_budget = budget;
        self
    }

    /// Set the shape penalty coefficient and exponent.
    pub fn with_shape_penalty(mut self, coefficient: f64, exponent: f64) -> Self {
        self.shape_penalty = coefficient;
        self.shape_penalty_exponent = exponent;
        self
    }

    /// Check the options for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let invalid = |reason: &str| {
            Err(LayoutError::InvalidOptions {
                reason: reason.to_string(),
            })
        };

        if self.empty_slot.width < 1 || self.empty_slot.height < 1 {
            return invalid("empty slot footprint must be at least 1x1");
        }
        if self.viewport_width < 1 {
            return invalid("viewport width must be positive");
        }
        if self.item_gap < 0 || self.row_gap < 0 || self.continuation_indent < 0 {
            return invalid("gaps and indents must not be negative");
        }
        if self.bracket_width < 0 {
            return invalid("bracket width must not be negative");
        }
        if !(self.break_badness >= 0.0 && self.shape_penalty >= 0.0) {
            return invalid("badness weights must be non-negative numbers");
        }
        if !self.shape_penalty_exponent.is_finite() || self.shape_penalty_exponent < 1.0 {
            return invalid("shape penalty exponent must be at least 1");
        }
        if self.max_margin_steps == 0 {
            return invalid("at least one margin step is required");
        }
        Ok(())
    }
}
