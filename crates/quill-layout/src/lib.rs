//! Multi-row candidate layout for Quill element trees.
//!
//! This crate decides how a tree of variable-size elements is arranged into
//! rectangles before anything is drawn. Every element offers a small set of
//! alternative shapes; ordered sequences (argument lists) are wrapped into
//! rows at every width where the wrapping can change.
//!
//! # Architecture
//!
//! 1. **Candidates**: [`LayoutNode`] values, immutable once built
//! 2. **Reduction**: dominance pruning plus a size budget per subtree
//! 3. **Combination**: bounded Cartesian product of children's candidates
//! 4. **Row search**: incremental, margin-driven frontier search per row
//! 5. **Sequences**: rows stitched into multi-row candidates
//! 6. **Commit**: the root picks one candidate and [`instantiate`] writes it
//!
//! # Example
//!
//! ```
//! use quill_core::{LayoutError, LayoutOptions};
//! use quill_layout::{compute_layout, ElementTree, MonospaceMeasure};
//!
//! fn main() -> Result<(), LayoutError> {
//!     let mut tree = ElementTree::new();
//!     let f = tree.token("print");
//!     let arg = tree.token("value");
//!     let call = tree.call(Some(f), [Some(arg)]);
//!
//!     let options = LayoutOptions::default();
//!     let report = compute_layout(&mut tree, call, &MonospaceMeasure::default(), &options)?;
//!     assert_eq!(report.layout.node().height(), 16);
//!     assert!(tree.placed(arg).is_some());
//!     Ok(())
//! }
//! ```

mod combine;
mod compute;
mod measure;
mod node;
mod reduce;
mod row_search;
mod sequence;
mod stats;
mod tree;

pub use combine::{combinations, Combinations};
pub use compute::{calc_layouts, compute_layout, select_layout, LayoutContext, LayoutReport};
pub use measure::{Measure, MonospaceMeasure};
pub use node::{
    instantiate, ApplyLayout, CandidateSet, LayoutNode, Placement, RowSpan, SequenceLayoutData,
    SubLayout,
};
pub use reduce::{prune_dominated, rank_and_truncate, reduce};
pub use row_search::{RowFrontierSearch, RowLayout, SequenceItem};
pub use sequence::{layout_sequence, shape_penalty, RowStack, SequenceLayouter};
pub use stats::LayoutStats;
pub use tree::{Element, ElementKind, ElementTree, EmptySlot, Placed};
