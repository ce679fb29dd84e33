//! Error types for the Quill engine.

use crate::types::ElementId;
use thiserror::Error;

/// Errors during layout computation.
///
/// Quality degradation (budget exhaustion, convergence faults) is never an
/// error; it is counted in the layout statistics instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Element {id} is not part of the tree")]
    UnknownElement { id: ElementId },

    #[error("Layout cycle detected involving element {element}")]
    CycleDetected { element: ElementId },

    #[error("Element {element} is already placed under {owner}")]
    SharedElement { element: ElementId, owner: ElementId },

    #[error("Invalid layout options: {reason}")]
    InvalidOptions { reason: String },

    #[error("Margin {requested} is below the already searched margin {current}")]
    MarginRegression { requested: i32, current: i32 },
}
