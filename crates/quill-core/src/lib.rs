//! Core types, options, and errors for the Quill layout engine.
//!
//! This crate provides the foundational types shared by the layout crates:
//! - Element and slot identifiers
//! - Extents (width, height, anchor) used for measurement and footprints
//! - Layout options and the candidate budget table
//! - Error types

pub mod errors;
pub mod options;
pub mod types;

pub use errors::*;
pub use options::*;
pub use types::*;
